//! Static keyword vocabularies and the substring topic matcher.
//!
//! Tables map a canonical topic name to its trigger substrings. They are
//! append-only configuration: add triggers here, never at runtime.

use std::collections::BTreeSet;

/// Canonical topic name → trigger substrings (all lower-case).
pub type TriggerTable = &'static [(&'static str, &'static [&'static str])];

/// Symptom categories used to read case narratives.
pub static SYMPTOM_CATEGORIES: TriggerTable = &[
    (
        "cardiovascular",
        &[
            "chest pain",
            "palpitations",
            "shortness of breath",
            "radiating pain",
            "arm pain",
            "jaw pain",
            "sweating",
        ],
    ),
    (
        "neurological",
        &[
            "headache",
            "weakness",
            "numbness",
            "confusion",
            "aphasia",
            "hemiparesis",
            "dizziness",
            "vision changes",
        ],
    ),
    (
        "respiratory",
        &[
            "cough",
            "wheezing",
            "dyspnea",
            "sputum",
            "hemoptysis",
            "breathing difficulty",
            "shortness of breath",
        ],
    ),
    (
        "gastrointestinal",
        &[
            "nausea",
            "vomiting",
            "abdominal pain",
            "diarrhea",
            "constipation",
            "bloating",
        ],
    ),
    (
        "infectious",
        &["fever", "chills", "rash", "fatigue", "malaise", "night sweats"],
    ),
    (
        "musculoskeletal",
        &["joint pain", "stiffness", "swelling", "muscle pain", "back pain"],
    ),
];

/// Interview topics detected in the student's questions.
pub static INTERVIEW_TOPICS: TriggerTable = &[
    ("pain", &["pain", "hurt", "ache", "sore"]),
    ("fever", &["fever", "temperature", "hot", "chills"]),
    ("cough", &["cough", "coughing"]),
    ("nausea", &["nausea", "nauseous", "sick"]),
    ("vomiting", &["vomit", "throw up", "throwing up"]),
    ("fatigue", &["tired", "fatigue", "exhausted", "energy"]),
    ("headache", &["headache", "head hurt", "head pain"]),
    ("rash", &["rash", "skin", "itchy", "itch"]),
    ("breathing", &["breath", "breathing", "shortness"]),
    ("swelling", &["swell", "swollen", "swelling"]),
    ("duration", &["how long", "when did", "started", "began"]),
    ("severity", &["how bad", "scale", "worse", "better"]),
    ("medications", &["medication", "medicine", "taking", "drugs"]),
    ("allergies", &["allergy", "allergic", "allergies"]),
    ("history", &["history", "before", "previous", "past"]),
];

/// Phrases that indicate the student requested an examination or test.
pub static EXAM_TRIGGERS: &[&str] = &[
    "examine",
    "check",
    "look at",
    "test",
    "blood pressure",
    "temperature",
    "listen",
    "vital",
];

/// Phrases that indicate the student reviewed the patient's history.
pub static HISTORY_TRIGGERS: &[&str] = &[
    "history",
    "before",
    "medication",
    "allergy",
    "family",
    "previous",
];

/// Examination vocabulary looked for in case narratives.
pub static EXAM_FINDING_TERMS: &[&str] = &[
    "blood pressure",
    "heart rate",
    "pulse",
    "temperature",
    "tenderness",
    "swelling",
];

/// Common symptoms offered as negatives when a narrative doesn't mention them.
pub static RULE_OUT_CANDIDATES: &[&str] = &["fever", "nausea", "vomiting", "headache", "rash"];

/// Every topic in `table` with at least one trigger contained in `text`.
///
/// `text` is expected to be lower-cased already.
pub fn match_topics(text: &str, table: TriggerTable) -> BTreeSet<&'static str> {
    table
        .iter()
        .filter(|(_, triggers)| contains_any(text, triggers))
        .map(|(topic, _)| *topic)
        .collect()
}

pub fn contains_any(text: &str, triggers: &[&str]) -> bool {
    triggers.iter().any(|t| text.contains(t))
}

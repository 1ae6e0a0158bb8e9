//! Approximate symptom and demographic extraction from case narratives.
//!
//! Only used when a case arrives without structured symptom lists. The output
//! is a best guess and may be empty or noisy; nothing downstream relies on it
//! being complete.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::vocabulary::{EXAM_FINDING_TERMS, RULE_OUT_CANDIDATES, SYMPTOM_CATEGORIES};
use crate::models::{CaseContext, SymptomSets};

/// Maximum inferred absent symptoms.
const MAX_ABSENT: usize = 3;

static AGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)[\s-]*(?:year|yr|y\.?o\.?)").expect("valid age regex")
});

static MALE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:male|man|boy|he|his)\b").expect("valid male regex")
});

static FEMALE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:female|woman|girl|she|her)\b").expect("valid female regex")
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    pub age: Option<String>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseFeatures {
    pub symptoms: SymptomSets,
    pub demographics: Demographics,
}

/// Derive symptom lists and demographic hints from a free-text narrative.
pub fn extract_case_features(description: &str) -> CaseFeatures {
    let text = description.to_lowercase();

    let mut presenting: Vec<String> = Vec::new();
    for (_, triggers) in SYMPTOM_CATEGORIES {
        for trigger in *triggers {
            if text.contains(trigger) && !presenting.iter().any(|p| p == trigger) {
                presenting.push(trigger.to_string());
            }
        }
    }

    let exam_findings: Vec<String> = EXAM_FINDING_TERMS
        .iter()
        .filter(|term| text.contains(*term))
        .map(|term| term.to_string())
        .collect();

    // Without any presenting signal, negatives would be pure noise.
    let absent: Vec<String> = if presenting.is_empty() {
        Vec::new()
    } else {
        RULE_OUT_CANDIDATES
            .iter()
            .filter(|s| !text.contains(*s))
            .take(MAX_ABSENT)
            .map(|s| s.to_string())
            .collect()
    };

    CaseFeatures {
        symptoms: SymptomSets::new(presenting, absent, exam_findings),
        demographics: infer_demographics(description),
    }
}

pub fn infer_demographics(description: &str) -> Demographics {
    let age = AGE_PATTERN
        .captures(description)
        .and_then(|c| c.get(1))
        .map(|m| format!("{} years old", m.as_str()));

    let gender = if MALE_PATTERN.is_match(description) {
        Some("male".to_string())
    } else if FEMALE_PATTERN.is_match(description) {
        Some("female".to_string())
    } else {
        None
    };

    Demographics { age, gender }
}

/// Fill in what the narrative can supply: symptom lists when none are
/// structured, the specialty when blank, and the label of a numeric
/// difficulty tier. Structured data is never overwritten.
pub fn complete_case(mut case: CaseContext) -> CaseContext {
    if case.specialty.trim().is_empty() {
        case.specialty = infer_specialty(&case.description, &case.expected_diagnosis).to_string();
    }
    if let Ok(tier) = case.difficulty.trim().parse::<u8>() {
        case.difficulty = difficulty_label(tier).to_string();
    }
    if case.symptoms.is_empty() {
        let features = extract_case_features(&case.description);
        tracing::debug!(
            case_id = %case.case_id,
            presenting = features.symptoms.presenting.len(),
            exam_findings = features.symptoms.exam_findings.len(),
            "Extracted symptoms from case description"
        );
        case.symptoms = features.symptoms;
    }
    case
}

/// Guess the specialty from narrative and diagnosis keywords.
pub fn infer_specialty(description: &str, diagnosis: &str) -> &'static str {
    let text = format!("{description} {diagnosis}").to_lowercase();
    let has = |terms: &[&str]| terms.iter().any(|t| text.contains(t));

    if has(&["chest", "heart", "cardiac", "coronary"]) {
        "Cardiology"
    } else if has(&["brain", "stroke", "neuro", "weakness", "aphasia"]) {
        "Neurology"
    } else if has(&["child", "pediatric", "fever", "rash", "measles"]) {
        "Pediatrics"
    } else if has(&["lung", "cough", "breath", "respiratory"]) {
        "Pulmonology"
    } else {
        "General Medicine"
    }
}

/// Human label for a numeric difficulty tier.
pub fn difficulty_label(tier: u8) -> &'static str {
    match tier {
        1 => "Beginner",
        3 => "Advanced",
        _ => "Intermediate",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_presenting_and_exam_terms() {
        let features = extract_case_features(
            "55-year-old man with crushing chest pain, sweating and nausea. \
             Blood pressure 150/95, heart rate 110.",
        );
        let s = &features.symptoms;
        assert_eq!(s.presenting, vec!["chest pain", "sweating", "nausea"]);
        assert_eq!(s.exam_findings, vec!["blood pressure", "heart rate"]);
        // nausea is present, so it is not offered as a negative
        assert_eq!(s.absent, vec!["fever", "vomiting", "headache"]);
        assert_eq!(features.demographics.age.as_deref(), Some("55 years old"));
        assert_eq!(features.demographics.gender.as_deref(), Some("male"));
    }

    #[test]
    fn no_presenting_means_no_absent() {
        let features = extract_case_features("Routine follow-up visit.");
        assert!(features.symptoms.presenting.is_empty());
        assert!(features.symptoms.absent.is_empty());
    }

    #[test]
    fn absent_capped_at_three() {
        let features = extract_case_features("Patient reports a cough.");
        assert_eq!(features.symptoms.absent.len(), 3);
    }

    #[test]
    fn demographics_default_to_unset() {
        let d = infer_demographics("Patient presents to clinic.");
        assert!(d.age.is_none());
        assert!(d.gender.is_none());
    }

    #[test]
    fn female_detected_without_male_false_positive() {
        let d = infer_demographics("A 7 yo girl; her mother reports fever.");
        assert_eq!(d.gender.as_deref(), Some("female"));
        assert_eq!(d.age.as_deref(), Some("7 years old"));
    }

    #[test]
    fn sets_stay_disjoint_for_shared_terms() {
        // "swelling" is both a symptom trigger and an exam term
        let features = extract_case_features("Knee swelling after a fall.");
        assert!(features.symptoms.presenting.contains(&"swelling".to_string()));
        assert!(!features.symptoms.exam_findings.contains(&"swelling".to_string()));
    }

    #[test]
    fn complete_case_keeps_structured_data() {
        let case = CaseContext {
            case_id: "c1".into(),
            title: "Cough".into(),
            description: "fever and rash".into(),
            specialty: "General Medicine".into(),
            difficulty: "Beginner".into(),
            expected_diagnosis: "Bronchitis".into(),
            acceptable_diagnoses: vec![],
            symptoms: SymptomSets::new(vec!["productive cough".into()], vec![], vec![]),
        };
        let out = complete_case(case);
        assert_eq!(out.symptoms.presenting, vec!["productive cough"]);
    }

    #[test]
    fn complete_case_extracts_when_empty() {
        let case = CaseContext {
            case_id: "c2".into(),
            title: "Rash".into(),
            description: "Child with fever and rash".into(),
            specialty: "Pediatrics".into(),
            difficulty: "Beginner".into(),
            expected_diagnosis: "Measles".into(),
            acceptable_diagnoses: vec![],
            symptoms: SymptomSets::default(),
        };
        let out = complete_case(case);
        assert_eq!(out.symptoms.presenting, vec!["fever", "rash"]);
    }

    #[test]
    fn complete_case_infers_specialty_and_difficulty() {
        let case = CaseContext {
            case_id: "c3".into(),
            title: "Chest pain".into(),
            description: "Crushing chest pain radiating to the jaw".into(),
            specialty: " ".into(),
            difficulty: "3".into(),
            expected_diagnosis: "Myocardial infarction".into(),
            acceptable_diagnoses: vec![],
            symptoms: SymptomSets::new(vec!["Chest pain".into()], vec![], vec![]),
        };
        let out = complete_case(case);
        assert_eq!(out.specialty, "Cardiology");
        assert_eq!(out.difficulty, "Advanced");
        assert_eq!(out.symptoms.presenting, vec!["Chest pain"]);

        let named = complete_case(CaseContext {
            specialty: "Neurology".into(),
            difficulty: "Beginner".into(),
            ..out
        });
        assert_eq!(named.specialty, "Neurology");
        assert_eq!(named.difficulty, "Beginner");
    }

    #[test]
    fn specialty_keyword_priority() {
        assert_eq!(infer_specialty("chest tightness", "angina"), "Cardiology");
        assert_eq!(infer_specialty("sudden aphasia", "stroke"), "Neurology");
        assert_eq!(infer_specialty("child with spots", "measles"), "Pediatrics");
        assert_eq!(infer_specialty("chronic cough", "copd"), "Pulmonology");
        assert_eq!(infer_specialty("burning urination", "uti"), "General Medicine");
    }

    #[test]
    fn difficulty_labels() {
        assert_eq!(difficulty_label(1), "Beginner");
        assert_eq!(difficulty_label(2), "Intermediate");
        assert_eq!(difficulty_label(3), "Advanced");
        assert_eq!(difficulty_label(9), "Intermediate");
    }
}

use serde::{Deserialize, Serialize};

/// The three disjoint symptom lists of a case.
///
/// Order matters: downstream components treat list position as priority.
/// Deserialization goes through [`SymptomSets::new`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSymptomSets")]
pub struct SymptomSets {
    pub presenting: Vec<String>,
    pub absent: Vec<String>,
    pub exam_findings: Vec<String>,
}

/// Wire shape of [`SymptomSets`] before blanks and overlaps are removed.
#[derive(Deserialize)]
struct RawSymptomSets {
    #[serde(default)]
    presenting: Vec<String>,
    #[serde(default)]
    absent: Vec<String>,
    #[serde(default)]
    exam_findings: Vec<String>,
}

impl From<RawSymptomSets> for SymptomSets {
    fn from(raw: RawSymptomSets) -> Self {
        Self::new(raw.presenting, raw.absent, raw.exam_findings)
    }
}

impl SymptomSets {
    /// Build the sets, dropping blanks and duplicates. An entry already present
    /// in an earlier list (presenting, then absent, then exam findings) is
    /// dropped from the later one, so the three lists never overlap.
    pub fn new(presenting: Vec<String>, absent: Vec<String>, exam_findings: Vec<String>) -> Self {
        let mut seen: Vec<String> = Vec::new();
        let presenting = dedupe_into(presenting, &mut seen);
        let absent = dedupe_into(absent, &mut seen);
        let exam_findings = dedupe_into(exam_findings, &mut seen);
        Self {
            presenting,
            absent,
            exam_findings,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.presenting.is_empty() && self.absent.is_empty() && self.exam_findings.is_empty()
    }

    /// Whether `text` is one of the case's symptom or finding strings.
    pub fn contains(&self, text: &str) -> bool {
        let needle = normalize(text);
        self.presenting
            .iter()
            .chain(&self.absent)
            .chain(&self.exam_findings)
            .any(|s| normalize(s) == needle)
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn dedupe_into(items: Vec<String>, seen: &mut Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            continue;
        }
        let key = normalize(trimmed);
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(trimmed.to_string());
    }
    out
}

/// Immutable facts about one simulated encounter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseContext {
    pub case_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub specialty: String,
    pub difficulty: String,
    pub expected_diagnosis: String,
    #[serde(default)]
    pub acceptable_diagnoses: Vec<String>,
    #[serde(default)]
    pub symptoms: SymptomSets,
}

impl CaseContext {
    pub fn presenting(&self) -> &[String] {
        &self.symptoms.presenting
    }

    pub fn absent(&self) -> &[String] {
        &self.symptoms.absent
    }

    pub fn exam_findings(&self) -> &[String] {
        &self.symptoms.exam_findings
    }
}

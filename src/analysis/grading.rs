use super::conversation::significant_words;
use crate::models::{CaseContext, DiagnosisResult};

/// Minimum length for a substring match to count as correct.
const MIN_SUBSTRING_MATCH_LEN: usize = 4;

/// Deterministic comparison of a submitted diagnosis against the case answer.
///
/// Exact or substring matches against the expected or any acceptable
/// diagnosis are correct; a shared significant word is partial.
pub fn grade_diagnosis(user_diagnosis: &str, case: &CaseContext) -> DiagnosisResult {
    let submitted = user_diagnosis.trim().to_lowercase();
    if submitted.chars().count() < 2 {
        return DiagnosisResult::Wrong;
    }

    let answers: Vec<String> = std::iter::once(case.expected_diagnosis.as_str())
        .chain(case.acceptable_diagnoses.iter().map(String::as_str))
        .flat_map(|a| a.split([',', ';']))
        .map(|a| a.trim().to_lowercase())
        .filter(|a| !a.is_empty())
        .collect();

    if answers.iter().any(|a| is_match(&submitted, a)) {
        return DiagnosisResult::Correct;
    }

    let words = significant_words(&submitted);
    if answers
        .iter()
        .any(|a| words.iter().any(|w| a.contains(w.as_str())))
    {
        return DiagnosisResult::Partial;
    }

    DiagnosisResult::Wrong
}

fn is_match(submitted: &str, answer: &str) -> bool {
    if submitted == answer {
        return true;
    }
    submitted.chars().count() >= MIN_SUBSTRING_MATCH_LEN
        && answer.chars().count() >= MIN_SUBSTRING_MATCH_LEN
        && (answer.contains(submitted) || submitted.contains(answer))
}

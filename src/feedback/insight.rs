//! Insight text for the deterministic path.
//!
//! Candidates are gathered in priority order from the analysis, topped up
//! from generic templates, then cut to the allowed range.

use crate::analysis::ConversationAnalysis;
use crate::models::{CaseContext, DiagnosisResult, Insight};

pub const MIN_INSIGHT_ITEMS: usize = 2;
pub const MAX_INSIGHT_ITEMS: usize = 3;

/// Symptoms among the first few that feed strength/improvement lines.
const HIGHLIGHT_STRENGTH_SYMPTOMS: usize = 2;
const HIGHLIGHT_MISSED_SYMPTOMS: usize = 3;

/// Questions after which the turn count itself is worth praising.
const ENGAGED_TURNS: usize = 3;

pub fn compose_insight(
    case: &CaseContext,
    analysis: &ConversationAnalysis,
    user_diagnosis: &str,
    result: DiagnosisResult,
) -> Insight {
    let submitted = display_diagnosis(user_diagnosis);
    Insight {
        summary: summary(case, &submitted, result),
        strengths: strengths(case, analysis, result),
        improvements: improvements(case, analysis, &submitted, result),
        tip: tip(case, analysis),
    }
}

fn display_diagnosis(user_diagnosis: &str) -> String {
    let trimmed = user_diagnosis.trim();
    if trimmed.is_empty() {
        "no diagnosis".to_string()
    } else {
        trimmed.to_string()
    }
}

fn summary(case: &CaseContext, submitted: &str, result: DiagnosisResult) -> String {
    let expected = &case.expected_diagnosis;
    match result {
        DiagnosisResult::Correct => format!(
            "Excellent work! You correctly diagnosed {expected}. Your questioning approach led you to the right conclusion."
        ),
        DiagnosisResult::Partial => format!(
            "You were close with '{submitted}'. The correct diagnosis was {expected}. Review the distinguishing features between these conditions."
        ),
        DiagnosisResult::Wrong => format!(
            "The correct diagnosis was {expected}, not {submitted}. Review the key symptoms that differentiate this condition."
        ),
    }
}

fn strengths(
    case: &CaseContext,
    analysis: &ConversationAnalysis,
    result: DiagnosisResult,
) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();

    match result {
        DiagnosisResult::Correct => items.push(format!(
            "Reached the correct diagnosis of {}",
            case.expected_diagnosis
        )),
        DiagnosisResult::Partial => items.push(format!(
            "Narrowed the problem to a condition related to {}",
            case.expected_diagnosis
        )),
        DiagnosisResult::Wrong => {}
    }

    for coverage in analysis.symptoms.iter().take(HIGHLIGHT_STRENGTH_SYMPTOMS) {
        if coverage.asked {
            items.push(format!("Asked about {}", coverage.symptom.to_lowercase()));
        }
    }

    if analysis.topic("duration") {
        items.push("Inquired about symptom duration and timeline".into());
    }
    if analysis.topic("medications") || analysis.topic("history") {
        items.push("Explored the patient's medical history".into());
    }
    if analysis.exam_requested {
        items.push("Requested a physical examination before committing to a diagnosis".into());
    }

    if items.len() < MIN_INSIGHT_ITEMS {
        if analysis.student_turns >= ENGAGED_TURNS {
            items.push(format!(
                "Asked {} questions to explore the patient's condition",
                analysis.student_turns
            ));
        } else {
            items.push("Initiated the diagnostic process with the patient".into());
        }
    }
    if items.len() < MIN_INSIGHT_ITEMS {
        match case.presenting().first() {
            Some(first) => items.push(format!(
                "Addressed the patient's main concern about {}",
                first.to_lowercase()
            )),
            None => items.push("Engaged with the patient".into()),
        }
    }

    items.truncate(MAX_INSIGHT_ITEMS);
    items
}

fn improvements(
    case: &CaseContext,
    analysis: &ConversationAnalysis,
    submitted: &str,
    result: DiagnosisResult,
) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();

    for coverage in analysis.symptoms.iter().take(HIGHLIGHT_MISSED_SYMPTOMS) {
        if !coverage.asked {
            items.push(format!(
                "Missed asking about {} - a key symptom",
                coverage.symptom.to_lowercase()
            ));
        }
    }

    match result {
        DiagnosisResult::Correct => {}
        DiagnosisResult::Partial => items.push(format!(
            "Distinguish '{submitted}' from {} by asking about the features that separate them",
            case.expected_diagnosis
        )),
        DiagnosisResult::Wrong => items.push(format!(
            "Revisit the findings that point to {} before settling on a diagnosis",
            case.expected_diagnosis
        )),
    }

    if !analysis.topic("duration") {
        items.push("Should ask about when symptoms started and how long they've lasted".into());
    }
    if !analysis.exam_requested {
        if let Some(finding) = case.exam_findings().first() {
            items.push(format!(
                "Physical examination would help - key findings include {}",
                finding.to_lowercase()
            ));
        }
    }

    if items.len() < MIN_INSIGHT_ITEMS {
        if let Some(negative) = case.absent().first() {
            items.push(format!(
                "Asking about {} would help rule out other conditions",
                negative.to_lowercase()
            ));
        }
    }
    if items.len() < MIN_INSIGHT_ITEMS {
        items.push("Consider exploring what makes the symptoms better or worse".into());
    }
    if items.len() < MIN_INSIGHT_ITEMS {
        items.push("Summarize the key findings back to the patient before concluding".into());
    }

    items.truncate(MAX_INSIGHT_ITEMS);
    items
}

fn tip(case: &CaseContext, analysis: &ConversationAnalysis) -> String {
    let expected = &case.expected_diagnosis;
    let presenting = case.presenting();
    let top = |n: usize, empty: &str| {
        if presenting.is_empty() {
            empty.to_string()
        } else {
            presenting
                .iter()
                .take(n)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        }
    };

    // One sentence: the template clause, optionally joined with the miss.
    let base = match case.specialty.as_str() {
        "General Medicine" => format!(
            "For {expected}, always explore the key symptoms ({}) thoroughly",
            top(3, "the presenting complaints")
        ),
        "Cardiology" => "For cardiac cases, always ask about radiation of pain, associated symptoms like sweating or nausea, and risk factors".to_string(),
        "Pulmonology" => "For respiratory cases, assess onset, character of cough, sputum production, and any breathing difficulties".to_string(),
        "Pediatrics" => "For pediatric cases, consider developmental history, immunization status, and how symptoms affect daily activities".to_string(),
        "Neurology" => "For neurological cases, pin down the exact time of onset and check for focal deficits, speech and vision changes".to_string(),
        _ => format!(
            "For {expected}, focus on the characteristic symptoms: {}",
            top(2, "presenting complaints")
        ),
    };

    match analysis.missed_symptoms().next() {
        Some(missed) => format!(
            "{base}; in this case, start with {}, which you did not ask about.",
            missed.to_lowercase()
        ),
        None => format!("{base}."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ConversationAnalyzer, KeywordAnalyzer};
    use crate::models::{ConversationMessage, SymptomSets};

    fn make_case(specialty: &str, presenting: &[&str], absent: &[&str], exam: &[&str]) -> CaseContext {
        let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        CaseContext {
            case_id: "case_9".into(),
            title: "Headache".into(),
            description: String::new(),
            specialty: specialty.into(),
            difficulty: "Intermediate".into(),
            expected_diagnosis: "Migraine".into(),
            acceptable_diagnoses: vec![],
            symptoms: SymptomSets::new(owned(presenting), owned(absent), owned(exam)),
        }
    }

    fn insight_for(
        case: &CaseContext,
        turns: &[&str],
        diagnosis: &str,
        result: DiagnosisResult,
    ) -> Insight {
        let conv: Vec<ConversationMessage> =
            turns.iter().map(|t| ConversationMessage::student(t)).collect();
        let analysis = KeywordAnalyzer::new().analyze(case, &conv);
        compose_insight(case, &analysis, diagnosis, result)
    }

    fn assert_bounds(insight: &Insight) {
        assert!((MIN_INSIGHT_ITEMS..=MAX_INSIGHT_ITEMS).contains(&insight.strengths.len()));
        assert!((MIN_INSIGHT_ITEMS..=MAX_INSIGHT_ITEMS).contains(&insight.improvements.len()));
        assert!(!insight.tip.is_empty());
        assert!(!insight.summary.is_empty());
    }

    #[test]
    fn correct_summary_names_diagnosis() {
        let case = make_case("Neurology", &["Throbbing headache", "Photophobia"], &[], &[]);
        let insight = insight_for(
            &case,
            &["Tell me about the headache", "How long does it last?"],
            "migraine",
            DiagnosisResult::Correct,
        );
        assert!(insight.summary.contains("correctly diagnosed Migraine"));
        assert_eq!(insight.strengths[0], "Reached the correct diagnosis of Migraine");
        assert_eq!(insight.strengths[1], "Asked about throbbing headache");
        assert!(insight
            .improvements
            .iter()
            .any(|i| i.contains("photophobia")));
        assert_bounds(&insight);
    }

    #[test]
    fn wrong_summary_mentions_both_diagnoses() {
        let case = make_case("Neurology", &["Headache"], &[], &[]);
        let insight = insight_for(&case, &[], "Tension headache", DiagnosisResult::Wrong);
        assert!(insight.summary.contains("Migraine"));
        assert!(insight.summary.contains("Tension headache"));
        assert_bounds(&insight);
    }

    #[test]
    fn degenerate_input_still_within_bounds() {
        let case = make_case("Dermatology", &[], &[], &[]);
        let insight = insight_for(&case, &[], "", DiagnosisResult::Wrong);
        assert_bounds(&insight);
        assert!(insight.summary.contains("no diagnosis"));
        assert!(insight.tip.contains("presenting complaints"));
    }

    #[test]
    fn thorough_interview_truncated_to_three() {
        let case = make_case(
            "General Medicine",
            &["fever", "cough", "fatigue"],
            &["rash"],
            &["crackles"],
        );
        let insight = insight_for(
            &case,
            &[
                "Any fever or cough?",
                "How long has it lasted?",
                "Any medication?",
                "Let me examine your chest.",
            ],
            "Pneumonia",
            DiagnosisResult::Partial,
        );
        assert_eq!(insight.strengths.len(), 3);
        assert_bounds(&insight);
        assert_eq!(
            insight.tip,
            "For Migraine, always explore the key symptoms (fever, cough, fatigue) thoroughly; \
             in this case, start with fatigue, which you did not ask about."
        );
    }

    #[test]
    fn tip_is_one_sentence() {
        for specialty in ["General Medicine", "Cardiology", "Pulmonology", "Pediatrics", "Neurology", "Dermatology"] {
            let case = make_case(specialty, &["Fever", "Cough", "Fatigue"], &[], &[]);
            for turns in [&[][..], &["fever, cough or fatigue?"][..]] {
                let insight = insight_for(&case, turns, "Flu", DiagnosisResult::Partial);
                assert!(insight.tip.ends_with('.'), "{}", insight.tip);
                assert_eq!(insight.tip.matches(". ").count(), 0, "{}", insight.tip);
            }
        }
    }

    #[test]
    fn specialty_tip_selected() {
        let case = make_case("Cardiology", &["Chest pain"], &[], &[]);
        let insight = insight_for(&case, &["chest pain?"], "MI", DiagnosisResult::Correct);
        assert!(insight.tip.starts_with("For cardiac cases"));
    }

    #[test]
    fn every_result_category_stays_within_bounds() {
        let case = make_case("Pediatrics", &["Fever", "Rash"], &["Cough"], &["Koplik spots"]);
        for result in [
            DiagnosisResult::Correct,
            DiagnosisResult::Partial,
            DiagnosisResult::Wrong,
        ] {
            for turns in [&[][..], &["fever?"][..], &["fever?", "rash?", "how long?", "check"][..]] {
                assert_bounds(&insight_for(&case, turns, "Measles", result));
            }
        }
    }
}

//! Clue selection for the deterministic path.
//!
//! Importance is positional: the first two presenting symptoms are critical.
//! This is a known simplification, not a clinical ranking. After the
//! symptoms come topic-level clues, then the first exam finding and the
//! first pertinent negative; the cap cuts from the end.

use crate::analysis::ConversationAnalysis;
use crate::models::{CaseContext, Clue, Importance};

/// Maximum clues produced by the deterministic path.
pub const MAX_FALLBACK_CLUES: usize = 6;

const CRITICAL_POSITIONS: usize = 2;

pub const PLACEHOLDER_CHIEF_COMPLAINT: &str = "Chief complaint explored";
pub const PLACEHOLDER_DURATION: &str = "Duration of symptoms";
pub const TOPIC_HISTORY: &str = "Medications and past history";

pub fn rank_clues(case: &CaseContext, analysis: &ConversationAnalysis) -> Vec<Clue> {
    if analysis.symptoms.is_empty() {
        return placeholder_clues(analysis);
    }

    let mut clues: Vec<Clue> = analysis
        .symptoms
        .iter()
        .enumerate()
        .map(|(i, coverage)| Clue {
            id: format!("p{}", i + 1),
            text: coverage.symptom.clone(),
            importance: if i < CRITICAL_POSITIONS {
                Importance::Critical
            } else {
                Importance::Helpful
            },
            asked: coverage.asked,
        })
        .collect();

    clues.push(Clue {
        id: "t1".into(),
        text: PLACEHOLDER_DURATION.into(),
        importance: Importance::Helpful,
        asked: analysis.topic("duration"),
    });
    if analysis.history_reviewed {
        clues.push(Clue {
            id: "t2".into(),
            text: TOPIC_HISTORY.into(),
            importance: Importance::Minor,
            asked: true,
        });
    }

    if let Some(finding) = case.exam_findings().first() {
        clues.push(Clue {
            id: "e1".into(),
            text: finding.clone(),
            importance: Importance::Minor,
            asked: analysis.exam_requested,
        });
    }

    if let Some(negative) = case.absent().first() {
        clues.push(Clue {
            id: "a1".into(),
            text: negative.clone(),
            importance: Importance::Minor,
            asked: analysis.mentions(negative),
        });
    }

    clues.truncate(MAX_FALLBACK_CLUES);
    clues
}

/// Generic clues for cases without presenting symptoms, so the list is never
/// empty.
fn placeholder_clues(analysis: &ConversationAnalysis) -> Vec<Clue> {
    vec![
        Clue {
            id: "c1".into(),
            text: PLACEHOLDER_CHIEF_COMPLAINT.into(),
            importance: Importance::Critical,
            asked: analysis.student_turns >= 1,
        },
        Clue {
            id: "c2".into(),
            text: PLACEHOLDER_DURATION.into(),
            importance: Importance::Helpful,
            asked: analysis.topic("duration"),
        },
    ]
}

/// Clue texts that are generated rather than taken from the case.
pub fn is_placeholder(text: &str) -> bool {
    matches!(
        text,
        PLACEHOLDER_CHIEF_COMPLAINT | PLACEHOLDER_DURATION | TOPIC_HISTORY
    )
}

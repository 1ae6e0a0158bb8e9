//! Decision tree reconstruction from the interview path.
//!
//! The tree is a picture of what the student explored, not a classifier.
//! Branch order follows case list order: first presenting symptoms are
//! treated as the most important ones.

use crate::analysis::ConversationAnalysis;
use crate::models::{
    truncate_chars, CaseContext, DecisionTreeNode, DiagnosisResult, NodeType,
};

pub const ROOT_LABEL_MAX_CHARS: usize = 60;
pub const NODE_LABEL_MAX_CHARS: usize = 40;

/// Root fan-out ceiling. The diagnosis child always survives truncation.
pub const MAX_ROOT_CHILDREN: usize = 6;

/// Presenting symptoms considered for asked branches.
const ASKED_CANDIDATES: usize = 3;
const MAX_ASKED_BRANCHES: usize = 2;

const DEFAULT_ROOT_LABEL: &str = "Patient presents with symptoms";
const DEFAULT_EXAM_LABEL: &str = "Physical exam";
const HISTORY_LABEL: &str = "Medical history reviewed";
const NO_DIAGNOSIS_LABEL: &str = "No diagnosis submitted";

pub fn build_decision_tree(
    case: &CaseContext,
    analysis: &ConversationAnalysis,
    user_diagnosis: &str,
    result: DiagnosisResult,
) -> DecisionTreeNode {
    let mut children: Vec<DecisionTreeNode> = Vec::new();

    let asked: Vec<&str> = analysis
        .symptoms
        .iter()
        .take(ASKED_CANDIDATES)
        .filter(|s| s.asked)
        .map(|s| s.symptom.as_str())
        .take(MAX_ASKED_BRANCHES)
        .collect();

    for (i, symptom) in asked.iter().enumerate() {
        children.push(DecisionTreeNode::leaf(
            &format!("sym{}", i + 1),
            &truncate_chars(symptom, NODE_LABEL_MAX_CHARS),
            NodeType::Symptom,
            true,
        ));
    }

    if analysis.exam_requested {
        let label = case
            .exam_findings()
            .first()
            .map(|f| truncate_chars(f, NODE_LABEL_MAX_CHARS))
            .unwrap_or_else(|| DEFAULT_EXAM_LABEL.to_string());
        children.push(DecisionTreeNode::leaf("test1", &label, NodeType::Test, true));
    }

    if analysis.history_reviewed {
        children.push(DecisionTreeNode::leaf(
            "hist",
            HISTORY_LABEL,
            NodeType::Symptom,
            true,
        ));
    }

    // Missed avenues come last so they are the first to go when trimming.
    let room = MAX_ROOT_CHILDREN.saturating_sub(children.len() + 1);
    let missed = analysis.missed_symptoms().take(room);
    for (i, symptom) in missed.enumerate() {
        children.push(DecisionTreeNode::leaf(
            &format!("missed{}", i + 1),
            &truncate_chars(symptom, NODE_LABEL_MAX_CHARS),
            NodeType::Symptom,
            false,
        ));
    }

    let diagnosis_label = if user_diagnosis.trim().is_empty() {
        NO_DIAGNOSIS_LABEL.to_string()
    } else {
        truncate_chars(user_diagnosis.trim(), NODE_LABEL_MAX_CHARS)
    };
    children.push(DecisionTreeNode::leaf(
        "diag",
        &diagnosis_label,
        NodeType::Diagnosis,
        result == DiagnosisResult::Correct,
    ));

    let root_label = if case.title.trim().is_empty() {
        DEFAULT_ROOT_LABEL.to_string()
    } else {
        truncate_chars(case.title.trim(), ROOT_LABEL_MAX_CHARS)
    };

    DecisionTreeNode {
        id: "root".into(),
        label: root_label,
        node_type: NodeType::Symptom,
        asked: true,
        children,
    }
}

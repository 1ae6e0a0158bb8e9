use serde::{Deserialize, Serialize};

use super::case::CaseContext;
use super::conversation::ConversationMessage;
use super::enums::{DiagnosisResult, Importance, NodeType};

pub const MAX_DIAGNOSIS_POINTS: u32 = 40;
pub const MAX_KEY_QUESTION_POINTS: u32 = 20;
pub const MAX_TEST_POINTS: u32 = 20;
pub const MAX_TIME_POINTS: u32 = 10;
pub const MAX_DIFFERENTIAL_POINTS: u32 = 10;

/// Points deducted per hint the student requested.
pub const HINT_PENALTY_PER_HINT: u32 = 3;

/// Deepest chain allowed in a decision tree (root counts as level 1).
pub const MAX_TREE_DEPTH: usize = 4;

/// Five-part rubric. Each field is independently capped, so the sum never
/// exceeds 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub correct_diagnosis: u32,
    pub key_questions: u32,
    pub right_tests: u32,
    pub time_efficiency: u32,
    pub ruled_out_differentials: u32,
}

impl ScoreBreakdown {
    pub fn clamped(self) -> Self {
        Self {
            correct_diagnosis: self.correct_diagnosis.min(MAX_DIAGNOSIS_POINTS),
            key_questions: self.key_questions.min(MAX_KEY_QUESTION_POINTS),
            right_tests: self.right_tests.min(MAX_TEST_POINTS),
            time_efficiency: self.time_efficiency.min(MAX_TIME_POINTS),
            ruled_out_differentials: self.ruled_out_differentials.min(MAX_DIFFERENTIAL_POINTS),
        }
    }

    pub fn total(&self) -> u32 {
        self.correct_diagnosis
            + self.key_questions
            + self.right_tests
            + self.time_efficiency
            + self.ruled_out_differentials
    }
}

/// Total score after the hint penalty, floored at zero.
pub fn net_score(breakdown: &ScoreBreakdown, hint_penalty: u32) -> u32 {
    breakdown.total().saturating_sub(hint_penalty)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionTreeNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub asked: bool,
    #[serde(default)]
    pub children: Vec<DecisionTreeNode>,
}

impl DecisionTreeNode {
    pub fn leaf(id: &str, label: &str, node_type: NodeType, asked: bool) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            node_type,
            asked,
            children: Vec::new(),
        }
    }

    /// Number of levels, counting this node.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(|c| c.depth()).max().unwrap_or(0)
    }

    pub fn count_of(&self, node_type: NodeType) -> usize {
        let own = usize::from(self.node_type == node_type);
        own + self.children.iter().map(|c| c.count_of(node_type)).sum::<usize>()
    }

    /// Pre-order traversal.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a DecisionTreeNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
    pub id: String,
    pub text: String,
    pub importance: Importance,
    pub asked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub summary: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub tip: String,
}

/// Provenance of a feedback result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSource {
    pub is_ai_generated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FeedbackSource {
    pub fn generated() -> Self {
        Self {
            is_ai_generated: true,
            reason: None,
        }
    }

    pub fn reconstructed(reason: impl Into<String>) -> Self {
        Self {
            is_ai_generated: false,
            reason: Some(reason.into()),
        }
    }
}

/// One diagnosis submission: the case snapshot, the transcript in order, and
/// the already graded diagnosis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub case: CaseContext,
    pub conversation: Vec<ConversationMessage>,
    pub user_diagnosis: String,
    pub result: DiagnosisResult,
    #[serde(default)]
    pub hints_used: u32,
}

/// The single object returned for one diagnosis submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResult {
    pub score: u32,
    pub breakdown: ScoreBreakdown,
    pub decision_tree: DecisionTreeNode,
    pub clues: Vec<Clue>,
    pub insight: Insight,
    pub user_diagnosis: String,
    pub correct_diagnosis: String,
    pub result: DiagnosisResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints_used: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint_penalty: Option<u32>,
    pub source: FeedbackSource,
}

impl FeedbackResult {
    pub fn is_ai_generated(&self) -> bool {
        self.source.is_ai_generated
    }
}

/// Truncate to at most `max` characters without splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

//! Coerce a decoded model reply into a schema-valid `FeedbackResult`.
//!
//! Nothing here fails. Missing fields take defaults, numbers are clamped to
//! the rubric, the tree is repaired and clues are rewritten to the case entry
//! they refer to or dropped. Every repair leaves a human-readable warning.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::analysis::conversation::significant_words;
use crate::feedback::decision_tree::{
    MAX_ROOT_CHILDREN, NODE_LABEL_MAX_CHARS, ROOT_LABEL_MAX_CHARS,
};
use crate::feedback::hint_penalty;
use crate::feedback::insight::{MAX_INSIGHT_ITEMS, MIN_INSIGHT_ITEMS};
use crate::models::{
    net_score, truncate_chars, CaseContext, Clue, DecisionTreeNode, DiagnosisResult,
    FeedbackRequest, FeedbackResult, FeedbackSource, Importance, Insight, NodeType,
    ScoreBreakdown, MAX_TREE_DEPTH,
};

/// Maximum clues accepted from the model.
pub const MAX_MODEL_CLUES: usize = 10;

const DEFAULT_TIP: &str = "Use structured history-taking for consistent results.";
const STRENGTH_PADDING: &[&str] = &[
    "Engaged with the patient",
    "Committed to a diagnosis at the end of the interview",
    "Kept the interview focused on the presenting complaint",
];
const IMPROVEMENT_PADDING: &[&str] = &[
    "Consider a more systematic approach",
    "Ask about onset, duration and severity for every presenting symptom",
    "Request a targeted physical examination before concluding",
];

/// Validated result plus the repairs applied to get there.
#[derive(Debug, Clone)]
pub struct ValidatedFeedback {
    pub feedback: FeedbackResult,
    pub warnings: Vec<String>,
}

/// Build a `FeedbackResult` from any decoded JSON object.
///
/// Diagnoses, result category and hint count always come from the request;
/// the model's echo of them is only compared.
pub fn validate_feedback(raw: &Value, request: &FeedbackRequest) -> ValidatedFeedback {
    let mut warnings = Vec::new();

    let breakdown = extract_breakdown(raw, &mut warnings);
    let penalty = hint_penalty(request.hints_used);
    let score = net_score(&breakdown, penalty);
    if let Some(reported) = field(raw, &["score"]).and_then(as_points) {
        if reported != score {
            warnings.push(format!(
                "Model score {reported} replaced by recomputed score {score}"
            ));
        }
    }

    if let Some(reported) = field(raw, &["result"])
        .and_then(as_text)
        .and_then(|r| DiagnosisResult::parse_lenient(&r))
    {
        if reported != request.result {
            warnings.push(format!(
                "Model result '{reported}' ignored in favour of graded result '{}'",
                request.result
            ));
        }
    }

    let decision_tree = extract_tree(raw, request, &mut warnings);
    let clues = extract_clues(raw, &request.case, &mut warnings);
    let insight = extract_insight(raw, &request.case, &mut warnings);

    ValidatedFeedback {
        feedback: FeedbackResult {
            score,
            breakdown,
            decision_tree,
            clues,
            insight,
            user_diagnosis: request.user_diagnosis.clone(),
            correct_diagnosis: request.case.expected_diagnosis.clone(),
            result: request.result,
            hints_used: Some(request.hints_used),
            hint_penalty: Some(penalty),
            source: FeedbackSource::generated(),
        },
        warnings,
    }
}

// ═══════════════════════════════════════════════════════════
// Lenient field access
// ═══════════════════════════════════════════════════════════

/// First present key among `keys` (snake_case and camelCase spellings).
fn field<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k)).filter(|v| !v.is_null())
}

fn as_points(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(|x| u32::try_from(x).unwrap_or(u32::MAX))
            .or_else(|| n.as_f64().map(float_points)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(float_points),
        _ => None,
    }
}

fn float_points(x: f64) -> u32 {
    if !x.is_finite() || x <= 0.0 {
        0
    } else if x >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        x.round() as u32
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|x| x != 0.0),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(as_text).collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

// ═══════════════════════════════════════════════════════════
// Breakdown
// ═══════════════════════════════════════════════════════════

fn extract_breakdown(raw: &Value, warnings: &mut Vec<String>) -> ScoreBreakdown {
    let Some(obj) = field(raw, &["breakdown"]).filter(|v| v.is_object()) else {
        warnings.push("Missing score breakdown; all parts set to 0".into());
        return ScoreBreakdown::default();
    };

    let mut missing = Vec::new();
    let mut part = |snake: &'static str, camel: &'static str| {
        field(obj, &[snake, camel]).and_then(as_points).unwrap_or_else(|| {
            missing.push(snake);
            0
        })
    };

    let reported = ScoreBreakdown {
        correct_diagnosis: part("correct_diagnosis", "correctDiagnosis"),
        key_questions: part("key_questions", "keyQuestions"),
        right_tests: part("right_tests", "rightTests"),
        time_efficiency: part("time_efficiency", "timeEfficiency"),
        ruled_out_differentials: part("ruled_out_differentials", "ruledOutDifferentials"),
    };

    if !missing.is_empty() {
        warnings.push(format!("Breakdown parts missing, set to 0: {}", missing.join(", ")));
    }

    let clamped = reported.clamped();
    if clamped != reported {
        warnings.push("Breakdown clamped to rubric ranges".into());
    }
    clamped
}

// ═══════════════════════════════════════════════════════════
// Decision tree
// ═══════════════════════════════════════════════════════════

fn extract_tree(
    raw: &Value,
    request: &FeedbackRequest,
    warnings: &mut Vec<String>,
) -> DecisionTreeNode {
    let mut root = match field(raw, &["decision_tree", "decisionTree"]).filter(|v| v.is_object()) {
        Some(value) => {
            let mut cut = 0;
            let root = parse_node(value, 1, &mut cut);
            if cut > 0 {
                warnings.push(format!(
                    "Decision tree cut at depth {MAX_TREE_DEPTH} ({cut} nodes dropped)"
                ));
            }
            root
        }
        None => {
            warnings.push("Missing decision tree; using diagnosis stub".into());
            DecisionTreeNode::leaf("root", "Interview", NodeType::Symptom, true)
        }
    };

    enforce_single_diagnosis(&mut root, request, warnings);
    cap_root_children(&mut root, warnings);

    let mut renamed = 0;
    dedupe_ids(&mut root, &mut BTreeSet::new(), &mut renamed);
    if renamed > 0 {
        warnings.push(format!("Renamed {renamed} duplicate decision tree ids"));
    }

    truncate_labels(&mut root, ROOT_LABEL_MAX_CHARS);
    root
}

fn parse_node(value: &Value, depth: usize, cut: &mut usize) -> DecisionTreeNode {
    let children: Vec<&Value> = field(value, &["children"])
        .and_then(Value::as_array)
        .map(|items| items.iter().filter(|c| c.is_object()).collect())
        .unwrap_or_default();

    let children = if depth >= MAX_TREE_DEPTH {
        *cut += children.iter().map(|c| count_nodes(c)).sum::<usize>();
        Vec::new()
    } else {
        children
            .into_iter()
            .map(|c| parse_node(c, depth + 1, cut))
            .collect()
    };

    DecisionTreeNode {
        id: field(value, &["id"])
            .and_then(as_text)
            .unwrap_or_else(|| "node".into()),
        label: field(value, &["label", "text"])
            .and_then(as_text)
            .unwrap_or_else(|| "Unknown".into()),
        node_type: field(value, &["type", "node_type", "nodeType"])
            .and_then(as_text)
            .map(|t| NodeType::parse_lenient(&t))
            .unwrap_or(NodeType::Symptom),
        asked: field(value, &["asked"]).and_then(as_bool).unwrap_or(true),
        children,
    }
}

fn count_nodes(value: &Value) -> usize {
    1 + field(value, &["children"])
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter(|c| c.is_object())
                .map(count_nodes)
                .sum::<usize>()
        })
        .unwrap_or(0)
}

/// Keep the first diagnosis node in pre-order, demote the rest to
/// `ruled_out`, and add one under the root when none exists.
fn enforce_single_diagnosis(
    root: &mut DecisionTreeNode,
    request: &FeedbackRequest,
    warnings: &mut Vec<String>,
) {
    if root.node_type == NodeType::Diagnosis {
        root.node_type = NodeType::Symptom;
        warnings.push("Decision tree root cannot be a diagnosis; retyped as symptom".into());
    }

    let correct = request.result == DiagnosisResult::Correct;
    let mut found = false;
    let mut demoted = 0;
    let mut regraded = false;
    demote_extra_diagnoses(&mut root.children, correct, &mut found, &mut demoted, &mut regraded);
    if regraded {
        warnings.push(format!(
            "Diagnosis node asked flag set to {correct} to match graded result '{}'",
            request.result
        ));
    }
    if demoted > 0 {
        warnings.push(format!(
            "Decision tree had {} diagnosis nodes; extras marked ruled out",
            demoted + 1
        ));
    }

    if !found {
        let label = if request.user_diagnosis.trim().is_empty() {
            "No diagnosis submitted".to_string()
        } else {
            request.user_diagnosis.trim().to_string()
        };
        root.children.push(DecisionTreeNode::leaf(
            "diag",
            &label,
            NodeType::Diagnosis,
            correct,
        ));
        warnings.push("Decision tree had no diagnosis node; one was added".into());
    }
}

/// The surviving diagnosis node is `asked` only when the graded result is
/// correct.
fn demote_extra_diagnoses(
    nodes: &mut [DecisionTreeNode],
    correct: bool,
    found: &mut bool,
    demoted: &mut usize,
    regraded: &mut bool,
) {
    for node in nodes {
        if node.node_type == NodeType::Diagnosis {
            if *found {
                node.node_type = NodeType::RuledOut;
                *demoted += 1;
            } else {
                *found = true;
                if node.asked != correct {
                    node.asked = correct;
                    *regraded = true;
                }
            }
        }
        demote_extra_diagnoses(&mut node.children, correct, found, demoted, regraded);
    }
}

/// Trim root branches from the end down to `MAX_ROOT_CHILDREN`, never the
/// branch holding the diagnosis node.
fn cap_root_children(root: &mut DecisionTreeNode, warnings: &mut Vec<String>) {
    let excess = root.children.len().saturating_sub(MAX_ROOT_CHILDREN);
    if excess == 0 {
        return;
    }
    let keep = root
        .children
        .iter()
        .position(|c| c.count_of(NodeType::Diagnosis) > 0);

    let mut dropped = 0;
    let mut i = root.children.len();
    while dropped < excess && i > 0 {
        i -= 1;
        if Some(i) == keep {
            continue;
        }
        root.children.remove(i);
        dropped += 1;
    }
    warnings.push(format!(
        "Decision tree root had {} branches; capped to {MAX_ROOT_CHILDREN}",
        MAX_ROOT_CHILDREN + dropped
    ));
}

fn dedupe_ids(node: &mut DecisionTreeNode, seen: &mut BTreeSet<String>, renamed: &mut usize) {
    let base = match node.id.trim() {
        "" => "node".to_string(),
        id => id.to_string(),
    };
    let mut candidate = base.clone();
    let mut n = 2;
    while seen.contains(&candidate) {
        candidate = format!("{base}_{n}");
        n += 1;
    }
    if candidate != node.id {
        *renamed += 1;
        node.id = candidate.clone();
    }
    seen.insert(candidate);

    for child in &mut node.children {
        dedupe_ids(child, seen, renamed);
    }
}

fn truncate_labels(node: &mut DecisionTreeNode, max_chars: usize) {
    node.label = truncate_chars(&node.label, max_chars);
    for child in &mut node.children {
        truncate_labels(child, NODE_LABEL_MAX_CHARS);
    }
}

// ═══════════════════════════════════════════════════════════
// Clues
// ═══════════════════════════════════════════════════════════

fn extract_clues(raw: &Value, case: &CaseContext, warnings: &mut Vec<String>) -> Vec<Clue> {
    let Some(items) = field(raw, &["clues"]).and_then(Value::as_array) else {
        warnings.push("Missing clues; returning none".into());
        return Vec::new();
    };

    let mut dropped = 0;
    let mut rewritten = 0;
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut clues = Vec::new();
    for (i, c) in items.iter().filter(|c| c.is_object()).enumerate() {
        let reported = field(c, &["text", "label"]).and_then(as_text);
        let Some(entry) = reported.as_deref().and_then(|t| case_entry_for(case, t)) else {
            dropped += 1;
            continue;
        };
        if !seen.insert(entry.to_lowercase()) {
            dropped += 1;
            continue;
        }
        if reported.as_deref() != Some(entry) {
            rewritten += 1;
        }
        clues.push(Clue {
            id: field(c, &["id"])
                .and_then(as_text)
                .unwrap_or_else(|| format!("clue{}", i + 1)),
            text: entry.to_string(),
            importance: field(c, &["importance"])
                .and_then(as_text)
                .map(|t| Importance::parse_lenient(&t))
                .unwrap_or(Importance::Helpful),
            asked: field(c, &["asked"]).and_then(as_bool).unwrap_or(false),
        });
    }

    if rewritten > 0 {
        warnings.push(format!("Rewrote {rewritten} clues to their case wording"));
    }
    if dropped > 0 {
        warnings.push(format!("Dropped {dropped} clues not found in the case or repeated"));
    }
    if clues.len() > MAX_MODEL_CLUES {
        warnings.push(format!(
            "Excessive clues ({}) capped to {MAX_MODEL_CLUES}",
            clues.len()
        ));
        clues.truncate(MAX_MODEL_CLUES);
    }
    clues
}

/// The case entry a clue refers to: an exact (case-insensitive) match
/// first, else the first entry sharing a significant word.
fn case_entry_for<'a>(case: &'a CaseContext, text: &str) -> Option<&'a str> {
    let entries = || {
        case.presenting()
            .iter()
            .chain(case.absent())
            .chain(case.exam_findings())
    };
    let needle = text.trim().to_lowercase();
    if let Some(exact) = entries().find(|e| e.trim().to_lowercase() == needle) {
        return Some(exact.as_str());
    }
    let words = significant_words(text);
    if words.is_empty() {
        return None;
    }
    entries()
        .find(|e| {
            let entry_words = significant_words(e);
            words.iter().any(|w| entry_words.contains(w))
        })
        .map(String::as_str)
}

// ═══════════════════════════════════════════════════════════
// Insight
// ═══════════════════════════════════════════════════════════

fn extract_insight(raw: &Value, case: &CaseContext, warnings: &mut Vec<String>) -> Insight {
    let obj = field(raw, &["insight"]).filter(|v| v.is_object());
    if obj.is_none() {
        warnings.push("Missing insight; using generic text".into());
    }
    let get = |keys: &[&str]| obj.and_then(|o| field(o, keys));

    let summary = get(&["summary"]).and_then(as_text).unwrap_or_else(|| {
        format!("Review your approach to this {} case.", case.specialty)
    });
    let tip = get(&["tip"])
        .and_then(as_text)
        .unwrap_or_else(|| DEFAULT_TIP.to_string());

    let strengths = bounded_list(
        get(&["strengths"]).map(text_list).unwrap_or_default(),
        STRENGTH_PADDING,
        "strengths",
        warnings,
    );
    let improvements = bounded_list(
        get(&["improvements"]).map(text_list).unwrap_or_default(),
        IMPROVEMENT_PADDING,
        "improvements",
        warnings,
    );

    Insight {
        summary,
        strengths,
        improvements,
        tip,
    }
}

/// Pad from `padding` up to the minimum, then truncate to the maximum.
fn bounded_list(
    mut items: Vec<String>,
    padding: &[&str],
    name: &str,
    warnings: &mut Vec<String>,
) -> Vec<String> {
    let original = items.len();
    for pad in padding {
        if items.len() >= MIN_INSIGHT_ITEMS {
            break;
        }
        if !items.iter().any(|i| i == pad) {
            items.push(pad.to_string());
        }
    }
    if items.len() > MAX_INSIGHT_ITEMS {
        items.truncate(MAX_INSIGHT_ITEMS);
    }
    if items.len() != original {
        warnings.push(format!(
            "Insight {name} adjusted from {original} to {} items",
            items.len()
        ));
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConversationMessage, SymptomSets};
    use serde_json::json;

    fn make_request(result: DiagnosisResult, hints: u32) -> FeedbackRequest {
        FeedbackRequest {
            case: CaseContext {
                case_id: "case_mi".into(),
                title: "Chest pain".into(),
                description: String::new(),
                specialty: "Cardiology".into(),
                difficulty: "Intermediate".into(),
                expected_diagnosis: "Acute myocardial infarction".into(),
                acceptable_diagnoses: vec![],
                symptoms: SymptomSets::new(
                    vec!["Crushing chest pain".into(), "Sweating".into()],
                    vec!["Fever".into()],
                    vec!["ST elevation on ECG".into()],
                ),
            },
            conversation: vec![ConversationMessage::student("Where is the pain?")],
            user_diagnosis: "Myocardial infarction".into(),
            result,
            hints_used: hints,
        }
    }

    fn full_reply() -> Value {
        json!({
            "score": 85,
            "breakdown": {
                "correct_diagnosis": 40,
                "key_questions": 15,
                "right_tests": 15,
                "time_efficiency": 8,
                "ruled_out_differentials": 7
            },
            "decision_tree": {
                "id": "root",
                "label": "Chest pain",
                "type": "symptom",
                "asked": true,
                "children": [
                    {"id": "q1", "label": "Pain character", "type": "symptom", "asked": true, "children": [
                        {"id": "t1", "label": "ECG", "type": "test", "asked": true, "children": []}
                    ]},
                    {"id": "diag", "label": "Acute MI", "type": "diagnosis", "asked": true, "children": []}
                ]
            },
            "clues": [
                {"id": "clue1", "text": "Crushing chest pain", "importance": "critical", "asked": true},
                {"id": "clue2", "text": "Sweating", "importance": "helpful", "asked": false}
            ],
            "insight": {
                "summary": "Good focused interview.",
                "strengths": ["Asked about pain character", "Requested an ECG"],
                "improvements": ["Did not ask about sweating", "Missed risk factors"],
                "tip": "Always ask about radiation."
            },
            "user_diagnosis": "Myocardial infarction",
            "correct_diagnosis": "Acute myocardial infarction",
            "result": "correct"
        })
    }

    #[test]
    fn well_formed_reply_accepted_without_warnings() {
        let request = make_request(DiagnosisResult::Correct, 0);
        let validated = validate_feedback(&full_reply(), &request);
        assert!(validated.warnings.is_empty(), "{:?}", validated.warnings);
        let fb = validated.feedback;
        assert_eq!(fb.score, 85);
        assert_eq!(fb.clues.len(), 2);
        assert_eq!(fb.decision_tree.count_of(NodeType::Diagnosis), 1);
        assert!(fb.is_ai_generated());
        assert_eq!(fb.insight.tip, "Always ask about radiation.");
    }

    #[test]
    fn out_of_range_numbers_clamped_and_score_recomputed() {
        let mut reply = full_reply();
        reply["breakdown"]["correct_diagnosis"] = json!(55);
        reply["breakdown"]["key_questions"] = json!(-4);
        reply["breakdown"]["time_efficiency"] = json!("9.6");
        reply["score"] = json!(140);
        let request = make_request(DiagnosisResult::Correct, 2);
        let validated = validate_feedback(&reply, &request);
        let fb = &validated.feedback;
        assert_eq!(fb.breakdown.correct_diagnosis, 40);
        assert_eq!(fb.breakdown.key_questions, 0);
        assert_eq!(fb.breakdown.time_efficiency, 10);
        assert_eq!(fb.score, 40 + 0 + 15 + 10 + 7 - 6);
        assert_eq!(fb.hint_penalty, Some(6));
        assert!(validated.warnings.iter().any(|w| w.contains("clamped")));
        assert!(validated.warnings.iter().any(|w| w.contains("replaced")));
    }

    #[test]
    fn camel_case_keys_accepted() {
        let reply = json!({
            "breakdown": {
                "correctDiagnosis": 20,
                "keyQuestions": 10,
                "rightTests": 10,
                "timeEfficiency": 5,
                "ruledOutDifferentials": 5
            },
            "decisionTree": {"id": "root", "label": "Chest pain", "type": "symptom", "asked": true,
                "children": [{"id": "d", "label": "Angina", "type": "diagnosis", "asked": false}]}
        });
        let validated = validate_feedback(&reply, &make_request(DiagnosisResult::Partial, 0));
        assert_eq!(validated.feedback.breakdown.total(), 50);
        assert_eq!(validated.feedback.decision_tree.children[0].label, "Angina");
    }

    #[test]
    fn empty_object_yields_valid_defaults() {
        let request = make_request(DiagnosisResult::Wrong, 0);
        let validated = validate_feedback(&json!({}), &request);
        let fb = validated.feedback;
        assert_eq!(fb.score, 0);
        assert!(fb.clues.is_empty());
        assert_eq!(fb.decision_tree.id, "root");
        assert_eq!(fb.decision_tree.count_of(NodeType::Diagnosis), 1);
        assert!(!fb.decision_tree.children[0].asked);
        assert_eq!(fb.insight.summary, "Review your approach to this Cardiology case.");
        assert_eq!(fb.insight.strengths.len(), 2);
        assert_eq!(fb.insight.improvements.len(), 2);
        assert_eq!(fb.insight.tip, DEFAULT_TIP);
        assert!(validated.warnings.len() >= 4);
    }

    #[test]
    fn deep_tree_cut_at_max_depth() {
        let reply = json!({"decision_tree": {"id": "r", "label": "root", "children": [
            {"id": "a", "label": "a", "children": [
                {"id": "b", "label": "b", "children": [
                    {"id": "c", "label": "c", "children": [
                        {"id": "d", "label": "d", "children": [
                            {"id": "e", "label": "e"}
                        ]}
                    ]}
                ]}
            ]},
            {"id": "x", "label": "dx", "type": "diagnosis"}
        ]}});
        let validated = validate_feedback(&reply, &make_request(DiagnosisResult::Correct, 0));
        assert_eq!(validated.feedback.decision_tree.depth(), MAX_TREE_DEPTH);
        assert!(validated
            .warnings
            .iter()
            .any(|w| w.contains("2 nodes dropped")));
    }

    #[test]
    fn extra_diagnoses_demoted_and_ids_deduplicated() {
        let reply = json!({"decision_tree": {"id": "root", "label": "root", "type": "diagnosis", "children": [
            {"id": "n", "label": "Angina", "type": "diagnosis"},
            {"id": "n", "label": "MI", "type": "diagnosis"},
            {"id": "", "label": "Pericarditis", "type": "Ruled Out"}
        ]}});
        let validated = validate_feedback(&reply, &make_request(DiagnosisResult::Wrong, 0));
        let tree = &validated.feedback.decision_tree;
        assert_eq!(tree.node_type, NodeType::Symptom);
        assert_eq!(tree.count_of(NodeType::Diagnosis), 1);
        assert_eq!(tree.children[0].node_type, NodeType::Diagnosis);
        assert_eq!(tree.children[1].node_type, NodeType::RuledOut);
        assert_eq!(tree.children[2].node_type, NodeType::RuledOut);

        let mut ids = Vec::new();
        tree.visit(&mut |n| ids.push(n.id.clone()));
        assert_eq!(ids, vec!["root", "n", "n_2", "node"]);
    }

    #[test]
    fn long_labels_truncated() {
        let reply = json!({"decision_tree": {"id": "root", "label": "r".repeat(90), "children": [
            {"id": "diag", "label": "d".repeat(90), "type": "diagnosis"}
        ]}});
        let validated = validate_feedback(&reply, &make_request(DiagnosisResult::Correct, 0));
        let tree = &validated.feedback.decision_tree;
        assert_eq!(tree.label.chars().count(), ROOT_LABEL_MAX_CHARS);
        assert_eq!(tree.children[0].label.chars().count(), NODE_LABEL_MAX_CHARS);
    }

    #[test]
    fn clue_text_rewritten_to_case_entry() {
        let reply = json!({"clues": [
            {"text": "Patient denies chest trauma", "importance": "critical"},
            {"text": "Recent travel to Brazil"},
            {"text": "sweating at night", "asked": true},
            {"text": "fever", "importance": "minor"},
            {"text": "Crushing chest pain"}
        ]});
        let request = make_request(DiagnosisResult::Correct, 0);
        let validated = validate_feedback(&reply, &request);
        let fb = validated.feedback;
        for clue in &fb.clues {
            assert!(request.case.symptoms.contains(&clue.text), "{}", clue.text);
        }
        let texts: Vec<&str> = fb.clues.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Crushing chest pain", "Sweating", "Fever"]);
        assert_eq!(fb.clues[1].id, "clue3");
        assert!(fb.clues[1].asked);
        assert!(validated.warnings.iter().any(|w| w.contains("Rewrote 3 clues")));
        assert!(validated.warnings.iter().any(|w| w.contains("Dropped 2 clues")));
    }

    #[test]
    fn clues_capped_at_model_limit() {
        let mut request = make_request(DiagnosisResult::Correct, 0);
        let entries: Vec<String> = (0..14).map(|i| format!("finding{i}")).collect();
        request.case.symptoms = SymptomSets::new(entries.clone(), vec![], vec![]);

        let mut clues: Vec<Value> = entries
            .iter()
            .map(|e| json!({"text": e, "importance": "minor"}))
            .collect();
        clues.insert(0, json!({"text": "Recent travel to Brazil", "importance": "critical"}));
        clues.insert(1, json!({"text": "FINDING13", "importance": "CRITICAL", "asked": "true"}));

        let validated = validate_feedback(&json!({"clues": clues}), &request);
        let fb = validated.feedback;
        assert_eq!(fb.clues.len(), MAX_MODEL_CLUES);
        assert_eq!(fb.clues[0].text, "finding13");
        assert_eq!(fb.clues[0].id, "clue2");
        assert_eq!(fb.clues[0].importance, Importance::Critical);
        assert!(fb.clues[0].asked);
        assert!(fb.clues.iter().all(|c| request.case.symptoms.contains(&c.text)));
        assert!(validated.warnings.iter().any(|w| w.contains("capped")));
    }

    #[test]
    fn diagnosis_asked_follows_graded_result() {
        let reply = json!({"decision_tree": {"id": "root", "label": "Chest pain", "children": [
            {"id": "diag", "label": "Pericarditis", "type": "diagnosis", "asked": true}
        ]}});
        let validated = validate_feedback(&reply, &make_request(DiagnosisResult::Wrong, 0));
        let diag = &validated.feedback.decision_tree.children[0];
        assert_eq!(diag.node_type, NodeType::Diagnosis);
        assert!(!diag.asked);
        assert!(validated.warnings.iter().any(|w| w.contains("asked flag")));

        let validated = validate_feedback(&reply, &make_request(DiagnosisResult::Correct, 0));
        assert!(validated.feedback.decision_tree.children[0].asked);
        assert!(!validated.warnings.iter().any(|w| w.contains("asked flag")));
    }

    #[test]
    fn root_fan_out_capped_keeping_diagnosis() {
        let branches: Vec<Value> = (0..10)
            .map(|i| json!({"id": format!("b{i}"), "label": format!("branch {i}"), "type": "symptom"}))
            .collect();
        let validated = validate_feedback(
            &json!({"decision_tree": {"id": "root", "label": "Chest pain", "children": branches}}),
            &make_request(DiagnosisResult::Correct, 0),
        );
        let tree = &validated.feedback.decision_tree;
        assert_eq!(tree.children.len(), MAX_ROOT_CHILDREN);
        assert_eq!(tree.count_of(NodeType::Diagnosis), 1);
        assert_eq!(tree.children[0].id, "b0");
        assert_eq!(tree.children[MAX_ROOT_CHILDREN - 1].node_type, NodeType::Diagnosis);
        assert!(validated.warnings.iter().any(|w| w.contains("capped to")));

        let mut branches: Vec<Value> = (0..9)
            .map(|i| json!({"id": format!("b{i}"), "label": format!("branch {i}")}))
            .collect();
        branches.insert(
            7,
            json!({"id": "t", "label": "ECG", "type": "test", "children": [
                {"id": "diag", "label": "MI", "type": "diagnosis"}
            ]}),
        );
        let validated = validate_feedback(
            &json!({"decision_tree": {"id": "root", "label": "Chest pain", "children": branches}}),
            &make_request(DiagnosisResult::Correct, 0),
        );
        let tree = &validated.feedback.decision_tree;
        let ids: Vec<&str> = tree.children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b0", "b1", "b2", "b3", "b4", "t"]);
        assert_eq!(tree.count_of(NodeType::Diagnosis), 1);
    }

    #[test]
    fn insight_lists_padded_and_truncated() {
        let reply = json!({"insight": {
            "summary": "ok",
            "strengths": ["one"],
            "improvements": ["a", "b", "c", "d", "e"],
            "tip": "t"
        }});
        let fb = validate_feedback(&reply, &make_request(DiagnosisResult::Partial, 0)).feedback;
        assert_eq!(fb.insight.strengths, vec!["one", STRENGTH_PADDING[0]]);
        assert_eq!(fb.insight.improvements, vec!["a", "b", "c"]);
    }

    #[test]
    fn diagnoses_and_result_come_from_request() {
        let mut reply = full_reply();
        reply["user_diagnosis"] = json!("something else");
        reply["result"] = json!("wrong");
        let request = make_request(DiagnosisResult::Correct, 0);
        let validated = validate_feedback(&reply, &request);
        assert_eq!(validated.feedback.user_diagnosis, "Myocardial infarction");
        assert_eq!(validated.feedback.correct_diagnosis, "Acute myocardial infarction");
        assert_eq!(validated.feedback.result, DiagnosisResult::Correct);
        assert!(validated.warnings.iter().any(|w| w.contains("graded result")));
    }

    #[test]
    fn wrong_types_never_panic() {
        let request = make_request(DiagnosisResult::Wrong, 1);
        for reply in [
            json!({"breakdown": [1, 2, 3], "decision_tree": "tree", "clues": {"a": 1}, "insight": 7}),
            json!({"breakdown": {"correct_diagnosis": null}, "clues": [1, "x", null]}),
            json!({"decision_tree": {"children": [1, {"children": "no"}]}}),
        ] {
            let fb = validate_feedback(&reply, &request).feedback;
            assert!(fb.score <= 100);
            assert_eq!(fb.decision_tree.count_of(NodeType::Diagnosis), 1);
            assert!((2..=3).contains(&fb.insight.strengths.len()));
        }
    }
}

//! Deterministic feedback pipeline.
//!
//! Analyzer → tree builder → clue ranker → scorer → insight composer, all
//! pure functions of the request. Used whenever the generated path is
//! unavailable or unusable, and fully valid on its own.

use crate::analysis::{complete_case, ConversationAnalyzer, KeywordAnalyzer};
use crate::models::{FeedbackRequest, FeedbackResult, FeedbackSource};

use super::clues::rank_clues;
use super::decision_tree::build_decision_tree;
use super::insight::compose_insight;
use super::scoring::score_interview;

/// Build feedback without the model, using the keyword analyzer.
pub fn deterministic_feedback(request: &FeedbackRequest, reason: &str) -> FeedbackResult {
    deterministic_feedback_with(&KeywordAnalyzer::new(), request, reason)
}

pub fn deterministic_feedback_with(
    analyzer: &dyn ConversationAnalyzer,
    request: &FeedbackRequest,
    reason: &str,
) -> FeedbackResult {
    let case = complete_case(request.case.clone());
    let analysis = analyzer.analyze(&case, &request.conversation);

    tracing::info!(
        case_id = %case.case_id,
        result = %request.result,
        student_turns = analysis.student_turns,
        reason,
        "Building deterministic feedback"
    );

    let decision_tree =
        build_decision_tree(&case, &analysis, &request.user_diagnosis, request.result);
    let clues = rank_clues(&case, &analysis);
    let score = score_interview(request.result, analysis.student_turns, request.hints_used);
    let insight = compose_insight(&case, &analysis, &request.user_diagnosis, request.result);

    FeedbackResult {
        score: score.total,
        breakdown: score.breakdown,
        decision_tree,
        clues,
        insight,
        user_diagnosis: request.user_diagnosis.clone(),
        correct_diagnosis: case.expected_diagnosis.clone(),
        result: request.result,
        hints_used: Some(score.hints_used),
        hint_penalty: Some(score.hint_penalty),
        source: FeedbackSource::reconstructed(reason),
    }
}

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::parser::parse_feedback_json;
use super::prompt::{build_feedback_prompt, FEEDBACK_SYSTEM_PROMPT};
use super::validation::validate_feedback;
use super::ReconcileError;
use crate::analysis::complete_case;
use crate::config::FeedbackConfig;
use crate::feedback::deterministic_feedback;
use crate::llm::{AnthropicClient, LlmClient, LlmError};
use crate::models::{FeedbackRequest, FeedbackResult};

/// Rate-limit signals get exactly this many extra model calls.
const MAX_RATE_LIMIT_RETRIES: usize = 1;

/// Reason recorded when no model client could be built.
const NO_CLIENT_REASON: &str = "No model client configured";

/// Stages of one feedback submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    AwaitModel,
    ParseJson,
    Validate,
    Accept,
    FallbackDeterministic,
}

impl fmt::Display for ReconcileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AwaitModel => "await_model",
            Self::ParseJson => "parse_json",
            Self::Validate => "validate",
            Self::Accept => "accept",
            Self::FallbackDeterministic => "fallback_deterministic",
        };
        f.write_str(name)
    }
}

/// Produces feedback for a submission: the model's when it is usable, the
/// deterministic pipeline's otherwise. Never returns an error.
pub struct FeedbackReconciler {
    llm: Option<Arc<dyn LlmClient>>,
    config: FeedbackConfig,
}

impl FeedbackReconciler {
    pub fn new(llm: Box<dyn LlmClient>, config: FeedbackConfig) -> Self {
        Self {
            llm: Some(Arc::from(llm)),
            config,
        }
    }

    /// Reconciler that always takes the deterministic path.
    pub fn offline(config: FeedbackConfig) -> Self {
        Self { llm: None, config }
    }

    /// Hosted client when an API key is configured, offline otherwise.
    pub fn from_config(config: FeedbackConfig) -> Self {
        if !config.has_api_key() {
            tracing::info!("No API key configured, feedback will be deterministic");
            return Self::offline(config);
        }
        match AnthropicClient::from_config(&config) {
            Ok(client) => Self::new(Box::new(client), config),
            Err(e) => {
                tracing::info!(error = %e, "Model client unavailable, feedback will be deterministic");
                Self::offline(config)
            }
        }
    }

    pub fn config(&self) -> &FeedbackConfig {
        &self.config
    }

    /// Run the state machine for one submission.
    pub fn generate_feedback(&self, request: &FeedbackRequest) -> FeedbackResult {
        let request = normalize(request);
        let _span = tracing::info_span!(
            "generate_feedback",
            case_id = %request.case.case_id,
            result = %request.result,
        )
        .entered();

        let Some(llm) = self.llm.as_deref() else {
            return fallback(&request, NO_CLIENT_REASON);
        };

        transition(ReconcileState::AwaitModel);
        let prompt = build_feedback_prompt(
            &request.case,
            &request.conversation,
            &request.user_diagnosis,
            request.result,
        );
        let response = match call_with_retry(llm, &self.config.model, &prompt, &self.config) {
            Ok(response) => response,
            Err(e) => return fallback(&request, &ReconcileError::from(e).to_string()),
        };

        self.reconcile_response(&request, &response)
    }

    /// Async entry point: the blocking model call runs on the blocking pool
    /// under a deadline. Dropping the future abandons the call; its result
    /// is discarded and nothing is written.
    pub async fn generate_feedback_async(&self, request: &FeedbackRequest) -> FeedbackResult {
        let request = normalize(request);

        let Some(llm) = self.llm.clone() else {
            return fallback(&request, NO_CLIENT_REASON);
        };

        transition(ReconcileState::AwaitModel);
        let prompt = build_feedback_prompt(
            &request.case,
            &request.conversation,
            &request.user_diagnosis,
            request.result,
        );
        let worker = {
            let model = self.config.model.clone();
            let config = self.config.clone();
            tokio::task::spawn_blocking(move || {
                call_with_retry(llm.as_ref(), &model, &prompt, &config)
            })
        };

        let deadline = self.deadline();
        let response = match tokio::time::timeout(deadline, worker).await {
            Ok(Ok(Ok(response))) => response,
            Ok(Ok(Err(e))) => return fallback(&request, &ReconcileError::from(e).to_string()),
            Ok(Err(join_error)) => {
                let reason = ReconcileError::MalformedResponse(format!(
                    "model task failed: {join_error}"
                ));
                return fallback(&request, &reason.to_string());
            }
            Err(_) => {
                let reason = ReconcileError::Deadline(deadline.as_secs());
                return fallback(&request, &reason.to_string());
            }
        };

        self.reconcile_response(&request, &response)
    }

    /// ParseJson → Validate → Accept, or fallback on a parse failure.
    fn reconcile_response(&self, request: &FeedbackRequest, response: &str) -> FeedbackResult {
        transition(ReconcileState::ParseJson);
        let raw = match parse_feedback_json(response) {
            Ok(raw) => raw,
            Err(e) => return fallback(request, &e.to_string()),
        };

        transition(ReconcileState::Validate);
        let validated = validate_feedback(&raw, request);
        if !validated.warnings.is_empty() {
            tracing::warn!(
                case_id = %request.case.case_id,
                warning_count = validated.warnings.len(),
                warnings = ?validated.warnings,
                "Model feedback repaired during validation"
            );
        }

        transition(ReconcileState::Accept);
        validated.feedback
    }

    /// Whole-call budget: HTTP timeout per attempt plus the retry back-off.
    fn deadline(&self) -> Duration {
        let attempts = 1 + MAX_RATE_LIMIT_RETRIES as u64;
        Duration::from_secs(self.config.timeout_secs.saturating_mul(attempts))
            + Duration::from_millis(self.config.rate_limit_delay_ms(None))
    }
}

/// One model call plus at most one retry on a rate-limit signal.
fn call_with_retry(
    llm: &dyn LlmClient,
    model: &str,
    prompt: &str,
    config: &FeedbackConfig,
) -> Result<String, LlmError> {
    let mut attempt = 0;
    loop {
        match llm.generate(model, prompt, FEEDBACK_SYSTEM_PROMPT) {
            Err(e) if e.is_rate_limited() && attempt < MAX_RATE_LIMIT_RETRIES => {
                attempt += 1;
                let delay_ms = config.rate_limit_delay_ms(e.retry_after_secs());
                tracing::warn!(
                    attempt,
                    delay_ms,
                    error = %e,
                    "Model rate limited, retrying once"
                );
                std::thread::sleep(Duration::from_millis(delay_ms));
            }
            other => return other,
        }
    }
}

/// Fill symptom lists from the narrative when the case has none, so prompt,
/// validation and fallback all see the same case.
fn normalize(request: &FeedbackRequest) -> FeedbackRequest {
    FeedbackRequest {
        case: complete_case(request.case.clone()),
        ..request.clone()
    }
}

fn transition(state: ReconcileState) {
    tracing::debug!(%state, "Feedback state transition");
}

fn fallback(request: &FeedbackRequest, reason: &str) -> FeedbackResult {
    tracing::warn!(
        state = %ReconcileState::FallbackDeterministic,
        case_id = %request.case.case_id,
        reason,
        "Falling back to deterministic feedback"
    );
    deterministic_feedback(request, reason)
}

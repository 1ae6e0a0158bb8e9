//! Model-generated feedback with a deterministic safety net.
//!
//! ```text
//! AwaitModel → ParseJson → Validate → Accept
//!      │            │
//!      └────────────┴──→ FallbackDeterministic
//! ```

pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod validation;

pub use orchestrator::{FeedbackReconciler, ReconcileState};
pub use parser::{extract_json_object, parse_feedback_json};
pub use prompt::{build_feedback_prompt, FEEDBACK_SYSTEM_PROMPT};
pub use validation::{validate_feedback, ValidatedFeedback};

use thiserror::Error;

use crate::llm::LlmError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("Model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Model call exceeded the {0}s deadline")]
    Deadline(u64),
}

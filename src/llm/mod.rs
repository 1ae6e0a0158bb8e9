//! Generative model clients.
//!
//! The reconciler only sees the `LlmClient` trait, so tests swap in the mock
//! and nothing outside `anthropic` touches HTTP.

pub mod anthropic;
pub mod mock;

pub use anthropic::AnthropicClient;
pub use mock::MockLlmClient;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("Model service is not reachable at {0}")]
    Connection(String),

    #[error("Model service returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Model service rate limit reached")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("No API key configured for the model service")]
    MissingApiKey,
}

impl LlmError {
    /// Rate-limit signals, whether typed or as a bare 429.
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited { .. } | LlmError::Status { status: 429, .. }
        )
    }

    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            LlmError::RateLimited { retry_after_secs } => *retry_after_secs,
            _ => None,
        }
    }
}

/// Text-in, text-out model abstraction (allows mocking).
pub trait LlmClient: Send + Sync {
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, LlmError>;
}

//! Explainable feedback for simulated diagnostic interviews.
//!
//! ```text
//! FeedbackRequest ─→ reconcile (model reply → parse → validate)
//!                       │
//!                       └─→ feedback (deterministic: tree, clues, score, insight)
//!                              ▲
//!                      analysis (case narrative, transcript, grading)
//! ```

pub mod analysis;
pub mod config;
pub mod feedback;
pub mod llm;
pub mod models;
pub mod reconcile;

pub use config::FeedbackConfig;
pub use feedback::deterministic_feedback;
pub use models::{FeedbackRequest, FeedbackResult};
pub use reconcile::FeedbackReconciler;

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` wins over the crate default;
/// a subscriber installed earlier by the host is left in place.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}

//! Deterministic feedback construction.
//!
//! Each stage is a pure function; `fallback` wires them together into a
//! complete `FeedbackResult`.

pub mod clues;
pub mod decision_tree;
pub mod fallback;
pub mod insight;
pub mod scoring;

pub use clues::{rank_clues, MAX_FALLBACK_CLUES};
pub use decision_tree::build_decision_tree;
pub use fallback::{deterministic_feedback, deterministic_feedback_with};
pub use insight::compose_insight;
pub use scoring::{hint_penalty, score_interview, Score};

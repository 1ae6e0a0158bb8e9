//! Lexical analysis of cases and interview transcripts.
//!
//! Everything here is rule-based and side-effect free:
//! ```text
//! vocabulary (trigger tables) → case_features (narrative → symptom lists)
//!                             → conversation (transcript → asked map)
//! grading (submitted diagnosis → correct / partial / wrong)
//! ```

pub mod case_features;
pub mod conversation;
pub mod grading;
pub mod vocabulary;

pub use case_features::{
    complete_case, difficulty_label, extract_case_features, infer_demographics,
    infer_specialty, CaseFeatures, Demographics,
};
pub use conversation::{
    ConversationAnalysis, ConversationAnalyzer, KeywordAnalyzer, SymptomCoverage,
    MAX_TRACKED_SYMPTOMS,
};
pub use grading::grade_diagnosis;
pub use vocabulary::match_topics;

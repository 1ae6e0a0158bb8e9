//! Conversation analyzer: which symptoms and interview topics the student
//! raised, and how many turns it took.
//!
//! Purely lexical and deterministic. Identical input always yields identical
//! output; no model calls are made here.

use std::collections::BTreeMap;

use serde::Serialize;

use super::vocabulary::{contains_any, EXAM_TRIGGERS, HISTORY_TRIGGERS, INTERVIEW_TOPICS};
use crate::models::{student_turns, CaseContext, ConversationMessage};

/// Only the first presenting symptoms (in case order) are tracked.
pub const MAX_TRACKED_SYMPTOMS: usize = 5;

/// Words shorter than this carry no signal ("the", "of", "left").
const MIN_SIGNIFICANT_WORD_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymptomCoverage {
    pub symptom: String,
    pub asked: bool,
}

/// Output of analyzing one transcript against one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationAnalysis {
    /// Tracked presenting symptoms, in case order.
    pub symptoms: Vec<SymptomCoverage>,
    /// Every interview topic, mapped to whether the student raised it.
    pub topics: BTreeMap<&'static str, bool>,
    pub exam_requested: bool,
    pub history_reviewed: bool,
    pub student_turns: usize,
    /// Lower-cased student turns joined with single spaces.
    #[serde(skip)]
    pub student_text: String,
}

impl ConversationAnalysis {
    pub fn topic(&self, name: &str) -> bool {
        self.topics.get(name).copied().unwrap_or(false)
    }

    pub fn asked_symptoms(&self) -> impl Iterator<Item = &str> {
        self.symptoms
            .iter()
            .filter(|s| s.asked)
            .map(|s| s.symptom.as_str())
    }

    pub fn missed_symptoms(&self) -> impl Iterator<Item = &str> {
        self.symptoms
            .iter()
            .filter(|s| !s.asked)
            .map(|s| s.symptom.as_str())
    }

    /// Whether the student's questions share a significant word with `text`.
    pub fn mentions(&self, text: &str) -> bool {
        shares_significant_word(&self.student_text, text)
    }
}

/// Analyzes a completed interview transcript.
pub trait ConversationAnalyzer: Send + Sync {
    fn analyze(
        &self,
        case: &CaseContext,
        conversation: &[ConversationMessage],
    ) -> ConversationAnalysis;
}

/// Keyword-driven analyzer over the static vocabularies.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordAnalyzer;

impl KeywordAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl ConversationAnalyzer for KeywordAnalyzer {
    fn analyze(
        &self,
        case: &CaseContext,
        conversation: &[ConversationMessage],
    ) -> ConversationAnalysis {
        let turns = student_turns(conversation);
        let student_text = turns.join(" ");

        let symptoms = case
            .presenting()
            .iter()
            .take(MAX_TRACKED_SYMPTOMS)
            .map(|symptom| SymptomCoverage {
                symptom: symptom.clone(),
                asked: turns.iter().any(|t| shares_significant_word(t, symptom)),
            })
            .collect();

        let topics = INTERVIEW_TOPICS
            .iter()
            .map(|(topic, triggers)| (*topic, contains_any(&student_text, triggers)))
            .collect();

        ConversationAnalysis {
            symptoms,
            topics,
            exam_requested: contains_any(&student_text, EXAM_TRIGGERS),
            history_reviewed: contains_any(&student_text, HISTORY_TRIGGERS),
            student_turns: turns.len(),
            student_text,
        }
    }
}

/// Lower-cased words of `text` longer than three characters, stripped of
/// surrounding punctuation.
pub fn significant_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| w.chars().count() >= MIN_SIGNIFICANT_WORD_LEN)
        .collect()
}

/// `haystack` must already be lower-cased.
fn shares_significant_word(haystack: &str, text: &str) -> bool {
    significant_words(text)
        .iter()
        .any(|w| haystack.contains(w.as_str()))
}

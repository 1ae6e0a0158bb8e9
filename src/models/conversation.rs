use chrono::NaiveDateTime;
use serde::{de, Deserialize, Deserializer, Serialize};

use super::enums::Speaker;

/// One turn of the interview transcript. Position in the transcript is the
/// only ordering that matters; the timestamp is informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    #[serde(alias = "sender", deserialize_with = "speaker_from_sender")]
    pub speaker: Speaker,
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
}

/// Accepts the transcript store's sender names as well as the speaker names.
fn speaker_from_sender<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Speaker, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Speaker::from_sender(&raw).ok_or_else(|| de::Error::custom(format!("unknown sender '{raw}'")))
}

impl ConversationMessage {
    pub fn student(text: &str) -> Self {
        Self {
            speaker: Speaker::Student,
            text: text.to_string(),
            timestamp: None,
        }
    }

    pub fn patient(text: &str) -> Self {
        Self {
            speaker: Speaker::Patient,
            text: text.to_string(),
            timestamp: None,
        }
    }

    pub fn is_student(&self) -> bool {
        self.speaker == Speaker::Student
    }
}

/// Lower-cased student turns, in transcript order.
pub fn student_turns(conversation: &[ConversationMessage]) -> Vec<String> {
    conversation
        .iter()
        .filter(|m| m.is_student())
        .map(|m| m.text.to_lowercase())
        .collect()
}

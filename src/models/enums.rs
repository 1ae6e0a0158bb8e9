use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Speaker {
    Student => "student",
    Patient => "patient",
});

str_enum!(NodeType {
    Symptom => "symptom",
    Test => "test",
    RuledOut => "ruled_out",
    Diagnosis => "diagnosis",
});

str_enum!(Importance {
    Critical => "critical",
    Helpful => "helpful",
    Minor => "minor",
});

str_enum!(DiagnosisResult {
    Correct => "correct",
    Partial => "partial",
    Wrong => "wrong",
});

impl Speaker {
    /// Lenient parse accepting the transcript store's sender names
    /// ("user" for the student, "ai"/"assistant" for the simulated patient).
    pub fn from_sender(sender: &str) -> Option<Self> {
        match sender.trim().to_lowercase().as_str() {
            "student" | "user" => Some(Self::Student),
            "patient" | "ai" | "assistant" => Some(Self::Patient),
            _ => None,
        }
    }
}

impl NodeType {
    /// Unknown node types coming back from the model are treated as symptoms.
    /// Accepts "ruled-out" and "ruled out" spellings.
    pub fn parse_lenient(s: &str) -> Self {
        s.trim()
            .to_lowercase()
            .replace(['-', ' '], "_")
            .parse()
            .unwrap_or(Self::Symptom)
    }
}

impl Importance {
    pub fn parse_lenient(s: &str) -> Self {
        s.trim().to_lowercase().parse().unwrap_or(Self::Helpful)
    }
}

impl DiagnosisResult {
    pub fn parse_lenient(s: &str) -> Option<Self> {
        s.trim().to_lowercase().parse().ok()
    }
}

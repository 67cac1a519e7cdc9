use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DISTRACTOR_COUNT: usize = 3;

/// Structured output of the elaboration stage.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct McqCandidate {
    /// The question text.
    pub stem: String,
    /// The correct answer.
    pub key: String,
    /// Exactly three plausible but incorrect answers.
    pub distractors: Vec<String>,
}

impl McqCandidate {
    pub fn new(stem: &str, key: &str, distractors: &[&str]) -> Self {
        McqCandidate {
            stem: stem.to_string(),
            key: key.to_string(),
            distractors: distractors.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// Where the context behind a question came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Cluster,
    Retriever,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::Cluster => write!(f, "cluster"),
            Provenance::Retriever => write!(f, "retriever"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provenance_serializes_lowercase() {
        let json = serde_json::to_string(&Provenance::Retriever).expect("should serialize");
        assert_eq!(json, "\"retriever\"");
    }
}

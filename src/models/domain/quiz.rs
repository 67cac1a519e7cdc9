use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::mcq::Provenance;

/// A persisted multiple-choice question belonging to one course material.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Quiz {
    pub id: String,
    pub material_id: String,
    pub question: String,
    pub options: [String; 4], // labelled A-D by position
    pub correct_option: OptionLetter,
    pub source: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Quiz {
    pub fn new(
        material_id: &str,
        question: &str,
        options: [String; 4],
        correct_option: OptionLetter,
        source: Provenance,
    ) -> Self {
        Quiz {
            id: Uuid::new_v4().to_string(),
            material_id: material_id.to_string(),
            question: question.to_string(),
            options,
            correct_option,
            source,
            created_at: Some(Utc::now()),
        }
    }

    pub fn correct_answer(&self) -> &str {
        &self.options[self.correct_option.index()]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
}

impl OptionLetter {
    pub const ALL: [OptionLetter; 4] = [
        OptionLetter::A,
        OptionLetter::B,
        OptionLetter::C,
        OptionLetter::D,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        match self {
            OptionLetter::A => 0,
            OptionLetter::B => 1,
            OptionLetter::C => 2,
            OptionLetter::D => 3,
        }
    }
}

impl std::fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionLetter::A => write!(f, "A"),
            OptionLetter::B => write!(f, "B"),
            OptionLetter::C => write!(f, "C"),
            OptionLetter::D => write!(f, "D"),
        }
    }
}

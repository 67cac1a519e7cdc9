use serde::{Deserialize, Serialize};

pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// A segmented unit of source document text.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Passage {
    pub text: String,
    pub source: String,      // path of the document this passage was cut from
    pub chunk_index: usize,  // ordinal position within the source document
    pub language: String,    // ISO 639-3 code or "unknown"
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>, // assigned once per pipeline run
}

impl Passage {
    pub fn new(text: &str, source: &str, chunk_index: usize) -> Self {
        Passage {
            text: text.to_string(),
            source: source.to_string(),
            chunk_index,
            language: UNKNOWN_LANGUAGE.to_string(),
            embedding: None,
        }
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_passage_has_unknown_language_and_no_embedding() {
        let passage = Passage::new("The stack is a LIFO structure.", "notes.pdf", 0);

        assert_eq!(passage.language, UNKNOWN_LANGUAGE);
        assert!(passage.embedding.is_none());
        assert_eq!(passage.word_count(), 6);
    }

    #[test]
    fn embedding_is_not_serialized() {
        let passage = Passage::new("text", "notes.pdf", 3).with_embedding(vec![1.0, 0.0]);
        let json = serde_json::to_value(&passage).expect("passage should serialize");

        assert!(json.get("embedding").is_none());
        assert_eq!(json["chunk_index"], 3);
    }
}

use crate::models::domain::{Material, OptionLetter, Passage, Provenance, Quiz};

#[cfg(test)]
pub mod fixtures {
    use super::*;

    pub const STACK_TEXT: &str = "A stack is a linear data structure that follows the last in first out principle where push adds an element on top and pop removes the most recently added element from the top of the stack.";
    pub const QUEUE_TEXT: &str = "A queue is a linear data structure that follows the first in first out principle where enqueue adds an element at the rear and dequeue removes the oldest element from the front of the queue.";

    /// Creates a passage carrying a unit-length embedding
    pub fn embedded_passage(text: &str, chunk_index: usize, embedding: Vec<f32>) -> Passage {
        Passage::new(text, "notes.pdf", chunk_index)
            .with_language("eng")
            .with_embedding(embedding)
    }

    /// Creates a standard test quiz with the answer under `B`
    pub fn test_quiz(material_id: &str) -> Quiz {
        Quiz::new(
            material_id,
            "Which principle does a stack follow?",
            [
                "First in first out".to_string(),
                "Last in first out".to_string(),
                "Random access".to_string(),
                "Priority order".to_string(),
            ],
            OptionLetter::B,
            Provenance::Cluster,
        )
    }

    pub fn test_material(id: &str) -> Material {
        Material::new(id, &format!("/var/uploads/{}.pdf", id))
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::{body::to_bytes, http::StatusCode, HttpResponse};

    /// Splits a response into its status and JSON body
    pub async fn read_json(response: HttpResponse) -> (StatusCode, serde_json::Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.expect("response body");
        let json = serde_json::from_slice(&bytes).expect("json body");
        (status, json)
    }

    /// Asserts the `{"status": "error", "message": ...}` envelope with the given HTTP status
    pub fn assert_error_envelope(
        status: StatusCode,
        json: &serde_json::Value,
        expected: StatusCode,
    ) {
        assert_eq!(status, expected, "unexpected status for {}", json);
        assert_eq!(json["status"], "error");
        assert!(json["message"].is_string(), "missing message in {}", json);
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_fixture_quiz_answer() {
        let quiz = test_quiz("mat-1");
        assert_eq!(quiz.correct_answer(), "Last in first out");
        assert_eq!(quiz.material_id, "mat-1");
    }

    #[test]
    fn test_fixture_passages_are_long_enough() {
        let passage = embedded_passage(STACK_TEXT, 0, vec![1.0, 0.0]);
        assert!(passage.word_count() >= 20);
        assert!(embedded_passage(QUEUE_TEXT, 1, vec![0.0, 1.0]).word_count() >= 20);
    }
}

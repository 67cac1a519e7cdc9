use serde::Deserialize;
use validator::Validate;

/// Form body of `POST /generate-mcqs/`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateMcqsForm {
    #[validate(length(min = 1, max = 128))]
    pub material_id: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AskQuestionRequest {
    #[validate(length(min = 1, max = 128))]
    pub material_id: String,

    #[validate(length(min = 1, max = 2000, message = "Question must be 1-2000 characters"))]
    pub question: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_material_id_fails_validation() {
        let form = GenerateMcqsForm {
            material_id: String::new(),
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn ask_request_requires_question() {
        let request = AskQuestionRequest {
            material_id: "mat-1".to_string(),
            question: String::new(),
        };
        assert!(request.validate().is_err());

        let request = AskQuestionRequest {
            question: "What is a stack?".to_string(),
            ..request
        };
        assert!(request.validate().is_ok());
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::{OptionLetter, Provenance, Quiz};
use crate::services::ask_service::{AnswerSource, AskAnswer};
use crate::services::generation_service::TokenUsage;
use crate::services::quiz_generation_service::GenerationSummary;

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// Body of `POST /generate-mcqs/`. Failures keep a 2xx-style shape with
/// `status: "error"` so the upload frontend can show the message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateMcqsResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcqs_generated: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_clusters: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_fallback: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
}

impl GenerateMcqsResponse {
    pub fn from_summary(summary: &GenerationSummary) -> Self {
        if summary.quizzes_generated == 0 {
            return Self {
                status: STATUS_ERROR,
                mcqs_generated: Some(0),
                message: Some("No questions could be generated from this material.".to_string()),
                from_clusters: None,
                from_fallback: None,
                tokens_used: Some(summary.tokens_used.total_tokens),
            };
        }

        Self {
            status: STATUS_SUCCESS,
            mcqs_generated: Some(summary.quizzes_generated),
            message: None,
            from_clusters: Some(summary.from_clusters),
            from_fallback: Some(summary.from_fallback),
            tokens_used: Some(summary.tokens_used.total_tokens),
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            status: STATUS_ERROR,
            mcqs_generated: None,
            message: Some(message.to_string()),
            from_clusters: None,
            from_fallback: None,
            tokens_used: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizDto {
    pub id: String,
    pub material_id: String,
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_option: OptionLetter,
    pub source: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Quiz> for QuizDto {
    fn from(quiz: Quiz) -> Self {
        let [option_a, option_b, option_c, option_d] = quiz.options;
        QuizDto {
            id: quiz.id,
            material_id: quiz.material_id,
            question: quiz.question,
            option_a,
            option_b,
            option_c,
            option_d,
            correct_option: quiz.correct_option,
            source: quiz.source,
            created_at: quiz.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuizListResponse {
    pub material_id: String,
    pub total: usize,
    pub quizzes: Vec<QuizDto>,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub rewritten_query: String,
    pub sources: Vec<AnswerSource>,
    pub tokens_used: TokenUsage,
}

impl From<AskAnswer> for AnswerResponse {
    fn from(answer: AskAnswer) -> Self {
        AnswerResponse {
            answer: answer.answer,
            rewritten_query: answer.rewritten_query,
            sources: answer.sources,
            tokens_used: answer.usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_response_reports_count() {
        let summary = GenerationSummary {
            quizzes_generated: 7,
            from_clusters: 5,
            from_fallback: 2,
            tokens_used: TokenUsage::new(100, 50),
        };
        let json = serde_json::to_value(GenerateMcqsResponse::from_summary(&summary))
            .expect("serializes");

        assert_eq!(json["status"], "success");
        assert_eq!(json["mcqs_generated"], 7);
        assert!(json.get("message").is_none());
    }

    #[test]
    fn zero_questions_is_an_error_status() {
        let json = serde_json::to_value(GenerateMcqsResponse::from_summary(
            &GenerationSummary::default(),
        ))
        .expect("serializes");

        assert_eq!(json["status"], "error");
        assert_eq!(json["mcqs_generated"], 0);
        assert!(json["message"].is_string());
    }

    #[test]
    fn failure_has_message_only() {
        let response = GenerateMcqsResponse::failure("Material file not found at x.");
        let json = serde_json::to_value(response).expect("serializes");

        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Material file not found at x.");
        assert!(json.get("mcqs_generated").is_none());
    }

    #[test]
    fn quiz_dto_flattens_options() {
        let quiz = Quiz::new(
            "mat-1",
            "Q",
            ["w", "x", "y", "z"].map(String::from),
            OptionLetter::C,
            Provenance::Cluster,
        );
        let dto = QuizDto::from(quiz);

        assert_eq!(dto.option_a, "w");
        assert_eq!(dto.option_d, "z");
        assert_eq!(dto.correct_option, OptionLetter::C);
    }
}

use std::sync::Arc;

use actix_web::{get, post, web, HttpResponse, ResponseError};
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::{AppError, AppResult},
    models::dto::{
        request::GenerateMcqsForm,
        response::{GenerateMcqsResponse, QuizDto, QuizListResponse},
    },
    services::quiz_generation_service::GenerationSummary,
};

#[post("/generate-mcqs/")]
async fn generate_mcqs(
    state: web::Data<Arc<AppState>>,
    form: web::Form<GenerateMcqsForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    form.validate()?;

    let result = state
        .quiz_generation_service
        .generate_for_material(&form.material_id)
        .await;
    generation_response(result)
}

/// Maps a generation run onto the upload frontend's status envelope.
/// Missing files and unreadable documents are reported in that envelope;
/// everything else goes through the regular error response.
pub fn generation_response(result: AppResult<GenerationSummary>) -> Result<HttpResponse, AppError> {
    let err = match result {
        Ok(summary) => {
            return Ok(HttpResponse::Ok().json(GenerateMcqsResponse::from_summary(&summary)))
        }
        Err(err) => err,
    };

    let message = match &err {
        AppError::NotFound(message) | AppError::DocumentError(message) => message.clone(),
        _ => return Err(err),
    };
    log::warn!("Question generation failed: {}", err);
    Ok(HttpResponse::build(err.status_code()).json(GenerateMcqsResponse::failure(&message)))
}

#[get("/api/materials/{material_id}/quizzes")]
async fn list_material_quizzes(
    state: web::Data<Arc<AppState>>,
    material_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let material_id = material_id.into_inner();
    let quizzes = state.quiz_service.list_for_material(&material_id).await?;

    Ok(HttpResponse::Ok().json(QuizListResponse {
        total: quizzes.len(),
        quizzes: quizzes.into_iter().map(QuizDto::from).collect(),
        material_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::generation_service::TokenUsage;
    use crate::test_utils::test_helpers::{assert_error_envelope, read_json};
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn test_success_envelope() {
        let response = generation_response(Ok(GenerationSummary {
            quizzes_generated: 3,
            from_clusters: 3,
            from_fallback: 0,
            tokens_used: TokenUsage::new(30, 12),
        }))
        .expect("response");

        let (status, json) = read_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "success");
        assert_eq!(json["mcqs_generated"], 3);
    }

    #[actix_web::test]
    async fn test_missing_file_is_404_envelope() {
        let response = generation_response(Err(AppError::NotFound(
            "Material file not found at uploads/x.pdf.".to_string(),
        )))
        .expect("response");

        let (status, json) = read_json(response).await;
        assert_error_envelope(status, &json, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Material file not found at uploads/x.pdf.");
    }

    #[actix_web::test]
    async fn test_document_error_is_422_envelope() {
        let response = generation_response(Err(AppError::DocumentError(
            "unsupported file type".to_string(),
        )))
        .expect("response");

        let (status, json) = read_json(response).await;
        assert_error_envelope(status, &json, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn test_zero_generated_is_200_with_error_status() {
        let response = generation_response(Ok(GenerationSummary::default())).expect("response");

        let (status, json) = read_json(response).await;
        assert_error_envelope(status, &json, StatusCode::OK);
        assert_eq!(json["mcqs_generated"], 0);
    }

    #[test]
    fn test_database_errors_propagate() {
        let result = generation_response(Err(AppError::DatabaseError("down".to_string())));
        assert!(matches!(result, Err(AppError::DatabaseError(_))));
    }
}

use std::sync::Arc;

use actix_web::{post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::{request::AskQuestionRequest, response::AnswerResponse},
};

#[post("/api/ask")]
async fn ask_question(
    state: web::Data<Arc<AppState>>,
    request: web::Json<AskQuestionRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let answer = state
        .ask_service
        .answer(&request.material_id, &request.question)
        .await?;
    Ok(HttpResponse::Ok().json(AnswerResponse::from(answer)))
}

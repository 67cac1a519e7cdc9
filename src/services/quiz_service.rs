use std::sync::Arc;

use crate::{
    errors::{AppError, AppResult},
    models::domain::Quiz,
    repositories::QuizRepository,
};

pub struct QuizService {
    repository: Arc<dyn QuizRepository>,
}

impl QuizService {
    pub fn new(repository: Arc<dyn QuizRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_for_material(&self, material_id: &str) -> AppResult<Vec<Quiz>> {
        if material_id.trim().is_empty() {
            return Err(AppError::ValidationError(
                "material_id must not be empty".to_string(),
            ));
        }

        self.repository.find_by_material(material_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::quiz_repository::MockQuizRepository;
    use crate::test_utils::fixtures::test_quiz;

    #[tokio::test]
    async fn lists_quizzes_for_material() {
        let mut repository = MockQuizRepository::new();
        repository
            .expect_find_by_material()
            .withf(|id| id.to_string() == "mat-1")
            .times(1)
            .returning(|id| Ok(vec![test_quiz(id)]));

        let quizzes = QuizService::new(Arc::new(repository))
            .list_for_material("mat-1")
            .await
            .expect("quizzes");
        assert_eq!(quizzes.len(), 1);
    }

    #[tokio::test]
    async fn blank_material_id_is_rejected() {
        let mut repository = MockQuizRepository::new();
        repository.expect_find_by_material().never();

        let err = QuizService::new(Arc::new(repository))
            .list_for_material("  ")
            .await
            .expect_err("blank id");
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}

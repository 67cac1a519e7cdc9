use std::sync::Arc;

use serde::Serialize;

use crate::{
    errors::AppResult,
    models::domain::Quiz,
    repositories::QuizRepository,
    services::{
        document_service::DocumentLoader, generation_service::TokenUsage,
        material_service::MaterialService, mcq_pipeline::McqPipeline,
    },
};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GenerationSummary {
    pub quizzes_generated: usize,
    pub from_clusters: usize,
    pub from_fallback: usize,
    pub tokens_used: TokenUsage,
}

/// Regenerates the quiz set of a material: stale quizzes are purged before
/// the pipeline runs, then each new quiz is stored.
pub struct QuizGenerationService {
    materials: Arc<MaterialService>,
    quizzes: Arc<dyn QuizRepository>,
    loader: Arc<DocumentLoader>,
    pipeline: McqPipeline,
}

impl QuizGenerationService {
    pub fn new(
        materials: Arc<MaterialService>,
        quizzes: Arc<dyn QuizRepository>,
        loader: Arc<DocumentLoader>,
        pipeline: McqPipeline,
    ) -> Self {
        Self {
            materials,
            quizzes,
            loader,
            pipeline,
        }
    }

    pub async fn generate_for_material(&self, material_id: &str) -> AppResult<GenerationSummary> {
        log::info!("Generating questions for material {}", material_id);

        let path = self.materials.resolve_path(material_id).await?;

        let deleted = self.quizzes.delete_by_material(material_id).await?;
        if deleted > 0 {
            log::info!("Removed {} old quizzes for material {}", deleted, material_id);
        }

        let passages = self.loader.load(&path).await?;
        let outcome = self.pipeline.run(material_id, passages).await;

        let quizzes_generated = self.persist(material_id, outcome.quizzes).await?;

        Ok(GenerationSummary {
            quizzes_generated,
            from_clusters: outcome.from_clusters,
            from_fallback: outcome.from_fallback,
            tokens_used: outcome.usage,
        })
    }

    /// Stores quizzes one by one. The stale set is already gone at this
    /// point, so a failed write reports how much of the new set landed.
    async fn persist(&self, material_id: &str, quizzes: Vec<Quiz>) -> AppResult<usize> {
        let total = quizzes.len();
        let mut stored = 0;

        for quiz in quizzes {
            if let Err(e) = self.quizzes.create(quiz).await {
                log::error!(
                    "Stored {} of {} quizzes for material {} before failing: {}",
                    stored,
                    total,
                    material_id,
                    e
                );
                return Err(e);
            }
            stored += 1;
        }

        log::info!("Stored {} quizzes for material {}", stored, material_id);
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::repositories::material_repository::MockMaterialRepository;
    use crate::repositories::quiz_repository::MockQuizRepository;
    use crate::services::embedding_service::MockEmbedder;
    use crate::services::generation_service::MockTextGenerator;
    use crate::services::pipeline_settings::PipelineSettings;
    use crate::test_utils::fixtures::test_quiz;

    fn service(quizzes: MockQuizRepository) -> QuizGenerationService {
        let materials = MaterialService::new(Arc::new(MockMaterialRepository::new()), "uploads");
        let pipeline = McqPipeline::new(
            Arc::new(MockEmbedder::new()),
            Arc::new(MockTextGenerator::new()),
            PipelineSettings::unpaced(),
        );
        QuizGenerationService::new(
            Arc::new(materials),
            Arc::new(quizzes),
            Arc::new(DocumentLoader::new(1000, 200)),
            pipeline,
        )
    }

    #[tokio::test]
    async fn persist_stores_every_quiz() {
        let mut quizzes = MockQuizRepository::new();
        quizzes.expect_create().times(3).returning(Ok);

        let batch = vec![test_quiz("mat-1"), test_quiz("mat-1"), test_quiz("mat-1")];
        let stored = service(quizzes)
            .persist("mat-1", batch)
            .await
            .expect("persisted");
        assert_eq!(stored, 3);
    }

    #[tokio::test]
    async fn persist_stops_at_the_first_failed_write() {
        let mut quizzes = MockQuizRepository::new();
        let mut seq = mockall::Sequence::new();
        quizzes
            .expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(Ok);
        quizzes
            .expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::DatabaseError("write failed".to_string())));

        let batch = vec![test_quiz("mat-1"), test_quiz("mat-1"), test_quiz("mat-1")];
        let err = service(quizzes)
            .persist("mat-1", batch)
            .await
            .expect_err("second write fails");
        assert!(matches!(err, AppError::DatabaseError(_)));
    }
}

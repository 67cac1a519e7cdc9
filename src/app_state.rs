use std::sync::Arc;

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{MongoMaterialRepository, MongoQuizRepository},
    services::{
        ask_service::AskService, document_service::DocumentLoader,
        embedding_service::OpenAiEmbedder, generation_service::OpenAiGenerator,
        material_service::MaterialService, mcq_pipeline::McqPipeline,
        quiz_generation_service::QuizGenerationService, quiz_service::QuizService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub quiz_generation_service: Arc<QuizGenerationService>,
    pub quiz_service: Arc<QuizService>,
    pub ask_service: Arc<AskService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let material_repository = Arc::new(MongoMaterialRepository::new(&db));
        material_repository.ensure_indexes().await?;
        let quiz_repository = Arc::new(MongoQuizRepository::new(&db));
        quiz_repository.ensure_indexes().await?;

        let embedder = Arc::new(OpenAiEmbedder::new(
            &config.openai_api_key,
            &config.openai_api_base,
            &config.embedding_model,
            config.embedding_batch_size,
            config.generation_timeout(),
        )?);
        let generator = Arc::new(OpenAiGenerator::new(
            &config.openai_api_key,
            &config.openai_api_base,
            &config.chat_model,
            config.generation_timeout(),
        ));

        let materials = Arc::new(MaterialService::new(
            material_repository,
            config.upload_dir.clone(),
        ));
        let loader = Arc::new(DocumentLoader::new(config.chunk_size, config.chunk_overlap));
        let pipeline = McqPipeline::new(
            embedder.clone(),
            generator.clone(),
            config.pipeline_settings(),
        );

        let quiz_generation_service = Arc::new(QuizGenerationService::new(
            materials.clone(),
            quiz_repository.clone(),
            loader.clone(),
            pipeline,
        ));
        let ask_service = Arc::new(AskService::new(materials, loader, embedder, generator));
        let quiz_service = Arc::new(QuizService::new(quiz_repository));

        Ok(Self {
            db,
            quiz_generation_service,
            quiz_service,
            ask_service,
            config: Arc::new(config),
        })
    }
}

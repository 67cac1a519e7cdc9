use std::sync::Arc;

use serde::Serialize;

use crate::{
    constants::prompts::{query_rewrite_prompt, tutor_prompt},
    errors::{AppError, AppResult},
    services::{
        context_selector::CONTEXT_SEPARATOR,
        document_service::DocumentLoader,
        embedding_service::{attach_embeddings, Embedder},
        generation_service::{TextGenerator, TokenUsage},
        material_service::MaterialService,
        vector_index::{InMemoryVectorIndex, Retriever},
    },
};

pub const ASK_TOP_K: usize = 10;
const ASK_TEMPERATURE: f32 = 0.2;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnswerSource {
    pub source: String,
    pub chunk_index: usize,
    pub language: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AskAnswer {
    pub rewritten_query: String,
    pub answer: String,
    pub sources: Vec<AnswerSource>,
    pub usage: TokenUsage,
}

/// Answers free-text questions grounded in one material's passages.
pub struct AskService {
    materials: Arc<MaterialService>,
    loader: Arc<DocumentLoader>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn TextGenerator>,
}

impl AskService {
    pub fn new(
        materials: Arc<MaterialService>,
        loader: Arc<DocumentLoader>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            materials,
            loader,
            embedder,
            generator,
        }
    }

    pub async fn answer(&self, material_id: &str, question: &str) -> AppResult<AskAnswer> {
        let path = self.materials.resolve_path(material_id).await?;
        let passages = self.loader.load(&path).await?;
        let embedded = attach_embeddings(self.embedder.as_ref(), passages).await?;
        let index = InMemoryVectorIndex::new(self.embedder.clone(), &embedded);

        self.answer_with(&index, question).await
    }

    /// Rewrite, retrieve, answer. Split out so any retriever can back it.
    pub async fn answer_with(
        &self,
        retriever: &dyn Retriever,
        question: &str,
    ) -> AppResult<AskAnswer> {
        if question.trim().is_empty() {
            return Err(AppError::ValidationError(
                "question must not be empty".to_string(),
            ));
        }

        let mut usage = TokenUsage::default();

        let rewrite = self
            .generator
            .generate(&query_rewrite_prompt(question), ASK_TEMPERATURE)
            .await?;
        usage += rewrite.usage;
        let rewritten_query = match rewrite.text.trim() {
            "" => question.trim().to_string(),
            text => text.to_string(),
        };
        log::debug!("Rewrote '{}' as '{}'", question, rewritten_query);

        let passages = retriever.retrieve(&rewritten_query, ASK_TOP_K).await?;
        let context = passages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        let answer = self
            .generator
            .generate(&tutor_prompt(&context, &rewritten_query), ASK_TEMPERATURE)
            .await?;
        usage += answer.usage;

        Ok(AskAnswer {
            rewritten_query,
            answer: answer.text.trim().to_string(),
            sources: passages
                .iter()
                .map(|p| AnswerSource {
                    source: p.source.clone(),
                    chunk_index: p.chunk_index,
                    language: p.language.clone(),
                })
                .collect(),
            usage,
        })
    }
}

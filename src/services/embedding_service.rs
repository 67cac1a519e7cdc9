use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::models::domain::Passage;
use crate::services::similarity::l2_normalize;

/// Text embedding capability. Returns one unit-length vector per input, in
/// input order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;
}

/// Client for OpenAI-compatible `/embeddings` endpoints.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    batch_size: usize,
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: &SecretString,
        base_url: &str,
        model: &str,
        batch_size: usize,
        timeout: Duration,
    ) -> AppResult<Self> {
        if model.trim().is_empty() {
            return Err(AppError::InternalError(
                "missing embedding model name".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.expose_secret().trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| AppError::InternalError("invalid embedding API key".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::InternalError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
            batch_size: batch_size.max(1),
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    async fn embed_batch(&self, inputs: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
        };
        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(AppError::UpstreamError(format!(
                "embeddings request failed ({}): {}",
                status, body
            )));
        }

        let parsed: EmbeddingResponse = response.json().await?;
        vectors_in_input_order(parsed, inputs.len())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.embed_batch(batch).await?);
        }
        log::debug!("Embedded {} texts with {}", vectors.len(), self.model);
        Ok(vectors)
    }
}

/// Embeds every passage in one call and attaches the vectors in order.
pub async fn attach_embeddings(
    embedder: &dyn Embedder,
    passages: Vec<Passage>,
) -> AppResult<Vec<Passage>> {
    if passages.is_empty() {
        return Ok(passages);
    }

    let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
    let vectors = embedder.embed(&texts).await?;
    if vectors.len() != passages.len() {
        return Err(AppError::UpstreamError(format!(
            "expected {} embeddings, got {}",
            passages.len(),
            vectors.len()
        )));
    }

    Ok(passages
        .into_iter()
        .zip(vectors)
        .map(|(passage, vector)| passage.with_embedding(vector))
        .collect())
}

fn vectors_in_input_order(
    mut response: EmbeddingResponse,
    expected: usize,
) -> AppResult<Vec<Vec<f32>>> {
    response.data.sort_by_key(|entry| entry.index);
    if response.data.len() != expected {
        return Err(AppError::UpstreamError(format!(
            "embeddings endpoint returned {} vectors for {} inputs",
            response.data.len(),
            expected
        )));
    }

    Ok(response
        .data
        .into_iter()
        .map(|entry| {
            let mut vector = entry.embedding;
            l2_normalize(&mut vector);
            vector
        })
        .collect())
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingEntry>,
}

#[derive(Deserialize)]
struct EmbeddingEntry {
    index: usize,
    embedding: Vec<f32>,
}

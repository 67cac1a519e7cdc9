use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::{AppError, AppResult};
use crate::models::domain::Passage;
use crate::services::embedding_service::Embedder;
use crate::services::similarity::cosine_similarity;

pub const MMR_LAMBDA: f32 = 0.5;

/// Nearest-neighbour lookup over indexed passages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, top_k: usize) -> AppResult<Vec<Passage>>;
}

/// Flat in-memory index over the embedded passages of one document.
///
/// Queries are answered with maximal marginal relevance: the `2 * top_k`
/// most similar passages form the candidate pool, then passages are picked
/// one at a time trading relevance against similarity to those already picked.
pub struct InMemoryVectorIndex {
    embedder: Arc<dyn Embedder>,
    passages: Vec<Passage>,
    lambda: f32,
}

impl InMemoryVectorIndex {
    /// Indexes every passage that carries an embedding.
    pub fn new(embedder: Arc<dyn Embedder>, passages: &[Passage]) -> Self {
        let passages: Vec<Passage> = passages
            .iter()
            .filter(|p| p.embedding.is_some())
            .cloned()
            .collect();
        log::debug!("Indexed {} passages", passages.len());

        Self {
            embedder,
            passages,
            lambda: MMR_LAMBDA,
        }
    }

    pub fn with_lambda(mut self, lambda: f32) -> Self {
        self.lambda = lambda.clamp(0.0, 1.0);
        self
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Indices of the passages chosen for `query_vector`, in pick order.
    pub fn search(&self, query_vector: &[f32], top_k: usize) -> Vec<usize> {
        if top_k == 0 || self.passages.is_empty() {
            return Vec::new();
        }

        let mut pool: Vec<(usize, f32)> = self
            .passages
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                p.embedding
                    .as_deref()
                    .map(|e| (i, cosine_similarity(query_vector, e)))
            })
            .collect();
        pool.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        pool.truncate(top_k.saturating_mul(2));

        mmr_select(&pool, top_k, self.lambda, |a, b| {
            match (
                self.passages[a].embedding.as_deref(),
                self.passages[b].embedding.as_deref(),
            ) {
                (Some(x), Some(y)) => cosine_similarity(x, y),
                _ => 0.0,
            }
        })
    }
}

/// Greedy MMR over `pool` (index, relevance) pairs.
fn mmr_select<F>(pool: &[(usize, f32)], top_k: usize, lambda: f32, similarity: F) -> Vec<usize>
where
    F: Fn(usize, usize) -> f32,
{
    let mut remaining: Vec<(usize, f32)> = pool.to_vec();
    let mut selected: Vec<usize> = Vec::with_capacity(top_k.min(pool.len()));

    while selected.len() < top_k && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_score = f32::NEG_INFINITY;
        for (pos, (candidate, relevance)) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|&s| similarity(*candidate, s))
                .fold(f32::NEG_INFINITY, f32::max);
            let redundancy = if redundancy.is_finite() { redundancy } else { 0.0 };
            let score = lambda * relevance - (1.0 - lambda) * redundancy;
            if score > best_score {
                best_score = score;
                best_pos = pos;
            }
        }
        selected.push(remaining.remove(best_pos).0);
    }

    selected
}

#[async_trait]
impl Retriever for InMemoryVectorIndex {
    async fn retrieve(&self, query: &str, top_k: usize) -> AppResult<Vec<Passage>> {
        if top_k == 0 || self.passages.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::UpstreamError("no embedding returned for query".to_string()))?;

        Ok(self
            .search(&query_vector, top_k)
            .into_iter()
            .map(|i| self.passages[i].clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::embedding_service::MockEmbedder;
    use crate::test_utils::fixtures::{embedded_passage, QUEUE_TEXT, STACK_TEXT};

    fn passage(text: &str, embedding: Vec<f32>) -> Passage {
        embedded_passage(text, 0, embedding)
    }

    fn index(passages: &[Passage]) -> InMemoryVectorIndex {
        InMemoryVectorIndex::new(Arc::new(MockEmbedder::new()), passages)
    }

    #[test]
    fn first_pick_is_most_relevant() {
        let idx = index(&[
            passage("far", vec![0.0, 1.0]),
            passage("close", vec![1.0, 0.0]),
        ]);
        assert_eq!(idx.search(&[1.0, 0.0], 1), vec![1]);
    }

    #[test]
    fn mmr_prefers_diverse_second_pick() {
        let idx = index(&[
            passage("a", vec![1.0, 0.0]),
            passage("a duplicate", vec![1.0, 0.0]),
            passage("different", vec![0.0, 1.0]),
        ]);
        let picked = idx.search(&[1.0, 0.5], 2);

        assert_eq!(picked[0], 0);
        assert_eq!(picked[1], 2);
    }

    #[test]
    fn lambda_one_is_pure_relevance() {
        let idx = index(&[
            passage("a", vec![1.0, 0.0]),
            passage("a duplicate", vec![1.0, 0.0]),
            passage("different", vec![0.0, 1.0]),
        ])
        .with_lambda(1.0);

        assert_eq!(idx.search(&[1.0, 0.5], 2), vec![0, 1]);
    }

    #[test]
    fn unembedded_passages_are_not_indexed() {
        let idx = index(&[
            passage("a", vec![1.0]),
            Passage::new("no vector", "notes.pdf", 1),
        ]);
        assert_eq!(idx.len(), 1);
    }

    #[tokio::test]
    async fn retrieve_embeds_query_once() {
        let mut embedder = MockEmbedder::new();
        embedder
            .expect_embed()
            .times(1)
            .returning(|texts| Ok(texts.iter().map(|_| vec![0.0, 1.0]).collect()));
        let passages = vec![
            embedded_passage(QUEUE_TEXT, 0, vec![0.0, 1.0]),
            embedded_passage(STACK_TEXT, 1, vec![1.0, 0.0]),
        ];
        let idx = InMemoryVectorIndex::new(Arc::new(embedder), &passages);

        let hits = idx.retrieve("what is FIFO?", 1).await.expect("retrieval");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, QUEUE_TEXT);
        assert_eq!(hits[0].language, "eng");
    }

    #[tokio::test]
    async fn zero_top_k_or_empty_index_returns_nothing() {
        let idx = index(&[]);
        assert!(idx.retrieve("q", 5).await.expect("empty").is_empty());

        let idx = index(&[passage("a", vec![1.0])]);
        assert!(idx.retrieve("q", 0).await.expect("zero").is_empty());
    }
}

use std::time::Duration;

use crate::services::clustering::{
    ClusteringConfig, COHERENCE_THRESHOLD, DEFAULT_CLUSTER_COUNT, KMEANS_MAX_ITERATIONS,
    KMEANS_SEED, MIN_PASSAGE_WORDS,
};
use crate::services::context_selector::{DEFAULT_CONTEXT_TOP_K, MIN_CONTEXT_WORDS};
use crate::services::pacing::RequestPacer;

pub const DEFAULT_TARGET_QUIZ_COUNT: usize = 10;
pub const FALLBACK_TOP_K: usize = 10;

/// Tunables for one quiz generation run.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineSettings {
    pub target_quiz_count: usize,
    pub cluster_count: usize,
    pub coherence_threshold: f32,
    pub min_passage_words: usize,
    pub context_top_k: usize,
    pub min_context_words: usize,
    pub fallback_top_k: usize,
    pub temperature: f32,
    pub kmeans_seed: u64,
    pub kmeans_max_iterations: usize,
    pub pacing_enabled: bool,
    pub pacing_base: Duration,
    pub pacing_step: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            target_quiz_count: DEFAULT_TARGET_QUIZ_COUNT,
            cluster_count: DEFAULT_CLUSTER_COUNT,
            coherence_threshold: COHERENCE_THRESHOLD,
            min_passage_words: MIN_PASSAGE_WORDS,
            context_top_k: DEFAULT_CONTEXT_TOP_K,
            min_context_words: MIN_CONTEXT_WORDS,
            fallback_top_k: FALLBACK_TOP_K,
            temperature: 0.2,
            kmeans_seed: KMEANS_SEED,
            kmeans_max_iterations: KMEANS_MAX_ITERATIONS,
            pacing_enabled: true,
            pacing_base: Duration::from_millis(4000),
            pacing_step: Duration::from_millis(500),
        }
    }
}

impl PipelineSettings {
    pub fn clustering(&self) -> ClusteringConfig {
        ClusteringConfig {
            cluster_count: self.cluster_count,
            coherence_threshold: self.coherence_threshold,
            min_passage_words: self.min_passage_words,
            max_iterations: self.kmeans_max_iterations,
            seed: self.kmeans_seed,
        }
    }

    pub fn pacer(&self) -> RequestPacer {
        if self.pacing_enabled {
            RequestPacer::new(self.pacing_base, self.pacing_step)
        } else {
            RequestPacer::disabled()
        }
    }

    /// Settings without pacing delays, for tests and local runs.
    pub fn unpaced() -> Self {
        Self {
            pacing_enabled: false,
            ..Self::default()
        }
    }
}

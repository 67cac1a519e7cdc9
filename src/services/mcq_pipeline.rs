//! End-to-end question generation for one document.
//!
//! passages -> embeddings -> topic clusters -> merged contexts -> synthesis
//! -> assembled quizzes, topped up from seed-query retrieval when the
//! clusters alone fall short of the target.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::constants::prompts::SEED_QUERIES;
use crate::errors::AppResult;
use crate::models::domain::{MergedContext, Passage, Provenance, Quiz};
use crate::services::clustering::TopicClusterer;
use crate::services::context_selector::{ContextSelector, CONTEXT_SEPARATOR};
use crate::services::embedding_service::{attach_embeddings, Embedder};
use crate::services::generation_service::{TextGenerator, TokenUsage};
use crate::services::mcq_synthesis::{McqSynthesizer, SynthesisOutcome};
use crate::services::pacing::RequestPacer;
use crate::services::pipeline_settings::PipelineSettings;
use crate::services::quiz_assembly::assemble_quiz;
use crate::services::vector_index::{InMemoryVectorIndex, Retriever};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipelineOutcome {
    pub quizzes: Vec<Quiz>,
    pub clusters_formed: usize,
    pub clusters_accepted: usize,
    pub contexts_selected: usize,
    pub from_clusters: usize,
    pub from_fallback: usize,
    pub usage: TokenUsage,
}

/// Accepted contexts plus the counts that led to them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContextPlan {
    pub contexts: Vec<MergedContext>,
    pub clusters_formed: usize,
    pub clusters_accepted: usize,
}

struct RunState {
    outcome: PipelineOutcome,
    rng: StdRng,
    calls: usize,
}

pub struct McqPipeline {
    embedder: Arc<dyn Embedder>,
    synthesizer: McqSynthesizer,
    clusterer: TopicClusterer,
    selector: ContextSelector,
    pacer: RequestPacer,
    settings: PipelineSettings,
    shuffle_seed: Option<u64>,
}

impl McqPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            embedder,
            synthesizer: McqSynthesizer::new(generator, settings.temperature),
            clusterer: TopicClusterer::new(settings.clustering()),
            selector: ContextSelector::new(settings.context_top_k, settings.min_context_words),
            pacer: settings.pacer(),
            settings,
            shuffle_seed: None,
        }
    }

    /// Fixes the option shuffle so runs are reproducible.
    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    pub async fn embed_passages(&self, passages: Vec<Passage>) -> AppResult<Vec<Passage>> {
        attach_embeddings(self.embedder.as_ref(), passages).await
    }

    /// Clusters embedded passages and keeps one merged context per coherent
    /// cluster with enough informative text.
    pub fn plan_contexts(&self, passages: &[Passage]) -> ContextPlan {
        let clusters = self.clusterer.cluster(passages);
        let clusters_formed = clusters.len();
        let coherent = self.clusterer.retain_coherent(clusters);
        let clusters_accepted = coherent.len();
        let mut contexts = Vec::new();

        for cluster in &coherent {
            match self.selector.select(cluster, passages) {
                Ok(context) => contexts.push(context),
                Err(rejection) => {
                    log::warn!("Skipping cluster {}: {}", cluster.label, rejection)
                }
            }
        }

        log::info!(
            "{} clusters formed, {} coherent, {} contexts selected",
            clusters_formed,
            clusters_accepted,
            contexts.len()
        );

        ContextPlan {
            contexts,
            clusters_formed,
            clusters_accepted,
        }
    }

    pub async fn run(&self, material_id: &str, passages: Vec<Passage>) -> PipelineOutcome {
        let mut state = RunState {
            outcome: PipelineOutcome::default(),
            rng: match self.shuffle_seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            },
            calls: 0,
        };

        let embedded = match self.embed_passages(passages).await {
            Ok(embedded) => embedded,
            Err(e) => {
                log::error!("Embedding failed for material {}: {}", material_id, e);
                return state.outcome;
            }
        };

        let plan = self.plan_contexts(&embedded);
        state.outcome.clusters_formed = plan.clusters_formed;
        state.outcome.clusters_accepted = plan.clusters_accepted;
        state.outcome.contexts_selected = plan.contexts.len();

        for context in &plan.contexts {
            if self.target_met(&state) {
                break;
            }
            let label = format!("cluster {}", context.cluster_label);
            self.synthesize_into(
                &mut state,
                material_id,
                &context.text,
                Provenance::Cluster,
                &label,
            )
            .await;
        }

        if !self.target_met(&state) {
            let index = InMemoryVectorIndex::new(self.embedder.clone(), &embedded);
            self.fill_from_retriever(&mut state, material_id, &index).await;
        }

        log::info!(
            "Generated {} questions for material {} ({} from clusters, {} from fallback, {} tokens)",
            state.outcome.quizzes.len(),
            material_id,
            state.outcome.from_clusters,
            state.outcome.from_fallback,
            state.outcome.usage.total_tokens
        );
        state.outcome
    }

    fn target_met(&self, state: &RunState) -> bool {
        state.outcome.quizzes.len() >= self.settings.target_quiz_count
    }

    async fn fill_from_retriever(
        &self,
        state: &mut RunState,
        material_id: &str,
        retriever: &dyn Retriever,
    ) {
        let needed = self
            .settings
            .target_quiz_count
            .saturating_sub(state.outcome.quizzes.len());
        log::info!(
            "Only {} questions from clusters, using retriever fallback for {} more",
            state.outcome.quizzes.len(),
            needed
        );

        for query in SEED_QUERIES.iter().take(needed) {
            if self.target_met(state) {
                break;
            }

            let passages = match retriever.retrieve(query, self.settings.fallback_top_k).await {
                Ok(passages) if !passages.is_empty() => passages,
                Ok(_) => {
                    log::warn!("Seed query '{}' retrieved nothing", query);
                    continue;
                }
                Err(e) => {
                    log::warn!("Seed query '{}' failed: {}", query, e);
                    continue;
                }
            };

            let context = passages
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join(CONTEXT_SEPARATOR);
            let label = format!("seed query '{}'", query);
            self.synthesize_into(state, material_id, &context, Provenance::Retriever, &label)
                .await;
        }
    }

    async fn synthesize_into(
        &self,
        state: &mut RunState,
        material_id: &str,
        context: &str,
        source: Provenance,
        label: &str,
    ) {
        if state.calls > 0 {
            self.pacer.wait(state.calls - 1).await;
        }
        state.calls += 1;

        let report = self.synthesizer.synthesize(context).await;
        state.outcome.usage += report.usage;

        let candidate = match report.outcome {
            SynthesisOutcome::Produced(candidate) => candidate,
            SynthesisOutcome::NoCandidate(reason) => {
                log::warn!("No question from {}: {}", label, reason);
                return;
            }
        };

        if let Ok(quiz) = assemble_quiz(material_id, &candidate, source, &mut state.rng) {
            match source {
                Provenance::Cluster => state.outcome.from_clusters += 1,
                Provenance::Retriever => state.outcome.from_fallback += 1,
            }
            state.outcome.quizzes.push(quiz);
        }
    }
}

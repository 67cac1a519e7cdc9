//! Topic clustering over passage embeddings.
//!
//! Eligible passages (enough words, embedded) are hard-partitioned with a
//! seeded k-means++ / Lloyd run, then each group is scored by its mean cosine
//! similarity to the raw centroid. Acceptance by coherence is a separate step
//! so callers can inspect every group of a run.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::models::domain::{Cluster, Passage};
use crate::services::similarity::{cosine_similarity, mean_vector, squared_euclidean};

pub const DEFAULT_CLUSTER_COUNT: usize = 8;
pub const COHERENCE_THRESHOLD: f32 = 0.55;
pub const MIN_PASSAGE_WORDS: usize = 10;
pub const KMEANS_SEED: u64 = 42;
pub const KMEANS_MAX_ITERATIONS: usize = 100;

#[derive(Clone, Debug, PartialEq)]
pub struct ClusteringConfig {
    pub cluster_count: usize,
    pub coherence_threshold: f32,
    pub min_passage_words: usize,
    pub max_iterations: usize,
    pub seed: u64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            cluster_count: DEFAULT_CLUSTER_COUNT,
            coherence_threshold: COHERENCE_THRESHOLD,
            min_passage_words: MIN_PASSAGE_WORDS,
            max_iterations: KMEANS_MAX_ITERATIONS,
            seed: KMEANS_SEED,
        }
    }
}

impl ClusteringConfig {
    pub fn with_cluster_count(mut self, cluster_count: usize) -> Self {
        self.cluster_count = cluster_count;
        self
    }
}

pub struct TopicClusterer {
    config: ClusteringConfig,
}

impl TopicClusterer {
    pub fn new(config: ClusteringConfig) -> Self {
        Self { config }
    }

    /// Indices of passages that take part in clustering.
    ///
    /// Short passages are noise and never clustered. Passages without an
    /// embedding, or whose dimension differs from the first embedded one,
    /// are left out as well.
    pub fn eligible_indices(&self, passages: &[Passage]) -> Vec<usize> {
        let mut dimension: Option<usize> = None;
        let mut eligible = Vec::new();

        for (i, passage) in passages.iter().enumerate() {
            if passage.word_count() < self.config.min_passage_words {
                continue;
            }
            let Some(embedding) = passage.embedding.as_ref() else {
                log::warn!("Passage {} has no embedding, leaving it out of clustering", i);
                continue;
            };
            let dim = *dimension.get_or_insert(embedding.len());
            if embedding.len() != dim || dim == 0 {
                log::warn!(
                    "Passage {} has embedding dimension {} (expected {}), leaving it out",
                    i,
                    embedding.len(),
                    dim
                );
                continue;
            }
            eligible.push(i);
        }

        eligible
    }

    /// Partitions the eligible passages into `min(k, n)` groups.
    ///
    /// Returns an empty list when nothing is eligible or `k` is zero.
    pub fn cluster(&self, passages: &[Passage]) -> Vec<Cluster> {
        let eligible = self.eligible_indices(passages);
        let vectors: Vec<&[f32]> = eligible
            .iter()
            .filter_map(|&i| passages[i].embedding.as_deref())
            .collect();

        if vectors.is_empty() || self.config.cluster_count == 0 {
            log::info!("No passages eligible for clustering");
            return Vec::new();
        }

        let k = self.config.cluster_count.min(vectors.len());
        let labels = kmeans(&vectors, k, self.config.max_iterations, self.config.seed);

        let mut clusters = Vec::with_capacity(k);
        for label in 0..k {
            let member_positions: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|(_, l)| **l == label)
                .map(|(pos, _)| pos)
                .collect();
            if member_positions.is_empty() {
                continue;
            }

            let members: Vec<&[f32]> = member_positions.iter().map(|&p| vectors[p]).collect();
            let Some(centroid) = mean_vector(members.iter().copied()) else {
                continue;
            };
            let coherence = coherence(&members, &centroid);

            clusters.push(Cluster {
                label,
                member_indices: member_positions.iter().map(|&p| eligible[p]).collect(),
                centroid,
                coherence,
            });
        }

        log::info!(
            "Clustered {} of {} passages into {} groups",
            vectors.len(),
            passages.len(),
            clusters.len()
        );
        clusters
    }

    pub fn is_coherent(&self, cluster: &Cluster) -> bool {
        cluster.coherence > self.config.coherence_threshold
    }

    /// Keeps the clusters whose coherence exceeds the threshold.
    pub fn retain_coherent(&self, clusters: Vec<Cluster>) -> Vec<Cluster> {
        clusters
            .into_iter()
            .filter(|cluster| {
                let keep = self.is_coherent(cluster);
                if !keep {
                    log::warn!(
                        "Skipping low-coherence cluster {} (coherence {:.3}, {} members)",
                        cluster.label,
                        cluster.coherence,
                        cluster.len()
                    );
                }
                keep
            })
            .collect()
    }
}

impl Default for TopicClusterer {
    fn default() -> Self {
        Self::new(ClusteringConfig::default())
    }
}

/// Mean cosine similarity of `members` to `centroid`.
pub fn coherence(members: &[&[f32]], centroid: &[f32]) -> f32 {
    if members.is_empty() {
        return 0.0;
    }
    let total: f32 = members
        .iter()
        .map(|member| cosine_similarity(member, centroid))
        .sum();
    total / members.len() as f32
}

/// Seeded k-means. Returns one label in `0..k` per input vector, with every
/// label used whenever `k <= vectors.len()`.
pub fn kmeans(vectors: &[&[f32]], k: usize, max_iterations: usize, seed: u64) -> Vec<usize> {
    let n = vectors.len();
    if n == 0 || k == 0 {
        return Vec::new();
    }
    let k = k.min(n);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = kmeans_plus_plus_init(vectors, k, &mut rng);
    let mut labels = vec![usize::MAX; n];

    for _ in 0..max_iterations.max(1) {
        let mut changed = false;
        for (i, vector) in vectors.iter().enumerate() {
            let nearest = nearest_centroid(vector, &centroids);
            if labels[i] != nearest {
                labels[i] = nearest;
                changed = true;
            }
        }

        if fill_empty_clusters(vectors, &mut labels, &centroids, k) {
            changed = true;
        }

        for (label, centroid) in centroids.iter_mut().enumerate() {
            let members = vectors
                .iter()
                .zip(&labels)
                .filter(|(_, l)| **l == label)
                .map(|(v, _)| *v);
            if let Some(mean) = mean_vector(members) {
                *centroid = mean;
            }
        }

        if !changed {
            break;
        }
    }

    labels
}

fn nearest_centroid(vector: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_distance = f32::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let distance = squared_euclidean(vector, centroid);
        if distance < best_distance {
            best = i;
            best_distance = distance;
        }
    }
    best
}

/// Gives every empty cluster the point farthest from its own centroid,
/// taken from a cluster that can spare one. Returns whether anything moved.
fn fill_empty_clusters(
    vectors: &[&[f32]],
    labels: &mut [usize],
    centroids: &[Vec<f32>],
    k: usize,
) -> bool {
    let mut counts = vec![0usize; k];
    for &label in labels.iter() {
        counts[label] += 1;
    }

    let mut moved = false;
    for empty in 0..k {
        if counts[empty] > 0 {
            continue;
        }
        let donor = (0..vectors.len())
            .filter(|&i| counts[labels[i]] > 1)
            .max_by(|&a, &b| {
                let da = squared_euclidean(vectors[a], &centroids[labels[a]]);
                let db = squared_euclidean(vectors[b], &centroids[labels[b]]);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            });
        if let Some(i) = donor {
            counts[labels[i]] -= 1;
            labels[i] = empty;
            counts[empty] = 1;
            moved = true;
        }
    }
    moved
}

/// k-means++ seeding: first centre uniform, the rest sampled proportional to
/// squared distance from the nearest chosen centre.
fn kmeans_plus_plus_init(vectors: &[&[f32]], k: usize, rng: &mut StdRng) -> Vec<Vec<f32>> {
    let n = vectors.len();
    let first = rng.gen_range(0..n);
    let mut chosen = vec![first];
    let mut min_distances: Vec<f32> = vectors
        .iter()
        .map(|v| squared_euclidean(v, vectors[first]))
        .collect();

    while chosen.len() < k {
        let total: f32 = min_distances.iter().sum();
        let sampled = if total > 0.0 {
            let mut target = rng.gen::<f32>() * total;
            let mut pick = None;
            for (i, distance) in min_distances.iter().enumerate() {
                if *distance <= 0.0 {
                    continue;
                }
                if target < *distance {
                    pick = Some(i);
                    break;
                }
                target -= distance;
            }
            pick.or_else(|| min_distances.iter().rposition(|d| *d > 0.0))
        } else {
            None
        };

        // All remaining points coincide with a chosen centre
        let next = sampled
            .or_else(|| (0..n).find(|i| !chosen.contains(i)))
            .unwrap_or(0);
        chosen.push(next);

        for (i, vector) in vectors.iter().enumerate() {
            let distance = squared_euclidean(vector, vectors[next]);
            if distance < min_distances[i] {
                min_distances[i] = distance;
            }
        }
    }

    chosen.into_iter().map(|i| vectors[i].to_vec()).collect()
}

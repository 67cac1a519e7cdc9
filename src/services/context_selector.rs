use thiserror::Error;

use crate::models::domain::{Cluster, MergedContext, Passage};
use crate::services::similarity::{cosine_similarity, mean_vector};

pub const DEFAULT_CONTEXT_TOP_K: usize = 3;
pub const MIN_CONTEXT_WORDS: usize = 20;
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Why an accepted cluster produced no usable context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextRejection {
    #[error("cluster has no embedded members")]
    NoMembers,
    #[error("merged text is entirely numeric")]
    NumericOnly,
    #[error("merged text has {0} words, below the minimum")]
    TooShort(usize),
}

/// Picks the passages closest to a cluster's centroid and merges their text.
pub struct ContextSelector {
    top_k: usize,
    min_words: usize,
}

impl Default for ContextSelector {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_TOP_K, MIN_CONTEXT_WORDS)
    }
}

impl ContextSelector {
    pub fn new(top_k: usize, min_words: usize) -> Self {
        Self { top_k, min_words }
    }

    /// Member indices ranked by similarity to the members' mean, highest first,
    /// truncated to `top_k`. Ties keep the lower passage index first.
    pub fn rank_members(&self, cluster: &Cluster, passages: &[Passage]) -> Vec<usize> {
        let members: Vec<(usize, &[f32])> = cluster
            .member_indices
            .iter()
            .filter_map(|&i| {
                passages
                    .get(i)
                    .and_then(|p| p.embedding.as_deref())
                    .map(|e| (i, e))
            })
            .collect();

        let Some(centroid) = mean_vector(members.iter().map(|(_, e)| *e)) else {
            return Vec::new();
        };

        let mut scored: Vec<(usize, f32)> = members
            .iter()
            .map(|(i, e)| (*i, cosine_similarity(e, &centroid)))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        scored.into_iter().take(self.top_k).map(|(i, _)| i).collect()
    }

    pub fn select(
        &self,
        cluster: &Cluster,
        passages: &[Passage],
    ) -> Result<MergedContext, ContextRejection> {
        let selected = self.rank_members(cluster, passages);
        if selected.is_empty() {
            return Err(ContextRejection::NoMembers);
        }

        let text = selected
            .iter()
            .map(|&i| passages[i].text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        if is_numeric_only(&text) {
            return Err(ContextRejection::NumericOnly);
        }
        let words = text.split_whitespace().count();
        if words < self.min_words {
            return Err(ContextRejection::TooShort(words));
        }

        Ok(MergedContext {
            cluster_label: cluster.label,
            passage_indices: selected,
            text,
        })
    }
}

/// True when every non-whitespace character is an ASCII digit.
pub fn is_numeric_only(text: &str) -> bool {
    let mut chars = text.chars().filter(|c| !c.is_whitespace()).peekable();
    chars.peek().is_some() && chars.all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize, word: &str) -> String {
        vec![word; n].join(" ")
    }

    fn cluster(members: &[usize]) -> Cluster {
        Cluster {
            label: 0,
            member_indices: members.to_vec(),
            centroid: Vec::new(),
            coherence: 1.0,
        }
    }

    fn passage(text: &str, embedding: Vec<f32>) -> Passage {
        Passage::new(text, "notes.pdf", 0).with_embedding(embedding)
    }

    #[test]
    fn selects_top_k_by_centroid_similarity_descending() {
        let passages = vec![
            passage(&words(10, "outlier"), vec![0.0, 1.0]),
            passage(&words(10, "central"), vec![0.8, 0.6]),
            passage(&words(10, "near"), vec![1.0, 0.0]),
            passage(&words(10, "also"), vec![0.9, 0.43]),
        ];
        let selector = ContextSelector::new(3, 20);
        let context = selector
            .select(&cluster(&[0, 1, 2, 3]), &passages)
            .expect("context should be accepted");

        assert_eq!(context.passage_indices, vec![1, 3, 2]);
        assert!(context.text.starts_with("central"));
        assert!(context.text.contains(CONTEXT_SEPARATOR));
    }

    #[test]
    fn small_cluster_selects_every_member() {
        let passages = vec![
            passage(&words(12, "alpha"), vec![1.0, 0.0]),
            passage(&words(12, "beta"), vec![0.9, 0.1]),
        ];
        let context = ContextSelector::default()
            .select(&cluster(&[0, 1]), &passages)
            .expect("context should be accepted");

        assert_eq!(context.passage_indices.len(), 2);
        assert_eq!(context.word_count(), 24);
    }

    #[test]
    fn single_member_cluster_passes_when_long_enough() {
        let passages = vec![passage(&words(25, "topic"), vec![0.3, 0.7])];
        let context = ContextSelector::default()
            .select(&cluster(&[0]), &passages)
            .expect("single passage context");

        assert_eq!(context.passage_indices, vec![0]);
        assert_eq!(context.text, passages[0].text);
    }

    #[test]
    fn rejects_short_merged_text() {
        let passages = vec![passage(&words(12, "short"), vec![1.0, 0.0])];
        let result = ContextSelector::default().select(&cluster(&[0]), &passages);

        assert_eq!(result, Err(ContextRejection::TooShort(12)));
    }

    #[test]
    fn rejects_numeric_only_text() {
        let numbers = (0..30).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
        let passages = vec![passage(&numbers, vec![1.0, 0.0])];
        let result = ContextSelector::default().select(&cluster(&[0]), &passages);

        assert_eq!(result, Err(ContextRejection::NumericOnly));
    }

    #[test]
    fn rejects_cluster_without_embeddings() {
        let passages = vec![Passage::new(&words(30, "plain"), "notes.pdf", 0)];
        let result = ContextSelector::default().select(&cluster(&[0]), &passages);

        assert_eq!(result, Err(ContextRejection::NoMembers));
    }

    #[test]
    fn numeric_detection() {
        assert!(is_numeric_only("12 34\n\n56"));
        assert!(!is_numeric_only("12 apples"));
        assert!(!is_numeric_only("   "));
        assert!(!is_numeric_only("3.14"));
    }
}

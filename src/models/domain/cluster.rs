use serde::Serialize;

/// A group of passages that k-means placed under the same label.
///
/// `member_indices` index into the passage slice that was clustered, so a
/// cluster never owns passage text itself.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Cluster {
    pub label: usize,
    pub member_indices: Vec<usize>,
    pub centroid: Vec<f32>,
    /// Mean cosine similarity of the members to the raw (unnormalised) centroid.
    pub coherence: f32,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.member_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.member_indices.is_empty()
    }
}

/// Representative text of one accepted cluster, the unit of MCQ generation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MergedContext {
    pub cluster_label: usize,
    /// Selected passages, highest centroid similarity first.
    pub passage_indices: Vec<usize>,
    pub text: String,
}

impl MergedContext {
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

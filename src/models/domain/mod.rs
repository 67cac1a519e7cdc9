pub mod cluster;
pub mod material;
pub mod mcq;
pub mod passage;
pub mod quiz;
pub use cluster::{Cluster, MergedContext};
pub use material::Material;
pub use mcq::{McqCandidate, Provenance};
pub use passage::Passage;
pub use quiz::{OptionLetter, Quiz};

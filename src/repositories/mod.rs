pub mod material_repository;
pub mod quiz_repository;

pub use material_repository::{MaterialRepository, MongoMaterialRepository};
pub use quiz_repository::{MongoQuizRepository, QuizRepository};

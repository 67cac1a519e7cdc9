pub mod ask_handler;
pub mod health_handler;
pub mod quiz_handler;

pub use ask_handler::ask_question;
pub use health_handler::{health_check, health_check_live, health_check_ready};
pub use quiz_handler::{generate_mcqs, list_material_quizzes};

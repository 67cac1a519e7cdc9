pub mod ask_service;
pub mod clustering;
pub mod context_selector;
pub mod document_service;
pub mod embedding_service;
pub mod generation_service;
pub mod material_service;
pub mod mcq_pipeline;
pub mod mcq_synthesis;
pub mod pacing;
pub mod pipeline_settings;
pub mod quiz_assembly;
pub mod quiz_generation_service;
pub mod quiz_service;
pub mod similarity;
pub mod vector_index;

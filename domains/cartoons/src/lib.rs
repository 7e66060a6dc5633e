//! Cartoons domain: generation pipeline, catalog, gallery

pub mod api;
pub mod domain;
pub mod pipeline;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::*;

// Re-export pipeline and repository types
pub use pipeline::{CartoonPipeline, GalleryReader, ImageSynthesizer, PipelineError, PromptExpander};
pub use repository::{connect, connect_in_memory, CartoonRepository, MIGRATOR};

// Re-export API types
pub use api::routes;
pub use api::CartoonsState;

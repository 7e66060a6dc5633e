//! Generation pipeline and gallery read path

pub mod error;
pub mod expander;
pub mod gallery;
pub mod orchestrator;
pub mod synthesizer;

pub use error::{PipelineError, Stage};
pub use expander::PromptExpander;
pub use gallery::{GalleryItem, GalleryPage, GalleryReader};
pub use orchestrator::CartoonPipeline;
pub use synthesizer::ImageSynthesizer;

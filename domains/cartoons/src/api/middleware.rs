//! Cartoons domain state

use std::sync::Arc;

use crate::pipeline::{CartoonPipeline, GalleryReader};

/// Application state for the Cartoons domain
#[derive(Clone)]
pub struct CartoonsState {
    pub pipeline: Arc<CartoonPipeline>,
    pub gallery: GalleryReader,
}

//! Image synthesis with the fixed house style

use std::sync::Arc;

use cartoonist_render::{ImageRequest, ImageService, OutputFormat};

use super::error::PipelineError;
use crate::domain::entities::{ExpandedPrompt, ImageArtifact};

pub const IMAGE_SIZE: u32 = 1024;
pub const OUTPUT_QUALITY: u8 = 100;
pub const OUTPUT_FORMAT: OutputFormat = OutputFormat::Webp;

/// Wrap an expanded prompt in the monochrome newspaper style
pub fn styled_prompt(prompt: &str) -> String {
    format!(
        "simple black and white cartoon drawing of {}, black and white political cartoon",
        prompt
    )
}

/// Renders one image per call and returns its transient URL. No retry.
#[derive(Clone)]
pub struct ImageSynthesizer {
    renderer: Arc<dyn ImageService>,
}

impl ImageSynthesizer {
    pub fn new(renderer: Arc<dyn ImageService>) -> Self {
        Self { renderer }
    }

    pub fn image_request(prompt: &ExpandedPrompt) -> ImageRequest {
        ImageRequest {
            prompt: styled_prompt(&prompt.text),
            width: IMAGE_SIZE,
            height: IMAGE_SIZE,
            output_format: OUTPUT_FORMAT,
            output_quality: OUTPUT_QUALITY,
            prompt_upsampling: true,
        }
    }

    pub async fn synthesize(
        &self,
        prompt: &ExpandedPrompt,
    ) -> Result<ImageArtifact, PipelineError> {
        let image = self
            .renderer
            .generate(Self::image_request(prompt))
            .await
            .map_err(|e| PipelineError::ImageModel {
                timed_out: e.is_timeout(),
                message: e.to_string(),
            })?;

        if image.url.trim().is_empty() {
            return Err(PipelineError::ImageModel {
                message: "Image model returned an empty output URL".to_string(),
                timed_out: false,
            });
        }

        tracing::debug!(prediction_id = ?image.prediction_id, "Image rendered");
        Ok(ImageArtifact {
            source_url: image.url,
        })
    }
}

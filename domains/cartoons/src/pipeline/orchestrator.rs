//! The generation pipeline
//!
//! expand -> synthesize -> fetch -> store -> record -> resolve, strictly in
//! that order. The first failing stage aborts the run. Nothing is rolled
//! back: a blob stored before a failed catalog insert stays orphaned, and a
//! retry by the caller mints a new key.

use std::sync::Arc;

use cartoonist_render::ArtifactFetcher;
use cartoonist_storage::{BlobStore, ObjectMetadata, PublicUrlResolver};
use tracing::Instrument;

use super::error::PipelineError;
use super::expander::PromptExpander;
use super::synthesizer::{ImageSynthesizer, OUTPUT_FORMAT};
use crate::domain::entities::{
    GenerationOutcome, GenerationRequest, ImageArtifact, ImageBytes, StorageKey,
};
use crate::repository::CartoonRepository;

#[derive(Clone)]
pub struct CartoonPipeline {
    expander: PromptExpander,
    synthesizer: ImageSynthesizer,
    fetcher: Arc<dyn ArtifactFetcher>,
    blobs: Arc<dyn BlobStore>,
    catalog: CartoonRepository,
    urls: PublicUrlResolver,
}

impl CartoonPipeline {
    pub fn new(
        expander: PromptExpander,
        synthesizer: ImageSynthesizer,
        fetcher: Arc<dyn ArtifactFetcher>,
        blobs: Arc<dyn BlobStore>,
        catalog: CartoonRepository,
        urls: PublicUrlResolver,
    ) -> Self {
        Self {
            expander,
            synthesizer,
            fetcher,
            blobs,
            catalog,
            urls,
        }
    }

    /// Turn a topic into a stored, catalogued cartoon
    pub async fn run(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, PipelineError> {
        let span = tracing::info_span!("cartoon_pipeline", key = tracing::field::Empty);
        let result = self.run_stages(request).instrument(span.clone()).await;

        if let Err(err) = &result {
            span.in_scope(|| {
                tracing::warn!(stage = %err.stage(), error = %err, "Pipeline aborted");
            });
        }
        result
    }

    async fn run_stages(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, PipelineError> {
        tracing::info!(topic_len = request.topic().len(), "Expanding topic");
        let prompt = self.expander.expand(request).await?;

        tracing::info!("Synthesizing image");
        let artifact = self.synthesizer.synthesize(&prompt).await?;

        let image = self.fetch(&artifact).await?;

        let key = StorageKey::new_random(OUTPUT_FORMAT);
        tracing::Span::current().record("key", key.as_str());

        self.store(&key, image).await?;

        let record = self
            .catalog
            .insert(key.as_str())
            .await
            .map_err(|e| PipelineError::MetadataWrite(e.to_string()))?;
        tracing::info!(id = record.id, "Catalog row written");

        Ok(GenerationOutcome {
            public_url: self.urls.resolve(key.as_str()),
            image_prompt: prompt.text,
            record,
        })
    }

    async fn fetch(&self, artifact: &ImageArtifact) -> Result<ImageBytes, PipelineError> {
        let fetched = self
            .fetcher
            .fetch(&artifact.source_url)
            .await
            .map_err(|e| PipelineError::ArtifactRetrieval(e.to_string()))?;

        tracing::info!(
            bytes = fetched.bytes.len(),
            content_type = ?fetched.content_type,
            "Fetched rendered image"
        );
        Ok(ImageBytes {
            data: fetched.bytes,
            reported_content_type: fetched.content_type,
        })
    }

    async fn store(&self, key: &StorageKey, image: ImageBytes) -> Result<(), PipelineError> {
        let metadata = ObjectMetadata::inline(OUTPUT_FORMAT.content_type());
        self.blobs
            .put(key.as_str(), image.data, &metadata)
            .await
            .map_err(|e| PipelineError::StorageWrite(e.to_string()))?;
        tracing::info!("Image stored");
        Ok(())
    }
}

//! Cartoonist Render Service
//!
//! Provides image synthesis via hosted model backends:
//! - Replicate predictions API for production (blocking request, poll fallback)
//! - Mock render service for testing and development
//! - Retrieval of the transient output URL into memory (`fetch`)

pub mod fetch;
pub mod mock;
pub mod replicate;

use std::time::Duration;

use cartoonist_common::config::parse_or;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fetch::{ArtifactFetcher, FetchError, FetchedImage, HttpArtifactFetcher};

const DEFAULT_MODEL: &str = "black-forest-labs/flux-1.1-pro";
const DEFAULT_TIMEOUT_SECS: u64 = 180;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Render configuration error: {0}")]
    Configuration(String),

    #[error("Render request error: {0}")]
    Request(String),

    #[error("Render response error: {0}")]
    Response(String),

    #[error("Render failed: {0}")]
    Failed(String),

    #[error("Render timed out after {0:?}")]
    Timeout(Duration),
}

impl RenderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RenderError::Timeout(_))
    }
}

/// Output encoding requested from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Webp,
    Png,
    Jpg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Webp => "webp",
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Webp => "image/webp",
            OutputFormat::Png => "image/png",
            OutputFormat::Jpg => "image/jpeg",
        }
    }
}

/// A single image generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub output_format: OutputFormat,
    pub output_quality: u8,
    pub prompt_upsampling: bool,
}

/// A finished render. `url` is transient and must be fetched promptly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedImage {
    pub url: String,
    pub prediction_id: Option<String>,
}

/// Render service configuration
#[derive(Clone)]
pub struct RenderConfig {
    /// Provider (replicate, mock)
    pub provider: String,
    pub api_token: String,
    /// `owner/name` of the hosted model
    pub model: String,
    /// Override for the provider API base URL
    pub base_url: Option<String>,
    /// Overall deadline for one render, polling included
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Timeout for retrieving the transient output URL
    pub fetch_timeout: Duration,
}

impl std::fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderConfig")
            .field("provider", &self.provider)
            .field("api_token", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("poll_interval", &self.poll_interval)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}

impl RenderConfig {
    /// Create render config from environment variables
    pub fn from_env() -> Result<Self, RenderError> {
        let provider = std::env::var("RENDER_PROVIDER").unwrap_or_else(|_| "mock".to_string());
        let api_token = std::env::var("REPLICATE_API_TOKEN").unwrap_or_default();

        if provider != "mock" && api_token.is_empty() {
            return Err(RenderError::Configuration(
                "REPLICATE_API_TOKEN is required for the replicate provider".to_string(),
            ));
        }

        Ok(Self {
            provider,
            api_token,
            model: std::env::var("RENDER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            base_url: std::env::var("RENDER_BASE_URL").ok(),
            timeout: Duration::from_secs(parse_or("RENDER_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)),
            poll_interval: Duration::from_millis(parse_or(
                "RENDER_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )),
            fetch_timeout: Duration::from_secs(parse_or(
                "FETCH_TIMEOUT_SECS",
                DEFAULT_FETCH_TIMEOUT_SECS,
            )),
        })
    }
}

/// Image synthesis trait for different model hosts
#[async_trait::async_trait]
pub trait ImageService: Send + Sync {
    /// Generate one image and return once it is fully rendered.
    /// Hosts that only support asynchronous jobs poll internally.
    async fn generate(&self, request: ImageRequest) -> Result<RenderedImage, RenderError>;
}

/// Factory for creating ImageService implementations
pub struct RenderServiceFactory;

impl RenderServiceFactory {
    pub fn create(config: RenderConfig) -> Result<Box<dyn ImageService>, RenderError> {
        match config.provider.as_str() {
            "replicate" => {
                tracing::info!(model = %config.model, "Creating Replicate render service");
                Ok(Box::new(replicate::ReplicateService::new(config)?))
            }
            "mock" => {
                tracing::info!("Creating mock render service");
                Ok(Box::new(mock::MockRenderService::new()))
            }
            provider => Err(RenderError::Configuration(format!(
                "Unknown render provider: {}. Supported providers: replicate, mock",
                provider
            ))),
        }
    }

    /// Fetcher matching the configured provider. The mock provider serves
    /// URLs nothing can resolve, so it gets the mock fetcher.
    pub fn create_fetcher(config: &RenderConfig) -> Result<Box<dyn ArtifactFetcher>, RenderError> {
        match config.provider.as_str() {
            "mock" => Ok(Box::new(mock::MockArtifactFetcher::new())),
            _ => Ok(Box::new(
                HttpArtifactFetcher::new(config.fetch_timeout)
                    .map_err(|e| RenderError::Configuration(e.to_string()))?,
            )),
        }
    }
}

//! Cartoonist application composition root
//!
//! Builds provider services from configuration and composes the domain
//! router with shared infrastructure routes and layers.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use cartoonist_cartoons::{
    CartoonPipeline, CartoonRepository, CartoonsState, GalleryReader, ImageSynthesizer,
    PromptExpander,
};
use cartoonist_common::Config;
use cartoonist_llm::{LlmConfig, LlmService, LlmServiceFactory};
use cartoonist_render::{ArtifactFetcher, ImageService, RenderConfig, RenderServiceFactory};
use cartoonist_storage::{BlobStore, BlobStoreFactory, PublicUrlResolver, StorageConfig};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 64 * 1024;

/// External collaborators of the generation pipeline
#[derive(Clone)]
pub struct Services {
    pub llm: Arc<dyn LlmService>,
    pub render: Arc<dyn ImageService>,
    pub fetcher: Arc<dyn ArtifactFetcher>,
    pub blobs: Arc<dyn BlobStore>,
}

impl Services {
    /// Build every provider from its environment configuration
    pub async fn from_env() -> Result<Self, anyhow::Error> {
        let llm_config = LlmConfig::from_env()?;
        tracing::info!(config = ?llm_config, "LLM configuration loaded");
        let render_config = RenderConfig::from_env()?;
        tracing::info!(config = ?render_config, "Render configuration loaded");
        let storage_config = StorageConfig::from_env()?;
        tracing::info!(config = ?storage_config, "Storage configuration loaded");

        let fetcher = RenderServiceFactory::create_fetcher(&render_config)?;

        Ok(Self {
            llm: Arc::from(LlmServiceFactory::create(llm_config)?),
            render: Arc::from(RenderServiceFactory::create(render_config)?),
            fetcher: Arc::from(fetcher),
            blobs: Arc::from(BlobStoreFactory::create(storage_config).await?),
        })
    }
}

/// Create the main application router with all routes
pub fn create_app(
    config: &Config,
    pool: SqlitePool,
    services: Services,
) -> Result<Router, anyhow::Error> {
    let urls = PublicUrlResolver::new(&config.public_bucket_base_url)?;
    let catalog = CartoonRepository::new(pool);

    let pipeline = CartoonPipeline::new(
        PromptExpander::new(services.llm),
        ImageSynthesizer::new(services.render),
        services.fetcher,
        services.blobs,
        catalog.clone(),
        urls.clone(),
    );

    let cartoons_state = CartoonsState {
        pipeline: Arc::new(pipeline),
        gallery: GalleryReader::new(catalog, urls),
    };

    let app = Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { "Cartoonist API v0.0.1-SNAPSHOT" }),
        )
        .merge(cartoonist_cartoons::routes().with_state(cartoons_state));

    Ok(app)
}

/// CORS for the gallery frontend. Permissive when no origins are configured.
pub fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    let origins = match origins.map(str::trim) {
        None | Some("*") => return CorsLayer::permissive(),
        Some(origins) => origins,
    };

    let allowed: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

pub fn body_limit_layer() -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(MAX_BODY_BYTES)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

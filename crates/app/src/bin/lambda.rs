//! Cartoonist API - AWS Lambda Runtime

use lambda_http::{run, Error};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cartoonist_app::{body_limit_layer, build_cors_layer, create_app, Services};
use cartoonist_common::config::Config;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cartoonist=info")),
        )
        .json()
        .without_time()
        .init();

    info!("Initializing Cartoonist API Lambda");

    let config =
        Config::from_env().map_err(|e| Error::from(format!("Configuration error: {}", e)))?;

    let pool =
        cartoonist_cartoons::connect(&config.database_url, config.database_acquire_timeout())
            .await
            .map_err(|e| Error::from(format!("Database error: {}", e)))?;

    info!("Database connection established");

    let services = Services::from_env()
        .await
        .map_err(|e| Error::from(format!("Provider initialization error: {}", e)))?;

    let app = create_app(&config, pool, services)
        .map_err(|e| Error::from(format!("App initialization error: {}", e)))?;

    let app = app
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(config.cors_allowed_origins.as_deref()))
        .layer(body_limit_layer());

    info!("Cartoonist API Lambda ready to serve requests");

    run(app).await
}

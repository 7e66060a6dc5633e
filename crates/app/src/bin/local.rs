// Cartoonist API - Local Development Server

use std::net::SocketAddr;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cartoonist_app::{body_limit_layer, build_cors_layer, create_app, Services};
use cartoonist_common::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cartoonist=debug,tower_http=info")),
        )
        .pretty()
        .init();

    info!("Starting Cartoonist API local development server");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");

    let pool =
        cartoonist_cartoons::connect(&config.database_url, config.database_acquire_timeout())
            .await
            .map_err(|e| {
                error!("Failed to open catalog database: {}", e);
                anyhow::anyhow!("Database connection failed: {}", e)
            })?;

    info!("Database connection established");

    let services = Services::from_env().await.map_err(|e| {
        error!("Failed to create provider services: {}", e);
        e
    })?;

    let app = create_app(&config, pool, services).map_err(|e| {
        error!("Failed to create application: {}", e);
        e
    })?;

    // Router::layer applies outermost-last, matching the original
    // ServiceBuilder order (trace -> cors -> body limit).
    let app = app
        .layer(body_limit_layer())
        .layer(build_cors_layer(config.cors_allowed_origins.as_deref()))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("Server starting on http://{}", addr);
    info!("Health check available at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}

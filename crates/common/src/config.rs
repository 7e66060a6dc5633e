//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config. Provider credentials live in
//! the provider crates (`LlmConfig`, `RenderConfig`, `StorageConfig`); this
//! struct only carries what the HTTP service itself needs.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite://cartoons.db";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Catalog database connection URL (SQLite)
    pub database_url: String,

    /// Seconds to wait for a pooled database connection
    pub database_acquire_timeout_secs: u64,

    /// Public base URL that stored keys are resolved against
    pub public_bucket_base_url: String,

    /// Comma-separated CORS origins; permissive when unset
    pub cors_allowed_origins: Option<String>,

    /// HTTP listen port for the local server
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let config = Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            database_acquire_timeout_secs: parse_or(
                "DATABASE_ACQUIRE_TIMEOUT_SECS",
                DEFAULT_ACQUIRE_TIMEOUT_SECS,
            ),

            public_bucket_base_url: env::var("PUBLIC_BUCKET_BASE_URL")
                .map_err(|_| anyhow::anyhow!("PUBLIC_BUCKET_BASE_URL is required"))?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .filter(|v| !v.trim().is_empty()),

            port: parse_or("PORT", DEFAULT_PORT),
        };

        Ok(config)
    }

    pub fn database_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.database_acquire_timeout_secs)
    }
}

/// Parse an environment variable, falling back to `default` when it is unset
/// or malformed.
pub fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring malformed environment value");
            default
        }),
        Err(_) => default,
    }
}

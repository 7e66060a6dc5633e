//! Cartoonist Object Storage
//!
//! Durable storage for rendered images:
//! - S3-compatible provider (AWS S3, Cloudflare R2, LocalStack) for production
//! - In-memory mock store for testing and development
//! - Resolution of stored keys to public URLs

use std::time::Duration;

use bytes::Bytes;
use cartoonist_common::config::parse_or;
use reqwest::Url;
use thiserror::Error;

pub mod mock;
pub mod s3;

const DEFAULT_REGION: &str = "auto";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage configuration error: {0}")]
    Configuration(String),

    #[error("Storage write error: {0}")]
    Write(String),

    #[error("Storage operation timed out")]
    Timeout,
}

/// Metadata attached to every stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub content_type: String,
    pub content_disposition: String,
}

impl ObjectMetadata {
    /// Inline image metadata so browsers render rather than download
    pub fn inline(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            content_disposition: "inline".to_string(),
        }
    }
}

/// Object storage configuration
#[derive(Clone)]
pub struct StorageConfig {
    /// Provider (s3, mock)
    pub provider: String,
    pub bucket: String,
    pub region: String,
    /// Custom endpoint (R2, LocalStack)
    pub endpoint_url: Option<String>,
    /// Static credentials; the default AWS chain is used when unset
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub force_path_style: bool,
    /// Sign with dummy credentials when no static keys are set
    pub localstack: bool,
    pub timeout: Duration,
}

impl std::fmt::Debug for StorageConfig {
    #[mutants::skip]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("provider", &self.provider)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("access_key_id", &self.access_key_id.as_ref().map(|_| "[REDACTED]"))
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("force_path_style", &self.force_path_style)
            .field("localstack", &self.localstack)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl StorageConfig {
    /// Create storage config from environment variables
    pub fn from_env() -> Result<Self, StorageError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("STORAGE_PROVIDER").unwrap_or_else(|_| "mock".to_string());
        let bucket = std::env::var("STORAGE_BUCKET").unwrap_or_default();

        if provider != "mock" && bucket.trim().is_empty() {
            return Err(StorageError::Configuration(
                "STORAGE_BUCKET is required for the s3 provider".to_string(),
            ));
        }

        Ok(Self {
            provider,
            bucket,
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            endpoint_url: std::env::var("AWS_ENDPOINT_URL").ok(),
            access_key_id: std::env::var("AWS_ACCESS_KEY_ID").ok(),
            secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
            force_path_style: parse_or("STORAGE_FORCE_PATH_STYLE", false),
            localstack: parse_or("STORAGE_LOCALSTACK", false),
            timeout: Duration::from_secs(parse_or("STORAGE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)),
        })
    }
}

/// Durable object storage
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `key`. A successful return means the object is
    /// durable and readable under that key.
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        metadata: &ObjectMetadata,
    ) -> Result<(), StorageError>;
}

/// Factory for creating BlobStore implementations
pub struct BlobStoreFactory;

impl BlobStoreFactory {
    pub async fn create(config: StorageConfig) -> Result<Box<dyn BlobStore>, StorageError> {
        match config.provider.as_str() {
            "s3" => {
                tracing::info!(bucket = %config.bucket, "Creating S3 blob store");
                Ok(Box::new(s3::S3BlobStore::new(config).await?))
            }
            "mock" => {
                tracing::info!("Creating in-memory mock blob store");
                Ok(Box::new(mock::MockBlobStore::new()))
            }
            provider => Err(StorageError::Configuration(format!(
                "Unknown storage provider: {}. Supported providers: s3, mock",
                provider
            ))),
        }
    }
}

/// Maps storage keys onto the public bucket URL
#[derive(Debug, Clone)]
pub struct PublicUrlResolver {
    base: Url,
}

impl PublicUrlResolver {
    pub fn new(base_url: &str) -> Result<Self, StorageError> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base = Url::parse(&normalized).map_err(|e| {
            StorageError::Configuration(format!("Invalid public bucket URL '{}': {}", base_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(StorageError::Configuration(format!(
                "Public bucket URL '{}' cannot be used as a base",
                base_url
            )));
        }
        Ok(Self { base })
    }

    pub fn base(&self) -> &str {
        self.base.as_str()
    }

    /// Public URL of `key`
    pub fn resolve(&self, key: &str) -> String {
        match self.base.join(key) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}{}", self.base, key),
        }
    }
}

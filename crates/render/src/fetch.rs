//! Transient artifact retrieval
//!
//! Render hosts serve outputs from short-lived URLs. The fetcher performs one
//! plain GET and hands back the whole body, since object stores need the
//! content length up front.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Artifact request failed: {0}")]
    Request(String),

    #[error("Artifact host returned status {0}")]
    Status(u16),

    #[error("Artifact request timed out")]
    Timeout,
}

/// Bytes retrieved from a transient URL
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Bytes,
    /// Content type reported by the host, if any
    pub content_type: Option<String>,
}

/// Retrieval of render outputs
#[async_trait::async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Retrieve the artifact at `url`. Never retried.
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError>;
}

/// reqwest-backed fetcher
pub struct HttpArtifactFetcher {
    client: Client,
}

impl HttpArtifactFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Request(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

fn map_transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Request(e.to_string())
    }
}

#[async_trait::async_trait]
impl ArtifactFetcher for HttpArtifactFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Artifact host returned non-success status");
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(map_transport_error)?;

        tracing::debug!(bytes = bytes.len(), content_type = ?content_type, "Fetched artifact");

        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }
}

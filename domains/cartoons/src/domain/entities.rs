//! Domain entities for the Cartoons domain
//!
//! Only `CartoonRecord` is durable. Everything else lives for the duration of
//! one pipeline run and is owned by the orchestrator.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cartoonist_common::{Error, Result};
use cartoonist_render::OutputFormat;

/// A validated topic. Non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    topic: String,
}

impl GenerationRequest {
    pub fn new(topic: impl AsRef<str>) -> Result<Self> {
        let topic = topic.as_ref().trim();
        if topic.is_empty() {
            return Err(Error::Validation("prompt must not be empty".to_string()));
        }
        Ok(Self {
            topic: topic.to_string(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Image prompt produced by the language model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpandedPrompt {
    pub text: String,
}

/// A rendered image at a transient URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArtifact {
    pub source_url: String,
}

/// Fetched image payload
#[derive(Debug, Clone)]
pub struct ImageBytes {
    pub data: Bytes,
    /// Content type reported by the render host
    pub reported_content_type: Option<String>,
}

/// Object key in the public bucket: `<uuid-v4>.<ext>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// Mint a fresh random key for `format`
    pub fn new_random(format: OutputFormat) -> Self {
        Self(format!("{}.{}", Uuid::new_v4(), format.extension()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Catalog row for a stored cartoon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartoonRecord {
    pub id: i64,
    pub key: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub public_url: String,
    pub image_prompt: String,
    pub record: CartoonRecord,
}

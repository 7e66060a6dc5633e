//! S3-compatible Blob Store Implementation
//!
//! Writes objects with `PutObject`. Works against AWS S3, Cloudflare R2 and
//! LocalStack by pointing `AWS_ENDPOINT_URL` at the provider.

use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::SharedCredentialsProvider;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;

use crate::{BlobStore, ObjectMetadata, StorageConfig, StorageError};

/// S3 blob store implementation
pub struct S3BlobStore {
    client: S3Client,
    bucket: String,
}

impl S3BlobStore {
    /// Create a new S3 blob store
    pub async fn new(config: StorageConfig) -> Result<Self, StorageError> {
        if config.bucket.trim().is_empty() {
            return Err(StorageError::Configuration(
                "STORAGE_BUCKET is required for the s3 provider".to_string(),
            ));
        }

        let timeouts = TimeoutConfig::builder()
            .operation_timeout(config.timeout)
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .timeout_config(timeouts);

        if let Some(endpoint_url) = config.endpoint_url.as_ref() {
            tracing::info!("Using custom storage endpoint: {}", endpoint_url);
            loader = loader.endpoint_url(endpoint_url);
        }

        if let Some(credentials) = credentials_override(&config) {
            loader = loader.credentials_provider(SharedCredentialsProvider::new(credentials));
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        Ok(Self {
            client: S3Client::from_conf(s3_config),
            bucket: config.bucket,
        })
    }
}

/// Credentials that replace the default AWS chain, if any. Static keys win.
/// Dummy keys are only for LocalStack; otherwise the default chain applies.
fn credentials_override(config: &StorageConfig) -> Option<Credentials> {
    match (&config.access_key_id, &config.secret_access_key) {
        (Some(key), Some(secret)) => Some(Credentials::new(
            key,
            secret,
            None,
            None,
            "cartoonist-storage-static",
        )),
        _ if config.localstack => Some(Credentials::new(
            "test-access-key",
            "test-secret-key",
            None,
            None,
            "localstack-storage-provider",
        )),
        _ => None,
    }
}

#[async_trait::async_trait]
impl BlobStore for S3BlobStore {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        metadata: &ObjectMetadata,
    ) -> Result<(), StorageError> {
        let size = data.len();
        tracing::debug!(bucket = %self.bucket, key, bytes = size, "Putting object");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(&metadata.content_type)
            .content_disposition(&metadata.content_disposition)
            .content_length(size as i64)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| match e {
                SdkError::TimeoutError(_) => StorageError::Timeout,
                other => StorageError::Write(format!(
                    "Failed to put object {}: {}",
                    key,
                    DisplayErrorContext(&other)
                )),
            })?;

        tracing::info!(bucket = %self.bucket, key, bytes = size, "Stored object");
        Ok(())
    }
}

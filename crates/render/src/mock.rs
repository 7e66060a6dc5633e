//! Mock Render Service Implementation
//!
//! Programmable mocks for testing render workflows:
//! - `MockRenderService`: configurable outcome with request recording
//! - `MockArtifactFetcher`: serves canned bytes for any URL
//! - `MockOutcome`: Complete, Fail, Timeout, or MissingOutput

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use bytes::Bytes;

use crate::fetch::{ArtifactFetcher, FetchError, FetchedImage};
use crate::{ImageRequest, ImageService, RenderError, RenderedImage};

const DEFAULT_DELAY_MS: u64 = 0;
const MOCK_OUTPUT_HOST: &str = "https://mock.render.local/outputs";

/// Smallest valid lossless webp (1x1 transparent pixel)
pub const MOCK_WEBP: &[u8] = &[
    0x52, 0x49, 0x46, 0x46, 0x1a, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50, 0x56, 0x50, 0x38,
    0x4c, 0x0d, 0x00, 0x00, 0x00, 0x2f, 0x00, 0x00, 0x00, 0x10, 0x07, 0x10, 0x11, 0x11, 0x88,
    0x88, 0xfe, 0x07, 0x00,
];

/// What outcome the mock should produce
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MockOutcome {
    /// Return a rendered image URL
    #[default]
    Complete,
    /// Fail with the given message
    Fail,
    /// Fail as if the render deadline passed
    Timeout,
    /// Succeed without an output URL
    MissingOutput,
}

/// Programmable behavior for the mock render service
#[derive(Debug, Clone)]
pub struct MockRenderBehavior {
    pub outcome: Arc<RwLock<MockOutcome>>,
    pub delay_ms: Arc<RwLock<u64>>,
    pub failure_message: Arc<RwLock<String>>,
    /// Fixed output URL; a unique one per call when unset
    pub output_url: Arc<RwLock<Option<String>>>,
}

impl Default for MockRenderBehavior {
    fn default() -> Self {
        Self {
            outcome: Arc::new(RwLock::new(MockOutcome::Complete)),
            delay_ms: Arc::new(RwLock::new(DEFAULT_DELAY_MS)),
            failure_message: Arc::new(RwLock::new("Mock render failure".to_string())),
            output_url: Arc::new(RwLock::new(None)),
        }
    }
}

impl MockRenderBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the mock outcome
    pub fn set_outcome(&self, outcome: MockOutcome) {
        *self.outcome.write().unwrap() = outcome;
    }

    /// Configure delay before responding
    pub fn set_delay_ms(&self, delay: u64) {
        *self.delay_ms.write().unwrap() = delay;
    }

    pub fn set_failure_message(&self, message: impl Into<String>) {
        *self.failure_message.write().unwrap() = message.into();
    }

    pub fn set_output_url(&self, url: impl Into<String>) {
        *self.output_url.write().unwrap() = Some(url.into());
    }

    /// Reset to default behavior
    pub fn reset(&self) {
        *self.outcome.write().unwrap() = MockOutcome::Complete;
        *self.delay_ms.write().unwrap() = DEFAULT_DELAY_MS;
        *self.failure_message.write().unwrap() = "Mock render failure".to_string();
        *self.output_url.write().unwrap() = None;
    }
}

/// Mock render service for testing
#[derive(Debug, Clone, Default)]
pub struct MockRenderService {
    behavior: MockRenderBehavior,
    requests: Arc<Mutex<Vec<ImageRequest>>>,
}

impl MockRenderService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a shared behavior handle
    pub fn with_behavior(behavior: MockRenderBehavior) -> Self {
        Self {
            behavior,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn behavior(&self) -> &MockRenderBehavior {
        &self.behavior
    }

    pub fn recorded_requests(&self) -> Vec<ImageRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ImageService for MockRenderService {
    async fn generate(&self, request: ImageRequest) -> Result<RenderedImage, RenderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };

        let delay = *self.behavior.delay_ms.read().unwrap();
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let outcome = self.behavior.outcome.read().unwrap().clone();
        tracing::info!(outcome = ?outcome, call, "Mock render service processing request");

        match outcome {
            MockOutcome::Complete => {
                let url = self
                    .behavior
                    .output_url
                    .read()
                    .unwrap()
                    .clone()
                    .unwrap_or_else(|| {
                        format!(
                            "{}/{}.{}",
                            MOCK_OUTPUT_HOST,
                            call,
                            request.output_format.extension()
                        )
                    });
                Ok(RenderedImage {
                    url,
                    prediction_id: Some(format!("mock-{}", call)),
                })
            }
            MockOutcome::Fail => Err(RenderError::Failed(
                self.behavior.failure_message.read().unwrap().clone(),
            )),
            MockOutcome::Timeout => Err(RenderError::Timeout(Duration::from_millis(delay))),
            MockOutcome::MissingOutput => Err(RenderError::Response(
                "Prediction succeeded without an output URL".to_string(),
            )),
        }
    }
}

/// Mock artifact fetcher. Serves `payload` for every URL unless a failure
/// status is configured.
#[derive(Debug, Clone)]
pub struct MockArtifactFetcher {
    payload: Arc<RwLock<Bytes>>,
    failure_status: Arc<RwLock<Option<u16>>>,
    urls: Arc<Mutex<Vec<String>>>,
}

impl Default for MockArtifactFetcher {
    fn default() -> Self {
        Self {
            payload: Arc::new(RwLock::new(Bytes::from_static(MOCK_WEBP))),
            failure_status: Arc::new(RwLock::new(None)),
            urls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockArtifactFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_payload(&self, payload: impl Into<Bytes>) {
        *self.payload.write().unwrap() = payload.into();
    }

    /// Make every fetch fail with `status`; `None` restores success
    pub fn set_failure_status(&self, status: Option<u16>) {
        *self.failure_status.write().unwrap() = status;
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ArtifactFetcher for MockArtifactFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        self.urls.lock().unwrap().push(url.to_string());

        if let Some(status) = *self.failure_status.read().unwrap() {
            return Err(FetchError::Status(status));
        }

        Ok(FetchedImage {
            bytes: self.payload.read().unwrap().clone(),
            content_type: Some("image/webp".to_string()),
        })
    }
}

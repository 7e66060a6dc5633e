//! Replicate Predictions Implementation
//!
//! Creates a prediction with `Prefer: wait` so most renders complete within the
//! first response. Predictions still running when the wait window closes are
//! polled until they reach a terminal status or the render deadline passes.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::{ImageRequest, ImageService, RenderConfig, RenderError, RenderedImage};

const DEFAULT_BASE_URL: &str = "https://api.replicate.com";

/// Replicate holds a synchronous request open for at most this long
const MAX_PREFER_WAIT_SECS: u64 = 60;

#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    input: PredictionInput<'a>,
}

#[derive(Debug, Serialize)]
struct PredictionInput<'a> {
    prompt: &'a str,
    prompt_upsampling: bool,
    width: u32,
    height: u32,
    output_quality: u8,
    output_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: PredictionStatus,
    #[serde(default)]
    output: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    get: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    fn is_terminal(self) -> bool {
        matches!(
            self,
            PredictionStatus::Succeeded | PredictionStatus::Failed | PredictionStatus::Canceled
        )
    }
}

/// Replicate render service implementation
pub struct ReplicateService {
    client: Client,
    config: RenderConfig,
    base_url: String,
}

impl ReplicateService {
    pub fn new(config: RenderConfig) -> Result<Self, RenderError> {
        if config.api_token.is_empty() {
            return Err(RenderError::Configuration(
                "REPLICATE_API_TOKEN is required for the replicate provider".to_string(),
            ));
        }
        if !config.model.contains('/') {
            return Err(RenderError::Configuration(format!(
                "RENDER_MODEL must be owner/name, got '{}'",
                config.model
            )));
        }

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                RenderError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    fn prefer_wait_secs(&self) -> u64 {
        self.config.timeout.as_secs().clamp(1, MAX_PREFER_WAIT_SECS)
    }

    async fn create_prediction(&self, request: &ImageRequest) -> Result<Prediction, RenderError> {
        let url = format!("{}/v1/models/{}/predictions", self.base_url, self.config.model);
        let body = PredictionRequest {
            input: PredictionInput {
                prompt: &request.prompt,
                prompt_upsampling: request.prompt_upsampling,
                width: request.width,
                height: request.height,
                output_quality: request.output_quality,
                output_format: request.output_format.extension(),
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_token)
            .header("Prefer", format!("wait={}", self.prefer_wait_secs()))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.read_prediction(response).await
    }

    async fn get_prediction(&self, prediction: &Prediction) -> Result<Prediction, RenderError> {
        let url = prediction
            .urls
            .as_ref()
            .and_then(|u| u.get.clone())
            .unwrap_or_else(|| format!("{}/v1/predictions/{}", self.base_url, prediction.id));

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_token)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.read_prediction(response).await
    }

    async fn read_prediction(&self, response: reqwest::Response) -> Result<Prediction, RenderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(RenderError::Response(format!(
                "Replicate API returned {}: {}",
                status, body
            )));
        }

        response
            .json::<Prediction>()
            .await
            .map_err(|e| RenderError::Response(format!("Failed to parse prediction: {}", e)))
    }

    fn transport_error(&self, e: reqwest::Error) -> RenderError {
        if e.is_timeout() {
            RenderError::Timeout(self.config.timeout)
        } else {
            RenderError::Request(format!("HTTP request failed: {}", e))
        }
    }
}

/// First URL in a prediction output. Image models return either a single
/// URL or a list of them.
fn output_url(output: Option<&serde_json::Value>) -> Option<String> {
    match output? {
        serde_json::Value::String(url) if !url.is_empty() => Some(url.clone()),
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .find(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

fn finish(prediction: Prediction) -> Result<RenderedImage, RenderError> {
    match prediction.status {
        PredictionStatus::Succeeded => {
            let url = output_url(prediction.output.as_ref()).ok_or_else(|| {
                RenderError::Response(format!(
                    "Prediction {} succeeded without an output URL",
                    prediction.id
                ))
            })?;
            Ok(RenderedImage {
                url,
                prediction_id: Some(prediction.id),
            })
        }
        PredictionStatus::Canceled => Err(RenderError::Failed(format!(
            "Prediction {} was canceled",
            prediction.id
        ))),
        _ => {
            let reason = match prediction.error {
                Some(serde_json::Value::String(s)) => s,
                Some(other) => other.to_string(),
                None => "no error detail".to_string(),
            };
            Err(RenderError::Failed(reason))
        }
    }
}

impl ReplicateService {
    async fn run_prediction(
        &self,
        request: &ImageRequest,
        deadline: Instant,
    ) -> Result<Prediction, RenderError> {
        let mut prediction = self.create_prediction(request).await?;

        while !prediction.status.is_terminal() {
            let now = Instant::now();
            if now >= deadline {
                return Err(RenderError::Timeout(self.config.timeout));
            }
            let pause = self.config.poll_interval.min(deadline - now);
            tracing::debug!(
                prediction_id = %prediction.id,
                status = ?prediction.status,
                "Prediction still running, polling"
            );
            tokio::time::sleep(pause).await;
            prediction = self.get_prediction(&prediction).await?;
        }

        Ok(prediction)
    }
}

#[async_trait::async_trait]
impl ImageService for ReplicateService {
    async fn generate(&self, request: ImageRequest) -> Result<RenderedImage, RenderError> {
        // Deadline covers the create call and every poll
        let deadline = Instant::now() + self.config.timeout;

        tracing::debug!(
            model = %self.config.model,
            width = request.width,
            height = request.height,
            "Creating Replicate prediction"
        );

        let prediction =
            match tokio::time::timeout_at(deadline, self.run_prediction(&request, deadline)).await {
                Ok(result) => result?,
                Err(_) => {
                    tracing::warn!(timeout = ?self.config.timeout, "Render deadline passed");
                    return Err(RenderError::Timeout(self.config.timeout));
                }
            };

        tracing::info!(prediction_id = %prediction.id, status = ?prediction.status, "Prediction finished");
        finish(prediction)
    }
}

impl std::fmt::Debug for ReplicateService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicateService")
            .field("config", &self.config)
            .field("base_url", &self.base_url)
            .finish()
    }
}

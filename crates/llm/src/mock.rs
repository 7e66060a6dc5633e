//! Mock LLM Service Implementation
//!
//! Used by `LlmServiceFactory` when provider is `"mock"`, and by tests that
//! need to script replies or failures. Every request is recorded.

use std::sync::{Arc, Mutex, RwLock};

use crate::{CompletionRequest, CompletionResponse, LlmError, LlmService};

const MOCK_MODEL: &str = "mock-model";

/// What the next completions should do
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MockLlmOutcome {
    /// Deterministic reply derived from the last user message
    #[default]
    Echo,
    /// Reply with this exact content
    Reply(String),
    /// Fail as if the upstream were unreachable
    Fail,
    /// Fail as if the request timed out
    Timeout,
}

/// Mock LLM service for testing
#[derive(Debug, Clone, Default)]
pub struct MockLlmService {
    outcome: Arc<RwLock<MockLlmOutcome>>,
    history: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmService {
    /// Create a new mock LLM service
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that always replies with `content`
    pub fn replying(content: impl Into<String>) -> Self {
        let service = Self::new();
        service.set_outcome(MockLlmOutcome::Reply(content.into()));
        service
    }

    pub fn set_outcome(&self, outcome: MockLlmOutcome) {
        *self.outcome.write().unwrap() = outcome;
    }

    /// Requests received so far
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.history.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.history.lock().unwrap().len()
    }

    /// Build the echo reply. Structured requests get a JSON object that fills
    /// every required field so callers can parse it like a real response.
    fn echo(request: &CompletionRequest) -> String {
        let last_message = request
            .messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or("empty");
        let text = format!("Mock response to: {}", last_message);

        match &request.response_schema {
            Some(schema) => {
                let object: serde_json::Map<String, serde_json::Value> = schema
                    .required_fields()
                    .into_iter()
                    .map(|field| (field.to_string(), serde_json::Value::String(text.clone())))
                    .collect();
                serde_json::Value::Object(object).to_string()
            }
            None => text,
        }
    }
}

#[async_trait::async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        tracing::info!("Mock LLM service processing completion request");
        self.history.lock().unwrap().push(request.clone());

        let outcome = self.outcome.read().unwrap().clone();
        let content = match outcome {
            MockLlmOutcome::Echo => Self::echo(&request),
            MockLlmOutcome::Reply(content) => content,
            MockLlmOutcome::Fail => {
                return Err(LlmError::Request("Mock LLM failure".to_string()));
            }
            MockLlmOutcome::Timeout => return Err(LlmError::Timeout),
        };

        let model = if request.model.is_empty() {
            MOCK_MODEL.to_string()
        } else {
            request.model
        };
        let input_tokens = request
            .messages
            .iter()
            .map(|m| m.content.len() as i32 / 4)
            .sum::<i32>();
        let output_tokens = content.len() as i32 / 4;

        Ok(CompletionResponse {
            content,
            model,
            input_tokens,
            output_tokens,
            stop_reason: "stop".to_string(),
        })
    }

    fn default_model(&self) -> &str {
        MOCK_MODEL
    }
}

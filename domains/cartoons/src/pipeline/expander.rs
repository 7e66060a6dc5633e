//! Topic to image prompt expansion

use std::sync::Arc;

use cartoonist_llm::{CompletionRequest, LlmMessage, LlmService, ResponseSchema};
use serde::Deserialize;

use super::error::PipelineError;
use crate::domain::entities::{ExpandedPrompt, GenerationRequest};

pub const SYSTEM_PROMPT: &str = "You write image prompts for political cartoons. \
Cartoon must be simple which you find in the newspaper with text bubble, \
it should be humorous and controversial. There should be a joke.";

const SCHEMA_NAME: &str = "cartoon";
const PROMPT_FIELD: &str = "imagePrompt";
const PROMPT_FIELD_DESCRIPTION: &str = "The image prompt used to describe the cartoon";
const TEMPERATURE: f32 = 1.0;

#[derive(Debug, Deserialize)]
struct StructuredPrompt {
    #[serde(rename = "imagePrompt")]
    image_prompt: String,
}

pub fn user_message(topic: &str) -> String {
    format!("Generate image prompt for the following text: {}", topic)
}

/// Asks the language model for an image prompt. One call, no retry.
#[derive(Clone)]
pub struct PromptExpander {
    llm: Arc<dyn LlmService>,
}

impl PromptExpander {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self { llm }
    }

    fn completion_request(&self, request: &GenerationRequest) -> CompletionRequest {
        CompletionRequest {
            system_prompt: Some(SYSTEM_PROMPT.to_string()),
            messages: vec![LlmMessage::user(user_message(request.topic()))],
            temperature: Some(TEMPERATURE),
            response_schema: Some(ResponseSchema::single_string_field(
                SCHEMA_NAME,
                PROMPT_FIELD,
                PROMPT_FIELD_DESCRIPTION,
            )),
            ..Default::default()
        }
    }

    pub async fn expand(
        &self,
        request: &GenerationRequest,
    ) -> Result<ExpandedPrompt, PipelineError> {
        let response = self
            .llm
            .complete(self.completion_request(request))
            .await
            .map_err(|e| PipelineError::LanguageModel(e.to_string()))?;

        tracing::debug!(
            model = %response.model,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Language model responded"
        );

        let parsed: StructuredPrompt = serde_json::from_str(&response.content).map_err(|e| {
            PipelineError::LanguageModel(format!("Malformed structured output: {}", e))
        })?;

        let text = parsed.image_prompt.trim();
        if text.is_empty() {
            return Err(PipelineError::LanguageModel(
                "Language model returned an empty image prompt".to_string(),
            ));
        }

        Ok(ExpandedPrompt {
            text: text.to_string(),
        })
    }
}

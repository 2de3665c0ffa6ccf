//! Anthropic API provider
//!
//! Direct HTTP implementation for the Anthropic Messages API, streamed.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::sse::fragments_from_sse;
use super::{error_for_status, retry_after};
use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, LlmRequest, TextFragment, TextStream};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

// Translations of a full chunk run long; the Messages API requires a cap
const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Provider for direct Anthropic API calls
pub struct AnthropicProvider {
    model: String,
    api_url: String,
    api_key: String,
    client: Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider
    pub fn new(model: &str, api_key: String, base_url: Option<&str>) -> Result<Self> {
        let client = Client::new();

        Ok(Self {
            model: model.to_string(),
            api_url: base_url.unwrap_or(ANTHROPIC_API_URL).to_string(),
            api_key,
            client,
        })
    }
}

// Anthropic API request/response types

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    ContentBlockDelta { delta: Delta },
    Error { error: ApiError },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Delta {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

fn parse_event(data: &str) -> Option<Result<TextFragment>> {
    let event = match serde_json::from_str::<StreamEvent>(data) {
        Ok(event) => event,
        Err(e) => {
            return Some(Err(LlmError::Stream(format!(
                "Failed to parse event: {}",
                e
            ))));
        }
    };

    match event {
        StreamEvent::ContentBlockDelta { delta } => Some(Ok(TextFragment { text: delta.text })),
        StreamEvent::Error { error } => Some(Err(LlmError::Stream(error.message))),
        StreamEvent::Other => Some(Ok(TextFragment::empty())),
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn stream(&self, request: LlmRequest) -> Result<TextStream> {
        let api_request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            stream: true,
            system: request.system_prompt.clone(),
            temperature: request.temperature,
            messages: vec![Message {
                role: "user".to_string(),
                content: request.prompt,
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| LlmError::ApiError {
                message: format!("Request failed: {}", e),
                status_code: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after(&response);
            let error_text = response.text().await.unwrap_or_default();
            let message =
                if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                    error_response.error.message
                } else {
                    error_text
                };

            return Err(error_for_status(status, message, retry_after));
        }

        Ok(fragments_from_sse(response.bytes_stream(), parse_event))
    }

    fn name(&self) -> &'static str {
        "Anthropic API"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

//! OpenAI-compatible API provider
//!
//! Used for providers that implement the OpenAI chat completions API:
//! - OpenRouter
//! - Cerebras
//! - And others

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::sse::fragments_from_sse;
use super::{error_for_status, retry_after};
use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, LlmRequest, TextFragment, TextStream};

/// Provider for OpenAI-compatible APIs
pub struct OpenAICompatibleProvider {
    model: String,
    base_url: String,
    api_key: String,
    name: &'static str,
    client: Client,
}

impl OpenAICompatibleProvider {
    /// Create a new OpenAI-compatible provider
    pub fn new(model: &str, base_url: &str, api_key: String, name: &'static str) -> Result<Self> {
        let client = Client::new();

        Ok(Self {
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            name,
            client,
        })
    }

    /// Create an OpenRouter provider
    pub fn openrouter(model: &str, api_key: String, base_url: Option<&str>) -> Result<Self> {
        Self::new(
            model,
            base_url.unwrap_or("https://openrouter.ai/api/v1"),
            api_key,
            "OpenRouter",
        )
    }

    /// Create a Cerebras provider
    pub fn cerebras(model: &str, api_key: String, base_url: Option<&str>) -> Result<Self> {
        Self::new(
            model,
            base_url.unwrap_or("https://api.cerebras.ai/v1"),
            api_key,
            "Cerebras",
        )
    }

    fn build_request(&self, request: &LlmRequest) -> ChatCompletionRequest {
        let mut messages = Vec::new();

        if let Some(system) = &request.system_prompt {
            messages.push(Message {
                role: "system".to_string(),
                content: system.clone(),
            });
        }

        messages.push(Message {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            stream: true,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

// OpenAI API request/response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: Delta,
}

#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

fn parse_chunk(data: &str) -> Option<Result<TextFragment>> {
    if data == "[DONE]" {
        return None;
    }

    // Some gateways report failures inside the stream
    if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(data) {
        return Some(Err(LlmError::Stream(error_response.error.message)));
    }

    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => Some(Ok(TextFragment {
            text: chunk.choices.into_iter().next().and_then(|c| c.delta.content),
        })),
        Err(e) => Some(Err(LlmError::Stream(format!(
            "Failed to parse chunk: {}",
            e
        )))),
    }
}

#[async_trait]
impl LlmProvider for OpenAICompatibleProvider {
    async fn stream(&self, request: LlmRequest) -> Result<TextStream> {
        let chat_request = self.build_request(&request);

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&chat_request)
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

        Ok(fragments_from_sse(response.bytes_stream(), parse_chunk))
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_enables_streaming() {
        let provider = OpenAICompatibleProvider::openrouter("some/model", "key".into(), None).unwrap();
        let request = LlmRequest {
            system_prompt: Some("You translate.".into()),
            ..LlmRequest::new("Translate")
        };

        let json = serde_json::to_value(provider.build_request(&request)).unwrap();
        assert_eq!(json["stream"], true);
        assert_eq!(json["model"], "some/model");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Translate");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_custom_base_url_is_trimmed() {
        let provider =
            OpenAICompatibleProvider::cerebras("llama", "key".into(), Some("http://proxy/v1/")).unwrap();
        assert_eq!(provider.base_url, "http://proxy/v1");
        assert_eq!(provider.name(), "Cerebras");
    }

    #[test]
    fn test_parse_chunk_delta() {
        let data = r#"{"id":"x","choices":[{"index":0,"delta":{"content":"Bonjour"}}]}"#;
        assert_eq!(
            parse_chunk(data).unwrap().unwrap(),
            TextFragment::text("Bonjour")
        );
    }

    #[test]
    fn test_parse_chunk_role_only_delta_has_no_text() {
        let data = r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_chunk(data).unwrap().unwrap(), TextFragment::empty());
    }

    #[test]
    fn test_parse_chunk_done_and_error() {
        assert!(parse_chunk("[DONE]").is_none());

        let err = parse_chunk(r#"{"error":{"message":"quota exceeded"}}"#)
            .unwrap()
            .unwrap_err();
        assert_eq!(err.to_string(), "Stream error: quota exceeded");
    }
}

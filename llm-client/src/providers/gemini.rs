//! Google Gemini provider
//!
//! Streams from the Generative Language API (`streamGenerateContent`) using
//! server-sent events.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::sse::fragments_from_sse;
use super::{error_for_status, retry_after};
use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, LlmRequest, TextFragment, TextStream};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Provider for the Gemini API
pub struct GeminiProvider {
    model: String,
    base_url: String,
    api_key: String,
    client: Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(model: &str, api_key: String) -> Result<Self> {
        Self::with_base_url(model, GEMINI_API_URL, api_key)
    }

    /// Create a provider against a custom endpoint (proxies, test servers)
    pub fn with_base_url(model: &str, base_url: &str, api_key: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey {
                provider: "Gemini".to_string(),
                env_var: "GOOGLE_API_KEY".to_string(),
            });
        }

        Ok(Self {
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        })
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }
}

// Gemini API request/response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
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

fn build_request(request: &LlmRequest) -> GenerateContentRequest {
    let generation_config = if request.max_tokens.is_some() || request.temperature.is_some() {
        Some(GenerationConfig {
            max_output_tokens: request.max_tokens,
            temperature: request.temperature,
        })
    } else {
        None
    };

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![RequestPart {
                text: request.prompt.clone(),
            }],
        }],
        system_instruction: request.system_prompt.as_ref().map(|system| Content {
            role: None,
            parts: vec![RequestPart {
                text: system.clone(),
            }],
        }),
        generation_config,
    }
}

/// Parse one SSE payload into a fragment.
///
/// A chunk whose candidates hold no text (safety ratings, finish reason)
/// becomes an empty fragment rather than an error.
fn parse_chunk(data: &str) -> Option<Result<TextFragment>> {
    let chunk: GenerateContentChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            return Some(Err(LlmError::Stream(format!(
                "Failed to parse Gemini chunk: {}",
                e
            ))));
        }
    };

    let text: String = chunk
        .candidates
        .iter()
        .filter_map(|c| c.content.as_ref())
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| p.text.as_deref())
        .collect();

    if text.is_empty() {
        Some(Ok(TextFragment::empty()))
    } else {
        Some(Ok(TextFragment::text(text)))
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn stream(&self, request: LlmRequest) -> Result<TextStream> {
        let api_request = build_request(&request);

        log::debug!(
            "Gemini request: model={} prompt_chars={}",
            self.model,
            request.prompt.chars().count()
        );

        let response = self
            .client
            .post(self.stream_url())
            .header("x-goog-api-key", &self.api_key)
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

        Ok(fragments_from_sse(response.bytes_stream(), parse_chunk))
    }

    fn name(&self) -> &'static str {
        "Gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

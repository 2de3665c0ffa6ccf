use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use std::pin::Pin;

use crate::error::{LlmError, Result};

/// Request to send to an LLM provider
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl LlmRequest {
    /// Create a request carrying only a user prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            max_tokens: None,
            temperature: None,
        }
    }
}

/// One piece of a streamed response.
///
/// Providers emit fragments for every event they receive; events that carry
/// no text (role headers, finish markers, safety metadata) have `text: None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextFragment {
    pub text: Option<String>,
}

impl TextFragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    pub fn empty() -> Self {
        Self { text: None }
    }
}

/// Finite, single-pass stream of response fragments
pub type TextStream = Pin<Box<dyn Stream<Item = Result<TextFragment>> + Send>>;

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Start a streaming completion
    async fn stream(&self, request: LlmRequest) -> Result<TextStream>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// Model identifier requests are sent to
    fn model(&self) -> &str;
}

/// Drain a fragment stream into a single string.
///
/// Fragments without text are skipped. The first stream error is returned
/// as-is, and a stream that never carried any text is an
/// [`LlmError::EmptyResponse`].
pub async fn collect_text(mut stream: TextStream) -> Result<String> {
    let mut content = String::new();
    let mut saw_text = false;

    while let Some(fragment) = stream.next().await {
        if let Some(text) = fragment?.text {
            if text.is_empty() {
                continue;
            }
            saw_text = true;
            content.push_str(&text);
        }
    }

    if !saw_text {
        return Err(LlmError::EmptyResponse);
    }

    Ok(content)
}

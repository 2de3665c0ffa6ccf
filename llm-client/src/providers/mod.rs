//! LLM provider implementations

mod anthropic;
mod gemini;
pub mod mock;
mod openai_compatible;
pub mod sse;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use mock::{MockProvider, MockReply};
pub use openai_compatible::OpenAICompatibleProvider;

use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;

use crate::config::{ModelPreset, ProviderConfig};
use crate::error::{LlmError, Result};
use crate::provider::LlmProvider;

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Anthropic,
    OpenRouter,
    Cerebras,
}

impl ProviderKind {
    /// Parse provider kind from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "anthropic" => Ok(Self::Anthropic),
            "openrouter" => Ok(Self::OpenRouter),
            "cerebras" => Ok(Self::Cerebras),
            _ => Err(LlmError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GOOGLE_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
            Self::Cerebras => "CEREBRAS_API_KEY",
        }
    }

    /// Display name used in error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gemini => "Gemini",
            Self::Anthropic => "Anthropic",
            Self::OpenRouter => "OpenRouter",
            Self::Cerebras => "Cerebras",
        }
    }
}

/// Create a provider instance from a preset and optional config
pub fn get_provider(
    preset: &ModelPreset,
    provider_config: Option<&ProviderConfig>,
) -> Result<Box<dyn LlmProvider>> {
    let kind = ProviderKind::from_str(&preset.provider)?;
    let api_key = get_api_key(provider_config, kind)?;
    let base_url = provider_config.and_then(|c| c.base_url.as_deref());

    match kind {
        ProviderKind::Gemini => match base_url {
            Some(url) => Ok(Box::new(GeminiProvider::with_base_url(
                &preset.model,
                url,
                api_key,
            )?)),
            None => Ok(Box::new(GeminiProvider::new(&preset.model, api_key)?)),
        },
        ProviderKind::Anthropic => Ok(Box::new(AnthropicProvider::new(
            &preset.model,
            api_key,
            base_url,
        )?)),
        ProviderKind::OpenRouter => Ok(Box::new(OpenAICompatibleProvider::openrouter(
            &preset.model,
            api_key,
            base_url,
        )?)),
        ProviderKind::Cerebras => Ok(Box::new(OpenAICompatibleProvider::cerebras(
            &preset.model,
            api_key,
            base_url,
        )?)),
    }
}

/// Get API key from config or environment variable
fn get_api_key(config: Option<&ProviderConfig>, kind: ProviderKind) -> Result<String> {
    // Check config first
    if let Some(key) = config.and_then(|c| c.api_key.clone()) {
        return Ok(key);
    }

    // Fall back to environment variable
    std::env::var(kind.env_var()).map_err(|_| LlmError::MissingApiKey {
        provider: kind.display_name().to_string(),
        env_var: kind.env_var().to_string(),
    })
}

/// Seconds from a `Retry-After` header, if present and numeric
pub(crate) fn retry_after(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

pub(crate) fn error_for_status(
    status: StatusCode,
    message: String,
    retry_after: Option<u64>,
) -> LlmError {
    LlmError::from_status(status.as_u16(), message, retry_after)
}

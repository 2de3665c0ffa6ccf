//! Streaming LLM client library for the doc-translate workspace
//!
//! Provides a unified, streaming interface for multiple LLM providers:
//! - Gemini (Google Generative Language API)
//! - Anthropic API (direct)
//! - OpenRouter (multi-model access)
//! - Cerebras (fast Llama inference)

pub mod config;
pub mod error;
pub mod provider;
pub mod providers;

pub use config::{Config, ModelPreset, ProviderConfig};
pub use error::{LlmError, Result};
pub use provider::{LlmProvider, LlmRequest, TextFragment, TextStream, collect_text};
pub use providers::{MockProvider, MockReply, ProviderKind, get_provider};

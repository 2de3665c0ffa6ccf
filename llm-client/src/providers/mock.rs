//! Mock LLM provider for testing
//!
//! Replies are scripted per call: a fixed fragment sequence, a failure before
//! the stream starts, or a failure part way through the stream. Every prompt
//! is recorded so tests can assert call order and call counts.

use async_trait::async_trait;
use futures_util::stream;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, LlmRequest, TextFragment, TextStream};

/// One scripted reply
#[derive(Debug)]
pub enum MockReply {
    /// Stream these fragments, then end
    Fragments(Vec<TextFragment>),
    /// Fail the call itself (transport, auth, quota)
    Fail(LlmError),
    /// Stream these fragments, then yield the error
    FailMidStream {
        fragments: Vec<TextFragment>,
        error: LlmError,
    },
}

impl MockReply {
    /// Reply with `text`, delivered in two fragments with a textless one between
    pub fn text(text: &str) -> Self {
        let split = text
            .char_indices()
            .nth(text.chars().count() / 2)
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        let (head, tail) = text.split_at(split);

        Self::Fragments(vec![
            TextFragment::text(head),
            TextFragment::empty(),
            TextFragment::text(tail),
        ])
    }

    fn duplicate(&self) -> Self {
        match self {
            Self::Fragments(fragments) => Self::Fragments(fragments.clone()),
            Self::Fail(error) => Self::Fail(clone_error(error)),
            Self::FailMidStream { fragments, error } => Self::FailMidStream {
                fragments: fragments.clone(),
                error: clone_error(error),
            },
        }
    }
}

/// A mock provider for testing generation callers
pub struct MockProvider {
    /// Replies consumed one per call, in order
    script: Mutex<VecDeque<MockReply>>,
    /// Reply used once the script runs out
    fallback: MockReply,
    /// Current call count
    call_count: AtomicUsize,
    /// Prompts received, in call order
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    fn build(script: Vec<MockReply>, fallback: MockReply) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            call_count: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that always succeeds
    pub fn always_succeeds(response: &str) -> Self {
        Self::build(Vec::new(), MockReply::text(response))
    }

    /// Create a provider that always fails with the given error
    pub fn always_fails(error: LlmError) -> Self {
        Self::build(Vec::new(), MockReply::Fail(error))
    }

    /// Create a provider that plays `script` in order, then falls back to `fallback`
    pub fn scripted(script: Vec<MockReply>, fallback: MockReply) -> Self {
        Self::build(script, fallback)
    }

    /// Get the number of times stream() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }

    fn next_reply(&self) -> MockReply {
        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| self.fallback.duplicate())
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn stream(&self, request: LlmRequest) -> Result<TextStream> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt);
        }

        let items: Vec<Result<TextFragment>> = match self.next_reply() {
            MockReply::Fragments(fragments) => fragments.into_iter().map(Ok).collect(),
            MockReply::Fail(error) => return Err(error),
            MockReply::FailMidStream { fragments, error } => fragments
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(error)))
                .collect(),
        };

        Ok(Box::pin(stream::iter(items)))
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

/// Clone an LlmError (needed because LlmError doesn't implement Clone)
fn clone_error(err: &LlmError) -> LlmError {
    match err {
        LlmError::ServerOverloaded { message } => LlmError::ServerOverloaded {
            message: message.clone(),
        },
        LlmError::MissingApiKey { provider, env_var } => LlmError::MissingApiKey {
            provider: provider.clone(),
            env_var: env_var.clone(),
        },
        LlmError::RateLimited { retry_after } => LlmError::RateLimited {
            retry_after: *retry_after,
        },
        LlmError::ApiError {
            message,
            status_code,
        } => LlmError::ApiError {
            message: message.clone(),
            status_code: *status_code,
        },
        LlmError::Stream(s) => LlmError::Stream(s.clone()),
        LlmError::EmptyResponse => LlmError::EmptyResponse,
        LlmError::ConfigError(s) => LlmError::ConfigError(s.clone()),
        LlmError::InvalidPreset(s) => LlmError::InvalidPreset(s.clone()),
        // For Io and Toml errors, we create a generic error since they can't be cloned
        LlmError::Io(_) => LlmError::ConfigError("IO error (mock)".to_string()),
        LlmError::TomlParse(_) => LlmError::ConfigError("TOML parse error (mock)".to_string()),
        LlmError::TomlSerialize(_) => {
            LlmError::ConfigError("TOML serialize error (mock)".to_string())
        }
    }
}

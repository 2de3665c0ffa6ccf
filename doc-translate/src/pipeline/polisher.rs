//! Whole-document polishing pass.

use llm_client::LlmProvider;
use std::sync::Arc;

use super::generate_text;
use super::prompts::polishing_prompt;

/// Shown in place of polished text when there was nothing to polish.
pub const NOTHING_TO_POLISH: &str = "沒有可潤飾的初步翻譯內容。";

/// Result of the polishing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolishOutcome {
    Polished(String),
    /// The merged text was blank; the provider was not called
    Empty,
    /// Error marker carrying the cause
    Failed(String),
}

impl PolishOutcome {
    /// Polished text, if polishing produced any
    pub fn polished_text(&self) -> Option<&str> {
        match self {
            Self::Polished(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Polished text, or the warning/error marker to show instead
    pub fn text_or_marker(&self) -> &str {
        match self {
            Self::Polished(text) | Self::Failed(text) => text,
            Self::Empty => NOTHING_TO_POLISH,
        }
    }
}

/// Polishes merged translations through a generation provider.
pub struct Polisher {
    provider: Arc<dyn LlmProvider>,
}

impl Polisher {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub async fn polish(&self, merged: &str, target_language: &str) -> PolishOutcome {
        if merged.trim().is_empty() {
            log::warn!("Nothing to polish: merged translation is empty");
            return PolishOutcome::Empty;
        }

        log::info!(
            "Polishing {} characters via {} ({})",
            merged.chars().count(),
            self.provider.name(),
            self.provider.model()
        );

        match generate_text(self.provider.as_ref(), polishing_prompt(merged, target_language)).await
        {
            Ok(text) => PolishOutcome::Polished(text),
            Err(e) => {
                log::error!("Polishing failed: {}", e);
                PolishOutcome::Failed(format!("[[潤飾錯誤: {}]]", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_client::{LlmError, MockProvider};

    #[tokio::test]
    async fn test_polish_success() {
        let mock = Arc::new(MockProvider::always_succeeds("  潤飾後的文本。 "));
        let polisher = Polisher::new(mock.clone());

        let outcome = polisher.polish("初步翻譯。", "繁體中文").await;
        assert_eq!(outcome, PolishOutcome::Polished("潤飾後的文本。".to_string()));
        assert_eq!(outcome.polished_text(), Some("潤飾後的文本。"));
        assert!(mock.prompts()[0].ends_with("\n\n初步翻譯。"));
    }

    #[tokio::test]
    async fn test_whitespace_only_input_skips_provider() {
        let mock = Arc::new(MockProvider::always_succeeds("never"));
        let polisher = Polisher::new(mock.clone());

        let outcome = polisher.polish(" \n\n\t ", "繁體中文").await;
        assert_eq!(outcome, PolishOutcome::Empty);
        assert_eq!(outcome.text_or_marker(), NOTHING_TO_POLISH);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_marker_is_distinct_from_translation_marker() {
        let mock = Arc::new(MockProvider::always_fails(LlmError::ServerOverloaded {
            message: "try later".to_string(),
        }));
        let polisher = Polisher::new(mock);

        let outcome = polisher.polish("初步翻譯。", "繁體中文").await;
        assert_eq!(
            outcome,
            PolishOutcome::Failed("[[潤飾錯誤: Server overloaded (HTTP 503): try later]]".to_string())
        );
        assert!(outcome.polished_text().is_none());
        assert!(!outcome.text_or_marker().contains("翻譯錯誤"));
    }
}

//! Per-segment translation.

use llm_client::LlmProvider;
use std::sync::Arc;

use super::generate_text;
use super::prompts::translation_prompt;

/// How much of a failed segment to quote in its error marker.
const EXCERPT_CHARS: usize = 30;

/// Result of translating one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Translated(String),
    /// Error marker naming the segment excerpt and the cause
    Failed(String),
}

/// Translates segments through a generation provider.
pub struct SegmentTranslator {
    provider: Arc<dyn LlmProvider>,
}

impl SegmentTranslator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Translate one segment. Failures come back as [`TranslationOutcome::Failed`].
    pub async fn translate(&self, segment: &str, target_language: &str) -> TranslationOutcome {
        if segment.is_empty() {
            return TranslationOutcome::Failed(failure_marker(segment, "empty segment"));
        }

        let prompt = translation_prompt(segment, target_language);
        match generate_text(self.provider.as_ref(), prompt).await {
            Ok(text) => TranslationOutcome::Translated(text),
            Err(e) => {
                log::error!(
                    "Translating segment '{}...' via {} failed: {}",
                    excerpt(segment),
                    self.provider.name(),
                    e
                );
                TranslationOutcome::Failed(failure_marker(segment, &e))
            }
        }
    }
}

fn failure_marker(segment: &str, cause: impl std::fmt::Display) -> String {
    format!("[[翻譯錯誤於塊: {}... - {}]]", excerpt(segment), cause)
}

fn excerpt(segment: &str) -> String {
    segment.chars().take(EXCERPT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_client::{LlmError, MockProvider, MockReply, TextFragment};

    #[tokio::test]
    async fn test_translate_success_concatenates_and_trims() {
        let mock = Arc::new(MockProvider::scripted(
            vec![MockReply::Fragments(vec![
                TextFragment::text("  你好，"),
                TextFragment::empty(),
                TextFragment::text("世界。\n"),
            ])],
            MockReply::text("unused"),
        ));
        let translator = SegmentTranslator::new(mock.clone());

        let outcome = translator.translate("Hello, world.", "繁體中文").await;
        assert_eq!(outcome, TranslationOutcome::Translated("你好，世界。".to_string()));

        let prompts = mock.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("professional 繁體中文 translator"));
        assert!(prompts[0].ends_with("\n\nHello, world."));
    }

    #[tokio::test]
    async fn test_translate_failure_becomes_marker() {
        let mock = Arc::new(MockProvider::always_fails(LlmError::ApiError {
            message: "quota exhausted".to_string(),
            status_code: Some(429),
        }));
        let translator = SegmentTranslator::new(mock);
        let segment = "This segment is definitely longer than thirty characters.";

        let outcome = translator.translate(segment, "繁體中文").await;
        assert_eq!(
            outcome,
            TranslationOutcome::Failed(
                "[[翻譯錯誤於塊: This segment is definitely lon... - API error (HTTP 429): quota exhausted]]"
                    .to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_translate_mid_stream_failure() {
        let mock = Arc::new(MockProvider::scripted(
            vec![MockReply::FailMidStream {
                fragments: vec![TextFragment::text("部分")],
                error: LlmError::Stream("connection reset".into()),
            }],
            MockReply::text("unused"),
        ));
        let translator = SegmentTranslator::new(mock);

        let outcome = translator.translate("short", "繁體中文").await;
        assert_eq!(
            outcome,
            TranslationOutcome::Failed("[[翻譯錯誤於塊: short... - Stream error: connection reset]]".to_string())
        );
    }

    #[tokio::test]
    async fn test_translate_response_without_text_fails() {
        let mock = Arc::new(MockProvider::scripted(
            vec![MockReply::Fragments(vec![TextFragment::empty()])],
            MockReply::text("unused"),
        ));
        let translator = SegmentTranslator::new(mock);

        let outcome = translator.translate("Hello", "繁體中文").await;
        assert!(matches!(outcome, TranslationOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_empty_segment_skips_provider() {
        let mock = Arc::new(MockProvider::always_succeeds("never"));
        let translator = SegmentTranslator::new(mock.clone());

        let outcome = translator.translate("", "繁體中文").await;
        assert!(matches!(outcome, TranslationOutcome::Failed(_)));
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_excerpt_counts_characters() {
        let text = "翻".repeat(40);
        assert_eq!(excerpt(&text).chars().count(), 30);
    }
}

//! Drives a full run: chunk, translate segments in order, merge, polish.

use super::pacing::Pacer;
use super::polisher::{PolishOutcome, Polisher};
use super::progress::ProgressSink;
use super::translator::{SegmentTranslator, TranslationOutcome};
use super::PipelineError;
use crate::text::{merge_segments, split_into_segments};

/// Knobs fixed for the lifetime of an orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    /// Maximum segment size in characters
    pub max_chars: usize,
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Segment results joined in order, failed segments marked inline
    pub raw_merged: String,
    pub polished: PolishOutcome,
    pub had_translation_errors: bool,
    pub segment_count: usize,
    /// 1-based ordinals of the segments that failed
    pub failed_segments: Vec<usize>,
}

/// Runs the two-stage pipeline, one segment at a time.
pub struct Orchestrator {
    settings: PipelineSettings,
    translator: SegmentTranslator,
    polisher: Polisher,
    pacer: Box<dyn Pacer>,
}

impl Orchestrator {
    pub fn new(
        settings: PipelineSettings,
        translator: SegmentTranslator,
        polisher: Polisher,
        pacer: Box<dyn Pacer>,
    ) -> Self {
        Self {
            settings,
            translator,
            polisher,
            pacer,
        }
    }

    /// Translate and polish `document`.
    ///
    /// Segment and polish failures are recorded in the report; the only
    /// errors are configuration problems and a document that yields no
    /// segments, both detected before any generation call.
    pub async fn run(
        &self,
        document: &str,
        target_language: &str,
        progress: &dyn ProgressSink,
    ) -> Result<RunReport, PipelineError> {
        if self.settings.max_chars == 0 {
            return Err(PipelineError::InvalidChunkSize(self.settings.max_chars));
        }

        progress.status("正在分割文本...");
        let segments = split_into_segments(document, self.settings.max_chars);
        let total = segments.len();
        if total == 0 {
            return Err(PipelineError::ChunkingEmpty);
        }
        log::info!(
            "Split {} characters into {} segment(s) of at most {}",
            document.chars().count(),
            total,
            self.settings.max_chars
        );
        progress.report(0, total);

        let mut results = Vec::with_capacity(total);
        let mut failed_segments = Vec::new();

        for (i, segment) in segments.iter().enumerate() {
            let ordinal = i + 1;
            progress.status(&format!("初步翻譯：塊 {} / {}...", ordinal, total));

            match self.translator.translate(segment, target_language).await {
                TranslationOutcome::Translated(text) => results.push(text),
                TranslationOutcome::Failed(detail) => {
                    log::error!("Segment {} of {} failed to translate", ordinal, total);
                    results.push(segment_failure_block(ordinal, &detail));
                    failed_segments.push(ordinal);
                }
            }

            progress.report(ordinal, total);

            if ordinal < total {
                self.pacer.pause().await;
            }
        }

        progress.status("初步翻譯完成，正在合併結果...");
        let raw_merged = merge_segments(&results);

        progress.status("正在進行 AI 潤飾與校對...");
        let polished = self.polisher.polish(&raw_merged, target_language).await;

        Ok(RunReport {
            raw_merged,
            polished,
            had_translation_errors: !failed_segments.is_empty(),
            segment_count: total,
            failed_segments,
        })
    }
}

/// Inline block standing in for a segment that failed.
fn segment_failure_block(ordinal: usize, detail: &str) -> String {
    format!("\n--- 塊 {} 初步翻譯失敗 ---\n{}\n---", ordinal, detail)
}

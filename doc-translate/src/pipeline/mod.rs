//! Two-stage translation pipeline: chunk, translate each segment, merge, polish.

mod orchestrator;
mod pacing;
mod polisher;
mod progress;
mod prompts;
mod translator;

pub use orchestrator::{Orchestrator, PipelineSettings, RunReport};
pub use pacing::{FixedDelay, NoDelay, Pacer};
pub use polisher::{PolishOutcome, Polisher};
pub use progress::BarProgress;
pub use translator::SegmentTranslator;

use llm_client::{LlmError, LlmProvider, LlmRequest, collect_text};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Text could not be split into segments")]
    ChunkingEmpty,

    #[error("Invalid segment size: {0} (must be at least 1 character)")]
    InvalidChunkSize(usize),
}

/// Send `prompt` as a streaming request and return the trimmed response text.
///
/// A response that is empty after trimming counts as [`LlmError::EmptyResponse`].
async fn generate_text(provider: &dyn LlmProvider, prompt: String) -> Result<String, LlmError> {
    let stream = provider.stream(LlmRequest::new(prompt)).await?;
    let text = collect_text(stream).await?;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(trimmed.to_string())
}

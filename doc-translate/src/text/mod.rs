//! Text processing for translation: paragraph-aware chunking.

pub mod chunker;

pub use chunker::{DEFAULT_MAX_CHARS, split_into_segments};

/// Blank line between paragraphs, used both to split source text and to
/// join translated segments back together.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Join segment results in order, one blank line apart.
pub fn merge_segments<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<&str>>()
        .join(PARAGRAPH_SEPARATOR)
}

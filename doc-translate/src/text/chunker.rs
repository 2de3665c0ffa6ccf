//! Paragraph-aware chunking for translation.
//!
//! Lengths are counted in characters, never bytes, so CJK and other
//! multi-byte text gets the same budget as ASCII.

use super::PARAGRAPH_SEPARATOR;

/// Default maximum segment size in characters.
pub const DEFAULT_MAX_CHARS: usize = 2500;

const SEPARATOR_LEN: usize = 2;

/// Split text into ordered segments of at most `max_chars` characters.
///
/// Paragraphs (separated by a blank line) are packed together while they fit.
/// A paragraph longer than `max_chars` is cut into `max_chars`-sized slices,
/// and the slices are packed the same way. Runs of blank lines contribute no
/// empty paragraphs, so no segment is ever empty, and empty input gives an
/// empty list.
///
/// `max_chars` must be non-zero.
pub fn split_into_segments(text: &str, max_chars: usize) -> Vec<String> {
    debug_assert!(max_chars > 0, "max_chars must be positive");

    let mut packer = Packer::new(max_chars.max(1));

    for paragraph in text.split(PARAGRAPH_SEPARATOR) {
        if paragraph.is_empty() {
            continue;
        }

        if char_len(paragraph) > packer.max_chars {
            for slice in hard_split(paragraph, packer.max_chars) {
                packer.push(slice);
                // A full-size slice can't share a segment with anything
                packer.flush_if_full();
            }
        } else {
            packer.push(paragraph);
        }
    }

    packer.finish()
}

/// Accumulates pieces into segments under the size limit.
struct Packer {
    max_chars: usize,
    segments: Vec<String>,
    current: String,
    current_len: usize,
}

impl Packer {
    fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            segments: Vec::new(),
            current: String::new(),
            current_len: 0,
        }
    }

    /// Append `piece` to the current segment, or start a new one if it won't fit.
    fn push(&mut self, piece: &str) {
        let piece_len = char_len(piece);

        if self.current.is_empty() {
            self.current.push_str(piece);
            self.current_len = piece_len;
        } else if self.current_len + SEPARATOR_LEN + piece_len <= self.max_chars {
            self.current.push_str(PARAGRAPH_SEPARATOR);
            self.current.push_str(piece);
            self.current_len += SEPARATOR_LEN + piece_len;
        } else {
            self.flush();
            self.current.push_str(piece);
            self.current_len = piece_len;
        }
    }

    fn flush_if_full(&mut self) {
        if self.current_len >= self.max_chars {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.segments.push(std::mem::take(&mut self.current));
        }
        self.current_len = 0;
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.segments
    }
}

/// Cut text into consecutive slices of at most `max_chars` characters.
fn hard_split(text: &str, max_chars: usize) -> Vec<&str> {
    let mut slices = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let end = rest
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let (slice, tail) = rest.split_at(end);
        slices.push(slice);
        rest = tail;
    }

    slices
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

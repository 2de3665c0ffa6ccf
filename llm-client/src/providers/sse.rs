//! Server-sent events decoding shared by the streaming HTTP providers.

use futures_util::{Stream, StreamExt, stream};

use crate::error::{LlmError, Result};
use crate::provider::{TextFragment, TextStream};

/// Line-oriented decoder for `text/event-stream` bodies.
///
/// Network chunks can end anywhere, including inside a multi-byte character,
/// so bytes are buffered until a full line is available.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feed a chunk of bytes, returning the `data:` payloads of every line completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if let Some(data) = line.strip_prefix("data:") {
                payloads.push(data.trim_start().to_string());
            }
        }

        payloads
    }
}

/// Turn an HTTP byte stream into a fragment stream.
///
/// `parse` maps one `data:` payload to a fragment, or to `None` for payloads
/// that carry nothing at all (such as a `[DONE]` terminator).
pub fn fragments_from_sse<S, B, E, F>(bytes: S, parse: F) -> TextStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + 'static,
    E: std::fmt::Display + 'static,
    F: Fn(&str) -> Option<Result<TextFragment>> + Send + 'static,
{
    let mut decoder = SseDecoder::default();

    let fragments = bytes
        .map(move |chunk| -> Vec<Result<TextFragment>> {
            match chunk {
                Ok(chunk) => decoder
                    .push(chunk.as_ref())
                    .iter()
                    .filter_map(|data| parse(data.as_str()))
                    .collect(),
                Err(e) => vec![Err(LlmError::Stream(e.to_string()))],
            }
        })
        .flat_map(stream::iter);

    Box::pin(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::collect_text;

    #[test]
    fn test_decoder_joins_lines_split_across_chunks() {
        let mut decoder = SseDecoder::default();

        assert!(decoder.push(b"data: {\"a\"").is_empty());
        assert_eq!(decoder.push(b":1}\n\n"), vec!["{\"a\":1}"]);
    }

    #[test]
    fn test_decoder_handles_crlf_and_ignores_other_fields() {
        let mut decoder = SseDecoder::default();

        let payloads = decoder.push(b": keep-alive\r\nevent: message\r\ndata: one\r\n\r\ndata: two\r\n");
        assert_eq!(payloads, vec!["one", "two"]);
    }

    #[test]
    fn test_decoder_keeps_multibyte_characters_intact() {
        let mut decoder = SseDecoder::default();
        let line = "data: 翻譯\n".as_bytes();

        // Split inside the first CJK character
        assert!(decoder.push(&line[..8]).is_empty());
        assert_eq!(decoder.push(&line[8..]), vec!["翻譯"]);
    }

    #[tokio::test]
    async fn test_fragments_from_sse_parses_and_skips_terminator() {
        let chunks: Vec<std::result::Result<Vec<u8>, String>> = vec![
            Ok(b"data: Hel".to_vec()),
            Ok(b"lo\n\ndata: [DONE]\n\n".to_vec()),
        ];

        let fragments = fragments_from_sse(stream::iter(chunks), |data| {
            (data != "[DONE]").then(|| Ok(TextFragment::text(data)))
        });

        assert_eq!(collect_text(fragments).await.unwrap(), "Hello");
    }

    #[tokio::test]
    async fn test_fragments_from_sse_reports_transport_error() {
        let chunks: Vec<std::result::Result<Vec<u8>, String>> = vec![
            Ok(b"data: partial\n".to_vec()),
            Err("connection reset".to_string()),
        ];

        let fragments =
            fragments_from_sse(stream::iter(chunks), |data| Some(Ok(TextFragment::text(data))));

        let err = collect_text(fragments).await.unwrap_err();
        assert!(matches!(err, LlmError::Stream(msg) if msg == "connection reset"));
    }
}

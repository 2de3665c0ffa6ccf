//! Plain-text extraction from source documents.

use quick_xml::Reader;
use quick_xml::events::Event;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

const DOCX_BODY: &str = "word/document.xml";

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unsupported file type '{0}' (expected .txt or .docx)")]
    Unsupported(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Not a valid .docx archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Word document body is not valid UTF-8")]
    InvalidBody,

    #[error("Malformed Word document body: {0}")]
    Xml(String),
}

/// Extract the text of a `.txt` or `.docx` file, trimmed.
pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let io_error = |source: std::io::Error| ExtractError::Io {
        path: path.display().to_string(),
        source,
    };

    let text = match extension.as_str() {
        "txt" => {
            let bytes = std::fs::read(path).map_err(io_error)?;
            decode_plain_text(bytes)
        }
        "docx" => {
            let file = File::open(path).map_err(io_error)?;
            docx_text(file)?
        }
        other => return Err(ExtractError::Unsupported(format!(".{}", other))),
    };

    log::debug!(
        "Extracted {} characters from {}",
        text.chars().count(),
        path.display()
    );

    Ok(text.trim().to_string())
}

/// Decode a text file, normalizing line endings so paragraph breaks survive.
fn decode_plain_text(bytes: Vec<u8>) -> String {
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("File is not valid UTF-8; undecodable bytes will be replaced");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };

    text.trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

/// Read the body of a Word document, one line per paragraph.
fn docx_text<R: Read + std::io::Seek>(reader: R) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut body = Vec::new();
    archive
        .by_name(DOCX_BODY)?
        .read_to_end(&mut body)
        .map_err(|source| ExtractError::Io {
            path: DOCX_BODY.to_string(),
            source,
        })?;
    let xml = String::from_utf8(body).map_err(|_| ExtractError::InvalidBody)?;

    Ok(paragraphs_from_document_xml(&xml)?.join("\n"))
}

/// Collect paragraph text from WordprocessingML.
///
/// Only `w:t` content counts as text. `w:tab`, `w:br` and `w:cr` inside a run
/// become a tab or newline; tab stops in paragraph properties are ignored.
fn paragraphs_from_document_xml(xml: &str) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| ExtractError::Xml(e.to_string()))?
        {
            Event::Start(e) => match e.name().as_ref() {
                b"w:r" => in_run = true,
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                b"w:tab" if in_run => current.push('\t'),
                b"w:br" | b"w:cr" if in_run => current.push('\n'),
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:r" => in_run = false,
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Text(e) if in_text => {
                let text = e.unescape().map_err(|e| ExtractError::Xml(e.to_string()))?;
                current.push_str(&text);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    // Text outside any closed paragraph (malformed body)
    if !current.is_empty() {
        paragraphs.push(current);
    }

    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn docx_bytes(document_xml: &str) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(DOCX_BODY, SimpleFileOptions::default()).unwrap();
        zip.write_all(document_xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_paragraphs_from_document_xml() {
        let xml = r#"<w:document><w:body>
            <w:p><w:r><w:t>Hello</w:t></w:r><w:r><w:t xml:space="preserve"> world &amp; all</w:t></w:r></w:p>
            <w:p/>
            <w:p w:rsidR="00AB"><w:r><w:t>Col</w:t><w:tab/><w:t>B</w:t><w:br/><w:t>next</w:t></w:r></w:p>
            <w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
        </w:body></w:document>"#;

        let paragraphs = paragraphs_from_document_xml(xml).unwrap();
        assert_eq!(
            paragraphs,
            vec!["Hello world & all", "", "Col\tB\nnext", "cell"]
        );
    }

    #[test]
    fn test_self_closing_text_run_is_empty() {
        let xml = r#"<w:p><w:r><w:t xml:space="preserve"/></w:r></w:p><w:p><w:r><w:t>B</w:t></w:r></w:p>"#;
        assert_eq!(paragraphs_from_document_xml(xml).unwrap(), vec!["", "B"]);
    }

    #[test]
    fn test_tab_stops_and_markup_outside_runs_are_ignored() {
        let xml = r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>&#32763;&#x8B6F; &lt;ok&gt;</w:t></w:r><w:proofErr w:type="spellStart"/></w:p>"#;
        assert_eq!(paragraphs_from_document_xml(xml).unwrap(), vec!["翻譯 <ok>"]);
    }

    #[test]
    fn test_mismatched_tags_are_an_error() {
        let result = paragraphs_from_document_xml("<w:p><w:r><w:t>x</w:r></w:p>");
        assert!(matches!(result, Err(ExtractError::Xml(_))));
    }

    #[test]
    fn test_docx_text_reads_body() {
        let xml = "<w:document><w:body><w:p><w:r><w:t>One</w:t></w:r></w:p><w:p><w:r><w:t>Two</w:t></w:r></w:p></w:body></w:document>";
        let text = docx_text(Cursor::new(docx_bytes(xml))).unwrap();
        assert_eq!(text, "One\nTwo");
    }

    #[test]
    fn test_docx_without_body_is_error() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("other.xml", SimpleFileOptions::default()).unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        assert!(matches!(
            docx_text(Cursor::new(bytes)),
            Err(ExtractError::Archive(_))
        ));
    }

    #[test]
    fn test_decode_plain_text_normalizes_line_endings() {
        let text = decode_plain_text(b"\xEF\xBB\xBFone\r\n\r\ntwo\rthree".to_vec());
        assert_eq!(text, "one\n\ntwo\nthree");
    }

    #[test]
    fn test_decode_plain_text_invalid_utf8_is_lossy() {
        let text = decode_plain_text(vec![b'o', b'k', 0xFF, b'!']);
        assert_eq!(text, "ok\u{fffd}!");
    }

    #[test]
    fn test_extract_txt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.TXT");
        std::fs::write(&path, "  First.\n\nSecond.\n\n").unwrap();

        assert_eq!(extract_text(&path).unwrap(), "First.\n\nSecond.");
    }

    #[test]
    fn test_extract_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        let err = extract_text(&path).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported file type '.pdf' (expected .txt or .docx)"
        );
    }

    #[test]
    fn test_extract_missing_file() {
        let err = extract_text(Path::new("/nonexistent/source.txt")).unwrap_err();
        assert!(matches!(err, ExtractError::Io { .. }));
    }
}

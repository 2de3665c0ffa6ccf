//! Writing translated text as plain text or Word documents.

use anyhow::{Context, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// File format for translated output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Docx,
    Txt,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Txt => "txt",
        }
    }
}

/// `<dir>/<base><suffix>.<ext>`
pub fn output_path(dir: &Path, base: &str, suffix: &str, format: OutputFormat) -> PathBuf {
    dir.join(format!("{}{}.{}", base, suffix, format.extension()))
}

/// Write `text` to `path` in the given format, replacing any existing file.
pub fn write_document(path: &Path, text: &str, format: OutputFormat) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    match format {
        OutputFormat::Txt => std::fs::write(path, text)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        OutputFormat::Docx => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_docx(file, text)
                .with_context(|| format!("Failed to write Word document {}", path.display()))?;
        }
    }

    log::debug!("Wrote {}", path.display());
    Ok(())
}

/// Write a minimal WordprocessingML package, one paragraph per line.
fn write_docx<W: Write + Seek>(writer: W, text: &str) -> Result<W> {
    let options =
        || SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut zip = zip::ZipWriter::new(writer);

    zip.start_file("[Content_Types].xml", options())?;
    zip.write_all(CONTENT_TYPES.as_bytes())?;

    zip.start_file("_rels/.rels", options())?;
    zip.write_all(PACKAGE_RELS.as_bytes())?;

    zip.start_file("word/document.xml", options())?;
    zip.write_all(&document_xml(text)?)?;

    Ok(zip.finish()?)
}

fn document_xml(text: &str) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    writer.write_event(Event::Start(
        BytesStart::new("w:document").with_attributes([("xmlns:w", WORDML_NS)]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("w:body")))?;

    for line in text.split('\n') {
        if line.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new("w:p")))?;
            continue;
        }

        let line = xml_chars_only(line);
        writer.write_event(Event::Start(BytesStart::new("w:p")))?;
        writer.write_event(Event::Start(BytesStart::new("w:r")))?;
        writer.write_event(Event::Start(
            BytesStart::new("w:t").with_attributes([("xml:space", "preserve")]),
        ))?;
        writer.write_event(Event::Text(BytesText::new(&line)))?;
        writer.write_event(Event::End(BytesEnd::new("w:t")))?;
        writer.write_event(Event::End(BytesEnd::new("w:r")))?;
        writer.write_event(Event::End(BytesEnd::new("w:p")))?;
    }

    writer.write_event(Event::Empty(BytesStart::new("w:sectPr")))?;
    writer.write_event(Event::End(BytesEnd::new("w:body")))?;
    writer.write_event(Event::End(BytesEnd::new("w:document")))?;

    Ok(writer.into_inner())
}

/// Drop characters XML 1.0 cannot represent, even escaped.
fn xml_chars_only(line: &str) -> String {
    line.chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r')
                || (c >= '\u{20}' && c != '\u{fffe}' && c != '\u{ffff}')
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::extract_text;
    use std::io::{Cursor, Read};

    #[test]
    fn test_output_path() {
        let path = output_path(Path::new("/out"), "report", "_潤飾版", OutputFormat::Docx);
        assert_eq!(path, PathBuf::from("/out/report_潤飾版.docx"));

        let path = output_path(Path::new("out"), "report", "_初步翻譯", OutputFormat::Txt);
        assert_eq!(path, PathBuf::from("out/report_初步翻譯.txt"));
    }

    #[test]
    fn test_document_xml_paragraphs() {
        let xml = String::from_utf8(document_xml("第一段 <b>\n\nA & B").unwrap()).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#));
        assert!(xml.contains(r#"<w:p><w:r><w:t xml:space="preserve">第一段 &lt;b&gt;</w:t></w:r></w:p><w:p/><w:p>"#));
        assert!(xml.contains("A &amp; B"));
        assert!(xml.ends_with("<w:sectPr/></w:body></w:document>"));
    }

    #[test]
    fn test_control_characters_are_dropped() {
        assert_eq!(xml_chars_only("bell\u{7}gone\ttab"), "bellgone\ttab");

        let xml = String::from_utf8(document_xml("a\u{1}b").unwrap()).unwrap();
        assert!(xml.contains(">ab</w:t>"));
    }

    #[test]
    fn test_docx_package_parts() {
        let cursor = write_docx(Cursor::new(Vec::new()), "hello").unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap();

        let names: Vec<String> = archive.file_names().map(String::from).collect();
        assert!(names.contains(&"[Content_Types].xml".to_string()));
        assert!(names.contains(&"_rels/.rels".to_string()));

        let mut body = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut body)
            .unwrap();
        assert!(body.contains(">hello</w:t>"));
    }

    #[test]
    fn test_docx_round_trip_through_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("doc_初步翻譯.docx");
        let text = "第一段，含 <標記> & 符號。\n\n\n--- 塊 2 初步翻譯失敗 ---\n第三段\t結尾";

        write_document(&path, text, OutputFormat::Docx).unwrap();
        assert_eq!(extract_text(&path).unwrap(), text);
    }

    #[test]
    fn test_write_txt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.txt");

        write_document(&path, "譯文\n\n第二段", OutputFormat::Txt).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "譯文\n\n第二段");
    }

    #[test]
    fn test_output_format_from_config_string() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: OutputFormat,
        }
        let parsed: Wrapper = toml::from_str(r#"format = "txt""#).unwrap();
        assert_eq!(parsed.format, OutputFormat::Txt);
    }
}

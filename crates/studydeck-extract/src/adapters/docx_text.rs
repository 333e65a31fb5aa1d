//! DocxText extraction adapter: raw paragraph text from `word/document.xml`.

use std::io::{Cursor, Read};

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;
use tracing::debug;
use zip::ZipArchive;

use studydeck_core::{DocumentType, Error, ExtractionAdapter, Result};

/// Adapter for extracting paragraph text from Word (`.docx`) documents.
///
/// Formatting, tables and embedded objects are flattened to their text runs.
/// Paragraphs are separated by a blank line.
pub struct DocxTextAdapter;

/// Read the main document part out of a DOCX archive and flatten it to text.
pub fn extract_docx_text(data: &[u8]) -> std::result::Result<String, String> {
    let mut archive =
        ZipArchive::new(Cursor::new(data)).map_err(|e| format!("not a DOCX archive: {}", e))?;

    let mut document = archive
        .by_name("word/document.xml")
        .map_err(|_| "missing word/document.xml".to_string())?;

    let mut xml = String::new();
    document
        .read_to_string(&mut xml)
        .map_err(|e| format!("failed to read document XML: {}", e))?;

    let mut reader = XmlReader::from_str(&xml);
    let mut buf = Vec::new();
    let mut output = String::new();
    let mut in_text_node = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"w:p" => push_paragraph_break(&mut output),
                b"w:tab" => output.push('\t'),
                b"w:br" => output.push('\n'),
                b"w:t" => in_text_node = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"w:p" => push_paragraph_break(&mut output),
                b"w:tab" => output.push('\t'),
                b"w:br" => output.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text_node {
                    let value = e
                        .unescape()
                        .map_err(|err| format!("invalid text node: {}", err))?;
                    output.push_str(&value);
                }
            }
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == b"w:t" {
                    in_text_node = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(format!("failed to parse document XML: {}", err)),
            _ => {}
        }
        buf.clear();
    }

    Ok(output.trim().to_string())
}

fn push_paragraph_break(output: &mut String) {
    if !output.is_empty() {
        output.push_str("\n\n");
    }
}

#[async_trait]
impl ExtractionAdapter for DocxTextAdapter {
    fn document_type(&self) -> DocumentType {
        DocumentType::Docx
    }

    async fn extract(&self, data: &[u8], filename: &str) -> Result<String> {
        let owned = data.to_vec();
        let text = tokio::task::spawn_blocking(move || extract_docx_text(&owned))
            .await
            .map_err(|e| Error::Internal(format!("DOCX extraction task failed: {}", e)))?
            .map_err(|detail| {
                Error::Extraction(format!("Failed to read DOCX '{}': {}", filename, detail))
            })?;

        debug!(
            subsystem = "extract",
            component = "docx_text",
            filename,
            text_len = text.len(),
            "Extracted DOCX text"
        );
        Ok(text)
    }

    fn name(&self) -> &str {
        "docx_text"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    /// Build an in-memory DOCX whose body holds the given XML.
    pub(crate) fn docx_with_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>{body}</w:body>
</w:document>"#
        );
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/document.xml", SimpleFileOptions::default())
            .expect("zip start file");
        zip.write_all(xml.as_bytes()).expect("write xml");
        zip.finish().expect("finish zip").into_inner()
    }

    #[tokio::test]
    async fn test_extracts_paragraphs() {
        let data = docx_with_body(
            "<w:p><w:r><w:t>Hello</w:t></w:r></w:p><w:p><w:r><w:t>World</w:t></w:r></w:p>",
        );
        let text = DocxTextAdapter.extract(&data, "notes.docx").await.unwrap();
        assert_eq!(text, "Hello\n\nWorld");
    }

    #[tokio::test]
    async fn test_tabs_breaks_and_entities() {
        let data = docx_with_body(
            "<w:p><w:r><w:t>A</w:t><w:tab/><w:t>B &amp; C</w:t><w:br/><w:t>D</w:t></w:r></w:p>",
        );
        let text = DocxTextAdapter.extract(&data, "notes.docx").await.unwrap();
        assert_eq!(text, "A\tB & C\nD");
    }

    #[tokio::test]
    async fn test_not_a_zip_is_extraction_error() {
        let err = DocxTextAdapter
            .extract(b"plain text", "notes.docx")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[tokio::test]
    async fn test_zip_without_document_part() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("other.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<x/>").unwrap();
        let data = zip.finish().unwrap().into_inner();

        let err = DocxTextAdapter.extract(&data, "notes.docx").await.unwrap_err();
        assert!(err.to_string().contains("missing word/document.xml"));
    }
}

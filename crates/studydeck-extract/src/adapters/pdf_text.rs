//! PdfText extraction adapter: embedded text content via `pdf-extract`.

use async_trait::async_trait;
use tracing::debug;

use studydeck_core::{DocumentType, Error, ExtractionAdapter, Result};

/// Adapter for extracting the embedded text layer of PDF files.
///
/// Scanned PDFs without a text layer yield empty text; no OCR is attempted.
pub struct PdfTextAdapter;

#[async_trait]
impl ExtractionAdapter for PdfTextAdapter {
    fn document_type(&self) -> DocumentType {
        DocumentType::Pdf
    }

    async fn extract(&self, data: &[u8], filename: &str) -> Result<String> {
        if data.is_empty() {
            return Err(Error::Extraction(format!("File '{}' is empty", filename)));
        }

        // Validate PDF magic bytes (%PDF)
        if data.len() < 4 || &data[0..4] != b"%PDF" {
            return Err(Error::Extraction(format!(
                "File '{}' is not a valid PDF (missing %PDF header)",
                filename
            )));
        }

        let owned = data.to_vec();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&owned))
            .await
            .map_err(|e| {
                // pdf-extract panics on some malformed documents.
                Error::Extraction(format!("PDF decoder aborted on '{}': {}", filename, e))
            })?
            .map_err(|e| {
                Error::Extraction(format!("Failed to read PDF '{}': {}", filename, e))
            })?;

        debug!(
            subsystem = "extract",
            component = "pdf_text",
            filename,
            text_len = text.len(),
            "Extracted PDF text"
        );
        Ok(text)
    }

    fn name(&self) -> &str {
        "pdf_text"
    }
}

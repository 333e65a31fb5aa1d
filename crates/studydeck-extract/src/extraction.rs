//! Extraction adapter registry for dispatching uploaded documents.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use studydeck_core::{DocumentType, Error, ExtractionAdapter, Result, UploadedDocument};

use crate::adapters::{DocxTextAdapter, PdfTextAdapter};

/// Registry mapping document types to their adapter implementations.
pub struct ExtractionRegistry {
    adapters: HashMap<DocumentType, Arc<dyn ExtractionAdapter>>,
}

impl ExtractionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Registry with the PDF and DOCX adapters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PdfTextAdapter));
        registry.register(Arc::new(DocxTextAdapter));
        registry
    }

    /// Register an adapter. Replaces any existing adapter for the same type.
    pub fn register(&mut self, adapter: Arc<dyn ExtractionAdapter>) {
        self.adapters.insert(adapter.document_type(), adapter);
    }

    /// Extract text using the adapter registered for `doc_type`.
    pub async fn extract(
        &self,
        doc_type: DocumentType,
        data: &[u8],
        filename: &str,
    ) -> Result<String> {
        let adapter = self
            .adapters
            .get(&doc_type)
            .ok_or_else(|| Error::UnsupportedFileType(doc_type.to_string()))?;
        adapter.extract(data, filename).await
    }

    /// Extract every document in upload order and concatenate the results.
    ///
    /// Each document's text is followed by a newline. Every file's type is
    /// checked before any decoding starts, so one unsupported file fails the
    /// whole batch without wasted work.
    pub async fn extract_all(&self, documents: &[UploadedDocument]) -> Result<String> {
        let typed = documents
            .iter()
            .map(|doc| {
                let doc_type = DocumentType::from_filename(&doc.filename)?;
                if !self.has_adapter(doc_type) {
                    return Err(Error::UnsupportedFileType(doc_type.to_string()));
                }
                Ok((doc_type, doc))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut combined = String::new();
        for (doc_type, doc) in typed {
            let start = Instant::now();
            let text = self.extract(doc_type, &doc.data, &doc.filename).await?;
            debug!(
                subsystem = "extract",
                component = "registry",
                op = "extract",
                filename = %doc.filename,
                doc_type = %doc_type,
                bytes = doc.data.len(),
                text_len = text.len(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Document extracted"
            );
            combined.push_str(&text);
            combined.push('\n');
        }
        Ok(combined)
    }

    /// Check if an adapter is registered for the given type.
    pub fn has_adapter(&self, doc_type: DocumentType) -> bool {
        self.adapters.contains_key(&doc_type)
    }
}

impl Default for ExtractionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

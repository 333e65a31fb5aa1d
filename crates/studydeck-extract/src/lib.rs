//! # studydeck-extract
//!
//! Plain-text extraction from uploaded study documents.
//!
//! This crate provides:
//! - An `ExtractionRegistry` dispatching on `DocumentType`
//! - A PDF adapter (embedded text layer via `pdf-extract`)
//! - A DOCX adapter (paragraph text via `zip` + `quick-xml`)
//!
//! Decoding runs on tokio's blocking thread pool.
//!
//! ## Example
//!
//! ```ignore
//! use studydeck_extract::{ExtractionRegistry, UploadedDocument};
//!
//! let registry = ExtractionRegistry::with_defaults();
//! let text = registry
//!     .extract_all(&[UploadedDocument::new("lecture.pdf", bytes)])
//!     .await?;
//! ```

pub mod adapters;
pub mod extraction;

// Re-export core types
pub use studydeck_core::*;

pub use adapters::{DocxTextAdapter, PdfTextAdapter};
pub use extraction::ExtractionRegistry;

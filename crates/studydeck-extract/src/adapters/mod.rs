//! Extraction adapter implementations.

pub mod docx_text;
pub mod pdf_text;

pub use docx_text::DocxTextAdapter;
pub use pdf_text::PdfTextAdapter;

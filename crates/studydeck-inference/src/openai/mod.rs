//! OpenAI-compatible chat completion backend.
//!
//! Works with any endpoint that speaks the `/chat/completions` protocol,
//! including Groq (the default), OpenAI, vLLM and Ollama in compatibility
//! mode.
//!
//! # Example
//!
//! ```rust,no_run
//! use studydeck_inference::openai::OpenAIBackend;
//! use studydeck_inference::GenerationBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OpenAIBackend::from_env().unwrap();
//!     let text = backend
//!         .generate_with_system("Answer briefly.", "What is ATP?")
//!         .await
//!         .unwrap();
//!     println!("{text}");
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig};
pub use error::{to_generation_error, OpenAIErrorCode};
pub use types::*;

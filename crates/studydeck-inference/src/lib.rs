//! # studydeck-inference
//!
//! Model backend and response recovery for studydeck.
//!
//! This crate provides:
//! - OpenAI-compatible chat completion backend (Groq by default)
//! - The flashcard generation system instruction
//! - Ordered repair transforms for almost-JSON output
//! - Two-tier recovery of question/answer pairs
//!
//! # Feature Flags
//!
//! - `mock`: expose [`mock::MockGenerationBackend`] to dependent crates' tests
//!
//! # Example
//!
//! ```rust,no_run
//! use studydeck_inference::{flashcard_system_prompt, recover, OpenAIBackend};
//! use studydeck_inference::{DuplicateIndex, GenerationBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OpenAIBackend::from_env().unwrap();
//!     let system = flashcard_system_prompt(12, &DuplicateIndex::default());
//!     let raw = backend.generate_with_system(&system, "Mitochondria ...").await.unwrap();
//!     let recovered = recover(&raw).unwrap();
//!     println!("{} pairs via {}", recovered.pairs.len(), recovered.tier);
//! }
//! ```

pub mod openai;
pub mod prompt;
pub mod recovery;
pub mod repair;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use studydeck_core::*;

pub use openai::{OpenAIBackend, OpenAIConfig};
pub use prompt::flashcard_system_prompt;
pub use recovery::{locate_candidate, recover, Recovered, RecoveryTier};
pub use repair::{repair_candidate, REPAIR_STEPS};

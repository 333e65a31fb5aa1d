//! Service layer for business logic.

pub mod deck_locks;
pub mod generation;

pub use deck_locks::DeckLocks;
pub use generation::{
    FlashcardGenerator, GenerationOutcome, PipelineError, PipelineStage,
};

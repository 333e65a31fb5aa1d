//! Core traits for studydeck abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability. Storage and
//! the model endpoint are injected into the generation pipeline through
//! them rather than reached as process-wide singletons.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// DECK REPOSITORY TRAITS
// =============================================================================

/// Repository for deck storage.
///
/// Every lookup is scoped by the owning user; a deck owned by someone else
/// behaves exactly like a missing one.
#[async_trait]
pub trait DeckRepository: Send + Sync {
    /// Insert a new deck.
    async fn create(&self, deck: Deck) -> Result<Deck>;

    /// Fetch a deck owned by `user_id`, failing with `DeckNotFound`.
    async fn fetch(&self, deck_id: Uuid, user_id: &str) -> Result<Deck>;

    /// List a user's decks, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Deck>>;

    /// Rename a deck.
    async fn rename(&self, deck_id: Uuid, user_id: &str, name: &str) -> Result<Deck>;

    /// Delete a deck and its flashcards.
    async fn delete(&self, deck_id: Uuid, user_id: &str) -> Result<()>;

    /// Store extracted notes on the deck for later regeneration.
    async fn set_source_text(&self, deck_id: Uuid, user_id: &str, text: &str) -> Result<()>;

    /// Count flashcard rows referencing the deck.
    async fn count_flashcards(&self, deck_id: Uuid) -> Result<i64>;

    /// Overwrite the deck's denormalized flashcard count.
    async fn set_flashcard_count(&self, deck_id: Uuid, count: i64) -> Result<()>;

    /// Recompute the denormalized count from rows and write it back.
    ///
    /// Implementations backed by a database should do this in one statement.
    async fn recount_flashcards(&self, deck_id: Uuid) -> Result<i64> {
        let count = self.count_flashcards(deck_id).await?;
        self.set_flashcard_count(deck_id, count).await?;
        Ok(count)
    }
}

// =============================================================================
// FLASHCARD REPOSITORY TRAITS
// =============================================================================

/// Outcome of persisting one batch of generated flashcards.
#[derive(Debug, Clone)]
pub struct PersistOutcome {
    /// Rows inserted, in input order.
    pub inserted: Vec<Flashcard>,
    /// Deck count recomputed after the inserts.
    pub flashcard_count: i64,
}

/// Repository for flashcard storage.
///
/// Every mutation recomputes the owning deck's flashcard count.
#[async_trait]
pub trait FlashcardRepository: Send + Sync {
    /// All question texts of a deck owned by `user_id`.
    async fn list_questions(&self, deck_id: Uuid, user_id: &str) -> Result<Vec<String>>;

    /// Insert one flashcard and recompute the deck count.
    async fn insert(&self, user_id: &str, deck_id: Uuid, pair: FlashcardPair)
        -> Result<Flashcard>;

    /// List a deck's flashcards, newest first.
    async fn list(&self, deck_id: Uuid, user_id: &str) -> Result<Vec<Flashcard>>;

    /// Replace the question and answer of a flashcard.
    async fn update(&self, flashcard_id: Uuid, user_id: &str, pair: FlashcardPair)
        -> Result<Flashcard>;

    /// Delete a flashcard and recompute its deck's count.
    async fn delete(&self, flashcard_id: Uuid, user_id: &str) -> Result<()>;

    /// Persist the output of one generation run atomically.
    ///
    /// Optionally stores `source_text` on the deck, inserts every pair, and
    /// recomputes the deck count. Either all of it is committed or none.
    async fn persist_generated(
        &self,
        user_id: &str,
        deck_id: Uuid,
        pairs: &[FlashcardPair],
        source_text: Option<&str>,
    ) -> Result<PersistOutcome>;
}

// =============================================================================
// GENERATION TRAITS
// =============================================================================

/// Backend for text generation.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text with a system instruction and user content.
    ///
    /// Returns the first candidate's text verbatim.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;

    /// Check if the backend is available and responding.
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

// =============================================================================
// EXTRACTION ADAPTER TRAITS
// =============================================================================

/// Adapter for extracting plain text from an uploaded document.
///
/// Each adapter handles one `DocumentType`. Adapters are registered in an
/// `ExtractionRegistry` and dispatched on the file's declared type.
#[async_trait]
pub trait ExtractionAdapter: Send + Sync {
    /// The document type this adapter handles.
    fn document_type(&self) -> DocumentType;

    /// Extract text from raw file data.
    async fn extract(&self, data: &[u8], filename: &str) -> Result<String>;

    /// Human-readable name of this adapter.
    fn name(&self) -> &str;
}

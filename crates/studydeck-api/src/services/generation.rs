//! Flashcard generation pipeline.
//!
//! One run moves through a fixed sequence of stages:
//!
//! ```text
//! Extracting -> Resolving -> IndexingDuplicates -> Generating -> Recovering -> Persisting
//! ```
//!
//! Any stage may fail; the failure is reported together with the stage it
//! happened in. Nothing is written before `Persisting`, and that stage is a
//! single storage transaction, so dropping the run midway leaves no trace.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use uuid::Uuid;

use studydeck_core::{
    DeckRepository, DuplicateIndex, Error, FlashcardPair, FlashcardRepository, GenerationBackend,
    GenerationRequest, SourceText, strip_control_chars,
};
use studydeck_extract::ExtractionRegistry;
use studydeck_inference::{flashcard_system_prompt, recover, RecoveryTier};

use crate::config::GenerationConfig;
use crate::services::DeckLocks;

/// Stage of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Extracting,
    Resolving,
    IndexingDuplicates,
    Generating,
    Recovering,
    Persisting,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Extracting => "extracting",
            PipelineStage::Resolving => "resolving",
            PipelineStage::IndexingDuplicates => "indexing_duplicates",
            PipelineStage::Generating => "generating",
            PipelineStage::Recovering => "recovering",
            PipelineStage::Persisting => "persisting",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed run: the stage it stopped in and why.
#[derive(Debug, thiserror::Error)]
#[error("generation failed while {stage}: {source}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    #[source]
    pub source: Error,
}

impl PipelineError {
    pub fn new(stage: PipelineStage, source: Error) -> Self {
        Self { stage, source }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// Persisted pairs in response order.
    pub flashcards: Vec<FlashcardPair>,
    /// Deck count after persisting.
    pub flashcard_count: i64,
    pub tier: RecoveryTier,
}

/// Runs the generation pipeline against injected storage and model backends.
pub struct FlashcardGenerator {
    decks: Arc<dyn DeckRepository>,
    flashcards: Arc<dyn FlashcardRepository>,
    backend: Arc<dyn GenerationBackend>,
    extractors: ExtractionRegistry,
    config: GenerationConfig,
    locks: DeckLocks,
}

impl FlashcardGenerator {
    pub fn new(
        decks: Arc<dyn DeckRepository>,
        flashcards: Arc<dyn FlashcardRepository>,
        backend: Arc<dyn GenerationBackend>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            decks,
            flashcards,
            backend,
            extractors: ExtractionRegistry::with_defaults(),
            config,
            locks: DeckLocks::new(),
        }
    }

    /// Replace the extraction registry.
    pub fn with_extractors(mut self, extractors: ExtractionRegistry) -> Self {
        self.extractors = extractors;
        self
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn GenerationBackend> {
        &self.backend
    }

    /// Run the full pipeline for one request.
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationOutcome, PipelineError> {
        let start = Instant::now();
        let GenerationRequest {
            user_id,
            deck_id,
            documents,
            target_count,
        } = request;

        self.enter(PipelineStage::Extracting, deck_id);
        let extracted = if documents.is_empty() {
            None
        } else {
            let text = self
                .extractors
                .extract_all(&documents)
                .await
                .map_err(|e| PipelineError::new(PipelineStage::Extracting, e))?;
            Some(text)
        };

        self.enter(PipelineStage::Resolving, deck_id);
        let source = self
            .resolve_source(deck_id, &user_id, extracted)
            .await
            .map_err(|e| PipelineError::new(PipelineStage::Resolving, e))?;

        let _deck_guard = if self.config.serialize_per_deck {
            Some(self.locks.acquire(deck_id).await)
        } else {
            None
        };

        self.enter(PipelineStage::IndexingDuplicates, deck_id);
        let existing = self
            .flashcards
            .list_questions(deck_id, &user_id)
            .await
            .map(DuplicateIndex::from_questions)
            .map_err(|e| PipelineError::new(PipelineStage::IndexingDuplicates, e))?;

        self.enter(PipelineStage::Generating, deck_id);
        let system = flashcard_system_prompt(target_count, &existing);
        let raw = self
            .call_model(&system, source.text())
            .await
            .map_err(|e| PipelineError::new(PipelineStage::Generating, e))?;

        self.enter(PipelineStage::Recovering, deck_id);
        let recovered =
            recover(&raw).map_err(|e| PipelineError::new(PipelineStage::Recovering, e))?;
        if recovered.tier == RecoveryTier::Pattern {
            warn!(
                subsystem = "api",
                component = "pipeline",
                deck_id = %deck_id,
                response_len = raw.len(),
                pair_count = recovered.pairs.len(),
                "Model response needed pattern fallback"
            );
        }

        self.enter(PipelineStage::Persisting, deck_id);
        let outcome = self
            .flashcards
            .persist_generated(&user_id, deck_id, &recovered.pairs, source.to_persist())
            .await
            .map_err(|e| PipelineError::new(PipelineStage::Persisting, e))?;

        info!(
            subsystem = "api",
            component = "pipeline",
            op = "generate",
            deck_id = %deck_id,
            user_id = %user_id,
            existing_count = existing.len(),
            pair_count = outcome.inserted.len(),
            flashcard_count = outcome.flashcard_count,
            tier = %recovered.tier,
            duration_ms = start.elapsed().as_millis() as u64,
            "Flashcards generated"
        );

        Ok(GenerationOutcome {
            flashcards: outcome.inserted.iter().map(|card| card.pair()).collect(),
            flashcard_count: outcome.flashcard_count,
            tier: recovered.tier,
        })
    }

    /// Pick the source text for this run.
    ///
    /// The deck is fetched either way so a missing or foreign deck fails
    /// before the model is called.
    async fn resolve_source(
        &self,
        deck_id: Uuid,
        user_id: &str,
        extracted: Option<String>,
    ) -> studydeck_core::Result<SourceText> {
        let deck = self.decks.fetch(deck_id, user_id).await?;
        match extracted.map(|text| strip_control_chars(&text)) {
            Some(text) if text.trim().is_empty() => Err(Error::EmptySource(deck_id)),
            Some(text) => Ok(SourceText::Extracted(text)),
            None => deck
                .usable_source_text()
                .map(|text| SourceText::Stored(text.to_string()))
                .ok_or(Error::EmptySource(deck_id)),
        }
    }

    async fn call_model(&self, system: &str, source: &str) -> studydeck_core::Result<String> {
        let timeout = self.config.timeout;
        match tokio::time::timeout(timeout, self.backend.generate_with_system(system, source))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Generation(format!(
                "timed out after {}s waiting for {}",
                timeout.as_secs(),
                self.backend.model_name()
            ))),
        }
    }

    fn enter(&self, stage: PipelineStage, deck_id: Uuid) {
        debug!(
            subsystem = "api",
            component = "pipeline",
            stage = %stage,
            deck_id = %deck_id,
            "Pipeline stage entered"
        );
    }
}

//! Flashcard repository implementation.
//!
//! Every mutation runs in a transaction that ends with a recount of the
//! owning deck, so `deck.flashcard_count` always matches the rows.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use studydeck_core::{
    Error, Flashcard, FlashcardPair, FlashcardRepository, PersistOutcome, Result,
};

use crate::decks::recount;

const FLASHCARD_COLUMNS: &str = "id, user_id, deck_id, question, answer, created_at_utc";

/// PostgreSQL implementation of FlashcardRepository.
#[derive(Clone)]
pub struct PgFlashcardRepository {
    pool: Pool<Postgres>,
}

impl PgFlashcardRepository {
    /// Create a new PgFlashcardRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Lock the deck row for the rest of the transaction, checking ownership.
    async fn lock_deck(
        tx: &mut Transaction<'_, Postgres>,
        deck_id: Uuid,
        user_id: &str,
    ) -> Result<()> {
        let found = sqlx::query("SELECT id FROM deck WHERE id = $1 AND user_id = $2 FOR UPDATE")
            .bind(deck_id)
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?;

        if found.is_none() {
            return Err(Error::DeckNotFound(deck_id));
        }
        Ok(())
    }

    /// Insert a flashcard within an existing transaction.
    async fn insert_tx(
        tx: &mut Transaction<'_, Postgres>,
        card: &Flashcard,
    ) -> Result<Flashcard> {
        let row = sqlx::query(&format!(
            "INSERT INTO flashcard (id, user_id, deck_id, question, answer, created_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {FLASHCARD_COLUMNS}"
        ))
        .bind(card.id)
        .bind(&card.user_id)
        .bind(card.deck_id)
        .bind(&card.question)
        .bind(&card.answer)
        .bind(card.created_at_utc)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(flashcard_from_row(&row))
    }

    async fn persist_generated_tx(
        &self,
        user_id: &str,
        deck_id: Uuid,
        pairs: &[FlashcardPair],
        source_text: Option<&str>,
    ) -> Result<PersistOutcome> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        Self::lock_deck(&mut tx, deck_id, user_id).await?;

        if let Some(text) = source_text {
            sqlx::query("UPDATE deck SET source_text = $3 WHERE id = $1 AND user_id = $2")
                .bind(deck_id)
                .bind(user_id)
                .bind(text)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;
        }

        let mut inserted = Vec::with_capacity(pairs.len());
        for pair in pairs.iter().filter(|p| p.is_usable()) {
            let card = Flashcard::new(user_id, deck_id, pair.clone())?;
            inserted.push(Self::insert_tx(&mut tx, &card).await?);
        }

        let flashcard_count = recount(&mut *tx, deck_id).await?;
        tx.commit().await.map_err(Error::Database)?;

        Ok(PersistOutcome {
            inserted,
            flashcard_count,
        })
    }
}

fn flashcard_from_row(row: &PgRow) -> Flashcard {
    Flashcard {
        id: row.get("id"),
        user_id: row.get("user_id"),
        deck_id: row.get("deck_id"),
        question: row.get("question"),
        answer: row.get("answer"),
        created_at_utc: row.get("created_at_utc"),
    }
}

#[async_trait]
impl FlashcardRepository for PgFlashcardRepository {
    async fn list_questions(&self, deck_id: Uuid, user_id: &str) -> Result<Vec<String>> {
        let questions: Vec<String> = sqlx::query_scalar(
            "SELECT question FROM flashcard WHERE deck_id = $1 AND user_id = $2",
        )
        .bind(deck_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(questions)
    }

    async fn insert(
        &self,
        user_id: &str,
        deck_id: Uuid,
        pair: FlashcardPair,
    ) -> Result<Flashcard> {
        let card = Flashcard::new(user_id, deck_id, pair)?;
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        Self::lock_deck(&mut tx, deck_id, user_id).await?;
        let inserted = Self::insert_tx(&mut tx, &card).await?;
        recount(&mut *tx, deck_id).await?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(inserted)
    }

    async fn list(&self, deck_id: Uuid, user_id: &str) -> Result<Vec<Flashcard>> {
        let rows = sqlx::query(&format!(
            "SELECT {FLASHCARD_COLUMNS} FROM flashcard
             WHERE deck_id = $1 AND user_id = $2
             ORDER BY created_at_utc DESC, id DESC"
        ))
        .bind(deck_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(flashcard_from_row).collect())
    }

    async fn update(
        &self,
        flashcard_id: Uuid,
        user_id: &str,
        pair: FlashcardPair,
    ) -> Result<Flashcard> {
        if !pair.is_usable() {
            return Err(Error::Validation(
                "Both question and answer are required".to_string(),
            ));
        }

        let row = sqlx::query(&format!(
            "UPDATE flashcard SET question = $3, answer = $4
             WHERE id = $1 AND user_id = $2
             RETURNING {FLASHCARD_COLUMNS}"
        ))
        .bind(flashcard_id)
        .bind(user_id)
        .bind(&pair.question)
        .bind(&pair.answer)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref()
            .map(flashcard_from_row)
            .ok_or(Error::FlashcardNotFound(flashcard_id))
    }

    async fn delete(&self, flashcard_id: Uuid, user_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let deck_id: Option<Uuid> = sqlx::query_scalar(
            "DELETE FROM flashcard WHERE id = $1 AND user_id = $2 RETURNING deck_id",
        )
        .bind(flashcard_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let deck_id = deck_id.ok_or(Error::FlashcardNotFound(flashcard_id))?;
        recount(&mut *tx, deck_id).await?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn persist_generated(
        &self,
        user_id: &str,
        deck_id: Uuid,
        pairs: &[FlashcardPair],
        source_text: Option<&str>,
    ) -> Result<PersistOutcome> {
        let start = Instant::now();
        debug!(
            subsystem = "db",
            component = "flashcards",
            op = "persist_generated",
            deck_id = %deck_id,
            pair_count = pairs.len(),
            stores_source = source_text.is_some(),
            "Persisting generated flashcards"
        );

        // The transaction rolls back when dropped on any early return.
        let outcome = self
            .persist_generated_tx(user_id, deck_id, pairs, source_text)
            .await
            .map_err(|e| match e {
                Error::Database(db) => Error::Persistence(db.to_string()),
                other => other,
            })?;

        info!(
            subsystem = "db",
            component = "flashcards",
            op = "persist_generated",
            deck_id = %deck_id,
            pair_count = outcome.inserted.len(),
            flashcard_count = outcome.flashcard_count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Generated flashcards persisted"
        );
        Ok(outcome)
    }
}

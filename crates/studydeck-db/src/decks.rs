//! Deck repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Executor, Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use studydeck_core::{Deck, DeckRepository, Error, Result};

const DECK_COLUMNS: &str = "id, user_id, name, source_text, flashcard_count, created_at_utc";

/// PostgreSQL implementation of DeckRepository.
#[derive(Clone)]
pub struct PgDeckRepository {
    pool: Pool<Postgres>,
}

impl PgDeckRepository {
    /// Create a new PgDeckRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

pub(crate) fn deck_from_row(row: &PgRow) -> Deck {
    Deck {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        source_text: row.get("source_text"),
        flashcard_count: row.get("flashcard_count"),
        created_at_utc: row.get("created_at_utc"),
    }
}

/// Recompute `deck.flashcard_count` from the flashcard rows in one statement.
///
/// Accepts a pool or an open transaction so callers can keep the recount
/// inside the same unit of work as their inserts or deletes.
pub(crate) async fn recount<'e, E>(executor: E, deck_id: Uuid) -> Result<i64>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query(
        "UPDATE deck
         SET flashcard_count = (SELECT COUNT(*) FROM flashcard WHERE deck_id = $1)
         WHERE id = $1
         RETURNING flashcard_count",
    )
    .bind(deck_id)
    .fetch_optional(executor)
    .await
    .map_err(Error::Database)?;

    let count: i64 = row
        .map(|r| r.get("flashcard_count"))
        .ok_or(Error::DeckNotFound(deck_id))?;

    debug!(
        subsystem = "db",
        component = "decks",
        op = "recount",
        deck_id = %deck_id,
        flashcard_count = count,
        "Recomputed deck flashcard count"
    );
    Ok(count)
}

#[async_trait]
impl DeckRepository for PgDeckRepository {
    async fn create(&self, deck: Deck) -> Result<Deck> {
        let row = sqlx::query(&format!(
            "INSERT INTO deck (id, user_id, name, source_text, flashcard_count, created_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {DECK_COLUMNS}"
        ))
        .bind(deck.id)
        .bind(&deck.user_id)
        .bind(&deck.name)
        .bind(&deck.source_text)
        .bind(deck.flashcard_count)
        .bind(deck.created_at_utc)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(deck_from_row(&row))
    }

    async fn fetch(&self, deck_id: Uuid, user_id: &str) -> Result<Deck> {
        let row = sqlx::query(&format!(
            "SELECT {DECK_COLUMNS} FROM deck WHERE id = $1 AND user_id = $2"
        ))
        .bind(deck_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref()
            .map(deck_from_row)
            .ok_or(Error::DeckNotFound(deck_id))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Deck>> {
        let rows = sqlx::query(&format!(
            "SELECT {DECK_COLUMNS} FROM deck
             WHERE user_id = $1
             ORDER BY created_at_utc DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(deck_from_row).collect())
    }

    async fn rename(&self, deck_id: Uuid, user_id: &str, name: &str) -> Result<Deck> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("deckName is required".to_string()));
        }

        let row = sqlx::query(&format!(
            "UPDATE deck SET name = $3
             WHERE id = $1 AND user_id = $2
             RETURNING {DECK_COLUMNS}"
        ))
        .bind(deck_id)
        .bind(user_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref()
            .map(deck_from_row)
            .ok_or(Error::DeckNotFound(deck_id))
    }

    async fn delete(&self, deck_id: Uuid, user_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM deck WHERE id = $1 AND user_id = $2")
            .bind(deck_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::DeckNotFound(deck_id));
        }
        Ok(())
    }

    async fn set_source_text(&self, deck_id: Uuid, user_id: &str, text: &str) -> Result<()> {
        let result =
            sqlx::query("UPDATE deck SET source_text = $3 WHERE id = $1 AND user_id = $2")
                .bind(deck_id)
                .bind(user_id)
                .bind(text)
                .execute(&self.pool)
                .await
                .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::DeckNotFound(deck_id));
        }
        Ok(())
    }

    async fn count_flashcards(&self, deck_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM flashcard WHERE deck_id = $1")
            .bind(deck_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(count)
    }

    async fn set_flashcard_count(&self, deck_id: Uuid, count: i64) -> Result<()> {
        let result = sqlx::query("UPDATE deck SET flashcard_count = $2 WHERE id = $1")
            .bind(deck_id)
            .bind(count)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::DeckNotFound(deck_id));
        }
        Ok(())
    }

    async fn recount_flashcards(&self, deck_id: Uuid) -> Result<i64> {
        recount(&self.pool, deck_id).await
    }
}

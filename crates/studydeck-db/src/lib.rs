//! # studydeck-db
//!
//! Storage layer for studydeck.
//!
//! This crate provides:
//! - Connection pool management
//! - PostgreSQL repositories for decks and flashcards
//! - An in-memory store implementing the same traits
//!
//! ## Example
//!
//! ```rust,ignore
//! use studydeck_db::{Database, Deck, DeckRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/studydeck").await?;
//!     db.migrate().await?;
//!
//!     let deck = db.decks.create(Deck::new("user_1", "Biology")?).await?;
//!     println!("Created deck: {}", deck.id);
//!     Ok(())
//! }
//! ```

pub mod decks;
pub mod flashcards;
pub mod memory;
pub mod pool;

// Compiled outside cfg(test) so integration tests in tests/ can use it.
#[cfg(feature = "migrations")]
pub mod test_fixtures;

// Re-export core types
pub use studydeck_core::*;

pub use decks::PgDeckRepository;
pub use flashcards::PgFlashcardRepository;
pub use memory::InMemoryStore;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};

/// Combined database context with all repositories.
pub struct Database {
    pool: sqlx::Pool<sqlx::Postgres>,
    pub decks: PgDeckRepository,
    pub flashcards: PgFlashcardRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            decks: PgDeckRepository::new(pool.clone()),
            flashcards: PgFlashcardRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

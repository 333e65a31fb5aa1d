//! Test fixtures for database integration tests.
//!
//! Each `TestDatabase` gets its own schema so tests can run in parallel
//! against one server.
//!
//! ## Configuration
//!
//! The test database URL is read from `DATABASE_URL`. When it is unset,
//! [`TestDatabase::from_env`] returns `None` and callers skip.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use studydeck_db::test_fixtures::TestDatabase;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let Some(test_db) = TestDatabase::from_env().await else { return };
//!     let deck = test_db.deck("user_1", "Biology").await;
//!     // ...
//!     test_db.cleanup().await;
//! }
//! ```

use std::time::Duration;

use sqlx::{Executor, PgPool};
use uuid::Uuid;

use crate::{Database, Deck, DeckRepository, PoolConfig};

/// Test database connection with automatic cleanup.
pub struct TestDatabase {
    pub pool: PgPool,
    pub db: Database,
    schema_name: String,
    cleanup_on_drop: bool,
}

impl TestDatabase {
    /// Connect to `DATABASE_URL` inside a fresh schema with migrations applied.
    ///
    /// Returns `None` when `DATABASE_URL` is unset.
    pub async fn from_env() -> Option<Self> {
        let database_url = std::env::var("DATABASE_URL").ok()?;
        Some(Self::connect(&database_url).await)
    }

    async fn connect(database_url: &str) -> Self {
        let schema_name = format!("test_{}", Uuid::new_v4().simple());

        let admin = PoolConfig::new()
            .max_connections(1)
            .pool_options()
            .connect(database_url)
            .await
            .expect("Failed to connect to test database");
        admin
            .execute(format!("CREATE SCHEMA {}", schema_name).as_str())
            .await
            .expect("Failed to create test schema");
        admin.close().await;

        // Every pooled connection must see the test schema, not just the first.
        let search_path = format!("SET search_path TO {}, public", schema_name);
        let pool = PoolConfig::new()
            .max_connections(5)
            .connect_timeout(Duration::from_secs(30))
            .pool_options()
            .after_connect(move |conn, _meta| {
                let search_path = search_path.clone();
                Box::pin(async move {
                    conn.execute(search_path.as_str()).await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await
            .expect("Failed to create test database pool");

        let db = Database::new(pool.clone());
        db.migrate().await.expect("Failed to run migrations");

        Self {
            pool,
            db,
            schema_name,
            cleanup_on_drop: true,
        }
    }

    /// Create a deck owned by `user_id`.
    pub async fn deck(&self, user_id: &str, name: &str) -> Deck {
        self.db
            .decks
            .create(Deck::new(user_id, name).expect("valid deck"))
            .await
            .expect("Failed to create deck")
    }

    /// Manually clean up test data and drop schema.
    pub async fn cleanup(mut self) {
        if self.cleanup_on_drop {
            let _ = sqlx::query(&format!(
                "DROP SCHEMA IF EXISTS {} CASCADE",
                self.schema_name
            ))
            .execute(&self.pool)
            .await;
            self.cleanup_on_drop = false;
        }
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        if self.cleanup_on_drop {
            let pool = self.pool.clone();
            let schema = self.schema_name.clone();
            tokio::spawn(async move {
                let _ = sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema))
                    .execute(&pool)
                    .await;
            });
        }
    }
}

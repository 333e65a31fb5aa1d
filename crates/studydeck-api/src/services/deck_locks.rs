//! Per-deck mutual exclusion for generation runs.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;
use uuid::Uuid;

/// Registry of async mutexes keyed by deck.
///
/// Holding the guard returned by [`DeckLocks::acquire`] keeps other runs
/// against the same deck waiting. Entries nobody holds or waits on are
/// pruned whenever a lock is acquired.
#[derive(Clone, Default)]
pub struct DeckLocks {
    locks: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl DeckLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `deck_id`.
    pub async fn acquire(&self, deck_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Only the map references an idle entry.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(deck_id).or_default().clone()
        };
        trace!(
            subsystem = "api",
            component = "deck_locks",
            deck_id = %deck_id,
            "Waiting for deck lock"
        );
        lock.lock_owned().await
    }

    /// Number of tracked decks.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

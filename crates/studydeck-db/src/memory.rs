//! In-memory storage backend.
//!
//! Implements the same repository traits as the PostgreSQL backend, with one
//! mutex around all state so every mutation is atomic. Used by tests and by
//! local runs with `STORAGE=memory`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use studydeck_core::{
    Deck, DeckRepository, Error, Flashcard, FlashcardPair, FlashcardRepository, PersistOutcome,
    Result,
};

#[derive(Default)]
struct State {
    decks: HashMap<Uuid, Deck>,
    // Insertion order doubles as creation order.
    flashcards: Vec<Flashcard>,
}

impl State {
    fn owned_deck(&self, deck_id: Uuid, user_id: &str) -> Result<&Deck> {
        self.decks
            .get(&deck_id)
            .filter(|d| d.user_id == user_id)
            .ok_or(Error::DeckNotFound(deck_id))
    }

    fn recount(&mut self, deck_id: Uuid) -> Result<i64> {
        let count = self
            .flashcards
            .iter()
            .filter(|c| c.deck_id == deck_id)
            .count() as i64;
        let deck = self
            .decks
            .get_mut(&deck_id)
            .ok_or(Error::DeckNotFound(deck_id))?;
        deck.flashcard_count = count;
        Ok(count)
    }
}

/// Deck and flashcard storage held in process memory.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    persist_calls: AtomicUsize,
    fail_persistence: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `persist_generated` invocations, successful or not.
    pub fn persist_calls(&self) -> usize {
        self.persist_calls.load(Ordering::SeqCst)
    }

    /// Make `persist_generated` fail with `Persistence` without writing.
    pub fn set_fail_persistence(&self, fail: bool) {
        self.fail_persistence.store(fail, Ordering::SeqCst);
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::Internal("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl DeckRepository for InMemoryStore {
    async fn create(&self, deck: Deck) -> Result<Deck> {
        let mut state = self.state()?;
        state.decks.insert(deck.id, deck.clone());
        Ok(deck)
    }

    async fn fetch(&self, deck_id: Uuid, user_id: &str) -> Result<Deck> {
        self.state()?.owned_deck(deck_id, user_id).cloned()
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Deck>> {
        let state = self.state()?;
        let mut decks: Vec<Deck> = state
            .decks
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        decks.sort_by(|a, b| (b.created_at_utc, b.id).cmp(&(a.created_at_utc, a.id)));
        Ok(decks)
    }

    async fn rename(&self, deck_id: Uuid, user_id: &str, name: &str) -> Result<Deck> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("deckName is required".to_string()));
        }
        let mut state = self.state()?;
        state.owned_deck(deck_id, user_id)?;
        let deck = state
            .decks
            .get_mut(&deck_id)
            .ok_or(Error::DeckNotFound(deck_id))?;
        deck.name = name.to_string();
        Ok(deck.clone())
    }

    async fn delete(&self, deck_id: Uuid, user_id: &str) -> Result<()> {
        let mut state = self.state()?;
        state.owned_deck(deck_id, user_id)?;
        state.decks.remove(&deck_id);
        state.flashcards.retain(|c| c.deck_id != deck_id);
        Ok(())
    }

    async fn set_source_text(&self, deck_id: Uuid, user_id: &str, text: &str) -> Result<()> {
        let mut state = self.state()?;
        state.owned_deck(deck_id, user_id)?;
        if let Some(deck) = state.decks.get_mut(&deck_id) {
            deck.source_text = Some(text.to_string());
        }
        Ok(())
    }

    async fn count_flashcards(&self, deck_id: Uuid) -> Result<i64> {
        let state = self.state()?;
        Ok(state
            .flashcards
            .iter()
            .filter(|c| c.deck_id == deck_id)
            .count() as i64)
    }

    async fn set_flashcard_count(&self, deck_id: Uuid, count: i64) -> Result<()> {
        let mut state = self.state()?;
        let deck = state
            .decks
            .get_mut(&deck_id)
            .ok_or(Error::DeckNotFound(deck_id))?;
        deck.flashcard_count = count;
        Ok(())
    }

    async fn recount_flashcards(&self, deck_id: Uuid) -> Result<i64> {
        self.state()?.recount(deck_id)
    }
}

#[async_trait]
impl FlashcardRepository for InMemoryStore {
    async fn list_questions(&self, deck_id: Uuid, user_id: &str) -> Result<Vec<String>> {
        let state = self.state()?;
        Ok(state
            .flashcards
            .iter()
            .filter(|c| c.deck_id == deck_id && c.user_id == user_id)
            .map(|c| c.question.clone())
            .collect())
    }

    async fn insert(
        &self,
        user_id: &str,
        deck_id: Uuid,
        pair: FlashcardPair,
    ) -> Result<Flashcard> {
        let card = Flashcard::new(user_id, deck_id, pair)?;
        let mut state = self.state()?;
        state.owned_deck(deck_id, user_id)?;
        state.flashcards.push(card.clone());
        state.recount(deck_id)?;
        Ok(card)
    }

    async fn list(&self, deck_id: Uuid, user_id: &str) -> Result<Vec<Flashcard>> {
        let state = self.state()?;
        Ok(state
            .flashcards
            .iter()
            .rev()
            .filter(|c| c.deck_id == deck_id && c.user_id == user_id)
            .cloned()
            .collect())
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
        let mut state = self.state()?;
        let card = state
            .flashcards
            .iter_mut()
            .find(|c| c.id == flashcard_id && c.user_id == user_id)
            .ok_or(Error::FlashcardNotFound(flashcard_id))?;
        card.question = pair.question;
        card.answer = pair.answer;
        Ok(card.clone())
    }

    async fn delete(&self, flashcard_id: Uuid, user_id: &str) -> Result<()> {
        let mut state = self.state()?;
        let position = state
            .flashcards
            .iter()
            .position(|c| c.id == flashcard_id && c.user_id == user_id)
            .ok_or(Error::FlashcardNotFound(flashcard_id))?;
        let removed = state.flashcards.remove(position);
        state.recount(removed.deck_id)?;
        Ok(())
    }

    async fn persist_generated(
        &self,
        user_id: &str,
        deck_id: Uuid,
        pairs: &[FlashcardPair],
        source_text: Option<&str>,
    ) -> Result<PersistOutcome> {
        self.persist_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_persistence.load(Ordering::SeqCst) {
            return Err(Error::Persistence("simulated storage failure".to_string()));
        }

        let mut state = self.state()?;
        state.owned_deck(deck_id, user_id)?;

        // Build every row before touching state so a failure writes nothing.
        let inserted = pairs
            .iter()
            .filter(|p| p.is_usable())
            .map(|p| Flashcard::new(user_id, deck_id, p.clone()))
            .collect::<Result<Vec<_>>>()?;

        if let Some(text) = source_text {
            if let Some(deck) = state.decks.get_mut(&deck_id) {
                deck.source_text = Some(text.to_string());
            }
        }
        state.flashcards.extend(inserted.iter().cloned());
        let flashcard_count = state.recount(deck_id)?;

        Ok(PersistOutcome {
            inserted,
            flashcard_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(q: &str, a: &str) -> FlashcardPair {
        FlashcardPair::new(q, a).unwrap()
    }

    async fn store_with_deck() -> (InMemoryStore, Deck) {
        let store = InMemoryStore::new();
        let deck = store
            .create(Deck::new("user_1", "Biology").unwrap())
            .await
            .unwrap();
        (store, deck)
    }

    #[tokio::test]
    async fn test_fetch_scoped_by_owner() {
        let (store, deck) = store_with_deck().await;
        assert!(store.fetch(deck.id, "user_1").await.is_ok());
        assert!(matches!(
            store.fetch(deck.id, "user_2").await,
            Err(Error::DeckNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_persist_generated_adds_to_existing_count() {
        let (store, deck) = store_with_deck().await;
        for i in 0..3 {
            store
                .insert("user_1", deck.id, pair(&format!("Q{i}"), "A"))
                .await
                .unwrap();
        }

        let outcome = store
            .persist_generated(
                "user_1",
                deck.id,
                &[pair("N1", "A"), pair("N2", "A")],
                Some("notes"),
            )
            .await
            .unwrap();

        assert_eq!(outcome.inserted.len(), 2);
        assert_eq!(outcome.flashcard_count, 5);
        let deck = store.fetch(deck.id, "user_1").await.unwrap();
        assert_eq!(deck.flashcard_count, 5);
        assert_eq!(deck.source_text.as_deref(), Some("notes"));
    }

    #[tokio::test]
    async fn test_persist_generated_skips_blank_pairs() {
        let (store, deck) = store_with_deck().await;
        let pairs = vec![
            pair("Q", "A"),
            FlashcardPair {
                question: "  ".to_string(),
                answer: "A".to_string(),
            },
        ];
        let outcome = store
            .persist_generated("user_1", deck.id, &pairs, None)
            .await
            .unwrap();
        assert_eq!(outcome.inserted.len(), 1);
        assert_eq!(outcome.flashcard_count, 1);
    }

    #[tokio::test]
    async fn test_persist_failure_writes_nothing() {
        let (store, deck) = store_with_deck().await;
        store.set_fail_persistence(true);
        let err = store
            .persist_generated("user_1", deck.id, &[pair("Q", "A")], Some("notes"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
        assert_eq!(store.persist_calls(), 1);

        let deck = store.fetch(deck.id, "user_1").await.unwrap();
        assert_eq!(deck.flashcard_count, 0);
        assert!(deck.source_text.is_none());
    }

    #[tokio::test]
    async fn test_recount_is_idempotent() {
        let (store, deck) = store_with_deck().await;
        store.insert("user_1", deck.id, pair("Q", "A")).await.unwrap();
        assert_eq!(store.recount_flashcards(deck.id).await.unwrap(), 1);
        assert_eq!(store.recount_flashcards(deck.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_flashcard_recounts() {
        let (store, deck) = store_with_deck().await;
        let card = store.insert("user_1", deck.id, pair("Q", "A")).await.unwrap();
        assert!(matches!(
            FlashcardRepository::delete(&store, card.id, "user_2").await,
            Err(Error::FlashcardNotFound(_))
        ));
        FlashcardRepository::delete(&store, card.id, "user_1")
            .await
            .unwrap();
        let deck = store.fetch(deck.id, "user_1").await.unwrap();
        assert_eq!(deck.flashcard_count, 0);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let (store, deck) = store_with_deck().await;
        store.insert("user_1", deck.id, pair("First", "A")).await.unwrap();
        store.insert("user_1", deck.id, pair("Second", "A")).await.unwrap();
        let cards = store.list(deck.id, "user_1").await.unwrap();
        assert_eq!(cards[0].question, "Second");
        assert_eq!(cards[1].question, "First");
    }

    #[tokio::test]
    async fn test_delete_deck_cascades() {
        let (store, deck) = store_with_deck().await;
        store.insert("user_1", deck.id, pair("Q", "A")).await.unwrap();
        DeckRepository::delete(&store, deck.id, "user_1")
            .await
            .unwrap();
        assert!(store.list(deck.id, "user_1").await.unwrap().is_empty());
    }
}

//! Integration tests for the deck flashcard count invariant.
//!
//! Requires a PostgreSQL server at `DATABASE_URL`; each test is a no-op when
//! the variable is unset.

use studydeck_db::test_fixtures::TestDatabase;
use studydeck_db::{DeckRepository, Error, FlashcardPair, FlashcardRepository};

async fn test_db() -> Option<TestDatabase> {
    dotenvy::dotenv().ok();
    TestDatabase::from_env().await
}

fn pair(q: &str, a: &str) -> FlashcardPair {
    FlashcardPair::new(q, a).unwrap()
}

#[tokio::test]
async fn test_persist_generated_counts_prior_and_new_rows() {
    let Some(test_db) = test_db().await else {
        return;
    };
    let deck = test_db.deck("user_1", "Biology").await;

    for i in 0..3 {
        test_db
            .db
            .flashcards
            .insert("user_1", deck.id, pair(&format!("Existing {i}"), "A"))
            .await
            .unwrap();
    }

    let pairs: Vec<FlashcardPair> = (0..4).map(|i| pair(&format!("New {i}"), "A")).collect();
    let outcome = test_db
        .db
        .flashcards
        .persist_generated("user_1", deck.id, &pairs, Some("cell notes"))
        .await
        .unwrap();

    assert_eq!(outcome.inserted.len(), 4);
    assert_eq!(outcome.flashcard_count, 7);

    let stored = test_db.db.decks.fetch(deck.id, "user_1").await.unwrap();
    assert_eq!(stored.flashcard_count, 7);
    assert_eq!(stored.source_text.as_deref(), Some("cell notes"));

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_recount_is_idempotent() {
    let Some(test_db) = test_db().await else {
        return;
    };
    let deck = test_db.deck("user_1", "Chemistry").await;
    test_db
        .db
        .flashcards
        .insert("user_1", deck.id, pair("What is H2O?", "Water"))
        .await
        .unwrap();

    let first = test_db.db.decks.recount_flashcards(deck.id).await.unwrap();
    let second = test_db.db.decks.recount_flashcards(deck.id).await.unwrap();
    assert_eq!(first, 1);
    assert_eq!(first, second);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_persist_generated_for_foreign_deck_writes_nothing() {
    let Some(test_db) = test_db().await else {
        return;
    };
    let deck = test_db.deck("owner", "Physics").await;

    let err = test_db
        .db
        .flashcards
        .persist_generated("intruder", deck.id, &[pair("Q", "A")], Some("notes"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DeckNotFound(_)));

    let stored = test_db.db.decks.fetch(deck.id, "owner").await.unwrap();
    assert_eq!(stored.flashcard_count, 0);
    assert!(stored.source_text.is_none());

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_delete_flashcard_recounts_deck() {
    let Some(test_db) = test_db().await else {
        return;
    };
    let deck = test_db.deck("user_1", "History").await;
    let card = test_db
        .db
        .flashcards
        .insert("user_1", deck.id, pair("When?", "1066"))
        .await
        .unwrap();
    test_db
        .db
        .flashcards
        .insert("user_1", deck.id, pair("Who?", "William"))
        .await
        .unwrap();

    FlashcardRepository::delete(&test_db.db.flashcards, card.id, "user_1")
        .await
        .unwrap();

    let stored = test_db.db.decks.fetch(deck.id, "user_1").await.unwrap();
    assert_eq!(stored.flashcard_count, 1);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_list_questions_scoped_to_owner() {
    let Some(test_db) = test_db().await else {
        return;
    };
    let deck = test_db.deck("user_1", "Art").await;
    test_db
        .db
        .flashcards
        .insert("user_1", deck.id, pair("Who painted the Mona Lisa?", "Leonardo"))
        .await
        .unwrap();

    let own = test_db
        .db
        .flashcards
        .list_questions(deck.id, "user_1")
        .await
        .unwrap();
    let other = test_db
        .db
        .flashcards
        .list_questions(deck.id, "user_2")
        .await
        .unwrap();
    assert_eq!(own, vec!["Who painted the Mona Lisa?".to_string()]);
    assert!(other.is_empty());

    test_db.cleanup().await;
}

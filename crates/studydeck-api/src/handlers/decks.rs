//! Deck HTTP handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use studydeck_core::Deck;

use super::flashcards::OwnerQuery;
use crate::{ApiError, AppState};

/// Body of deck create and rename requests.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckBody {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub deck_name: String,
}

#[derive(Debug, Serialize)]
pub struct DeckResponse {
    pub success: bool,
    pub deck: Deck,
}

#[derive(Debug, Serialize)]
pub struct DeckListResponse {
    pub success: bool,
    pub decks: Vec<Deck>,
}

/// Create an empty deck.
///
/// # Returns
/// - 201 Created with the new deck
/// - 400 Bad Request if `userId` or `deckName` is blank
pub async fn create_deck(
    State(state): State<AppState>,
    Json(body): Json<DeckBody>,
) -> Result<(StatusCode, Json<DeckResponse>), ApiError> {
    let deck = Deck::new(&body.user_id, &body.deck_name)?;
    let deck = state.decks.create(deck).await?;
    Ok((
        StatusCode::CREATED,
        Json(DeckResponse {
            success: true,
            deck,
        }),
    ))
}

/// List a user's decks, newest first.
pub async fn list_decks(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<DeckListResponse>, ApiError> {
    let decks = state.decks.list_for_user(&user_id).await?;
    Ok(Json(DeckListResponse {
        success: true,
        decks,
    }))
}

/// Rename a deck.
pub async fn rename_deck(
    State(state): State<AppState>,
    Path(deck_id): Path<Uuid>,
    Json(body): Json<DeckBody>,
) -> Result<Json<DeckResponse>, ApiError> {
    let deck = state
        .decks
        .rename(deck_id, &body.user_id, &body.deck_name)
        .await?;
    Ok(Json(DeckResponse {
        success: true,
        deck,
    }))
}

/// Delete a deck together with its flashcards.
pub async fn delete_deck(
    State(state): State<AppState>,
    Path(deck_id): Path<Uuid>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.decks.delete(deck_id, owner.user_id()?).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

//! HTTP handlers for studydeck-api.

pub mod decks;
pub mod flashcards;

use axum::{extract::State, response::IntoResponse, Json};

use crate::AppState;

/// Liveness probe. Reports the model backend's reachability without failing.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.generator.backend();
    let model_reachable = backend.health_check().await.unwrap_or(false);
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "model": backend.model_name(),
        "model_reachable": model_reachable,
    }))
}

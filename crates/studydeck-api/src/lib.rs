//! # studydeck-api
//!
//! HTTP surface of the studydeck flashcard service.
//!
//! The router is built from an [`AppState`] holding injected repositories and
//! a [`FlashcardGenerator`]; the binary in `main.rs` wires real backends, and
//! tests wire the in-memory store and a scripted model.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use studydeck_core::{DeckRepository, FlashcardRepository};

pub use config::{GenerationConfig, ServerConfig, StorageKind};
pub use error::ApiError;
pub use services::{DeckLocks, FlashcardGenerator, PipelineError, PipelineStage};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub decks: Arc<dyn DeckRepository>,
    pub flashcards: Arc<dyn FlashcardRepository>,
    pub generator: Arc<FlashcardGenerator>,
}

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Build the application router with all middleware.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Decks
        .route("/api/decks", post(handlers::decks::create_deck))
        // GET takes a user id, PUT and DELETE a deck id.
        .route(
            "/api/decks/:id",
            get(handlers::decks::list_decks)
                .put(handlers::decks::rename_deck)
                .delete(handlers::decks::delete_deck),
        )
        // Flashcards
        .route(
            "/api/flashcards/generate-flashcards",
            post(handlers::flashcards::generate_flashcards),
        )
        .route("/api/flashcards", post(handlers::flashcards::create_flashcard))
        // Shared first segment: a user id on GET, a flashcard id on PUT and DELETE.
        .route(
            "/api/flashcards/:id/:deck_id",
            get(handlers::flashcards::list_flashcards),
        )
        .route(
            "/api/flashcards/:id",
            put(handlers::flashcards::update_flashcard)
                .delete(handlers::flashcards::delete_flashcard),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(config.cors_origins()))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(Duration::from_secs(3600)),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .layer(axum::middleware::from_fn(middleware::json_error_envelope))
        .with_state(state)
}

//! studydeck-api - HTTP API server for studydeck

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studydeck_api::{
    build_router, AppState, FlashcardGenerator, GenerationConfig, ServerConfig, StorageKind,
};
use studydeck_core::{DeckRepository, FlashcardRepository};
use studydeck_db::{Database, InMemoryStore, PoolConfig};
use studydeck_inference::OpenAIBackend;

/// Initialize tracing with configurable output.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables daily-rolling file logging)
///   LOG_ANSI    - "true"/"false" override ANSI colors
///   RUST_LOG    - standard env filter (default: "studydeck_api=debug,tower_http=debug")
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "studydeck_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let path = std::path::Path::new(path);
        let file_dir = path.parent().unwrap_or(std::path::Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("studydeck-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );
    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _file_guard = init_tracing();

    let server_config = ServerConfig::from_env();
    let generation_config = GenerationConfig::from_env();

    let (decks, flashcards): (Arc<dyn DeckRepository>, Arc<dyn FlashcardRepository>) =
        match server_config.storage {
            StorageKind::Memory => {
                info!("Using in-memory storage");
                let store = Arc::new(InMemoryStore::new());
                let decks: Arc<dyn DeckRepository> = store.clone();
                let flashcards: Arc<dyn FlashcardRepository> = store;
                (decks, flashcards)
            }
            StorageKind::Postgres => {
                let database_url =
                    std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

                info!("Connecting to database...");
                let db = Database::connect_with_config(&database_url, PoolConfig::from_env())
                    .await?;
                info!("Database connected");

                info!("Running database migrations...");
                db.migrate().await?;
                info!("Database migrations complete");

                let decks: Arc<dyn DeckRepository> = Arc::new(db.decks.clone());
                let flashcards: Arc<dyn FlashcardRepository> = Arc::new(db.flashcards.clone());
                (decks, flashcards)
            }
        };

    let backend = OpenAIBackend::from_env()?;
    info!(
        model = backend.config().gen_model.as_str(),
        base_url = backend.config().base_url.as_str(),
        api_key_set = backend.config().api_key.is_some(),
        "Generation backend configured"
    );

    let generator = FlashcardGenerator::new(
        decks.clone(),
        flashcards.clone(),
        Arc::new(backend),
        generation_config,
    );
    let state = AppState {
        decks,
        flashcards,
        generator: Arc::new(generator),
    };
    let app = build_router(state, &server_config);

    let addr: SocketAddr = format!("{}:{}", server_config.host, server_config.port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! Server and generation configuration loaded from the environment.

use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use tracing::warn;

use studydeck_core::defaults::{
    FLASHCARD_TARGET_COUNT, GENERATION_SERIALIZE_PER_DECK, GENERATION_TIMEOUT_SECS,
    MAX_UPLOAD_BYTES, SERVER_PORT,
};

/// Origins allowed when neither `ALLOWED_ORIGINS` nor `FRONTEND_URL` is set.
const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Which storage backend serves the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Memory,
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub storage: StorageKind,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: SERVER_PORT,
            allowed_origins: vec![DEFAULT_ORIGIN.to_string()],
            max_upload_bytes: MAX_UPLOAD_BYTES,
            storage: StorageKind::Postgres,
        }
    }
}

impl ServerConfig {
    /// Load from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `HOST` | `0.0.0.0` |
    /// | `PORT` | `5000` |
    /// | `ALLOWED_ORIGINS` | comma-separated; falls back to `FRONTEND_URL`, then `http://localhost:3000` |
    /// | `MAX_UPLOAD_BYTES` | 25 MiB |
    /// | `STORAGE` | `postgres` (`memory` for the in-process store) |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let origins = std::env::var("ALLOWED_ORIGINS")
            .or_else(|_| std::env::var("FRONTEND_URL"))
            .unwrap_or_default();

        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            allowed_origins: parse_origin_list(&origins),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            storage: match std::env::var("STORAGE").as_deref() {
                Ok("memory") => StorageKind::Memory,
                _ => StorageKind::Postgres,
            },
        }
    }

    /// Allowed CORS origins as header values. Unparseable entries are skipped.
    ///
    /// `*` is skipped too: credentialed CORS cannot use a wildcard origin and
    /// tower-http panics when building such a layer.
    pub fn cors_origins(&self) -> Vec<HeaderValue> {
        self.allowed_origins
            .iter()
            .filter(|origin| {
                let wildcard = origin.as_str() == "*";
                if wildcard {
                    warn!("Ignoring wildcard CORS origin; list origins explicitly");
                }
                !wildcard
            })
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Invalid CORS origin '{}': {}", origin, e);
                    None
                }
            })
            .collect()
    }
}

fn parse_origin_list(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if origins.is_empty() {
        vec![DEFAULT_ORIGIN.to_string()]
    } else {
        origins
    }
}

/// Generation pipeline configuration.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Flashcards requested per run. Advisory.
    pub target_count: usize,
    /// Upper bound on the model call.
    pub timeout: Duration,
    /// Hold a per-deck lock across index, generate and persist.
    pub serialize_per_deck: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            target_count: FLASHCARD_TARGET_COUNT,
            timeout: Duration::from_secs(GENERATION_TIMEOUT_SECS),
            serialize_per_deck: GENERATION_SERIALIZE_PER_DECK,
        }
    }
}

impl GenerationConfig {
    /// Load from `GENERATION_TARGET_COUNT`, `GENERATION_TIMEOUT_SECS` and
    /// `GENERATION_SERIALIZE_PER_DECK`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            target_count: env_or("GENERATION_TARGET_COUNT", defaults.target_count),
            timeout: Duration::from_secs(env_or(
                "GENERATION_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )),
            serialize_per_deck: std::env::var("GENERATION_SERIALIZE_PER_DECK")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.serialize_per_deck),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(variable = key, value = %raw, "Ignoring unparseable environment value");
            default
        }),
        Err(_) => default,
    }
}

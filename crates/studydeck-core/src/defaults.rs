//! Centralized default constants for studydeck.
//!
//! All crates reference these constants instead of defining their own magic
//! numbers. Environment variables documented next to each value override it
//! at startup.

// =============================================================================
// GENERATION
// =============================================================================

/// Number of flashcards requested from the model per run.
///
/// Advisory: the recovery engine does not enforce it.
pub const FLASHCARD_TARGET_COUNT: usize = 12;

/// Upper bound on one generation pipeline's model call (`GENERATION_TIMEOUT_SECS`).
pub const GENERATION_TIMEOUT_SECS: u64 = 120;

/// Serialize generation runs against the same deck (`GENERATION_SERIALIZE_PER_DECK`).
pub const GENERATION_SERIALIZE_PER_DECK: bool = true;

// =============================================================================
// INFERENCE
// =============================================================================

/// OpenAI-compatible endpoint used when `LLM_BASE_URL` is unset.
pub const LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Chat model used when `LLM_MODEL` is unset.
pub const LLM_MODEL: &str = "llama-3.3-70b-versatile";

/// Sampling temperature used when `LLM_TEMPERATURE` is unset.
pub const LLM_TEMPERATURE: f32 = 0.7;

/// HTTP timeout for a single model request (`LLM_TIMEOUT_SECS`).
pub const LLM_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// SERVER
// =============================================================================

/// Listen port when `PORT` is unset.
pub const SERVER_PORT: u16 = 5000;

/// Maximum multipart upload size in bytes (`MAX_UPLOAD_BYTES`).
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

// =============================================================================
// DATABASE
// =============================================================================

/// Default maximum number of pooled connections (`DB_MAX_CONNECTIONS`).
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Connection acquire timeout in seconds.
pub const DB_CONNECT_TIMEOUT_SECS: u64 = 60;

/// Idle connection timeout in seconds.
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_count_matches_prompt_contract() {
        assert_eq!(FLASHCARD_TARGET_COUNT, 12);
    }

    #[test]
    fn test_timeouts_are_nonzero() {
        assert!(GENERATION_TIMEOUT_SECS > 0);
        assert!(LLM_TIMEOUT_SECS > 0);
    }
}

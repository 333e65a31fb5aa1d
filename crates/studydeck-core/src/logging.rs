//! Structured logging schema and field name constants for studydeck.
//!
//! All crates use these names for structured `tracing` fields so that log
//! aggregation can query by the same keys across subsystems. `tracing`
//! macros need literal field names, so the constants document the schema
//! and are used where fields are built dynamically.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Request failed on the server side, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied (e.g. Tier 2 recovery) |
//! | INFO  | Lifecycle events, completed generation runs |
//! | DEBUG | Pipeline stage transitions, intermediate sizes |
//! | TRACE | Per-item iteration (individual recovered pairs) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the `x-request-id` header (UUIDv7).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "inference", "extract"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pipeline", "recovery", "openai", "pool", "deck_locks"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "generate", "recover", "persist", "extract"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Deck UUID being operated on.
pub const DECK_ID: &str = "deck_id";

/// Owning user id.
pub const USER_ID: &str = "user_id";

/// Pipeline stage name.
pub const STAGE: &str = "stage";

/// Uploaded file name.
pub const FILENAME: &str = "filename";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

/// Number of question/answer pairs recovered or persisted.
pub const PAIR_COUNT: &str = "pair_count";

/// Number of existing questions in the duplicate index.
pub const EXISTING_COUNT: &str = "existing_count";

/// Recovery tier that produced pairs ("structural", "pattern").
pub const TIER: &str = "tier";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

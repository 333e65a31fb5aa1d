//! Error types for studydeck.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using studydeck's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for studydeck operations.
///
/// Each pipeline stage owns one class of failure; the API layer maps the
/// variants onto HTTP status codes.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Required request fields are missing or malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Uploaded document has a type no extractor handles
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Document of a supported type could not be decoded
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Deck does not exist for the requesting user
    #[error("Deck not found: {0}")]
    DeckNotFound(Uuid),

    /// Flashcard does not exist for the requesting user
    #[error("Flashcard not found: {0}")]
    FlashcardNotFound(Uuid),

    /// Neither uploaded documents nor stored deck notes provide source text
    #[error("No uploaded files or saved notes found for deck {0}")]
    EmptySource(Uuid),

    /// Generative model call failed or timed out
    #[error("Generation error: {0}")]
    Generation(String),

    /// Both response recovery tiers came up empty
    #[error("Failed to parse model response: {tier1}. Fallback extraction also failed: {tier2}")]
    ResponseParse { tier1: String, tier2: String },

    /// Storage failure while persisting generated flashcards
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for failures caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::UnsupportedFileType(_)
                | Error::Extraction(_)
                | Error::DeckNotFound(_)
                | Error::FlashcardNotFound(_)
                | Error::EmptySource(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Generation(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unsupported_file_type() {
        let err = Error::UnsupportedFileType("pptx".to_string());
        assert_eq!(err.to_string(), "Unsupported file type: pptx");
    }

    #[test]
    fn test_error_display_deck_not_found() {
        let id = Uuid::nil();
        let err = Error::DeckNotFound(id);
        assert_eq!(err.to_string(), format!("Deck not found: {}", id));
    }

    #[test]
    fn test_error_display_empty_source() {
        let id = Uuid::nil();
        let err = Error::EmptySource(id);
        assert!(err.to_string().contains("No uploaded files or saved notes"));
    }

    #[test]
    fn test_error_display_generation() {
        let err = Error::Generation("connection refused".to_string());
        assert_eq!(err.to_string(), "Generation error: connection refused");
    }

    #[test]
    fn test_response_parse_reports_both_tiers() {
        let err = Error::ResponseParse {
            tier1: "expected value at line 1 column 2".to_string(),
            tier2: "no question/answer pairs found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("expected value at line 1 column 2"));
        assert!(msg.contains("Fallback extraction also failed: no question/answer pairs found"));
    }

    #[test]
    fn test_error_display_persistence() {
        let err = Error::Persistence("deadlock detected".to_string());
        assert_eq!(err.to_string(), "Persistence error: deadlock detected");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(Error::Validation("missing userId".into()).is_client_error());
        assert!(Error::UnsupportedFileType("txt".into()).is_client_error());
        assert!(Error::DeckNotFound(Uuid::nil()).is_client_error());
        assert!(Error::EmptySource(Uuid::nil()).is_client_error());
        assert!(!Error::Generation("x".into()).is_client_error());
        assert!(!Error::Persistence("x".into()).is_client_error());
        assert!(!Error::ResponseParse {
            tier1: "a".into(),
            tier2: "b".into()
        }
        .is_client_error());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}

//! HTTP error mapping.

use axum::{http::StatusCode, response::IntoResponse, Json};
use tracing::error;

use studydeck_core::Error;

use crate::services::PipelineError;

/// Message returned for any server-side failure of a generation run.
pub const GENERATION_FAILED: &str = "Failed to generate flashcards";

/// Message returned for any other server-side failure.
pub const INTERNAL_ERROR: &str = "Internal server error";

/// Message returned when a request body exceeds the upload limit.
pub const PAYLOAD_TOO_LARGE: &str = "Request body exceeds the upload size limit";

/// Error answered to HTTP clients as `{"error": <message>}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    PayloadTooLarge(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::Internal(msg) => msg,
        }
    }

    /// Map client errors onto their status; anything else becomes `Internal`
    /// with `server_message` after logging the detail.
    fn classify(err: Error, server_message: &str) -> Self {
        match err {
            Error::Validation(msg) => ApiError::BadRequest(msg),
            Error::UnsupportedFileType(_) | Error::Extraction(_) => {
                ApiError::BadRequest(err.to_string())
            }
            Error::EmptySource(_) => ApiError::BadRequest(
                "No uploaded files or saved notes found for this deck".to_string(),
            ),
            Error::DeckNotFound(_) => ApiError::NotFound("Deck not found for this user".to_string()),
            Error::FlashcardNotFound(_) => ApiError::NotFound("Flashcard not found".to_string()),
            other => {
                error!(subsystem = "api", error = %other, "Request failed");
                ApiError::Internal(server_message.to_string())
            }
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::classify(err, INTERNAL_ERROR)
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        if err.source.is_client_error() {
            return ApiError::classify(err.source, GENERATION_FAILED);
        }
        error!(
            subsystem = "api",
            component = "pipeline",
            stage = %err.stage,
            error = %err.source,
            "Flashcard generation failed"
        );
        ApiError::Internal(GENERATION_FAILED.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(serde_json::json!({
            "error": self.message(),
        }));

        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::PipelineStage;
    use uuid::Uuid;

    #[test]
    fn test_client_errors_keep_their_status() {
        let cases = [
            (Error::Validation("Missing userId or deckId".into()), StatusCode::BAD_REQUEST),
            (Error::UnsupportedFileType("pptx".into()), StatusCode::BAD_REQUEST),
            (Error::Extraction("bad xref".into()), StatusCode::BAD_REQUEST),
            (Error::EmptySource(Uuid::nil()), StatusCode::BAD_REQUEST),
            (Error::DeckNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (Error::FlashcardNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_validation_message_passes_through() {
        let err = ApiError::from(Error::Validation("Missing userId or deckId".into()));
        assert_eq!(err.message(), "Missing userId or deckId");
    }

    #[test]
    fn test_unsupported_type_names_offender() {
        let err = ApiError::from(Error::UnsupportedFileType("pptx".into()));
        assert_eq!(err.message(), "Unsupported file type: pptx");
    }

    #[test]
    fn test_pipeline_server_errors_are_generic() {
        let err = ApiError::from(PipelineError::new(
            PipelineStage::Recovering,
            Error::ResponseParse {
                tier1: "EOF while parsing".into(),
                tier2: "no pairs".into(),
            },
        ));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), GENERATION_FAILED);
    }

    #[test]
    fn test_other_server_errors_hide_detail() {
        let err = ApiError::from(Error::Persistence("connection reset".into()));
        assert_eq!(err.message(), INTERNAL_ERROR);
    }
}

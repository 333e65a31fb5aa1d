//! Flashcard HTTP handlers.
//!
//! Besides plain CRUD, this module hosts the generation endpoint, which reads
//! a multipart upload and hands it to the generation pipeline.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use studydeck_core::{Flashcard, FlashcardPair, GenerationRequest, UploadedDocument};

use crate::error::PAYLOAD_TOO_LARGE;
use crate::{ApiError, AppState};

/// Response body of the generation endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub flashcards: Vec<FlashcardPair>,
}

/// Body of `POST /api/flashcards`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlashcardBody {
    pub user_id: Option<String>,
    pub deck_id: Option<String>,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

/// Body of `PUT /api/flashcards/:flashcardId`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFlashcardBody {
    pub user_id: Option<String>,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

/// Owner query string for deletions.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerQuery {
    pub user_id: Option<String>,
}

impl OwnerQuery {
    pub fn user_id(&self) -> Result<&str, ApiError> {
        require_user_id(self.user_id.as_deref())
    }
}

#[derive(Debug, Serialize)]
pub struct FlashcardResponse {
    pub success: bool,
    pub flashcard: Flashcard,
}

#[derive(Debug, Serialize)]
pub struct FlashcardListResponse {
    pub success: bool,
    pub flashcards: Vec<Flashcard>,
}

/// Generate flashcards from uploaded documents or the deck's saved notes.
///
/// Multipart fields: any number of `files` parts plus `userId` and `deckId`.
/// Unknown fields are ignored.
///
/// # Returns
/// - 200 OK with `{ success, flashcards }`
/// - 400 Bad Request for missing ids, unsupported or unreadable files, or no source text
/// - 404 Not Found if the deck does not belong to the user
/// - 500 Internal Server Error if the model, recovery or storage fails
pub async fn generate_flashcards(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<GenerateResponse>, ApiError> {
    let mut documents = Vec::new();
    let mut user_id: Option<String> = None;
    let mut deck_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read upload", e))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("files") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("Failed to read file data", e))?;
                documents.push(UploadedDocument::new(filename, data.to_vec()));
            }
            Some("userId") => user_id = Some(read_text(field).await?),
            Some("deckId") => deck_id = Some(read_text(field).await?),
            _ => {}
        }
    }

    let request = GenerationRequest::new(
        user_id.as_deref(),
        deck_id.as_deref(),
        documents,
        state.generator.config().target_count,
    )?;
    let outcome = state.generator.generate(request).await?;

    Ok(Json(GenerateResponse {
        success: true,
        flashcards: outcome.flashcards,
    }))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| multipart_error("Failed to read form field", e))
}

/// Keep the body-limit status when an upload is cut off mid-stream.
fn multipart_error(context: &str, err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(PAYLOAD_TOO_LARGE.to_string())
    } else {
        ApiError::BadRequest(format!("{}: {}", context, err))
    }
}

/// Add one flashcard to a deck.
///
/// # Returns
/// - 201 Created with the stored flashcard
/// - 400 Bad Request if a field is missing or blank
/// - 404 Not Found if the deck does not belong to the user
pub async fn create_flashcard(
    State(state): State<AppState>,
    Json(body): Json<CreateFlashcardBody>,
) -> Result<(StatusCode, Json<FlashcardResponse>), ApiError> {
    let (user_id, deck_id) = match (body.user_id.as_deref(), body.deck_id.as_deref()) {
        (Some(u), Some(d)) if !u.trim().is_empty() => (u.trim(), d),
        _ => return Err(ApiError::BadRequest("Missing userId or deckId".to_string())),
    };
    let deck_id = parse_id("deckId", deck_id)?;
    let pair = FlashcardPair::new(body.question, body.answer)?;

    let flashcard = state.flashcards.insert(user_id, deck_id, pair).await?;
    Ok((
        StatusCode::CREATED,
        Json(FlashcardResponse {
            success: true,
            flashcard,
        }),
    ))
}

/// List a deck's flashcards, newest first.
pub async fn list_flashcards(
    State(state): State<AppState>,
    Path((user_id, deck_id)): Path<(String, Uuid)>,
) -> Result<Json<FlashcardListResponse>, ApiError> {
    let flashcards = state.flashcards.list(deck_id, &user_id).await?;
    Ok(Json(FlashcardListResponse {
        success: true,
        flashcards,
    }))
}

/// Replace a flashcard's question and answer.
pub async fn update_flashcard(
    State(state): State<AppState>,
    Path(flashcard_id): Path<Uuid>,
    Json(body): Json<UpdateFlashcardBody>,
) -> Result<Json<FlashcardResponse>, ApiError> {
    let user_id = require_user_id(body.user_id.as_deref())?;
    let pair = FlashcardPair::new(&body.question, &body.answer)?;
    let flashcard = state.flashcards.update(flashcard_id, user_id, pair).await?;
    Ok(Json(FlashcardResponse {
        success: true,
        flashcard,
    }))
}

/// Delete a flashcard; the deck count is recomputed.
pub async fn delete_flashcard(
    State(state): State<AppState>,
    Path(flashcard_id): Path<Uuid>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.flashcards.delete(flashcard_id, owner.user_id()?).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

fn require_user_id(user_id: Option<&str>) -> Result<&str, ApiError> {
    match user_id.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(ApiError::BadRequest("Missing userId".to_string())),
    }
}

pub(crate) fn parse_id(field: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::BadRequest(format!("Invalid {}: {}", field, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_body_uses_camel_case() {
        let body: CreateFlashcardBody = serde_json::from_str(
            r#"{"userId": "u1", "deckId": "d1", "question": "Q", "answer": "A"}"#,
        )
        .unwrap();
        assert_eq!(body.user_id.as_deref(), Some("u1"));
        assert_eq!(body.deck_id.as_deref(), Some("d1"));
    }

    #[test]
    fn test_generate_response_shape() {
        let response = GenerateResponse {
            success: true,
            flashcards: vec![FlashcardPair::new("Q", "A").unwrap()],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "flashcards": [{"question": "Q", "answer": "A"}]
            })
        );
    }

    #[test]
    fn test_owner_query_requires_user_id() {
        let blank = OwnerQuery {
            user_id: Some("  ".to_string()),
        };
        assert_eq!(blank.user_id().unwrap_err().message(), "Missing userId");
        let missing = OwnerQuery { user_id: None };
        assert!(missing.user_id().is_err());
        let given = OwnerQuery {
            user_id: Some(" user_1 ".to_string()),
        };
        assert_eq!(given.user_id().unwrap(), "user_1");
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert!(parse_id("deckId", "not-a-uuid").is_err());
        assert!(parse_id("deckId", &Uuid::nil().to_string()).is_ok());
    }
}

//! Core data models for studydeck.
//!
//! These types are shared across all studydeck crates and represent the
//! domain entities. Constructors validate required fields so that rows
//! reaching the storage boundary are always well-formed.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

// =============================================================================
// DECK TYPES
// =============================================================================

/// A named collection of flashcards owned by a user.
///
/// `flashcard_count` is denormalized: it is recomputed from the flashcard
/// rows after every insert or delete, never incremented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    #[serde(rename = "deckId")]
    pub id: Uuid,
    pub user_id: String,
    #[serde(rename = "deckName")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    pub flashcard_count: i64,
    #[serde(rename = "createdOn")]
    pub created_at_utc: DateTime<Utc>,
}

impl Deck {
    /// Build a new, empty deck for `user_id`.
    pub fn new(user_id: &str, name: &str) -> Result<Self> {
        let user_id = require_field("userId", user_id)?;
        let name = require_field("deckName", name)?;
        Ok(Self {
            id: Uuid::now_v7(),
            user_id,
            name,
            source_text: None,
            flashcard_count: 0,
            created_at_utc: Utc::now(),
        })
    }

    /// Stored notes usable as a generation source (non-blank).
    pub fn usable_source_text(&self) -> Option<&str> {
        self.source_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

// =============================================================================
// FLASHCARD TYPES
// =============================================================================

/// A question/answer pair that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardPair {
    pub question: String,
    pub answer: String,
}

impl FlashcardPair {
    /// Build a pair, rejecting blank fields.
    ///
    /// Control characters other than line breaks and tabs are removed first;
    /// Postgres `TEXT` cannot store NUL.
    pub fn new(question: impl AsRef<str>, answer: impl AsRef<str>) -> Result<Self> {
        let pair = Self {
            question: strip_control_chars(question.as_ref()),
            answer: strip_control_chars(answer.as_ref()),
        };
        if !pair.is_usable() {
            return Err(Error::Validation(
                "Both question and answer are required".to_string(),
            ));
        }
        Ok(pair)
    }

    /// True when both fields contain something other than whitespace.
    pub fn is_usable(&self) -> bool {
        !self.question.trim().is_empty() && !self.answer.trim().is_empty()
    }
}

/// A persisted flashcard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    #[serde(rename = "flashcardId")]
    pub id: Uuid,
    pub user_id: String,
    pub deck_id: Uuid,
    pub question: String,
    pub answer: String,
    #[serde(rename = "createdOn")]
    pub created_at_utc: DateTime<Utc>,
}

impl Flashcard {
    /// Build a new flashcard row from a validated pair.
    pub fn new(user_id: &str, deck_id: Uuid, pair: FlashcardPair) -> Result<Self> {
        let user_id = require_field("userId", user_id)?;
        if !pair.is_usable() {
            return Err(Error::Validation(
                "Both question and answer are required".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::now_v7(),
            user_id,
            deck_id,
            question: pair.question,
            answer: pair.answer,
            created_at_utc: Utc::now(),
        })
    }

    /// The question/answer content of this card.
    pub fn pair(&self) -> FlashcardPair {
        FlashcardPair {
            question: self.question.clone(),
            answer: self.answer.clone(),
        }
    }
}

// =============================================================================
// DOCUMENT TYPES
// =============================================================================

/// Document formats the text extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Docx,
}

impl DocumentType {
    /// Derive the declared type from a file name's extension.
    ///
    /// The token is the lower-cased text after the last `.`; a name without a
    /// dot yields the whole lower-cased name.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let token = filename
            .rsplit('.')
            .next()
            .unwrap_or(filename)
            .to_lowercase();
        token.parse()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Pdf => "pdf",
            DocumentType::Docx => "docx",
        }
    }
}

impl std::str::FromStr for DocumentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pdf" => Ok(DocumentType::Pdf),
            "docx" => Ok(DocumentType::Docx),
            other => Err(Error::UnsupportedFileType(other.to_string())),
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded file held in memory for the duration of one request.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub data: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

// =============================================================================
// GENERATION TYPES
// =============================================================================

/// Where the generation source text came from.
///
/// Exactly one origin is used per request; the two are never merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceText {
    /// Freshly extracted from uploads; written back onto the deck on success.
    Extracted(String),
    /// Previously stored deck notes.
    Stored(String),
}

impl SourceText {
    pub fn text(&self) -> &str {
        match self {
            SourceText::Extracted(text) | SourceText::Stored(text) => text,
        }
    }

    /// Text to persist onto the deck, if this source must be saved.
    pub fn to_persist(&self) -> Option<&str> {
        match self {
            SourceText::Extracted(text) => Some(text.trim()),
            SourceText::Stored(_) => None,
        }
    }
}

/// Normalized set of a deck's existing questions.
///
/// Used only as an exclusion hint in the generation prompt, never as a
/// persistence-time filter. Ordered so prompts are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateIndex {
    questions: BTreeSet<String>,
}

impl DuplicateIndex {
    /// Build an index from raw question texts (trimmed and lower-cased).
    pub fn from_questions<I, S>(questions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let questions = questions
            .into_iter()
            .map(|q| normalize_question(q.as_ref()))
            .filter(|q| !q.is_empty())
            .collect();
        Self { questions }
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.questions.iter().map(String::as_str)
    }
}

/// Drop C0 control characters (and DEL) except `\n`, `\r` and `\t`.
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_ascii_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect()
}

/// Case-fold and trim a question for duplicate comparison.
pub fn normalize_question(question: &str) -> String {
    question.trim().to_lowercase()
}

/// Ephemeral state of one generation pipeline invocation.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub user_id: String,
    pub deck_id: Uuid,
    pub documents: Vec<UploadedDocument>,
    pub target_count: usize,
}

impl GenerationRequest {
    /// Validate identifiers and build a request.
    pub fn new(
        user_id: Option<&str>,
        deck_id: Option<&str>,
        documents: Vec<UploadedDocument>,
        target_count: usize,
    ) -> Result<Self> {
        let (user_id, deck_id) = match (user_id, deck_id) {
            (Some(u), Some(d)) if !u.trim().is_empty() && !d.trim().is_empty() => (u, d),
            _ => {
                return Err(Error::Validation(
                    "Missing userId or deckId".to_string(),
                ))
            }
        };
        let deck_id = Uuid::parse_str(deck_id.trim())
            .map_err(|_| Error::Validation(format!("Invalid deckId: {}", deck_id)))?;
        Ok(Self {
            user_id: user_id.trim().to_string(),
            deck_id,
            documents,
            target_count,
        })
    }
}

fn require_field(name: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{} is required", name)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_new_starts_empty() {
        let deck = Deck::new("user_1", "Biology").unwrap();
        assert_eq!(deck.flashcard_count, 0);
        assert!(deck.source_text.is_none());
        assert_eq!(deck.name, "Biology");
    }

    #[test]
    fn test_deck_new_rejects_blank_name() {
        let err = Deck::new("user_1", "   ").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_usable_source_text_ignores_whitespace() {
        let mut deck = Deck::new("user_1", "Biology").unwrap();
        deck.source_text = Some(" \n\t ".to_string());
        assert!(deck.usable_source_text().is_none());
        deck.source_text = Some("Mitochondria".to_string());
        assert_eq!(deck.usable_source_text(), Some("Mitochondria"));
    }

    #[test]
    fn test_deck_serializes_with_api_field_names() {
        let deck = Deck::new("user_1", "Biology").unwrap();
        let json = serde_json::to_value(&deck).unwrap();
        assert!(json.get("deckId").is_some());
        assert!(json.get("deckName").is_some());
        assert!(json.get("flashcardCount").is_some());
        assert!(json.get("sourceText").is_none());
    }

    #[test]
    fn test_pair_rejects_blank_fields() {
        assert!(FlashcardPair::new("What is ATP?", "").is_err());
        assert!(FlashcardPair::new("  ", "Energy").is_err());
        assert!(FlashcardPair::new("What is ATP?", "Energy currency").is_ok());
    }

    #[test]
    fn test_pair_strips_nul_and_control_chars() {
        let pair = FlashcardPair::new("Q\u{0}1\u{1b}?", "Line\n\tTwo\u{7f}").unwrap();
        assert_eq!(pair.question, "Q1?");
        assert_eq!(pair.answer, "Line\n\tTwo");
        assert!(FlashcardPair::new("\u{0}\u{0}", "A").is_err());
    }

    #[test]
    fn test_strip_control_chars_keeps_line_breaks_and_unicode() {
        assert_eq!(strip_control_chars("a\r\nb\u{0}c é"), "a\r\nbc é");
    }

    #[test]
    fn test_flashcard_new_keeps_pair_text() {
        let pair = FlashcardPair::new("Q", "A").unwrap();
        let card = Flashcard::new("user_1", Uuid::nil(), pair.clone()).unwrap();
        assert_eq!(card.pair(), pair);
        assert_eq!(card.deck_id, Uuid::nil());
    }

    #[test]
    fn test_document_type_from_filename() {
        assert_eq!(
            DocumentType::from_filename("Lecture 1.PDF").unwrap(),
            DocumentType::Pdf
        );
        assert_eq!(
            DocumentType::from_filename("notes.final.docx").unwrap(),
            DocumentType::Docx
        );
    }

    #[test]
    fn test_document_type_unsupported_names_offending_type() {
        match DocumentType::from_filename("slides.pptx") {
            Err(Error::UnsupportedFileType(t)) => assert_eq!(t, "pptx"),
            other => panic!("expected UnsupportedFileType, got {:?}", other),
        }
        match DocumentType::from_filename("README") {
            Err(Error::UnsupportedFileType(t)) => assert_eq!(t, "readme"),
            other => panic!("expected UnsupportedFileType, got {:?}", other),
        }
    }

    #[test]
    fn test_source_text_persistence_marker() {
        let fresh = SourceText::Extracted("  notes \n".to_string());
        assert_eq!(fresh.to_persist(), Some("notes"));
        let stored = SourceText::Stored("notes".to_string());
        assert_eq!(stored.to_persist(), None);
        assert_eq!(stored.text(), "notes");
    }

    #[test]
    fn test_duplicate_index_normalizes() {
        let index = DuplicateIndex::from_questions(vec![
            "  What is DNA? ",
            "what is dna?",
            "WHAT IS RNA?",
            "   ",
        ]);
        assert_eq!(index.len(), 2);
        let ordered: Vec<&str> = index.iter().collect();
        assert_eq!(ordered, vec!["what is dna?", "what is rna?"]);
    }

    #[test]
    fn test_generation_request_requires_ids() {
        let err = GenerationRequest::new(None, Some("x"), vec![], 12).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        let err = GenerationRequest::new(Some("u"), Some(""), vec![], 12).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_generation_request_rejects_malformed_deck_id() {
        let err = GenerationRequest::new(Some("u"), Some("42"), vec![], 12).unwrap_err();
        assert!(err.to_string().contains("Invalid deckId"));
    }

    #[test]
    fn test_generation_request_parses_deck_id() {
        let id = Uuid::now_v7();
        let req = GenerationRequest::new(Some("user_1"), Some(&id.to_string()), vec![], 12)
            .unwrap();
        assert_eq!(req.deck_id, id);
        assert_eq!(req.user_id, "user_1");
    }
}

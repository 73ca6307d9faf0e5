//! Document domain model.
//!
//! # Responsibility
//! - Define the typed record persisted by every document store.
//! - Validate identifiers and titles before they reach storage.
//!
//! # Invariants
//! - `DocumentId` values match `[A-Za-z0-9_-]{1,128}`.
//! - `UserId` values are non-blank and trimmed.
//! - `owner_id` is assigned at creation and never rewritten.

use crate::model::delta::Delta;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Title assigned to documents created without an explicit one.
pub const DEFAULT_TITLE: &str = "Untitled Document";
/// Maximum title length in characters.
pub const TITLE_MAX_CHARS: usize = 200;

static DOCUMENT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,128}$").expect("valid document id regex"));

/// Validation failures for document identifiers and fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentValidationError {
    InvalidDocumentId(String),
    BlankUserId,
    TitleTooLong { chars: usize, max: usize },
}

impl Display for DocumentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDocumentId(value) => write!(f, "invalid document id `{value}`"),
            Self::BlankUserId => write!(f, "user id cannot be blank"),
            Self::TitleTooLong { chars, max } => {
                write!(f, "title has {chars} characters; at most {max} allowed")
            }
        }
    }
}

impl Error for DocumentValidationError {}

/// Opaque document key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    /// Parses and validates one document id.
    pub fn parse(value: &str) -> Result<Self, DocumentValidationError> {
        if DOCUMENT_ID_RE.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(DocumentValidationError::InvalidDocumentId(value.to_string()))
        }
    }

    /// Generates a fresh id for the explicit "new document" action.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DocumentId {
    type Err = DocumentValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// Identity issued by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn parse(value: &str) -> Result<Self, DocumentValidationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DocumentValidationError::BlankUserId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = DocumentValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// Persisted document record.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    /// Creating user; immutable after creation.
    pub owner_id: UserId,
    pub title: String,
    pub content: Delta,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Document {
    /// Creates an empty, untitled document owned by `owner_id`.
    pub fn new(id: DocumentId, owner_id: UserId, created_at: i64) -> Self {
        Self {
            id,
            owner_id,
            title: DEFAULT_TITLE.to_string(),
            content: Delta::new(),
            created_at,
        }
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner_id == user
    }

    /// Checks field constraints not already enforced by the id newtypes.
    pub fn validate(&self) -> Result<(), DocumentValidationError> {
        let chars = self.title.chars().count();
        if chars > TITLE_MAX_CHARS {
            return Err(DocumentValidationError::TitleTooLong {
                chars,
                max: TITLE_MAX_CHARS,
            });
        }
        Ok(())
    }
}

//! Document dashboard use-case service.
//!
//! # Responsibility
//! - Create documents explicitly, list a user's documents and rename them.
//!
//! # Invariants
//! - Only the owner may rename a document.
//! - Stored titles are whitespace-normalized, non-empty and at most
//!   `TITLE_MAX_CHARS` characters.
//! - Owned lists are sorted by `created_at DESC, id ASC`.

use crate::model::document::{
    Document, DocumentId, UserId, DEFAULT_TITLE, TITLE_MAX_CHARS,
};
use crate::store::{now_epoch_ms, DocumentPatch, DocumentStore, StoreError, WriteMode};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Service error for document use-cases.
#[derive(Debug)]
pub enum DocumentServiceError {
    /// Caller does not own the document.
    AccessDenied { id: DocumentId },
    NotFound(DocumentId),
    /// Persistence-layer failure.
    Store(StoreError),
}

impl Display for DocumentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessDenied { id } => write!(f, "only the owner may modify document `{id}`"),
            Self::NotFound(id) => write!(f, "document not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DocumentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for DocumentServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Document service facade over store implementations.
pub struct DocumentService<D: DocumentStore> {
    store: D,
}

impl<D: DocumentStore> DocumentService<D> {
    pub fn new(store: D) -> Self {
        Self { store }
    }

    /// Creates an empty, untitled document with a generated id.
    pub fn create_document(&self, owner: &UserId) -> Result<Document, DocumentServiceError> {
        let document = Document::new(DocumentId::generate(), owner.clone(), now_epoch_ms());
        self.store.set(
            &document.id,
            DocumentPatch::full(&document),
            WriteMode::Create,
        )?;
        info!(
            "event=doc_create module=service status=ok doc_id={}",
            document.id
        );
        Ok(document)
    }

    /// Documents owned by `owner`, newest first.
    pub fn list_owned(&self, owner: &UserId) -> Result<Vec<Document>, DocumentServiceError> {
        let mut documents: Vec<Document> = self
            .store
            .list()?
            .into_iter()
            .filter(|document| document.is_owned_by(owner))
            .collect();
        documents.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(documents)
    }

    /// Sets the title of a document owned by `identity`.
    pub fn rename(
        &self,
        id: &DocumentId,
        identity: &UserId,
        title: &str,
    ) -> Result<Document, DocumentServiceError> {
        let current = self
            .store
            .get(id)?
            .ok_or_else(|| DocumentServiceError::NotFound(id.clone()))?;
        if !current.is_owned_by(identity) {
            return Err(DocumentServiceError::AccessDenied { id: id.clone() });
        }

        let title = normalize_title(title);
        self.store
            .set(id, DocumentPatch::title(title.clone()), WriteMode::Merge)?;
        info!(
            "event=doc_rename module=service status=ok doc_id={}",
            id
        );
        Ok(Document { title, ..current })
    }
}

/// Collapses whitespace, trims and truncates a user-entered title. Blank
/// titles become `DEFAULT_TITLE`.
pub fn normalize_title(raw: &str) -> String {
    let collapsed = WHITESPACE_RE.replace_all(raw, " ");
    let trimmed = collapsed.trim();
    if trimmed.is_empty() {
        return DEFAULT_TITLE.to_string();
    }
    trimmed
        .chars()
        .take(TITLE_MAX_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

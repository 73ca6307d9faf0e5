//! Document access resolution.
//!
//! # Responsibility
//! - Parse open targets such as `d1?access=viewer`.
//! - Resolve the caller's tier for one document, creating the document when
//!   it does not exist yet.
//!
//! # Invariants
//! - Resolution runs once per session open; the tier never changes afterwards.
//! - A created document is owned by the identity that opened it.
//! - Non-owners only get access through an explicit viewer marker.

use crate::model::document::{Document, DocumentId, DocumentValidationError, UserId};
use crate::store::{now_epoch_ms, DocumentPatch, DocumentStore, StoreError, WriteMode};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_VIEWER_KEY: &str = "access";
const DEFAULT_VIEWER_VALUE: &str = "viewer";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTier {
    Owner,
    Viewer,
    Denied,
}

impl AccessTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Viewer => "viewer",
            Self::Denied => "denied",
        }
    }

    pub fn can_write(self) -> bool {
        self == Self::Owner
    }
}

/// Document a caller asks to open, plus whether it asked for viewer access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTarget {
    pub document_id: DocumentId,
    pub viewer_marker: bool,
}

impl OpenTarget {
    pub fn new(document_id: DocumentId) -> Self {
        Self {
            document_id,
            viewer_marker: false,
        }
    }

    pub fn viewer(document_id: DocumentId) -> Self {
        Self {
            document_id,
            viewer_marker: true,
        }
    }

    /// Parses `path/to/<id>?access=viewer`-style targets.
    pub fn parse(raw: &str) -> Result<Self, DocumentValidationError> {
        Self::parse_with(raw, DEFAULT_VIEWER_KEY, DEFAULT_VIEWER_VALUE)
    }

    /// Parses a target whose viewer marker is `key=value`. Unknown query
    /// parameters are ignored.
    pub fn parse_with(
        raw: &str,
        key: &str,
        value: &str,
    ) -> Result<Self, DocumentValidationError> {
        let (path, query) = raw.split_once('?').unwrap_or((raw, ""));
        let path = path.trim().trim_end_matches('/');
        let id_part = path.rsplit('/').next().unwrap_or(path);
        let document_id = DocumentId::parse(id_part)?;

        let viewer_marker = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .any(|(name, current)| name == key && current == value);

        Ok(Self {
            document_id,
            viewer_marker,
        })
    }
}

/// Outcome of one access resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessResolution {
    pub tier: AccessTier,
    /// Document as read (or created) during resolution.
    pub document: Document,
    /// Whether resolution created the document.
    pub created: bool,
}

impl AccessResolution {
    /// Converts a `Denied` resolution into an error.
    pub fn ensure_granted(self, identity: &UserId) -> Result<Self, AccessError> {
        if self.tier == AccessTier::Denied {
            return Err(AccessError::Denied {
                id: self.document.id,
                identity: identity.clone(),
            });
        }
        Ok(self)
    }
}

#[derive(Debug)]
pub enum AccessError {
    Denied { id: DocumentId, identity: UserId },
    Store(StoreError),
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Denied { id, identity } => {
                write!(f, "user `{identity}` may not open document `{id}`")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Denied { .. } => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for AccessError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Resolves access tiers against a document store.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessController;

impl AccessController {
    pub fn new() -> Self {
        Self
    }

    /// Resolves `identity`'s tier for `target`, creating the document when
    /// absent.
    ///
    /// # Errors
    /// - `AccessError::Store` when the store cannot be read or written.
    pub fn resolve<D: DocumentStore + ?Sized>(
        &self,
        store: &D,
        target: &OpenTarget,
        identity: &UserId,
    ) -> Result<AccessResolution, AccessError> {
        let id = &target.document_id;
        let (document, created) = match store.get(id)? {
            Some(document) => (document, false),
            None => match Self::create(store, id, identity) {
                Ok(document) => (document, true),
                Err(StoreError::AlreadyExists { .. }) => {
                    // Another writer created the record between our read and write.
                    warn!(
                        "event=access_resolve module=access status=retry reason=create_race doc_id={}",
                        id
                    );
                    let existing = store.get(id)?.ok_or_else(|| {
                        StoreError::InvalidPatch(format!("`{id}` vanished during creation"))
                    })?;
                    (existing, false)
                }
                Err(err) => return Err(err.into()),
            },
        };

        let tier = if document.is_owned_by(identity) {
            AccessTier::Owner
        } else if target.viewer_marker {
            AccessTier::Viewer
        } else {
            AccessTier::Denied
        };

        info!(
            "event=access_resolve module=access status=ok doc_id={} tier={} created={}",
            id,
            tier.as_str(),
            created
        );
        Ok(AccessResolution {
            tier,
            document,
            created,
        })
    }

    fn create<D: DocumentStore + ?Sized>(
        store: &D,
        id: &DocumentId,
        identity: &UserId,
    ) -> Result<Document, StoreError> {
        let document = Document::new(id.clone(), identity.clone(), now_epoch_ms());
        store.set(id, DocumentPatch::full(&document), WriteMode::Create)?;
        Ok(document)
    }
}

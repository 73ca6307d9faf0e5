//! Document store contracts and implementations.
//!
//! # Responsibility
//! - Define the remote document database contract used by sync and services.
//! - Validate records at the store boundary so callers only see typed documents.
//! - Share patch semantics (merge vs replace) across implementations.
//!
//! # Invariants
//! - `owner_id` can never be changed by a write.
//! - Every successful `set` publishes a snapshot to all subscribers of the id,
//!   including subscribers owned by the writer.
//! - Notifications are delivered on the event loop, never inside `set`.

pub mod memory;
pub mod record;
pub mod sqlite;
pub mod subscription;

use crate::db::DbError;
use crate::model::delta::Delta;
use crate::model::document::{Document, DocumentId, DocumentValidationError, UserId};
use rusqlite::ffi::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

pub use subscription::{SnapshotListener, SubscriberHub, Subscription};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level failure for reads, writes and subscriptions.
#[derive(Debug)]
pub enum StoreError {
    /// Backend could not be reached; `transient` failures may be retried.
    Unavailable { message: String, transient: bool },
    /// SQLite transport or schema failure.
    Db(DbError),
    /// Stored record failed boundary validation and is quarantined.
    Malformed { id: DocumentId, reason: String },
    /// Write rejected because it would change the document owner.
    OwnerImmutable { id: DocumentId },
    /// Create-only write found an existing record.
    AlreadyExists { id: DocumentId },
    /// Patch cannot produce a valid record.
    InvalidPatch(String),
    Validation(DocumentValidationError),
}

impl StoreError {
    /// Returns whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable { transient, .. } => *transient,
            Self::Db(DbError::Sqlite(err)) => matches!(
                err.sqlite_error_code(),
                Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
            ),
            _ => false,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable { message, transient } => {
                write!(f, "document store unavailable (transient={transient}): {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::Malformed { id, reason } => write!(f, "malformed document `{id}`: {reason}"),
            Self::OwnerImmutable { id } => write!(f, "owner of document `{id}` cannot change"),
            Self::AlreadyExists { id } => write!(f, "document `{id}` already exists"),
            Self::InvalidPatch(message) => write!(f, "invalid document patch: {message}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<DocumentValidationError> for StoreError {
    fn from(value: DocumentValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Write semantics for `DocumentStore::set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Unspecified fields keep their stored values.
    Merge,
    /// Unspecified fields reset to defaults; the owner must be restated.
    Replace,
    /// Writes only when no record exists; never touches an existing one.
    Create,
}

/// Field-scoped write payload. `None` means "not part of this write".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPatch {
    pub owner_id: Option<UserId>,
    pub title: Option<String>,
    pub content: Option<Delta>,
    pub created_at: Option<i64>,
}

impl DocumentPatch {
    /// Patch touching only `content`.
    pub fn content(content: Delta) -> Self {
        Self {
            content: Some(content),
            ..Self::default()
        }
    }

    /// Patch touching only `title`.
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Patch carrying every field of `document`, used for creation.
    pub fn full(document: &Document) -> Self {
        Self {
            owner_id: Some(document.owner_id.clone()),
            title: Some(document.title.clone()),
            content: Some(document.content.clone()),
            created_at: Some(document.created_at),
        }
    }
}

/// Change notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Present(Document),
    Absent(DocumentId),
    /// Record exists but failed boundary validation.
    Malformed { id: DocumentId, reason: String },
}

impl Snapshot {
    /// Converts a boundary lookup into a notification.
    pub fn from_lookup(id: &DocumentId, lookup: StoreResult<Option<Document>>) -> Self {
        match lookup {
            Ok(Some(document)) => Self::Present(document),
            Ok(None) => Self::Absent(id.clone()),
            Err(err) => Self::Malformed {
                id: id.clone(),
                reason: err.to_string(),
            },
        }
    }

    pub fn document_id(&self) -> &DocumentId {
        match self {
            Self::Present(document) => &document.id,
            Self::Absent(id) => id,
            Self::Malformed { id, .. } => id,
        }
    }
}

/// Remote document database contract.
pub trait DocumentStore {
    /// Point read; `Ok(None)` when the id has no record.
    fn get(&self, id: &DocumentId) -> StoreResult<Option<Document>>;
    /// Point write with merge or replace semantics.
    fn set(&self, id: &DocumentId, patch: DocumentPatch, mode: WriteMode) -> StoreResult<()>;
    /// Registers `listener` for every change of `id`; dropping the handle unsubscribes.
    fn subscribe(&self, id: &DocumentId, listener: SnapshotListener)
        -> StoreResult<Subscription>;
    /// All well-formed documents; malformed records are skipped.
    fn list(&self) -> StoreResult<Vec<Document>>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for Rc<T> {
    fn get(&self, id: &DocumentId) -> StoreResult<Option<Document>> {
        (**self).get(id)
    }

    fn set(&self, id: &DocumentId, patch: DocumentPatch, mode: WriteMode) -> StoreResult<()> {
        (**self).set(id, patch, mode)
    }

    fn subscribe(
        &self,
        id: &DocumentId,
        listener: SnapshotListener,
    ) -> StoreResult<Subscription> {
        (**self).subscribe(id, listener)
    }

    fn list(&self) -> StoreResult<Vec<Document>> {
        (**self).list()
    }
}

/// Applies `patch` onto the current record and returns the resulting document.
///
/// # Errors
/// - `OwnerImmutable` when the patch names a different owner, or when a
///   replace write on an existing record omits the owner.
/// - `AlreadyExists` for a create write when a record is present.
/// - `InvalidPatch` when creating a record without an owner.
/// - `Validation` when the result violates field constraints.
pub fn apply_patch(
    id: &DocumentId,
    existing: Option<Document>,
    patch: DocumentPatch,
    mode: WriteMode,
    now_ms: i64,
) -> StoreResult<Document> {
    let document = match existing {
        Some(_) if mode == WriteMode::Create => {
            return Err(StoreError::AlreadyExists { id: id.clone() });
        }
        Some(current) => {
            match (&patch.owner_id, mode) {
                (Some(owner), _) if owner != &current.owner_id => {
                    return Err(StoreError::OwnerImmutable { id: id.clone() });
                }
                (None, WriteMode::Replace) => {
                    return Err(StoreError::OwnerImmutable { id: id.clone() });
                }
                _ => {}
            }
            match mode {
                WriteMode::Merge => Document {
                    id: id.clone(),
                    owner_id: current.owner_id,
                    title: patch.title.unwrap_or(current.title),
                    content: patch.content.unwrap_or(current.content),
                    created_at: patch.created_at.unwrap_or(current.created_at),
                },
                WriteMode::Replace | WriteMode::Create => Document {
                    id: id.clone(),
                    owner_id: current.owner_id,
                    title: patch.title.unwrap_or_default(),
                    content: patch.content.unwrap_or_default(),
                    created_at: patch.created_at.unwrap_or(current.created_at),
                },
            }
        }
        None => {
            let owner_id = patch.owner_id.ok_or_else(|| {
                StoreError::InvalidPatch(format!("creating `{id}` requires an owner"))
            })?;
            Document {
                id: id.clone(),
                owner_id,
                title: patch.title.unwrap_or_default(),
                content: patch.content.unwrap_or_default(),
                created_at: patch.created_at.unwrap_or(now_ms),
            }
        }
    };

    document.validate()?;
    Ok(document)
}

/// Wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

//! Live document synchronization.
//!
//! # Responsibility
//! - Bind an editing surface to one stored document for the lifetime of a
//!   `Session`.
//! - Write owner edits through to the store and apply remote snapshots
//!   without feedback loops or cursor loss.
//!
//! # Invariants
//! - Only `Owner` sessions ever write.
//! - Remote snapshots are applied silently and never trigger a write.
//! - Deferred callbacks hold `Weak` session references and do nothing once
//!   the session is closed.

mod engine;
mod session;
mod write_job;

use crate::model::document::{DocumentId, DocumentValidationError};
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use engine::SyncEngine;
pub use session::Session;

/// Session-scoped sync failure.
#[derive(Debug)]
pub enum SyncError {
    /// Document belongs to someone else and no viewer marker was given.
    AccessDenied(DocumentId),
    /// Store could not be reached while opening.
    NotFound { id: DocumentId, source: StoreError },
    InvalidTarget(DocumentValidationError),
    /// Write requested on a session that may not write.
    ReadOnly(DocumentId),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessDenied(id) => write!(f, "access to document `{id}` denied"),
            Self::NotFound { id, source } => {
                write!(f, "document `{id}` could not be loaded: {source}")
            }
            Self::InvalidTarget(err) => write!(f, "invalid open target: {err}"),
            Self::ReadOnly(id) => write!(f, "document `{id}` is open read-only"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound { source, .. } => Some(source),
            Self::InvalidTarget(err) => Some(err),
            Self::AccessDenied(_) | Self::ReadOnly(_) => None,
        }
    }
}

/// Non-blocking condition reported to the host UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncNotice {
    /// A write was abandoned; the content stays unsaved until `save_now`.
    SaveFailed {
        document_id: DocumentId,
        attempts: u32,
        message: String,
    },
    /// A remote snapshot arrived while local content was unsaved; the local
    /// content was kept and wins on the next write.
    RemoteConflict { document_id: DocumentId },
    /// A remote snapshot failed validation and was not applied.
    RemoteContentRejected {
        document_id: DocumentId,
        reason: String,
    },
}

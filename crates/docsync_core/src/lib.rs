//! Core sync logic for docsync.
//! This crate is the single source of truth for document sync invariants.

pub mod access;
pub mod config;
pub mod content;
pub mod db;
pub mod logging;
pub mod model;
pub mod runtime;
pub mod service;
pub mod store;
pub mod surface;
pub mod sync;

pub use access::{AccessController, AccessError, AccessResolution, AccessTier, OpenTarget};
pub use config::{ConfigError, CursorPolicy, RetryPolicy, SyncConfig};
pub use content::codec::ContentError;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::delta::{Delta, Insert, Op};
pub use model::document::{Document, DocumentId, DocumentValidationError, UserId};
pub use runtime::EventLoop;
pub use service::document_service::{DocumentService, DocumentServiceError};
pub use store::memory::MemoryDocumentStore;
pub use store::sqlite::SqliteDocumentStore;
pub use store::{
    DocumentPatch, DocumentStore, Snapshot, StoreError, StoreResult, Subscription, WriteMode,
};
pub use surface::{ApplyMode, EditingSurface, HeadlessSurface, Selection};
pub use sync::{Session, SyncEngine, SyncError, SyncNotice};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! Domain model for synchronized rich-text documents.
//!
//! # Responsibility
//! - Define the typed document record shared by stores, access control and sync.
//! - Define the rich-text operation sequence (`Delta`) mirrored by editing surfaces.
//!
//! # Invariants
//! - Every document is identified by a validated `DocumentId`.
//! - `owner_id` never changes after a document is created.

pub mod delta;
pub mod document;

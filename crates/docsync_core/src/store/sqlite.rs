//! Durable `DocumentStore` on SQLite.
//!
//! # Responsibility
//! - Persist documents in the `documents` table created by `db::migrations`.
//! - Publish change snapshots through the shared `SubscriberHub`.
//!
//! # Invariants
//! - Each `set` reads, patches and upserts inside one immediate transaction.
//! - The upsert never touches `owner_id` or `created_at` of an existing row.
//! - Rows whose content fails decoding are reported as `Malformed`.

use crate::content::codec;
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::document::{Document, DocumentId, UserId};
use crate::runtime::EventLoop;
use crate::store::{
    apply_patch, now_epoch_ms, DocumentPatch, DocumentStore, Snapshot, SnapshotListener,
    StoreError, StoreResult, SubscriberHub, Subscription, WriteMode,
};
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::path::Path;

const SELECT_COLUMNS: &str = "SELECT id, owner_id, title, content, created_at FROM documents";

/// SQLite-backed document store.
pub struct SqliteDocumentStore {
    conn: Connection,
    hub: SubscriberHub,
}

impl SqliteDocumentStore {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `StoreError::Db(MissingRequiredTable)` when `documents` is absent.
    pub fn new(conn: Connection, event_loop: EventLoop) -> StoreResult<Self> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = 'documents'
            );",
            [],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(DbError::MissingRequiredTable("documents").into());
        }

        Ok(Self {
            conn,
            hub: SubscriberHub::new(event_loop),
        })
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>, event_loop: EventLoop) -> StoreResult<Self> {
        Self::new(open_db(path)?, event_loop)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory(event_loop: EventLoop) -> StoreResult<Self> {
        Self::new(open_db_in_memory()?, event_loop)
    }

    /// Underlying connection, for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn subscriber_count(&self, id: &DocumentId) -> usize {
        self.hub.subscriber_count(id)
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn get(&self, id: &DocumentId) -> StoreResult<Option<Document>> {
        read_document(&self.conn, id)
    }

    fn set(&self, id: &DocumentId, patch: DocumentPatch, mode: WriteMode) -> StoreResult<()> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let existing = read_document(&tx, id)?;
        let document = apply_patch(id, existing, patch, mode, now_epoch_ms())?;

        tx.execute(
            "INSERT INTO documents (id, owner_id, title, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                document.id.as_str(),
                document.owner_id.as_str(),
                document.title,
                codec::to_json_string(&document.content),
                document.created_at,
            ],
        )?;
        tx.commit()?;

        debug!(
            "event=doc_write module=store status=ok store=sqlite doc_id={} mode={:?}",
            id, mode
        );
        self.hub.publish(Snapshot::Present(document));
        Ok(())
    }

    fn subscribe(
        &self,
        id: &DocumentId,
        listener: SnapshotListener,
    ) -> StoreResult<Subscription> {
        Ok(self.hub.register(id, listener))
    }

    fn list(&self) -> StoreResult<Vec<Document>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY created_at DESC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            match parse_document_row(row)? {
                Ok(document) => documents.push(document),
                Err(err) => warn!(
                    "event=doc_list module=store status=skipped store=sqlite error={}",
                    err
                ),
            }
        }
        Ok(documents)
    }
}

fn read_document(conn: &Connection, id: &DocumentId) -> StoreResult<Option<Document>> {
    let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1;"))?;
    let parsed = stmt
        .query_row([id.as_str()], |row| parse_document_row(row))
        .optional()?;
    match parsed {
        Some(result) => result.map(Some),
        None => Ok(None),
    }
}

/// Outer error is a column read failure; inner error is a malformed row.
fn parse_document_row(row: &Row<'_>) -> rusqlite::Result<StoreResult<Document>> {
    let id_text: String = row.get("id")?;
    let owner_text: String = row.get("owner_id")?;
    let title: String = row.get("title")?;
    let content_text: String = row.get("content")?;
    let created_at: i64 = row.get("created_at")?;

    Ok(build_document(&id_text, &owner_text, title, &content_text, created_at))
}

fn build_document(
    id_text: &str,
    owner_text: &str,
    title: String,
    content_text: &str,
    created_at: i64,
) -> StoreResult<Document> {
    let id = DocumentId::parse(id_text)?;
    let malformed = |reason: String| StoreError::Malformed {
        id: id.clone(),
        reason,
    };

    let owner_id = UserId::parse(owner_text).map_err(|err| malformed(err.to_string()))?;
    let content = codec::from_json_str(content_text).map_err(|err| malformed(err.to_string()))?;
    let document = Document {
        id: id.clone(),
        owner_id,
        title,
        content,
        created_at,
    };
    document
        .validate()
        .map_err(|err| malformed(err.to_string()))?;
    Ok(document)
}

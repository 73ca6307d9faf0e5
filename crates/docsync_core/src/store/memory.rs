//! In-process document database.
//!
//! # Responsibility
//! - Model the remote store: records are untyped JSON objects keyed by id.
//! - Enforce boundary validation on every read and notification.
//!
//! # Invariants
//! - Merge writes keep stored keys the patch does not touch, including keys
//!   this crate does not know about.
//! - Records injected through `put_raw` may be malformed; they surface as
//!   `StoreError::Malformed` / `Snapshot::Malformed`, never as documents.

use crate::model::document::{Document, DocumentId};
use crate::runtime::EventLoop;
use crate::store::record;
use crate::store::{
    apply_patch, now_epoch_ms, DocumentPatch, DocumentStore, Snapshot, SnapshotListener,
    StoreResult, SubscriberHub, Subscription, WriteMode,
};
use log::{debug, warn};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// `DocumentStore` backed by an in-memory map of JSON records.
pub struct MemoryDocumentStore {
    records: RefCell<BTreeMap<DocumentId, Value>>,
    hub: SubscriberHub,
    writes: Cell<usize>,
}

impl MemoryDocumentStore {
    pub fn new(event_loop: EventLoop) -> Self {
        Self {
            records: RefCell::new(BTreeMap::new()),
            hub: SubscriberHub::new(event_loop),
            writes: Cell::new(0),
        }
    }

    /// Stores `record` verbatim, as an external writer would, and notifies.
    pub fn put_raw(&self, id: &DocumentId, record: Value) {
        let snapshot = Snapshot::from_lookup(id, record::decode(id, &record).map(Some));
        self.records.borrow_mut().insert(id.clone(), record);
        self.writes.set(self.writes.get() + 1);
        self.hub.publish(snapshot);
    }

    /// Raw stored record, bypassing validation.
    pub fn raw(&self, id: &DocumentId) -> Option<Value> {
        self.records.borrow().get(id).cloned()
    }

    /// Number of stored records, malformed ones included.
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Count of successful writes since creation.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    pub fn subscriber_count(&self, id: &DocumentId) -> usize {
        self.hub.subscriber_count(id)
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, id: &DocumentId) -> StoreResult<Option<Document>> {
        match self.records.borrow().get(id) {
            Some(value) => record::decode(id, value).map(Some),
            None => Ok(None),
        }
    }

    fn set(&self, id: &DocumentId, patch: DocumentPatch, mode: WriteMode) -> StoreResult<()> {
        let existing = self.get(id)?;
        let document = apply_patch(id, existing, patch, mode, now_epoch_ms())?;
        let encoded = record::encode(&document);

        {
            let mut records = self.records.borrow_mut();
            let stored = match (mode, records.remove(id)) {
                (WriteMode::Merge, Some(Value::Object(mut previous))) => {
                    if let Value::Object(fields) = encoded {
                        previous.extend(fields);
                    }
                    Value::Object(previous)
                }
                _ => encoded,
            };
            records.insert(id.clone(), stored);
        }

        self.writes.set(self.writes.get() + 1);
        debug!(
            "event=doc_write module=store status=ok store=memory doc_id={} mode={:?}",
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
        let records = self.records.borrow();
        let mut documents = Vec::with_capacity(records.len());
        for (id, value) in records.iter() {
            match record::decode(id, value) {
                Ok(document) => documents.push(document),
                Err(err) => warn!(
                    "event=doc_list module=store status=skipped store=memory doc_id={} error={}",
                    id, err
                ),
            }
        }
        Ok(documents)
    }
}

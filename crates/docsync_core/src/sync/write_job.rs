//! Write-through task with retry.
//!
//! # Invariants
//! - A job whose sequence number is older than the session's newest write
//!   never reaches the store, so a retry cannot clobber newer content.
//! - Jobs outlive their session: a closed session's last edits still persist.

use crate::config::RetryPolicy;
use crate::model::delta::Delta;
use crate::model::document::DocumentId;
use crate::runtime::EventLoop;
use crate::store::{DocumentPatch, DocumentStore, WriteMode};
use crate::surface::{EditingSurface, Selection};
use crate::sync::session::SessionState;
use log::{debug, error, info, warn};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

pub(crate) struct WriteJob<D, S> {
    pub(crate) store: Rc<D>,
    pub(crate) event_loop: EventLoop,
    pub(crate) document_id: DocumentId,
    pub(crate) content: Delta,
    pub(crate) seq: u64,
    pub(crate) latest_seq: Rc<Cell<u64>>,
    /// Selection captured when the write was issued.
    pub(crate) selection: Option<Selection>,
    pub(crate) attempt: u32,
    pub(crate) retry: RetryPolicy,
    pub(crate) session: Weak<RefCell<SessionState<D, S>>>,
}

impl<D, S> WriteJob<D, S>
where
    D: DocumentStore + 'static,
    S: EditingSurface + 'static,
{
    pub(crate) fn run(mut self) {
        if self.latest_seq.get() > self.seq {
            debug!(
                "event=doc_save module=sync status=skipped reason=superseded doc_id={} seq={}",
                self.document_id, self.seq
            );
            return;
        }

        let patch = DocumentPatch::content(self.content.clone());
        match self.store.set(&self.document_id, patch, WriteMode::Merge) {
            Ok(()) => {
                info!(
                    "event=doc_save module=sync status=ok doc_id={} seq={} attempt={}",
                    self.document_id, self.seq, self.attempt
                );
                if let Some(state) = self.session.upgrade() {
                    state
                        .borrow_mut()
                        .on_write_settled(self.seq, self.selection);
                }
            }
            Err(err) if err.is_transient() && self.attempt < self.retry.max_attempts => {
                let delay = self.retry.backoff_for(self.attempt);
                warn!(
                    "event=doc_save module=sync status=retry doc_id={} seq={} attempt={} delay_ms={} error={}",
                    self.document_id,
                    self.seq,
                    self.attempt,
                    delay.as_millis(),
                    err
                );
                self.attempt += 1;
                let event_loop = self.event_loop.clone();
                event_loop.post_after(delay, move || self.run());
            }
            Err(err) => {
                error!(
                    "event=doc_save module=sync status=error doc_id={} seq={} attempts={} error={}",
                    self.document_id, self.seq, self.attempt, err
                );
                if let Some(state) = self.session.upgrade() {
                    state
                        .borrow_mut()
                        .on_write_failed(self.seq, self.content, self.attempt, &err);
                }
            }
        }
    }
}

//! Per-editor sync session.
//!
//! # Responsibility
//! - Track what this editor last saw from the store and what it wrote.
//! - Decide, per local change, whether to write, revert or skip.
//! - Decide, per remote snapshot, whether to apply it or drop it as an echo.
//!
//! # Invariants
//! - `last_known_remote` is the content both sides agree on, updated
//!   optimistically when a write is issued.
//! - Only the most recently issued write restores the cursor or clears
//!   `unsaved`; a pending cursor restore is dropped once a newer write is
//!   issued.
//! - After `closed` is set, nothing touches the surface.
//! - While a write has failed, remote snapshots never replace the surface;
//!   the unsaved local content stays until it is written.
//! - Contents are compared by `Delta::same_content`, not by run layout.

use crate::access::AccessTier;
use crate::config::{CursorPolicy, SyncConfig};
use crate::model::delta::Delta;
use crate::model::document::{DocumentId, UserId};
use crate::runtime::EventLoop;
use crate::store::{DocumentStore, Snapshot, StoreError, Subscription};
use crate::surface::{ApplyMode, EditingSurface, Selection};
use crate::sync::write_job::WriteJob;
use crate::sync::{SyncError, SyncNotice};
use log::{debug, info, warn};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

pub(crate) struct SessionState<D, S> {
    pub(crate) this: Weak<RefCell<SessionState<D, S>>>,
    pub(crate) document_id: DocumentId,
    pub(crate) identity: UserId,
    pub(crate) tier: AccessTier,
    pub(crate) store: Rc<D>,
    pub(crate) surface: Rc<RefCell<S>>,
    pub(crate) event_loop: EventLoop,
    pub(crate) config: SyncConfig,
    pub(crate) last_known_remote: Delta,
    /// Snapshots this session wrote, oldest first, for late-echo detection.
    pub(crate) outbound: VecDeque<Delta>,
    /// Sequence number of the newest issued write; shared with write jobs.
    pub(crate) latest_seq: Rc<Cell<u64>>,
    pub(crate) acked_seq: u64,
    pub(crate) unsaved: Option<Delta>,
    pub(crate) notices: Vec<SyncNotice>,
    pub(crate) closed: bool,
}

impl<D, S> SessionState<D, S>
where
    D: DocumentStore + 'static,
    S: EditingSurface + 'static,
{
    pub(crate) fn handle_local_change(&mut self) {
        match self.tier {
            AccessTier::Denied => {}
            AccessTier::Viewer => self.revert_viewer_edit(),
            AccessTier::Owner => {
                let (current, selection) = {
                    let surface = self.surface.borrow();
                    (surface.contents(), surface.selection())
                };
                if current.same_content(&self.last_known_remote) && self.unsaved.is_none() {
                    debug!(
                        "event=local_change module=sync status=skipped reason=unchanged doc_id={}",
                        self.document_id
                    );
                    return;
                }
                self.issue_write(current, selection);
            }
        }
    }

    fn revert_viewer_edit(&mut self) {
        let mut surface = self.surface.borrow_mut();
        if surface.contents().same_content(&self.last_known_remote) {
            return;
        }
        surface.set_contents(&self.last_known_remote, ApplyMode::Silent);
        debug!(
            "event=local_change module=sync status=reverted tier=viewer doc_id={}",
            self.document_id
        );
    }

    /// Queues a content-only merge write of `content`.
    pub(crate) fn issue_write(&mut self, content: Delta, selection: Option<Selection>) {
        let seq = self.latest_seq.get() + 1;
        self.latest_seq.set(seq);
        self.last_known_remote = content.clone();
        self.outbound.push_back(content.clone());
        while self.outbound.len() > self.config.outbound_history {
            self.outbound.pop_front();
        }

        debug!(
            "event=doc_save module=sync status=queued doc_id={} seq={}",
            self.document_id, seq
        );
        let job = WriteJob {
            store: self.store.clone(),
            event_loop: self.event_loop.clone(),
            document_id: self.document_id.clone(),
            content,
            seq,
            latest_seq: self.latest_seq.clone(),
            selection,
            attempt: 1,
            retry: self.config.retry,
            session: self.this.clone(),
        };
        self.event_loop.post(move || job.run());
    }

    pub(crate) fn on_write_settled(&mut self, seq: u64, selection: Option<Selection>) {
        self.acked_seq = self.acked_seq.max(seq);
        if seq != self.latest_seq.get() {
            return;
        }
        self.unsaved = None;
        if !self.closed {
            self.schedule_cursor_restore(selection);
        }
    }

    pub(crate) fn on_write_failed(
        &mut self,
        seq: u64,
        content: Delta,
        attempts: u32,
        err: &StoreError,
    ) {
        if seq != self.latest_seq.get() {
            return;
        }
        self.unsaved = Some(content);
        self.notices.push(SyncNotice::SaveFailed {
            document_id: self.document_id.clone(),
            attempts,
            message: err.to_string(),
        });
    }

    pub(crate) fn handle_remote_change(&mut self, snapshot: Snapshot) {
        if self.closed {
            return;
        }

        let incoming = match snapshot {
            Snapshot::Present(document) => document.content,
            Snapshot::Absent(id) => {
                warn!(
                    "event=remote_change module=sync status=ignored reason=absent doc_id={}",
                    id
                );
                return;
            }
            Snapshot::Malformed { id, reason } => {
                warn!(
                    "event=remote_change module=sync status=rejected reason=malformed doc_id={}",
                    id
                );
                self.notices.push(SyncNotice::RemoteContentRejected {
                    document_id: id,
                    reason,
                });
                return;
            }
        };

        let current = self.surface.borrow().contents();
        if incoming.same_content(&current) {
            self.forget_outbound_through(&incoming);
            self.last_known_remote = incoming;
            debug!(
                "event=remote_change module=sync status=suppressed reason=matches_surface doc_id={}",
                self.document_id
            );
            return;
        }
        if self.forget_outbound_through(&incoming) {
            debug!(
                "event=remote_change module=sync status=suppressed reason=stale_echo doc_id={}",
                self.document_id
            );
            return;
        }
        if self.unsaved.is_some() {
            self.last_known_remote = incoming;
            self.outbound.clear();
            warn!(
                "event=remote_change module=sync status=deferred reason=unsaved_local doc_id={}",
                self.document_id
            );
            self.notices.push(SyncNotice::RemoteConflict {
                document_id: self.document_id.clone(),
            });
            return;
        }

        let selection = {
            let mut surface = self.surface.borrow_mut();
            let selection = surface.selection();
            surface.set_contents(&incoming, ApplyMode::Silent);
            selection
        };
        self.last_known_remote = incoming;
        self.outbound.clear();
        info!(
            "event=remote_change module=sync status=applied doc_id={}",
            self.document_id
        );
        self.schedule_cursor_restore(selection);
    }

    /// Drops outbound history up to and including `content`. Returns whether
    /// it was found.
    fn forget_outbound_through(&mut self, content: &Delta) -> bool {
        match self.outbound.iter().position(|sent| sent.same_content(content)) {
            Some(position) => {
                self.outbound.drain(..=position);
                true
            }
            None => false,
        }
    }

    /// Places the cursor after the surface renders, per the configured policy.
    /// Dropped if a newer local write is issued before the render.
    pub(crate) fn schedule_cursor_restore(&self, selection: Option<Selection>) {
        let policy = self.config.cursor_policy;
        let scheduled_at = self.latest_seq.get();
        let session = self.this.clone();
        self.surface.borrow_mut().after_render(Box::new(move || {
            let Some(state) = session.upgrade() else {
                return;
            };
            let state = state.borrow();
            if state.closed || state.latest_seq.get() != scheduled_at {
                return;
            }
            let mut surface = state.surface.borrow_mut();
            let length = surface.length();
            let target = match (policy, selection) {
                (CursorPolicy::JumpToEnd, _) => Selection::caret(length),
                (CursorPolicy::RestoreSelection, Some(selection)) => selection.clamp_to(length),
                (CursorPolicy::RestoreSelection, None) => return,
            };
            surface.set_selection(target);
        }));
    }

    /// Moves the cursor to the end once the initial contents render.
    pub(crate) fn schedule_cursor_to_end(&self) {
        let session = self.this.clone();
        self.surface.borrow_mut().after_render(Box::new(move || {
            let Some(state) = session.upgrade() else {
                return;
            };
            let state = state.borrow();
            if state.closed {
                return;
            }
            let mut surface = state.surface.borrow_mut();
            let length = surface.length();
            surface.set_selection(Selection::caret(length));
        }));
    }
}

/// Open editor bound to one document. Obtain with `SyncEngine::open`, end
/// with `close`.
pub struct Session<D, S> {
    pub(crate) inner: Rc<RefCell<SessionState<D, S>>>,
    pub(crate) subscription: Option<Subscription>,
}

impl<D, S> Session<D, S>
where
    D: DocumentStore + 'static,
    S: EditingSurface + 'static,
{
    /// Reports that the surface contents changed for any reason.
    pub fn on_local_change(&self) {
        self.inner.borrow_mut().handle_local_change();
    }

    /// Feeds one store snapshot to the session. The standing subscription
    /// calls this for every change of the document.
    pub fn on_remote_change(&self, snapshot: Snapshot) {
        self.inner.borrow_mut().handle_remote_change(snapshot);
    }

    /// Writes the current surface contents even if unchanged.
    ///
    /// # Errors
    /// - `SyncError::ReadOnly` for non-owner sessions.
    pub fn save_now(&self) -> Result<(), SyncError> {
        let mut state = self.inner.borrow_mut();
        state.ensure_writable()?;
        let (current, selection) = {
            let surface = state.surface.borrow();
            (surface.contents(), surface.selection())
        };
        state.issue_write(current, selection);
        Ok(())
    }

    /// Clears the document, locally and in the store.
    ///
    /// # Errors
    /// - `SyncError::ReadOnly` for non-owner sessions.
    pub fn reset(&self) -> Result<(), SyncError> {
        let surface = {
            let state = self.inner.borrow();
            state.ensure_writable()?;
            state.surface.clone()
        };
        // Normal mode: hosts may report the change synchronously.
        surface
            .borrow_mut()
            .set_contents(&Delta::new(), ApplyMode::Normal);
        self.inner
            .borrow_mut()
            .issue_write(Delta::new(), Some(Selection::caret(0)));
        Ok(())
    }

    pub fn tier(&self) -> AccessTier {
        self.inner.borrow().tier
    }

    pub fn document_id(&self) -> DocumentId {
        self.inner.borrow().document_id.clone()
    }

    pub fn identity(&self) -> UserId {
        self.inner.borrow().identity.clone()
    }

    pub fn last_known_remote(&self) -> Delta {
        self.inner.borrow().last_known_remote.clone()
    }

    /// Whether the newest write failed and its content is not persisted.
    pub fn has_unsaved_changes(&self) -> bool {
        self.inner.borrow().unsaved.is_some()
    }

    /// Content of the newest write that failed, if it is still unsaved.
    pub fn unsaved_content(&self) -> Option<Delta> {
        self.inner.borrow().unsaved.clone()
    }

    /// Whether a write has been issued that has not settled yet.
    pub fn has_pending_writes(&self) -> bool {
        let state = self.inner.borrow();
        state.unsaved.is_none() && state.acked_seq < state.latest_seq.get()
    }

    pub fn drain_notices(&self) -> Vec<SyncNotice> {
        std::mem::take(&mut self.inner.borrow_mut().notices)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.borrow().closed
    }

    /// Ends the session and releases its subscription. Writes already issued
    /// still reach the store.
    pub fn close(mut self) {
        {
            let mut state = self.inner.borrow_mut();
            state.closed = true;
            info!(
                "event=session_close module=sync status=ok doc_id={} tier={}",
                state.document_id,
                state.tier.as_str()
            );
        }
        self.subscription.take();
    }
}

impl<D, S> SessionState<D, S> {
    fn ensure_writable(&self) -> Result<(), SyncError> {
        if self.tier.can_write() {
            Ok(())
        } else {
            Err(SyncError::ReadOnly(self.document_id.clone()))
        }
    }
}

impl<D, S> Drop for Session<D, S> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.inner.try_borrow_mut() {
            if !state.closed {
                state.closed = true;
                warn!(
                    "event=session_close module=sync status=implicit doc_id={}",
                    state.document_id
                );
            }
        }
    }
}

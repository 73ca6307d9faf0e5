//! Session factory.

use crate::access::{AccessController, AccessError, AccessTier, OpenTarget};
use crate::config::{ConfigError, SyncConfig};
use crate::model::document::UserId;
use crate::runtime::EventLoop;
use crate::store::{DocumentStore, Snapshot};
use crate::surface::{ApplyMode, EditingSurface};
use crate::sync::session::{Session, SessionState};
use crate::sync::SyncError;
use log::{error, info, warn};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

/// Opens sync sessions against one store.
pub struct SyncEngine<D> {
    store: Rc<D>,
    event_loop: EventLoop,
    config: SyncConfig,
    access: AccessController,
}

impl<D: DocumentStore + 'static> SyncEngine<D> {
    /// # Errors
    /// - `ConfigError::Invalid` when `config` fails `SyncConfig::validate`.
    pub fn new(
        store: Rc<D>,
        event_loop: EventLoop,
        config: SyncConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            store,
            event_loop,
            config,
            access: AccessController::new(),
        })
    }

    pub fn store(&self) -> &Rc<D> {
        &self.store
    }

    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Parses a route target using the configured viewer marker.
    pub fn parse_target(&self, raw: &str) -> Result<OpenTarget, SyncError> {
        match self.config.viewer_marker() {
            Some((key, value)) => OpenTarget::parse_with(raw, key, value),
            None => OpenTarget::parse(raw),
        }
        .map_err(SyncError::InvalidTarget)
    }

    /// Resolves access, subscribes to the document's changes and loads it
    /// into `surface`. The surface is untouched when opening fails.
    ///
    /// # Errors
    /// - `AccessDenied` when `identity` neither owns the document nor asked
    ///   for viewer access.
    /// - `NotFound` when the store cannot be read, written or subscribed.
    pub fn open<S: EditingSurface + 'static>(
        &self,
        target: &OpenTarget,
        identity: &UserId,
        surface: Rc<RefCell<S>>,
    ) -> Result<Session<D, S>, SyncError> {
        let id = target.document_id.clone();
        let resolution = self
            .access
            .resolve(&*self.store, target, identity)
            .and_then(|resolution| resolution.ensure_granted(identity))
            .map_err(|err| match err {
                AccessError::Denied { id, .. } => {
                    warn!(
                        "event=session_open module=sync status=denied doc_id={}",
                        id
                    );
                    SyncError::AccessDenied(id)
                }
                AccessError::Store(source) => {
                    error!(
                        "event=session_open module=sync status=error doc_id={} error={}",
                        id, source
                    );
                    SyncError::NotFound {
                        id: id.clone(),
                        source,
                    }
                }
            })?;

        let document = resolution.document;
        let tier = resolution.tier;
        let inner = Rc::new_cyclic(|this: &Weak<RefCell<SessionState<D, S>>>| {
            RefCell::new(SessionState {
                this: this.clone(),
                document_id: id.clone(),
                identity: identity.clone(),
                tier,
                store: self.store.clone(),
                surface: surface.clone(),
                event_loop: self.event_loop.clone(),
                config: self.config.clone(),
                last_known_remote: document.content.clone(),
                outbound: VecDeque::new(),
                latest_seq: Rc::new(Cell::new(0)),
                acked_seq: 0,
                unsaved: None,
                notices: Vec::new(),
                closed: false,
            })
        });

        let listener_state = Rc::downgrade(&inner);
        let subscription = self
            .store
            .subscribe(
                &id,
                Box::new(move |snapshot: Snapshot| {
                    if let Some(state) = listener_state.upgrade() {
                        state.borrow_mut().handle_remote_change(snapshot);
                    }
                }),
            )
            .map_err(|source| {
                error!(
                    "event=session_open module=sync status=error doc_id={} error={}",
                    id, source
                );
                SyncError::NotFound {
                    id: id.clone(),
                    source,
                }
            })?;

        {
            let mut surface = surface.borrow_mut();
            surface.set_read_only(tier != AccessTier::Owner);
            surface.set_contents(&document.content, ApplyMode::Silent);
        }
        inner.borrow().schedule_cursor_to_end();

        info!(
            "event=session_open module=sync status=ok doc_id={} tier={} created={}",
            id,
            tier.as_str(),
            resolution.created
        );
        Ok(Session {
            inner,
            subscription: Some(subscription),
        })
    }
}

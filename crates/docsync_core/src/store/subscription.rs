//! Change-notification fan-out with RAII subscription handles.
//!
//! # Invariants
//! - Publishing only queues work; listeners run later on the event loop.
//! - A listener never runs after its `Subscription` has been dropped, even if
//!   a notification for it was already queued.

use crate::model::document::DocumentId;
use crate::runtime::EventLoop;
use crate::store::Snapshot;
use log::debug;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

/// Callback invoked with every snapshot of the subscribed document.
pub type SnapshotListener = Box<dyn FnMut(Snapshot)>;

struct Registration {
    document_id: DocumentId,
    listener: Rc<RefCell<SnapshotListener>>,
}

#[derive(Default)]
struct HubState {
    next_id: u64,
    registrations: BTreeMap<u64, Registration>,
}

/// Subscriber registry shared by store implementations.
#[derive(Clone)]
pub struct SubscriberHub {
    state: Rc<RefCell<HubState>>,
    event_loop: EventLoop,
}

impl SubscriberHub {
    pub fn new(event_loop: EventLoop) -> Self {
        Self {
            state: Rc::new(RefCell::new(HubState::default())),
            event_loop,
        }
    }

    /// Registers `listener` for `document_id`.
    pub fn register(&self, document_id: &DocumentId, listener: SnapshotListener) -> Subscription {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.registrations.insert(
            id,
            Registration {
                document_id: document_id.clone(),
                listener: Rc::new(RefCell::new(listener)),
            },
        );
        debug!(
            "event=subscribe module=store status=ok doc_id={} subscription={}",
            document_id, id
        );

        Subscription {
            id,
            document_id: document_id.clone(),
            state: Rc::downgrade(&self.state),
        }
    }

    /// Queues `snapshot` for every listener of its document.
    pub fn publish(&self, snapshot: Snapshot) {
        let targets: Vec<(u64, Rc<RefCell<SnapshotListener>>)> = self
            .state
            .borrow()
            .registrations
            .iter()
            .filter(|(_, registration)| &registration.document_id == snapshot.document_id())
            .map(|(id, registration)| (*id, registration.listener.clone()))
            .collect();

        for (id, listener) in targets {
            let state = Rc::downgrade(&self.state);
            let snapshot = snapshot.clone();
            self.event_loop.post(move || {
                let still_registered = state
                    .upgrade()
                    .is_some_and(|state| state.borrow().registrations.contains_key(&id));
                if !still_registered {
                    debug!(
                        "event=notify module=store status=skipped reason=unsubscribed subscription={}",
                        id
                    );
                    return;
                }
                let mut listener = listener.borrow_mut();
                (*listener)(snapshot);
            });
        }
    }

    /// Number of live subscriptions for `document_id`.
    pub fn subscriber_count(&self, document_id: &DocumentId) -> usize {
        self.state
            .borrow()
            .registrations
            .values()
            .filter(|registration| &registration.document_id == document_id)
            .count()
    }
}

/// Live registration; dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    document_id: DocumentId,
    state: Weak<RefCell<HubState>>,
}

impl Subscription {
    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    /// Returns whether the registration is still present in its hub.
    pub fn is_active(&self) -> bool {
        self.state
            .upgrade()
            .is_some_and(|state| state.borrow().registrations.contains_key(&self.id))
    }

    /// Unsubscribes explicitly; equivalent to dropping the handle.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            let removed = state.borrow_mut().registrations.remove(&self.id);
            if removed.is_some() {
                debug!(
                    "event=unsubscribe module=store status=ok doc_id={} subscription={}",
                    self.document_id, self.id
                );
            }
        }
    }
}

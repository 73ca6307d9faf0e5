use docsync_core::surface::settle;
use docsync_core::{
    AccessTier, ConfigError, CursorPolicy, Op, Delta, Document, DocumentId, DocumentPatch, DocumentStore,
    EditingSurface, EventLoop, HeadlessSurface, MemoryDocumentStore, RetryPolicy, Selection,
    Session, Snapshot, StoreError, StoreResult, Subscription, SyncConfig, SyncEngine, SyncError,
    SyncNotice, UserId, WriteMode,
};
use docsync_core::store::SnapshotListener;
use serde_json::json;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

const FOREVER: u32 = u32::MAX;

/// Memory store with injectable failures.
struct FlakyStore {
    inner: MemoryDocumentStore,
    failing_sets: Cell<u32>,
    transient: Cell<bool>,
    failing_gets: Cell<bool>,
    failing_subscribes: Cell<bool>,
    set_attempts: Cell<usize>,
}

impl FlakyStore {
    fn new(event_loop: EventLoop) -> Self {
        Self {
            inner: MemoryDocumentStore::new(event_loop),
            failing_sets: Cell::new(0),
            transient: Cell::new(true),
            failing_gets: Cell::new(false),
            failing_subscribes: Cell::new(false),
            set_attempts: Cell::new(0),
        }
    }

    fn fail_sets(&self, count: u32, transient: bool) {
        self.failing_sets.set(count);
        self.transient.set(transient);
    }
}

impl DocumentStore for FlakyStore {
    fn get(&self, id: &DocumentId) -> StoreResult<Option<Document>> {
        if self.failing_gets.get() {
            return Err(StoreError::Unavailable {
                message: "injected read failure".to_string(),
                transient: false,
            });
        }
        self.inner.get(id)
    }

    fn set(&self, id: &DocumentId, patch: DocumentPatch, mode: WriteMode) -> StoreResult<()> {
        self.set_attempts.set(self.set_attempts.get() + 1);
        let remaining = self.failing_sets.get();
        if remaining > 0 {
            if remaining != FOREVER {
                self.failing_sets.set(remaining - 1);
            }
            return Err(StoreError::Unavailable {
                message: "injected write failure".to_string(),
                transient: self.transient.get(),
            });
        }
        self.inner.set(id, patch, mode)
    }

    fn subscribe(
        &self,
        id: &DocumentId,
        listener: SnapshotListener,
    ) -> StoreResult<Subscription> {
        if self.failing_subscribes.get() {
            return Err(StoreError::Unavailable {
                message: "injected subscribe failure".to_string(),
                transient: false,
            });
        }
        self.inner.subscribe(id, listener)
    }

    fn list(&self) -> StoreResult<Vec<Document>> {
        self.inner.list()
    }
}

type TestSession = Session<FlakyStore, HeadlessSurface>;
type SharedSurface = Rc<RefCell<HeadlessSurface>>;

struct Harness {
    event_loop: EventLoop,
    store: Rc<FlakyStore>,
    engine: SyncEngine<FlakyStore>,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    fn with_config(config: SyncConfig) -> Self {
        let event_loop = EventLoop::new();
        let store = Rc::new(FlakyStore::new(event_loop.clone()));
        let engine = SyncEngine::new(store.clone(), event_loop.clone(), config).unwrap();
        Self {
            event_loop,
            store,
            engine,
        }
    }

    fn try_open(&self, raw: &str, who: &str) -> Result<(TestSession, SharedSurface), SyncError> {
        let surface = HeadlessSurface::shared();
        let target = self.engine.parse_target(raw)?;
        let session = self.engine.open(&target, &user(who), surface.clone())?;
        settle(&surface);
        Ok((session, surface))
    }

    fn open(&self, raw: &str, who: &str) -> (TestSession, SharedSurface) {
        self.try_open(raw, who).expect("open should succeed")
    }

    /// Runs due tasks, then lets every surface render.
    fn pump(&self, surfaces: &[&SharedSurface]) {
        self.event_loop.run_until_idle();
        for surface in surfaces {
            settle(surface);
        }
    }

    fn writes(&self) -> usize {
        self.store.inner.write_count()
    }

    fn stored_text(&self, id: &str) -> String {
        self.store
            .inner
            .get(&doc_id(id))
            .unwrap()
            .expect("document should exist")
            .content
            .plain_text()
    }
}

fn user(value: &str) -> UserId {
    UserId::parse(value).unwrap()
}

fn doc_id(value: &str) -> DocumentId {
    DocumentId::parse(value).unwrap()
}

fn type_and_report(session: &TestSession, surface: &SharedSurface, text: &str) {
    surface.borrow_mut().type_text(text);
    session.on_local_change();
}

fn selection_of(surface: &SharedSurface) -> Option<Selection> {
    surface.borrow().selection()
}

#[test]
fn owner_viewer_and_second_tab_scenario() {
    let h = Harness::new();

    let (owner, owner_surface) = h.open("d1", "A");
    assert_eq!(owner.tier(), AccessTier::Owner);
    let raw = h.store.inner.raw(&doc_id("d1")).unwrap();
    assert_eq!(raw["ownerId"], json!("A"));
    assert_eq!(raw["content"], json!([]));
    assert_eq!(h.writes(), 1);

    type_and_report(&owner, &owner_surface, "hi");
    h.pump(&[&owner_surface]);
    assert_eq!(
        h.store.inner.raw(&doc_id("d1")).unwrap()["content"],
        json!([{ "insert": "hi" }])
    );
    assert_eq!(h.writes(), 2);

    let (viewer, viewer_surface) = h.open("d1?access=viewer", "B");
    assert_eq!(viewer.tier(), AccessTier::Viewer);
    assert_eq!(viewer_surface.borrow().plain_text(), "hi");
    assert!(viewer_surface.borrow().is_read_only());
    assert_eq!(selection_of(&viewer_surface), Some(Selection::caret(2)));
    assert!(!viewer_surface.borrow_mut().type_text("!"));

    let (second_tab, second_surface) = h.open("d1", "A");
    assert_eq!(second_surface.borrow().plain_text(), "hi");
    owner.save_now().unwrap();
    h.pump(&[&owner_surface, &viewer_surface, &second_surface]);

    assert_eq!(h.writes(), 3);
    assert_eq!(second_surface.borrow().silent_applies(), 1);
    assert_eq!(viewer_surface.borrow().silent_applies(), 1);
    assert!(!second_tab.has_pending_writes());

    second_tab.close();
    viewer.close();
    owner.close();
}

#[test]
fn remote_snapshot_equal_to_local_content_never_writes() {
    let h = Harness::new();
    let (owner, surface) = h.open("doc", "A");
    type_and_report(&owner, &surface, "abc");
    h.pump(&[&surface]);
    let writes = h.writes();
    let applies = surface.borrow().silent_applies();

    h.store.inner.put_raw(
        &doc_id("doc"),
        json!({ "ownerId": "A", "title": "t", "content": [{ "insert": "abc" }] }),
    );
    h.pump(&[&surface]);
    owner.on_local_change();
    h.pump(&[&surface]);

    assert_eq!(h.writes(), writes + 1);
    assert_eq!(surface.borrow().silent_applies(), applies);
    assert_eq!(owner.last_known_remote(), Delta::text("abc"));
    owner.close();
}

#[test]
fn late_echo_of_own_earlier_write_is_dropped() {
    let h = Harness::new();
    let (owner, surface) = h.open("doc", "A");
    let owner = Rc::new(owner);

    type_and_report(&owner, &surface, "a");
    // Second keystroke lands after the first write but before its echo.
    let typing_session = owner.clone();
    let typing_surface = surface.clone();
    h.event_loop
        .post(move || type_and_report(&typing_session, &typing_surface, "b"));
    h.pump(&[&surface]);

    assert_eq!(h.store.set_attempts.get(), 3);
    assert_eq!(h.stored_text("doc"), "ab");
    assert_eq!(surface.borrow().plain_text(), "ab");
    assert_eq!(surface.borrow().silent_applies(), 1);
    assert_eq!(selection_of(&surface), Some(Selection::caret(2)));
}

#[test]
fn remote_apply_restores_cursor_after_render() {
    let h = Harness::new();
    let (first, first_surface) = h.open("doc", "A");
    type_and_report(&first, &first_surface, "hello world");
    h.pump(&[&first_surface]);

    let (second, second_surface) = h.open("doc", "A");
    first_surface.borrow_mut().set_cursor(Selection::new(2, 3));
    first_surface.borrow_mut().take_change_events();

    type_and_report(&second, &second_surface, " again");
    h.event_loop.run_until_idle();
    assert_eq!(first_surface.borrow().plain_text(), "hello world again");
    assert_eq!(first_surface.borrow_mut().take_change_events(), 0);

    // Widgets typically reset the caret when contents are replaced.
    first_surface.borrow_mut().set_cursor(Selection::caret(0));
    settle(&first_surface);
    settle(&second_surface);
    assert_eq!(selection_of(&first_surface), Some(Selection::new(2, 3)));

    first.close();
    second.close();
}

#[test]
fn restored_cursor_is_clamped_when_remote_content_shrinks() {
    let h = Harness::new();
    let (first, first_surface) = h.open("doc", "A");
    type_and_report(&first, &first_surface, "hello world");
    h.pump(&[&first_surface]);
    let (second, second_surface) = h.open("doc", "A");

    first_surface.borrow_mut().set_cursor(Selection::caret(10));
    second_surface.borrow_mut().delete_text(2, 9);
    second.on_local_change();
    h.pump(&[&first_surface, &second_surface]);

    assert_eq!(first_surface.borrow().plain_text(), "he");
    assert_eq!(selection_of(&first_surface), Some(Selection::caret(2)));
    first.close();
    second.close();
}

#[test]
fn jump_to_end_policy_moves_cursor_to_end() {
    let config = SyncConfig {
        cursor_policy: CursorPolicy::JumpToEnd,
        ..SyncConfig::default()
    };
    let h = Harness::with_config(config);
    let (first, first_surface) = h.open("doc", "A");
    type_and_report(&first, &first_surface, "hello");
    h.pump(&[&first_surface]);

    first_surface.borrow_mut().set_cursor(Selection::caret(1));
    type_and_report(&first, &first_surface, "X");
    assert_eq!(selection_of(&first_surface), Some(Selection::caret(2)));
    h.pump(&[&first_surface]);
    assert_eq!(first_surface.borrow().plain_text(), "hXello");
    assert_eq!(selection_of(&first_surface), Some(Selection::caret(6)));

    let (second, second_surface) = h.open("doc", "A");
    first_surface.borrow_mut().set_cursor(Selection::caret(0));
    type_and_report(&second, &second_surface, "!");
    h.pump(&[&first_surface, &second_surface]);
    assert_eq!(selection_of(&first_surface), Some(Selection::caret(7)));

    first.close();
    second.close();
}

#[test]
fn viewer_edits_are_reverted_and_never_written() {
    let h = Harness::new();
    let (owner, owner_surface) = h.open("doc", "A");
    type_and_report(&owner, &owner_surface, "shared");
    h.pump(&[&owner_surface]);
    let writes = h.writes();

    let (viewer, viewer_surface) = h.open("doc?access=viewer", "B");
    viewer_surface.borrow_mut().set_read_only(false);
    type_and_report(&viewer, &viewer_surface, " vandalism");
    h.pump(&[&viewer_surface]);

    assert_eq!(viewer_surface.borrow().plain_text(), "shared");
    assert!(matches!(viewer.save_now(), Err(SyncError::ReadOnly(_))));
    assert!(matches!(viewer.reset(), Err(SyncError::ReadOnly(_))));
    h.pump(&[&viewer_surface]);
    assert_eq!(h.writes(), writes);
    assert_eq!(h.stored_text("doc"), "shared");

    viewer.close();
    owner.close();
}

#[test]
fn non_owner_without_marker_is_denied() {
    let h = Harness::new();
    let (owner, _surface) = h.open("doc", "A");
    let writes = h.writes();

    match h.try_open("doc", "B") {
        Err(SyncError::AccessDenied(id)) => assert_eq!(id.as_str(), "doc"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("non-owner open must be denied"),
    }
    assert_eq!(h.writes(), writes);
    assert_eq!(h.store.inner.subscriber_count(&doc_id("doc")), 1);
    owner.close();
}

#[test]
fn opening_absent_document_creates_it_once() {
    let h = Harness::new();
    let (first, _first_surface) = h.open("fresh", "A");
    let (second, _second_surface) = h.open("fresh", "A");

    assert_eq!(h.writes(), 1);
    assert_eq!(h.store.inner.len(), 1);
    let document = h.store.inner.get(&doc_id("fresh")).unwrap().unwrap();
    assert_eq!(document.owner_id.as_str(), "A");
    assert!(document.content.is_empty());

    first.close();
    second.close();
}

#[test]
fn closed_session_ignores_late_callbacks_but_persists_last_write() {
    let h = Harness::new();
    let (first, first_surface) = h.open("doc", "A");
    let (second, second_surface) = h.open("doc", "A");

    type_and_report(&first, &first_surface, "draft");
    first.close();
    assert_eq!(h.store.inner.subscriber_count(&doc_id("doc")), 1);

    first_surface.borrow_mut().set_cursor(Selection::caret(1));
    h.pump(&[&first_surface, &second_surface]);
    assert_eq!(h.stored_text("doc"), "draft");
    assert_eq!(second_surface.borrow().plain_text(), "draft");
    assert_eq!(selection_of(&first_surface), Some(Selection::caret(1)));

    type_and_report(&second, &second_surface, " v2");
    h.pump(&[&first_surface, &second_surface]);
    assert_eq!(first_surface.borrow().plain_text(), "draft");
    assert_eq!(first_surface.borrow().silent_applies(), 1);
    second.close();
}

#[test]
fn render_hook_queued_before_close_does_nothing() {
    let h = Harness::new();
    let (first, first_surface) = h.open("doc", "A");
    let (second, second_surface) = h.open("doc", "A");
    first_surface.borrow_mut().set_cursor(Selection::caret(0));

    type_and_report(&second, &second_surface, "remote");
    h.event_loop.run_until_idle();
    assert_eq!(first_surface.borrow().pending_render_hooks(), 1);

    first.close();
    first_surface.borrow_mut().set_cursor(Selection::caret(3));
    assert_eq!(settle(&first_surface), 1);
    assert_eq!(selection_of(&first_surface), Some(Selection::caret(3)));
    second.close();
}

#[test]
fn dropping_session_releases_subscription() {
    let h = Harness::new();
    let (session, _surface) = h.open("doc", "A");
    assert_eq!(h.store.inner.subscriber_count(&doc_id("doc")), 1);
    drop(session);
    assert_eq!(h.store.inner.subscriber_count(&doc_id("doc")), 0);
}

#[test]
fn transient_failures_are_retried_with_backoff() {
    let h = Harness::new();
    let (owner, surface) = h.open("doc", "A");
    h.store.fail_sets(2, true);

    type_and_report(&owner, &surface, "saved eventually");
    h.pump(&[&surface]);
    assert!(owner.has_pending_writes());
    assert_eq!(h.event_loop.next_deadline(), Some(Duration::from_millis(250)));

    h.event_loop.run_all();
    settle(&surface);
    assert_eq!(h.event_loop.now(), Duration::from_millis(750));
    assert_eq!(h.stored_text("doc"), "saved eventually");
    assert!(!owner.has_pending_writes());
    assert!(!owner.has_unsaved_changes());
    assert!(owner.drain_notices().is_empty());
    owner.close();
}

#[test]
fn persistent_failure_raises_notice_and_keeps_unsaved_content() {
    let config = SyncConfig {
        retry: RetryPolicy {
            max_attempts: 3,
            ..RetryPolicy::default()
        },
        ..SyncConfig::default()
    };
    let h = Harness::with_config(config);
    let (owner, surface) = h.open("doc", "A");
    let create_attempts = h.store.set_attempts.get();
    h.store.fail_sets(FOREVER, true);

    type_and_report(&owner, &surface, "precious");
    h.event_loop.run_all();
    settle(&surface);

    assert_eq!(h.store.set_attempts.get() - create_attempts, 3);
    assert!(owner.has_unsaved_changes());
    let notices = owner.drain_notices();
    assert_eq!(notices.len(), 1);
    match &notices[0] {
        SyncNotice::SaveFailed {
            document_id,
            attempts,
            ..
        } => {
            assert_eq!(document_id.as_str(), "doc");
            assert_eq!(*attempts, 3);
        }
        other => panic!("unexpected notice: {other:?}"),
    }
    assert!(owner.drain_notices().is_empty());
    assert_eq!(surface.borrow().plain_text(), "precious");

    h.store.fail_sets(0, true);
    owner.on_local_change();
    h.pump(&[&surface]);
    assert_eq!(h.stored_text("doc"), "precious");
    assert!(!owner.has_unsaved_changes());
    owner.close();
}

#[test]
fn non_transient_failure_is_not_retried() {
    let h = Harness::new();
    let (owner, surface) = h.open("doc", "A");
    h.store.fail_sets(1, false);

    type_and_report(&owner, &surface, "x");
    h.event_loop.run_all();

    assert!(owner.has_unsaved_changes());
    assert!(matches!(
        owner.drain_notices().as_slice(),
        [SyncNotice::SaveFailed { attempts: 1, .. }]
    ));

    owner.save_now().unwrap();
    h.pump(&[&surface]);
    assert_eq!(h.stored_text("doc"), "x");
    owner.close();
}

#[test]
fn stale_retry_never_overwrites_newer_write() {
    let h = Harness::new();
    let (owner, surface) = h.open("doc", "A");
    let create_attempts = h.store.set_attempts.get();
    h.store.fail_sets(1, true);

    type_and_report(&owner, &surface, "a");
    h.pump(&[&surface]);
    type_and_report(&owner, &surface, "b");
    h.pump(&[&surface]);
    assert_eq!(h.stored_text("doc"), "ab");

    h.event_loop.advance(Duration::from_millis(250));
    settle(&surface);
    assert_eq!(h.store.set_attempts.get() - create_attempts, 2);
    assert_eq!(h.stored_text("doc"), "ab");
    assert_eq!(h.event_loop.pending(), 0);
    owner.close();
}

#[test]
fn malformed_remote_content_leaves_editor_untouched() {
    let h = Harness::new();
    let (owner, surface) = h.open("doc", "A");
    type_and_report(&owner, &surface, "kept");
    h.pump(&[&surface]);
    let applies = surface.borrow().silent_applies();

    h.store
        .inner
        .put_raw(&doc_id("doc"), json!({ "ownerId": "A", "content": 42 }));
    h.pump(&[&surface]);

    assert_eq!(surface.borrow().plain_text(), "kept");
    assert_eq!(surface.borrow().silent_applies(), applies);
    assert!(matches!(
        owner.drain_notices().as_slice(),
        [SyncNotice::RemoteContentRejected { .. }]
    ));
    owner.close();
}

#[test]
fn absent_snapshot_is_ignored() {
    let h = Harness::new();
    let (owner, surface) = h.open("doc", "A");
    type_and_report(&owner, &surface, "still here");
    h.pump(&[&surface]);

    owner.on_remote_change(Snapshot::Absent(doc_id("doc")));
    settle(&surface);
    assert_eq!(surface.borrow().plain_text(), "still here");
    assert!(owner.drain_notices().is_empty());
    owner.close();
}

#[test]
fn store_failure_on_open_is_not_found() {
    let h = Harness::new();
    h.store.failing_gets.set(true);
    assert!(matches!(
        h.try_open("doc", "A"),
        Err(SyncError::NotFound { .. })
    ));

    h.store.failing_gets.set(false);
    h.store.fail_sets(1, false);
    assert!(matches!(
        h.try_open("doc", "A"),
        Err(SyncError::NotFound { .. })
    ));
    assert!(h.store.inner.is_empty());
}

#[test]
fn reset_clears_surface_and_store() {
    let h = Harness::new();
    let (owner, surface) = h.open("doc", "A");
    type_and_report(&owner, &surface, "scratch");
    h.pump(&[&surface]);
    surface.borrow_mut().take_change_events();

    owner.reset().unwrap();
    assert!(surface.borrow().contents().is_empty());
    assert_eq!(surface.borrow_mut().take_change_events(), 1);
    h.pump(&[&surface]);

    assert_eq!(h.store.inner.raw(&doc_id("doc")).unwrap()["content"], json!([]));
    assert_eq!(h.store.inner.raw(&doc_id("doc")).unwrap()["ownerId"], json!("A"));
    assert_eq!(selection_of(&surface), Some(Selection::caret(0)));
    owner.close();
}

#[test]
fn custom_viewer_marker_is_honored() {
    let config = SyncConfig {
        viewer_param: "mode=readonly".to_string(),
        ..SyncConfig::default()
    };
    let h = Harness::with_config(config);
    let (owner, _owner_surface) = h.open("doc", "A");

    assert!(matches!(
        h.try_open("doc?access=viewer", "B"),
        Err(SyncError::AccessDenied(_))
    ));
    let (viewer, _viewer_surface) = h.open("doc?mode=readonly", "B");
    assert_eq!(viewer.tier(), AccessTier::Viewer);

    viewer.close();
    owner.close();
}

#[test]
fn invalid_target_is_rejected_before_store_access() {
    let h = Harness::new();
    assert!(matches!(
        h.try_open("no spaces allowed", "A"),
        Err(SyncError::InvalidTarget(_))
    ));
    assert!(h.store.inner.is_empty());
}

#[test]
fn remote_snapshot_never_replaces_unsaved_local_content() {
    let h = Harness::new();
    let (owner, surface) = h.open("doc", "A");
    h.store.fail_sets(FOREVER, false);
    type_and_report(&owner, &surface, "important");
    h.event_loop.run_all();
    settle(&surface);
    assert!(owner.has_unsaved_changes());
    assert!(matches!(
        owner.drain_notices().as_slice(),
        [SyncNotice::SaveFailed { .. }]
    ));

    h.store
        .inner
        .set(
            &doc_id("doc"),
            DocumentPatch::content(Delta::text("other tab")),
            WriteMode::Merge,
        )
        .unwrap();
    h.pump(&[&surface]);

    assert_eq!(surface.borrow().plain_text(), "important");
    assert_eq!(owner.unsaved_content(), Some(Delta::text("important")));
    assert_eq!(owner.last_known_remote(), Delta::text("other tab"));
    assert!(matches!(
        owner.drain_notices().as_slice(),
        [SyncNotice::RemoteConflict { .. }]
    ));

    h.store.fail_sets(0, true);
    owner.save_now().unwrap();
    h.pump(&[&surface]);
    assert_eq!(h.stored_text("doc"), "important");
    assert_eq!(surface.borrow().plain_text(), "important");
    assert!(!owner.has_unsaved_changes());
    assert!(owner.unsaved_content().is_none());
    owner.close();
}

#[test]
fn failed_subscribe_leaves_surface_untouched() {
    let h = Harness::new();
    let (owner, owner_surface) = h.open("doc", "A");
    type_and_report(&owner, &owner_surface, "hello");
    h.pump(&[&owner_surface]);

    h.store.failing_subscribes.set(true);
    let surface = HeadlessSurface::shared();
    let target = h.engine.parse_target("doc?access=viewer").unwrap();
    let result = h.engine.open(&target, &user("B"), surface.clone());

    assert!(matches!(result, Err(SyncError::NotFound { .. })));
    assert!(surface.borrow().contents().is_empty());
    assert!(!surface.borrow().is_read_only());
    assert_eq!(surface.borrow().silent_applies(), 0);
    assert_eq!(surface.borrow().pending_render_hooks(), 0);
    owner.close();
}

#[test]
fn differently_split_remote_content_counts_as_echo() {
    let h = Harness::new();
    let (owner, surface) = h.open("doc", "A");
    type_and_report(&owner, &surface, "ab");
    h.pump(&[&surface]);
    let writes = h.writes();
    let applies = surface.borrow().silent_applies();
    surface.borrow_mut().set_cursor(Selection::caret(1));

    owner.on_remote_change(Snapshot::Present(Document {
        content: Delta::from_ops(vec![Op::text("a"), Op::text("b")]),
        ..h.store.inner.get(&doc_id("doc")).unwrap().unwrap()
    }));
    settle(&surface);

    assert_eq!(surface.borrow().silent_applies(), applies);
    assert_eq!(selection_of(&surface), Some(Selection::caret(1)));
    owner.on_local_change();
    h.pump(&[&surface]);
    assert_eq!(h.writes(), writes);
    owner.close();
}

#[test]
fn invalid_config_is_rejected_by_engine() {
    let event_loop = EventLoop::new();
    let store = Rc::new(FlakyStore::new(event_loop.clone()));
    for config in [
        SyncConfig {
            viewer_param: "viewer".to_string(),
            ..SyncConfig::default()
        },
        SyncConfig {
            outbound_history: 0,
            ..SyncConfig::default()
        },
    ] {
        assert!(matches!(
            SyncEngine::new(store.clone(), event_loop.clone(), config),
            Err(ConfigError::Invalid(_))
        ));
    }
}

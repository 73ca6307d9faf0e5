use docsync_core::surface::settle;
use docsync_core::{
    Delta, DocumentId, DocumentPatch, DocumentStore, EventLoop, HeadlessSurface, OpenTarget,
    SqliteDocumentStore, StoreError, SyncConfig, SyncEngine, UserId, WriteMode,
};
use std::rc::Rc;

#[test]
fn documents_persist_across_store_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("docs.db");
    let id = DocumentId::parse("persisted").unwrap();

    {
        let store = SqliteDocumentStore::open(&path, EventLoop::new()).unwrap();
        let mut patch = DocumentPatch::content(Delta::text("kept"));
        patch.owner_id = Some(UserId::parse("A").unwrap());
        patch.title = Some("Notes".to_string());
        store.set(&id, patch, WriteMode::Replace).unwrap();
    }

    let reopened = SqliteDocumentStore::open(&path, EventLoop::new()).unwrap();
    let document = reopened.get(&id).unwrap().unwrap();
    assert_eq!(document.title, "Notes");
    assert_eq!(document.content, Delta::text("kept"));
    assert_eq!(document.owner_id.as_str(), "A");
}

#[test]
fn owner_change_is_rejected_before_reaching_sql() {
    let store = SqliteDocumentStore::open_in_memory(EventLoop::new()).unwrap();
    let id = DocumentId::parse("d1").unwrap();
    let mut create = DocumentPatch::default();
    create.owner_id = Some(UserId::parse("A").unwrap());
    store.set(&id, create, WriteMode::Merge).unwrap();

    let mut takeover = DocumentPatch::content(Delta::text("mine now"));
    takeover.owner_id = Some(UserId::parse("B").unwrap());
    assert!(store.set(&id, takeover, WriteMode::Merge).is_err());

    let document = store.get(&id).unwrap().unwrap();
    assert_eq!(document.owner_id.as_str(), "A");
    assert!(document.content.is_empty());
}

#[test]
fn create_write_leaves_existing_row_untouched() {
    let store = SqliteDocumentStore::open_in_memory(EventLoop::new()).unwrap();
    let id = DocumentId::parse("d1").unwrap();
    let owner = UserId::parse("A").unwrap();
    let mut first = DocumentPatch::content(Delta::text("original"));
    first.owner_id = Some(owner.clone());
    store.set(&id, first, WriteMode::Create).unwrap();

    let mut second = DocumentPatch::content(Delta::new());
    second.owner_id = Some(owner);
    second.title = Some("Untitled Document".to_string());
    assert!(matches!(
        store.set(&id, second, WriteMode::Create),
        Err(StoreError::AlreadyExists { .. })
    ));
    assert_eq!(
        store.get(&id).unwrap().unwrap().content,
        Delta::text("original")
    );
}

#[test]
fn sync_session_writes_through_to_sqlite() {
    let event_loop = EventLoop::new();
    let store = Rc::new(SqliteDocumentStore::open_in_memory(event_loop.clone()).unwrap());
    let engine =
        SyncEngine::new(store.clone(), event_loop.clone(), SyncConfig::default()).unwrap();
    let owner = UserId::parse("A").unwrap();

    let surface = HeadlessSurface::shared();
    let session = engine
        .open(
            &OpenTarget::parse("sqlite-doc").unwrap(),
            &owner,
            surface.clone(),
        )
        .unwrap();
    settle(&surface);
    surface.borrow_mut().type_text("durable");
    session.on_local_change();
    event_loop.run_until_idle();
    settle(&surface);

    let id = DocumentId::parse("sqlite-doc").unwrap();
    assert_eq!(
        store.get(&id).unwrap().unwrap().content,
        Delta::text("durable")
    );
    assert_eq!(store.subscriber_count(&id), 1);
    session.close();
    assert_eq!(store.subscriber_count(&id), 0);
}

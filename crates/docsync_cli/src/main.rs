//! CLI smoke entry point.
//!
//! # Responsibility
//! - Replay the owner/viewer sync scenario against a SQLite store.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `docsync_cli [db_path]`. Without a path an in-memory database is
//! used. Set `DOCSYNC_LOG_DIR` (absolute) to enable file logging.

use docsync_core::{
    core_version, default_log_level, init_logging, surface, DocumentStore, EventLoop,
    HeadlessSurface, OpenTarget, SqliteDocumentStore, SyncConfig, SyncEngine, SyncError, UserId,
};
use log::info;
use std::error::Error;
use std::process::ExitCode;
use std::rc::Rc;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("docsync error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    if let Ok(log_dir) = std::env::var("DOCSYNC_LOG_DIR") {
        init_logging(default_log_level(), &log_dir)?;
    }
    println!("docsync_core version={}", core_version());

    let event_loop = EventLoop::new();
    let store = match std::env::args().nth(1) {
        Some(path) => SqliteDocumentStore::open(path, event_loop.clone())?,
        None => SqliteDocumentStore::open_in_memory(event_loop.clone())?,
    };
    let engine = SyncEngine::new(Rc::new(store), event_loop.clone(), SyncConfig::default())?;

    let owner = UserId::parse("A")?;
    let viewer = UserId::parse("B")?;

    let owner_surface = HeadlessSurface::shared();
    let owner_session = engine.open(&engine.parse_target("d1")?, &owner, owner_surface.clone())?;
    surface::settle(&owner_surface);
    owner_surface.borrow_mut().type_text("hi");
    owner_session.on_local_change();
    event_loop.run_until_idle();
    surface::settle(&owner_surface);

    let stored = engine
        .store()
        .get(&owner_session.document_id())?
        .map(|document| document.content.plain_text())
        .unwrap_or_default();
    println!("owner wrote content={stored:?}");

    let denied = engine.open(
        &OpenTarget::parse("d1")?,
        &viewer,
        HeadlessSurface::shared(),
    );
    match denied {
        Err(SyncError::AccessDenied(id)) => println!("viewer without marker denied doc={id}"),
        Err(err) => return Err(err.into()),
        Ok(session) => {
            session.close();
            return Err("non-owner open without viewer marker was not denied".into());
        }
    }

    let viewer_surface = HeadlessSurface::shared();
    let viewer_session = engine.open(
        &engine.parse_target("d1?access=viewer")?,
        &viewer,
        viewer_surface.clone(),
    )?;
    surface::settle(&viewer_surface);
    let typed = viewer_surface.borrow_mut().type_text("!");
    viewer_session.on_local_change();
    event_loop.run_until_idle();
    println!(
        "viewer sees content={:?} tier={} typing_accepted={typed}",
        viewer_surface.borrow().plain_text(),
        viewer_session.tier().as_str()
    );

    let second_tab = HeadlessSurface::shared();
    let second_session = engine.open(&engine.parse_target("d1")?, &owner, second_tab.clone())?;
    owner_session.save_now()?;
    event_loop.run_until_idle();
    surface::settle(&second_tab);
    println!(
        "second tab content={:?} pending_writes={}",
        second_tab.borrow().plain_text(),
        second_session.has_pending_writes()
    );

    second_session.close();
    viewer_session.close();
    owner_session.close();
    event_loop.run_all();
    info!("event=cli_scenario module=cli status=ok");
    Ok(())
}

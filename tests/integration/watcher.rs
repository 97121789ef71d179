//! Filesystem watcher feeding the reconciler, end to end.
//!
//! Event delivery latency varies by platform backend, so these tests
//! drain the channel with generous timeouts and assert only on the
//! events they caused.

use std::fs;
use std::path::Path;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crate::helpers::{init_space, store_for, write_doc};
use gtdspace::reconcile::{reconcile, FileEvent, FileEventKind, ReconcileOutcome};
use gtdspace::watch;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Wait for an event of the given kind for `path`, discarding others.
fn wait_for(rx: &Receiver<FileEvent>, path: &Path, kind: FileEventKind) -> FileEvent {
    let deadline = std::time::Instant::now() + EVENT_TIMEOUT;
    loop {
        let remaining = deadline
            .checked_duration_since(std::time::Instant::now())
            .expect("timed out waiting for watch event");
        let event = rx.recv_timeout(remaining).expect("watch channel closed");
        if event.path == path && event.kind == kind {
            return event;
        }
    }
}

#[test]
fn test_watcher_reports_markdown_changes() {
    let space = init_space();
    // The project directory must exist before the watcher starts:
    // recursive watches register new subdirectories asynchronously, so
    // a file created in a brand-new directory can race the
    // registration and drop its event.
    fs::create_dir_all(space.path().join("Projects/A")).unwrap();
    let (_watcher, rx) = watch::watch(space.path()).unwrap();

    let path = write_doc(space.path(), "Projects/A/A.md", "v1");
    wait_for(&rx, &path, FileEventKind::Created);

    fs::write(&path, "v2").unwrap();
    wait_for(&rx, &path, FileEventKind::Modified);

    fs::remove_file(&path).unwrap();
    wait_for(&rx, &path, FileEventKind::Deleted);
}

#[test]
fn test_watched_deletion_closes_open_tab() {
    let space = init_space();
    let path = write_doc(space.path(), "Projects/A/A.md", "v1");

    let mut store = store_for(space.path());
    let id = store.open(&path).unwrap();
    store.edit(id, "unsaved").unwrap();

    let (_watcher, rx) = watch::watch(space.path()).unwrap();
    fs::remove_file(&path).unwrap();
    let event = wait_for(&rx, &path, FileEventKind::Deleted);

    let outcome = reconcile(&mut store, &event);
    assert_eq!(
        outcome,
        ReconcileOutcome::TabClosed {
            tab_id: id,
            path: path.clone()
        }
    );
    assert!(store.is_empty());
}

//! External-change reconciliation and conflict resolution flows.

use std::fs;

use chrono::{Duration, Utc};

use crate::helpers::{init_space, store_for, write_doc};
use gtdspace::conflict::{self, Resolution};
use gtdspace::reconcile::{reconcile, FileEvent, FileEventKind, ReconcileOutcome};
use gtdspace::tabs::TabError;

fn external_modify(path: &std::path::Path) -> FileEvent {
    let mut event = FileEvent::new(path, FileEventKind::Modified);
    // Clearly past any mtime the tab captured at open.
    event.timestamp = Utc::now() + Duration::seconds(10);
    event
}

#[test]
fn test_clean_tab_auto_reloads_on_external_change() {
    let space = init_space();
    let path = write_doc(space.path(), "Projects/A/A.md", "v1");
    let mut store = store_for(space.path());
    let id = store.open(&path).unwrap();

    fs::write(&path, "external v2").unwrap();
    let outcome = reconcile(&mut store, &external_modify(&path));
    assert_eq!(outcome, ReconcileOutcome::Reloaded { tab_id: id });
    assert_eq!(store.get(id).unwrap().buffer(), "external v2");
}

#[test]
fn test_dirty_tab_conflict_blocks_saves_until_resolved() {
    let space = init_space();
    let path = write_doc(space.path(), "Projects/A/A.md", "v1");
    let mut store = store_for(space.path());
    let id = store.open(&path).unwrap();
    store.edit(id, "local edits").unwrap();

    fs::write(&path, "external v2").unwrap();
    let outcome = reconcile(&mut store, &external_modify(&path));
    assert_eq!(
        outcome,
        ReconcileOutcome::ConflictRaised {
            tab_id: id,
            path: path.clone()
        }
    );

    // No silent overwrite in either direction.
    assert_eq!(store.get(id).unwrap().buffer(), "local edits");
    assert_eq!(fs::read_to_string(&path).unwrap(), "external v2");
    assert!(matches!(
        store.begin_save(id),
        Err(TabError::ConflictPending { .. })
    ));

    conflict::resolve(&mut store, id, Resolution::ManualMerge("merged text".to_string()))
        .unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "merged text");
    assert_eq!(store.get(id).unwrap().buffer(), "merged text");

    store.edit(id, "post-merge edit").unwrap();
    store.save(id).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "post-merge edit");
}

#[test]
fn test_keep_local_overwrites_external_change() {
    let space = init_space();
    let path = write_doc(space.path(), "Projects/A/A.md", "v1");
    let mut store = store_for(space.path());
    let id = store.open(&path).unwrap();
    store.edit(id, "local edits").unwrap();
    fs::write(&path, "external v2").unwrap();
    reconcile(&mut store, &external_modify(&path));

    conflict::resolve(&mut store, id, Resolution::KeepLocal).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "local edits");
    assert!(!store.get(id).unwrap().has_unsaved_changes());
}

#[test]
fn test_deletion_closes_the_tab_and_discards_edits() {
    let space = init_space();
    let path = write_doc(space.path(), "Projects/A/A.md", "v1");
    let mut store = store_for(space.path());
    let id = store.open(&path).unwrap();
    store.edit(id, "never saved").unwrap();

    fs::remove_file(&path).unwrap();
    let outcome = reconcile(&mut store, &FileEvent::new(&path, FileEventKind::Deleted));
    assert_eq!(
        outcome,
        ReconcileOutcome::TabClosed {
            tab_id: id,
            path: path.clone()
        }
    );
    assert!(store.is_empty());
    assert!(!path.exists());
}

#[test]
fn test_own_save_does_not_raise_a_conflict() {
    let space = init_space();
    let path = write_doc(space.path(), "Projects/A/A.md", "v1");
    let mut store = store_for(space.path());
    let id = store.open(&path).unwrap();

    store.edit(id, "v2").unwrap();
    store.save(id).unwrap();
    store.edit(id, "v3, still unsaved").unwrap();

    // The watcher reports our own write back with a timestamp right
    // around the save; it must not be treated as external.
    let echo = FileEvent::new(&path, FileEventKind::Modified);
    assert_eq!(reconcile(&mut store, &echo), ReconcileOutcome::Ignored);
    assert!(!store.get(id).unwrap().conflict_pending());
    assert_eq!(store.get(id).unwrap().buffer(), "v3, still unsaved");
}

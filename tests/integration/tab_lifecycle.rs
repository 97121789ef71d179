//! Open/edit/save/close flows, including load-time migration.

use std::fs;

use crate::helpers::{init_space, store_for, write_doc};
use gtdspace::tabs::TabError;
use gtdspace::tokens::{self, FieldValue};

#[test]
fn test_open_edit_save_round_trip() {
    let space = init_space();
    let path = write_doc(
        space.path(),
        "Projects/Alpha/Alpha.md",
        "# Alpha\n\n## Status\n\n[!singleselect:project-status:in-progress]\n",
    );

    let mut store = store_for(space.path());
    let id = store.open(&path).unwrap();

    // Flip the status through the codec and save.
    let updated = tokens::upsert(
        store.get(id).unwrap().buffer(),
        "project-status",
        &FieldValue::SingleSelect("completed".to_string()),
    );
    store.edit(id, updated).unwrap();
    assert!(store.get(id).unwrap().has_unsaved_changes());

    store.save(id).unwrap();
    assert!(!store.get(id).unwrap().has_unsaved_changes());

    let on_disk = fs::read_to_string(&path).unwrap();
    assert!(on_disk.contains("[!singleselect:project-status:completed]"));
}

#[test]
fn test_legacy_document_is_migrated_on_open_and_canonical_after_save() {
    let space = init_space();
    let path = write_doc(
        space.path(),
        "Projects/Legacy/Legacy.md",
        "# Legacy\n\n## Created Date\n\n[!datetime:created_date:2023-01-01]\n\n\
         ## Status\n\n[!multiselect:status:waiting-for,cancelled]\n",
    );

    let mut store = store_for(space.path());
    let id = store.open(&path).unwrap();

    let tab = store.get(id).unwrap();
    assert!(tab.buffer().contains("[!datetime:created_date_time:2023-01-01]"));
    assert!(tab.buffer().contains("[!singleselect:status:waiting]"));
    assert!(!gtdspace::migrate::needs_migration(tab.buffer()));
    // The migration lives in the buffer until the first save.
    assert!(fs::read_to_string(&path).unwrap().contains("created_date:"));

    let edited = format!("{}\nmore notes\n", store.get(id).unwrap().buffer());
    store.edit(id, edited).unwrap();
    store.save(id).unwrap();
    let on_disk = fs::read_to_string(&path).unwrap();
    assert!(!gtdspace::migrate::needs_migration(&on_disk));
}

#[test]
fn test_reopening_a_path_activates_the_existing_tab() {
    let space = init_space();
    let path = write_doc(space.path(), "Projects/A/A.md", "# A\n");
    let other = write_doc(space.path(), "Projects/B/B.md", "# B\n");

    let mut store = store_for(space.path());
    let first = store.open(&path).unwrap();
    store.open(&other).unwrap();
    assert_eq!(store.context().last_active_path(), Some(other));

    let again = store.open(&path).unwrap();
    assert_eq!(first, again);
    assert_eq!(store.len(), 2);
    assert_eq!(store.context().last_active_path(), Some(path));
}

#[test]
fn test_failed_save_surfaces_error_and_keeps_buffer() {
    let space = init_space();
    let path = write_doc(space.path(), "Projects/A/A.md", "v1");

    let mut store = store_for(space.path());
    let id = store.open(&path).unwrap();
    store.edit(id, "v2").unwrap();

    let op = store.begin_save(id).unwrap();
    let err = store
        .complete_save(&op, Err(anyhow::anyhow!("simulated I/O failure")))
        .unwrap_err();
    assert!(matches!(err, TabError::SaveFailed { .. }));

    let tab = store.get(id).unwrap();
    assert!(tab.has_unsaved_changes());
    assert_eq!(tab.buffer(), "v2");
    // Retry succeeds.
    store.save(id).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "v2");
}

#[test]
fn test_close_during_save_still_writes_through() {
    let space = init_space();
    let path = write_doc(space.path(), "Projects/A/A.md", "v1");

    let mut store = store_for(space.path());
    let id = store.open(&path).unwrap();
    store.edit(id, "v2").unwrap();

    let op = store.begin_save(id).unwrap();
    store.close(id);
    let result = gtdspace::fsio::write_document(&op.path, &op.content);
    store.complete_save(&op, result).unwrap();

    assert!(store.is_empty());
    assert_eq!(fs::read_to_string(&path).unwrap(), "v2");
}

//! Filesystem watcher feeding the reconciler.
//!
//! Thin adapter from `notify` events to [`FileEvent`]s on an mpsc
//! channel. Only markdown files are reported; everything else in the
//! space (assets, dotfiles, editor droppings) is noise as far as the
//! document model is concerned.

use std::path::Path;
use std::sync::mpsc::{channel, Receiver};

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::reconcile::{FileEvent, FileEventKind};

/// Watches a space root recursively. Dropping the watcher stops the
/// event stream.
pub struct SpaceWatcher {
    _watcher: RecommendedWatcher,
}

/// Start watching `root`, returning the watcher handle and the event
/// receiver. Events carry the delivery timestamp, which the reconciler
/// compares against each tab's own last-write time.
pub fn watch(root: &Path) -> Result<(SpaceWatcher, Receiver<FileEvent>)> {
    let (tx, rx) = channel();

    let mut watcher =
        notify::recommended_watcher(move |result: std::result::Result<Event, notify::Error>| {
            let event = match result {
                Ok(event) => event,
                Err(_) => return,
            };
            let Some(kind) = map_kind(&event.kind) else {
                return;
            };
            for path in event.paths {
                if !is_markdown(&path) {
                    continue;
                }
                // Receiver gone means shutdown; nothing to do.
                let _ = tx.send(FileEvent::new(path, kind));
            }
        })
        .context("Failed to create filesystem watcher")?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch directory: {}", root.display()))?;

    Ok((SpaceWatcher { _watcher: watcher }, rx))
}

fn map_kind(kind: &EventKind) -> Option<FileEventKind> {
    match kind {
        EventKind::Create(_) => Some(FileEventKind::Created),
        EventKind::Modify(_) => Some(FileEventKind::Modified),
        EventKind::Remove(_) => Some(FileEventKind::Deleted),
        _ => None,
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

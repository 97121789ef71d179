//! Reconciliation of filesystem watch events against open tabs.
//!
//! Events arrive asynchronously relative to edits and saves, so every
//! `Modified` event is checked against the owning tab's own last-write
//! timestamp first: one expected self-triggered event per save is
//! swallowed inside a small tolerance window, everything else is
//! genuinely external.
//!
//! External changes resolve as follows:
//! - clean tab → automatic buffer reload
//! - dirty tab → pending conflict, surfaced for a decision (silently
//!   overwriting unsaved edits is forbidden)
//! - deleted file → the tab closes, local edits and all; deletion is
//!   authoritative

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::conflict;
use crate::tabs::{TabId, TabStore};

/// How far an event timestamp may drift from our own write timestamp
/// and still count as self-triggered.
pub const SELF_EVENT_TOLERANCE_SECS: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Created,
    Modified,
    Deleted,
}

/// A change reported by the filesystem watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub path: PathBuf,
    pub kind: FileEventKind,
    pub timestamp: DateTime<Utc>,
}

impl FileEvent {
    pub fn new(path: impl Into<PathBuf>, kind: FileEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
            timestamp: Utc::now(),
        }
    }
}

/// What the reconciler did with an event; the UI layer reacts to this.
#[derive(Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing to do (no tab, stale event, or our own write echoing
    /// back).
    Ignored,
    /// A file appeared or disappeared outside any tab; the directory
    /// listing should refresh.
    RefreshListing,
    /// The file behind this tab was deleted; the tab is gone and the
    /// directory listing should refresh.
    TabClosed { tab_id: TabId, path: PathBuf },
    /// A clean tab picked up the external content.
    Reloaded { tab_id: TabId },
    /// A dirty tab diverged from an external change; a resolution is
    /// now required before the tab saves again.
    ConflictRaised { tab_id: TabId, path: PathBuf },
}

/// Apply one watch event to the store.
pub fn reconcile(store: &mut TabStore, event: &FileEvent) -> ReconcileOutcome {
    match event.kind {
        FileEventKind::Created => ReconcileOutcome::RefreshListing,
        FileEventKind::Deleted => {
            let Some(id) = store.id_for_path(&event.path) else {
                return ReconcileOutcome::RefreshListing;
            };
            // Local edits go with the tab; the deletion is authoritative.
            store.close(id);
            debug!(path = %event.path.display(), "closed tab for deleted file");
            ReconcileOutcome::TabClosed {
                tab_id: id,
                path: event.path.clone(),
            }
        }
        FileEventKind::Modified => {
            let Some(id) = store.id_for_path(&event.path) else {
                return ReconcileOutcome::Ignored;
            };
            if store.take_self_event(id, event.timestamp, Duration::seconds(SELF_EVENT_TOLERANCE_SECS))
            {
                return ReconcileOutcome::Ignored;
            }

            let Some(tab) = store.get(id) else {
                return ReconcileOutcome::Ignored;
            };
            if !tab.diverged() {
                return match store.reload_from_disk(id) {
                    Ok(()) => ReconcileOutcome::Reloaded { tab_id: id },
                    Err(err) => {
                        // Likely a modify/delete race; the delete event
                        // will follow and close the tab.
                        warn!(path = %event.path.display(), error = %err, "reload after external change failed");
                        ReconcileOutcome::Ignored
                    }
                };
            }
            let raise = store
                .get(id)
                .is_some_and(|tab| conflict::detect(tab, event.timestamp));
            if raise {
                store.mark_conflict(id);
                ReconcileOutcome::ConflictRaised {
                    tab_id: id,
                    path: event.path.clone(),
                }
            } else {
                ReconcileOutcome::Ignored
            }
        }
    }
}

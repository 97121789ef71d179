//! Open-document (tab) store.
//!
//! A tab is an open, editable instance of a document: its own buffer,
//! dirty flag and lifecycle state. A path maps to at most one tab.
//!
//! Lifecycle per tab:
//! - `Open` (clean) → `Open` (dirty) on edit
//! - `Open` → `Saving` → `Open` (clean) on successful save
//! - `Saving` → `Open` (dirty retained) on failed save
//! - any state → closed via [`TabStore::close`]
//!
//! Saves are two-phase ([`TabStore::begin_save`] /
//! [`TabStore::complete_save`]) so the embedding event loop can perform
//! the disk write asynchronously. A tab closed while its save is in
//! flight still gets its content written (write-through), but the
//! completion does not touch the now-absent tab.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::context::SpaceContext;
use crate::fsio;
use crate::migrate;
use crate::tokens::{self, FieldValue};

/// Opaque tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(Uuid);

impl TabId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabState {
    Open,
    Saving,
}

/// Errors surfaced to the UI layer. A failed save keeps the buffer and
/// the dirty flag intact; retry or discard is the caller's decision.
#[derive(Debug, Error)]
pub enum TabError {
    #[error("no tab with id {0}")]
    UnknownTab(TabId),

    #[error("a save is already in flight for {}", path.display())]
    SaveInFlight { path: PathBuf },

    #[error("unresolved external conflict on {}; resolve it before saving", path.display())]
    ConflictPending { path: PathBuf },

    #[error("failed to open {}", path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to save {}", path.display())]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to reload {}", path.display())]
    ReloadFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// An open document.
#[derive(Debug)]
pub struct Tab {
    id: TabId,
    path: PathBuf,
    buffer: String,
    /// Content as last loaded from (or saved to) disk; the baseline for
    /// conflict detection.
    snapshot: String,
    dirty: bool,
    state: TabState,
    last_known_mtime: Option<DateTime<Utc>>,
    last_write: Option<DateTime<Utc>>,
    /// One save produces one watcher event for our own write; this flag
    /// arms the reconciler to swallow exactly that event.
    expect_self_event: bool,
    conflict_pending: bool,
}

impl Tab {
    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn snapshot(&self) -> &str {
        &self.snapshot
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    pub fn state(&self) -> TabState {
        self.state
    }

    pub fn last_known_mtime(&self) -> Option<DateTime<Utc>> {
        self.last_known_mtime
    }

    pub fn conflict_pending(&self) -> bool {
        self.conflict_pending
    }

    /// Decoded metadata of the current buffer.
    pub fn fields(&self) -> BTreeMap<String, FieldValue> {
        tokens::decode(&self.buffer)
    }

    /// True when the buffer has diverged from the last-loaded snapshot.
    /// This, not the dirty flag, is what conflict detection compares:
    /// an edit that restores the snapshot byte-for-byte is not a local
    /// divergence.
    pub fn diverged(&self) -> bool {
        self.buffer != self.snapshot
    }
}

/// A save handed to the caller by [`TabStore::begin_save`]: the path
/// and the exact content to write. The content is captured at begin
/// time so edits made while the write is in flight stay dirty.
#[derive(Debug)]
pub struct SaveOp {
    pub tab_id: TabId,
    pub path: PathBuf,
    pub content: String,
}

/// Store of all open tabs, keyed by id with a path index.
pub struct TabStore {
    ctx: SpaceContext,
    tabs: HashMap<TabId, Tab>,
    by_path: HashMap<PathBuf, TabId>,
}

impl TabStore {
    pub fn new(ctx: SpaceContext) -> Self {
        Self {
            ctx,
            tabs: HashMap::new(),
            by_path: HashMap::new(),
        }
    }

    pub fn context(&self) -> &SpaceContext {
        &self.ctx
    }

    /// Open the document at `path`. If a tab for it already exists it
    /// is activated, never duplicated. A fresh open reads the file,
    /// runs the legacy-token migration on the buffer (the file itself
    /// is untouched until the next save), and starts clean.
    pub fn open(&mut self, path: &Path) -> Result<TabId, TabError> {
        if let Some(&id) = self.by_path.get(path) {
            self.ctx.set_last_active_path(path);
            return Ok(id);
        }

        let raw = fsio::read_document(path).map_err(|source| TabError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let content = if migrate::needs_migration(&raw) {
            debug!(path = %path.display(), "migrating legacy metadata on load");
            migrate::migrate(&raw)
        } else {
            raw
        };

        let id = TabId::new();
        let tab = Tab {
            id,
            path: path.to_path_buf(),
            buffer: content.clone(),
            snapshot: content,
            dirty: false,
            state: TabState::Open,
            last_known_mtime: fsio::modified_at(path).ok(),
            last_write: None,
            expect_self_event: false,
            conflict_pending: false,
        };
        self.tabs.insert(id, tab);
        self.by_path.insert(path.to_path_buf(), id);
        self.ctx.set_last_active_path(path);
        Ok(id)
    }

    pub fn get(&self, id: TabId) -> Option<&Tab> {
        self.tabs.get(&id)
    }

    pub fn tab_for_path(&self, path: &Path) -> Option<&Tab> {
        self.by_path.get(path).and_then(|id| self.tabs.get(id))
    }

    pub fn id_for_path(&self, path: &Path) -> Option<TabId> {
        self.by_path.get(path).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tab> {
        self.tabs.values()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Replace the buffer. Never touches disk.
    pub fn edit(&mut self, id: TabId, content: impl Into<String>) -> Result<(), TabError> {
        let tab = self.tabs.get_mut(&id).ok_or(TabError::UnknownTab(id))?;
        tab.buffer = content.into();
        tab.dirty = true;
        Ok(())
    }

    /// Start a save. Refused while another save for the same path is in
    /// flight, and refused while an external conflict awaits a
    /// resolution (edits may still accumulate in the meantime).
    pub fn begin_save(&mut self, id: TabId) -> Result<SaveOp, TabError> {
        let tab = self.tabs.get_mut(&id).ok_or(TabError::UnknownTab(id))?;
        if tab.conflict_pending {
            return Err(TabError::ConflictPending {
                path: tab.path.clone(),
            });
        }
        if tab.state == TabState::Saving {
            return Err(TabError::SaveInFlight {
                path: tab.path.clone(),
            });
        }
        tab.state = TabState::Saving;
        Ok(SaveOp {
            tab_id: id,
            path: tab.path.clone(),
            content: tab.buffer.clone(),
        })
    }

    /// Finish a save started with [`begin_save`]. If the tab was closed
    /// while the write was in flight this is a no-op: the write-through
    /// already happened, there is no tab state left to update.
    ///
    /// [`begin_save`]: TabStore::begin_save
    pub fn complete_save(
        &mut self,
        op: &SaveOp,
        write_result: anyhow::Result<()>,
    ) -> Result<(), TabError> {
        let Some(tab) = self.tabs.get_mut(&op.tab_id) else {
            debug!(path = %op.path.display(), "save completed after tab close");
            return write_result.map_err(|source| TabError::SaveFailed {
                path: op.path.clone(),
                source,
            });
        };

        tab.state = TabState::Open;
        match write_result {
            Ok(()) => {
                tab.snapshot = op.content.clone();
                // Edits made while the write was in flight stay dirty.
                tab.dirty = tab.buffer != tab.snapshot;
                tab.last_write = Some(Utc::now());
                tab.expect_self_event = true;
                tab.last_known_mtime = fsio::modified_at(&op.path).ok();
                Ok(())
            }
            Err(source) => Err(TabError::SaveFailed {
                path: op.path.clone(),
                source,
            }),
        }
    }

    /// Synchronous convenience: begin, write, complete.
    pub fn save(&mut self, id: TabId) -> Result<(), TabError> {
        let op = self.begin_save(id)?;
        let result = fsio::write_document(&op.path, &op.content);
        self.complete_save(&op, result)
    }

    /// Remove the tab. An in-flight save for its path is allowed to
    /// finish writing; [`TabStore::complete_save`] tolerates the
    /// missing tab.
    pub fn close(&mut self, id: TabId) -> Option<PathBuf> {
        let tab = self.tabs.remove(&id)?;
        self.by_path.remove(&tab.path);
        Some(tab.path)
    }

    /// Discard the buffer and re-load the document from disk, running
    /// the load-time migration exactly as a fresh open does. Clears
    /// dirty state and any pending conflict.
    pub fn reload_from_disk(&mut self, id: TabId) -> Result<(), TabError> {
        let tab = self.tabs.get_mut(&id).ok_or(TabError::UnknownTab(id))?;
        let raw = fsio::read_document(&tab.path).map_err(|source| TabError::ReloadFailed {
            path: tab.path.clone(),
            source,
        })?;
        let content = if migrate::needs_migration(&raw) {
            migrate::migrate(&raw)
        } else {
            raw
        };
        tab.buffer = content.clone();
        tab.snapshot = content;
        tab.dirty = false;
        tab.conflict_pending = false;
        tab.last_known_mtime = fsio::modified_at(&tab.path).ok();
        Ok(())
    }

    /// Mark the tab as having an unresolved external conflict. Saves
    /// are refused until a resolution clears it.
    pub(crate) fn mark_conflict(&mut self, id: TabId) {
        if let Some(tab) = self.tabs.get_mut(&id) {
            tab.conflict_pending = true;
        }
    }

    pub(crate) fn clear_conflict(&mut self, id: TabId) {
        if let Some(tab) = self.tabs.get_mut(&id) {
            tab.conflict_pending = false;
        }
    }

    /// Commit externally written content (conflict resolutions) as the
    /// new clean state of the tab.
    pub(crate) fn commit_written(&mut self, id: TabId, content: String) {
        if let Some(tab) = self.tabs.get_mut(&id) {
            tab.buffer = content.clone();
            tab.snapshot = content;
            tab.dirty = false;
            tab.conflict_pending = false;
            tab.last_write = Some(Utc::now());
            tab.expect_self_event = true;
            tab.last_known_mtime = fsio::modified_at(&tab.path).ok();
        }
    }

    /// Consume the one expected self-triggered watcher event for this
    /// tab, if the event timestamp falls inside the tolerance window
    /// around our own last write.
    pub(crate) fn take_self_event(
        &mut self,
        id: TabId,
        event_time: DateTime<Utc>,
        tolerance: Duration,
    ) -> bool {
        let Some(tab) = self.tabs.get_mut(&id) else {
            return false;
        };
        if !tab.expect_self_event {
            return false;
        }
        let Some(last_write) = tab.last_write else {
            return false;
        };
        if (event_time - last_write).abs() <= tolerance {
            tab.expect_self_event = false;
            true
        } else {
            false
        }
    }
}

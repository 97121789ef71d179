//! Divergence between a tab's buffer and the file on disk.
//!
//! A conflict exists only when both sides moved: the disk copy is newer
//! than the tab's last-known modification time AND the buffer differs
//! from the last-loaded snapshot. When the buffer still equals the
//! snapshot an automatic reload is safe and the reconciler performs it;
//! this module is never involved.
//!
//! Resolution is always an external decision. No default is safe:
//! keep-local silently drops the external writer's work, use-external
//! drops the user's, so the choice belongs to whoever can see both.

use chrono::{DateTime, Utc};

use crate::fsio;
use crate::tabs::{Tab, TabError, TabId, TabStore};

/// Caller-chosen way out of a conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Write the tab's buffer over the external change.
    KeepLocal,
    /// Discard the buffer and load the disk content.
    UseExternal,
    /// Write caller-supplied merged text.
    ManualMerge(String),
}

/// The conflict predicate: disk moved past what the tab knows, and the
/// buffer holds local edits. A missing last-known mtime counts as
/// "disk is newer"; better a spurious decision prompt than a silent
/// overwrite.
pub fn detect(tab: &Tab, disk_mtime: DateTime<Utc>) -> bool {
    let disk_newer = match tab.last_known_mtime() {
        Some(known) => disk_mtime > known,
        None => true,
    };
    disk_newer && tab.diverged()
}

/// Apply a resolution to the conflicted tab. On success the tab is
/// clean, its snapshot and mtime reflect the resolved content, and
/// saves are accepted again. A failed write leaves the conflict
/// pending and the buffer intact.
pub fn resolve(store: &mut TabStore, id: TabId, resolution: Resolution) -> Result<(), TabError> {
    match resolution {
        Resolution::KeepLocal => {
            let tab = store.get(id).ok_or(TabError::UnknownTab(id))?;
            let path = tab.path().to_path_buf();
            let content = tab.buffer().to_string();
            fsio::write_document(&path, &content)
                .map_err(|source| TabError::SaveFailed { path, source })?;
            store.commit_written(id, content);
            Ok(())
        }
        Resolution::UseExternal => store.reload_from_disk(id),
        Resolution::ManualMerge(merged) => {
            let tab = store.get(id).ok_or(TabError::UnknownTab(id))?;
            let path = tab.path().to_path_buf();
            fsio::write_document(&path, &merged)
                .map_err(|source| TabError::SaveFailed { path, source })?;
            store.commit_written(id, merged);
            Ok(())
        }
    }
}

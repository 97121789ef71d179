//! Shared space context.
//!
//! Several independent surfaces (tab strip, sidebar, calendar) want a
//! "last active document" lookup. That state lives here as an explicit
//! handle passed to the components that need it, never as a process
//! global.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Handle to the open space: its root directory and the most recently
/// activated document path. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct SpaceContext {
    root: PathBuf,
    last_active: Arc<Mutex<Option<PathBuf>>>,
}

impl SpaceContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            last_active: Arc::new(Mutex::new(None)),
        }
    }

    /// Root directory of the document collection.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The most recently activated document, if any.
    pub fn last_active_path(&self) -> Option<PathBuf> {
        self.last_active.lock().expect("context lock poisoned").clone()
    }

    pub fn set_last_active_path(&self, path: impl Into<PathBuf>) {
        *self.last_active.lock().expect("context lock poisoned") = Some(path.into());
    }

    pub fn clear_last_active_path(&self) {
        *self.last_active.lock().expect("context lock poisoned") = None;
    }
}

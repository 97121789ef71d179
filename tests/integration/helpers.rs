//! Shared test helpers: a scaffolded space in a temp directory.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use gtdspace::context::SpaceContext;
use gtdspace::space;
use gtdspace::tabs::TabStore;

/// Create a temp directory initialized as a space.
pub fn init_space() -> TempDir {
    gtdspace::init_tracing();
    let temp = TempDir::new().expect("Failed to create temp directory");
    space::initialize(temp.path()).expect("Failed to initialize space");
    temp
}

/// Write a document at a space-relative path, creating parents.
pub fn write_doc(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("document has a parent"))
        .expect("Failed to create parent directory");
    fs::write(&path, content).expect("Failed to write document");
    path
}

/// A tab store bound to the given space root.
pub fn store_for(root: &Path) -> TabStore {
    TabStore::new(SpaceContext::new(root))
}

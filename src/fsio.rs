//! Locked document I/O.
//!
//! Saves go through `fs2` advisory locks so an external process
//! honoring the same discipline (sync tooling, another instance) cannot
//! observe a half-written document. Locks are cooperative; the watcher
//! still reports the write, which the reconciler recognizes as
//! self-triggered.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;

/// Read a UTF-8 document under a shared lock.
pub fn read_document(path: &Path) -> Result<String> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    file.lock_shared()
        .with_context(|| format!("Failed to acquire shared lock: {}", path.display()))?;
    let mut content = String::new();
    BufReader::new(&file)
        .read_to_string(&mut content)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(content)
}

/// Write a document under an exclusive lock.
///
/// The file is truncated only after the lock is held, so a concurrent
/// locked reader never sees the empty intermediate state.
pub fn write_document(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    #[allow(clippy::suspicious_open_options)]
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .open(path)
        .with_context(|| format!("Failed to open file for writing: {}", path.display()))?;
    file.lock_exclusive()
        .with_context(|| format!("Failed to acquire exclusive lock: {}", path.display()))?;
    file.set_len(0)
        .with_context(|| format!("Failed to truncate file: {}", path.display()))?;
    let mut writer = BufWriter::new(&file);
    writer
        .write_all(content.as_bytes())
        .with_context(|| format!("Failed to write file: {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush file: {}", path.display()))?;
    Ok(())
}

/// Last modification time of `path` as UTC.
pub fn modified_at(path: &Path) -> Result<DateTime<Utc>> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat file: {}", path.display()))?;
    let mtime = meta
        .modified()
        .with_context(|| format!("Failed to read mtime: {}", path.display()))?;
    Ok(DateTime::<Utc>::from(mtime))
}

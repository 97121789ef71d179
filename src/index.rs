//! Lazy backlink index.
//!
//! Answers "which documents reference this one" by scanning every
//! markdown file under the space and decoding its reference-kind
//! fields. Recomputed on demand: at hundreds of documents a rescan is
//! cheaper than keeping an incremental index honest. Callers firing on
//! every keystroke are expected to debounce.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::fsio;
use crate::migrate;
use crate::tokens;

/// Which part of the space a document lives in, inferred from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizonKind {
    Project,
    Area,
    Goal,
    Vision,
    Habit,
    Other,
}

impl HorizonKind {
    /// Classify a space-relative path by its directory.
    pub fn classify(rel_path: &str) -> Self {
        let lower = rel_path.to_ascii_lowercase();
        if lower.starts_with("/projects/") {
            HorizonKind::Project
        } else if lower.starts_with("/habits/") {
            HorizonKind::Habit
        } else if lower.starts_with("/horizons/areas of focus/") {
            HorizonKind::Area
        } else if lower.starts_with("/horizons/goals/") {
            HorizonKind::Goal
        } else if lower.starts_with("/horizons/vision/") {
            HorizonKind::Vision
        } else {
            HorizonKind::Other
        }
    }
}

/// A document that references the query target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backlink {
    pub path: PathBuf,
    pub name: String,
    pub kind: HorizonKind,
}

/// Find every readable document under `space` whose reference fields
/// contain `target`. `filter` narrows the result to one horizon kind.
/// Unreadable or tokenless documents are skipped, never fatal.
pub fn find(space: &Path, target: &Path, filter: Option<HorizonKind>) -> Vec<Backlink> {
    let target_rel = match space_relative(space, target) {
        Some(rel) => rel,
        None => normalize_ref(&target.to_string_lossy()),
    };

    let pattern = format!("{}/**/*.md", space.display());
    let paths = match glob::glob(&pattern) {
        Ok(paths) => paths,
        Err(err) => {
            debug!(error = %err, "invalid scan pattern");
            return Vec::new();
        }
    };

    let mut backlinks = Vec::new();
    for entry in paths.flatten() {
        if entry == target {
            continue;
        }
        let raw = match fsio::read_document(&entry) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(path = %entry.display(), error = %err, "skipping unreadable document");
                continue;
            }
        };
        let text = if migrate::needs_migration(&raw) {
            migrate::migrate(&raw)
        } else {
            raw
        };

        let references_target = tokens::decode(&text).values().any(|value| {
            value
                .reference_paths()
                .is_some_and(|paths| paths.iter().any(|p| normalize_ref(p) == target_rel))
        });
        if !references_target {
            continue;
        }

        let rel = space_relative(space, &entry).unwrap_or_default();
        let kind = HorizonKind::classify(&rel);
        if let Some(wanted) = filter {
            if kind != wanted {
                continue;
            }
        }
        backlinks.push(Backlink {
            name: document_name(&entry),
            path: entry,
            kind,
        });
    }

    backlinks.sort_by(|a, b| a.path.cmp(&b.path));
    backlinks
}

/// Space-relative form with a leading slash, the shape reference
/// payloads use on disk.
fn space_relative(space: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(space).ok()?;
    Some(normalize_ref(&rel.to_string_lossy()))
}

fn normalize_ref(raw: &str) -> String {
    let cleaned = raw.trim().replace('\\', "/");
    if cleaned.starts_with('/') {
        cleaned
    } else {
        format!("/{cleaned}")
    }
}

fn document_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

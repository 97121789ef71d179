//! Space scaffolding and document creation.
//!
//! A space is the root directory holding the whole document
//! collection, organized by GTD horizon: `Projects/` (each project a
//! directory of action files), `Habits/`, and the `Horizons/`
//! altitudes. New documents are written through the token codec so
//! their metadata starts out canonical.

pub mod templates;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Datelike, Utc, Weekday};
use tracing::{debug, warn};

use crate::fsio;
use crate::tokens::{self, FieldValue};

/// Directories every space carries.
pub const SPACE_DIRS: [&str; 6] = [
    "Projects",
    "Habits",
    "Horizons/Areas of Focus",
    "Horizons/Goals",
    "Horizons/Vision",
    "Horizons/Purpose & Principles",
];

/// Horizon starter files written on initialization.
const HORIZON_FILES: [(&str, &str); 4] = [
    (
        "Horizons/Areas of Focus/Areas of Focus.md",
        templates::AREAS_OF_FOCUS,
    ),
    ("Horizons/Goals/Goals.md", templates::GOALS),
    ("Horizons/Vision/Vision.md", templates::VISION),
    (
        "Horizons/Purpose & Principles/Purpose & Principles.md",
        templates::PURPOSE,
    ),
];

/// Does `root` look like an initialized space?
pub fn is_space(root: &Path) -> bool {
    root.join("Projects").is_dir() && root.join("Horizons").is_dir()
}

/// Create the canonical directory scaffold and horizon starter files.
/// Idempotent: existing directories are kept, existing files are never
/// overwritten.
pub fn initialize(root: &Path) -> Result<()> {
    for dir in SPACE_DIRS {
        std::fs::create_dir_all(root.join(dir))
            .with_context(|| format!("Failed to create space directory: {dir}"))?;
    }
    for (rel, content) in HORIZON_FILES {
        let path = root.join(rel);
        if !path.exists() {
            fsio::write_document(&path, content)?;
        }
    }
    Ok(())
}

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    pub name: String,
    pub path: PathBuf,
    pub modified: Option<DateTime<Utc>>,
    pub size: u64,
}

/// List the markdown documents directly inside `dir`, sorted by name.
pub fn list_documents(dir: &Path) -> Result<Vec<DocumentEntry>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list directory: {}", dir.display()))?;

    let mut documents = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        let is_markdown = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("md"));
        if !path.is_file() || !is_markdown {
            continue;
        }
        let meta = entry.metadata().ok();
        documents.push(DocumentEntry {
            name: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            modified: meta
                .as_ref()
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from),
            size: meta.map(|m| m.len()).unwrap_or(0),
            path,
        });
    }
    documents.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(documents)
}

fn stamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Create a project: a directory under `Projects/` with an overview
/// document carrying canonical status/due/created tokens.
pub fn create_project(
    root: &Path,
    name: &str,
    description: &str,
    due_date: Option<&str>,
) -> Result<PathBuf> {
    let dir = root.join("Projects").join(name);
    if dir.exists() {
        bail!("Project already exists: {name}");
    }
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create project directory: {name}"))?;

    let mut text = format!("# {name}\n\n{description}\n");
    text = tokens::upsert(
        &text,
        "project-status",
        &FieldValue::SingleSelect("in-progress".to_string()),
    );
    if let Some(due) = due_date {
        text = tokens::upsert(&text, "due_date", &FieldValue::DateTime(due.to_string()));
    }
    text = tokens::upsert(
        &text,
        "created_date_time",
        &FieldValue::DateTime(stamp(Utc::now())),
    );

    let path = dir.join(format!("{name}.md"));
    fsio::write_document(&path, &text)?;
    Ok(path)
}

/// Create an action file inside an existing project.
pub fn create_action(
    root: &Path,
    project: &str,
    name: &str,
    effort: &str,
    due_date: Option<&str>,
) -> Result<PathBuf> {
    let dir = root.join("Projects").join(project);
    if !dir.is_dir() {
        bail!("No such project: {project}");
    }
    let path = dir.join(format!("{name}.md"));
    if path.exists() {
        bail!("Action already exists: {name}");
    }

    let mut text = format!("# {name}\n");
    text = tokens::upsert(
        &text,
        "status",
        &FieldValue::SingleSelect("in-progress".to_string()),
    );
    text = tokens::upsert(&text, "effort", &FieldValue::SingleSelect(effort.to_string()));
    if let Some(due) = due_date {
        text = tokens::upsert(&text, "due_date", &FieldValue::DateTime(due.to_string()));
    }
    text = tokens::upsert(
        &text,
        "created_date_time",
        &FieldValue::DateTime(stamp(Utc::now())),
    );

    fsio::write_document(&path, &text)?;
    Ok(path)
}

/// Create a habit under `Habits/` with an unchecked status box.
pub fn create_habit(root: &Path, name: &str, frequency: &str) -> Result<PathBuf> {
    let path = root.join("Habits").join(format!("{name}.md"));
    if path.exists() {
        bail!("Habit already exists: {name}");
    }

    let mut text = format!("# {name}\n");
    text = tokens::upsert(&text, "habit-status", &FieldValue::Checkbox(false));
    text = tokens::upsert(
        &text,
        "habit-frequency",
        &FieldValue::SingleSelect(frequency.to_string()),
    );
    text = tokens::upsert(
        &text,
        "created_date_time",
        &FieldValue::DateTime(stamp(Utc::now())),
    );

    fsio::write_document(&path, &text)?;
    Ok(path)
}

/// Mark a habit completed now: check the box and record when, so the
/// periodic reset knows which period the completion belongs to.
pub fn complete_habit(path: &Path, now: DateTime<Utc>) -> Result<()> {
    let text = fsio::read_document(path)?;
    let text = tokens::upsert(&text, "habit-status", &FieldValue::Checkbox(true));
    let text = tokens::upsert(&text, "habit-completed", &FieldValue::DateTime(stamp(now)));
    fsio::write_document(path, &text)
}

/// Reset completed habits whose frequency period has rolled over since
/// their recorded completion. Returns the paths that were reset.
/// Individual unreadable habit files are skipped.
pub fn check_and_reset_habits(root: &Path, now: DateTime<Utc>) -> Result<Vec<PathBuf>> {
    let habits_dir = root.join("Habits");
    if !habits_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut reset = Vec::new();
    for entry in list_documents(&habits_dir)? {
        let text = match fsio::read_document(&entry.path) {
            Ok(text) => text,
            Err(err) => {
                debug!(path = %entry.path.display(), error = %err, "skipping unreadable habit");
                continue;
            }
        };
        let fields = tokens::decode(&text);
        let completed = fields
            .get("habit-status")
            .and_then(FieldValue::as_checkbox)
            .unwrap_or(false);
        if !completed {
            continue;
        }
        let Some((completed_at, _)) = fields
            .get("habit-completed")
            .and_then(FieldValue::as_datetime)
            .and_then(crate::calendar::parse_date)
        else {
            // Checked box without a completion record: leave it alone
            // rather than guessing the period.
            continue;
        };
        let frequency = fields
            .get("habit-frequency")
            .and_then(FieldValue::as_single)
            .unwrap_or("daily");

        if period_elapsed(frequency, completed_at, now) {
            let updated = tokens::upsert(&text, "habit-status", &FieldValue::Checkbox(false));
            let updated = record_history(&updated, &completed_at, frequency);
            fsio::write_document(&entry.path, &updated)?;
            reset.push(entry.path);
        }
    }
    Ok(reset)
}

/// Has the habit's period rolled over between `completed_at` and `now`?
fn period_elapsed(frequency: &str, completed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let completed = completed_at.date_naive();
    let today = now.date_naive();
    match frequency {
        "daily" => completed < today,
        "weekdays" => {
            completed < today
                && !matches!(now.weekday(), Weekday::Sat | Weekday::Sun)
        }
        "weekly" => {
            let a = completed_at.iso_week();
            let b = now.iso_week();
            (a.year(), a.week()) < (b.year(), b.week())
        }
        "monthly" => (completed.year(), completed.month()) < (today.year(), today.month()),
        other => {
            warn!(frequency = other, "unknown habit frequency, treating as daily");
            completed < today
        }
    }
}

/// Append a completion line under the `## History` heading, creating
/// the heading at the end of the document when absent.
fn record_history(text: &str, completed_at: &DateTime<Utc>, frequency: &str) -> String {
    let line = format!("- [x] {} ({frequency})", completed_at.format("%Y-%m-%d"));
    if let Some(insert_at) = tokens::find_heading_end(text, "History") {
        let mut out = String::with_capacity(text.len() + line.len() + 2);
        out.push_str(&text[..insert_at]);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&line);
        out.push('\n');
        out.push_str(&text[insert_at..]);
        out
    } else {
        let mut out = text.to_string();
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&format!("\n## History\n\n{line}\n"));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_initialize_and_is_space() {
        let temp = tempfile::tempdir().unwrap();
        assert!(!is_space(temp.path()));
        initialize(temp.path()).unwrap();
        assert!(is_space(temp.path()));
        assert!(temp.path().join("Horizons/Goals/Goals.md").is_file());
        // Second run keeps existing content.
        std::fs::write(temp.path().join("Horizons/Goals/Goals.md"), "edited").unwrap();
        initialize(temp.path()).unwrap();
        assert_eq!(
            std::fs::read_to_string(temp.path().join("Horizons/Goals/Goals.md")).unwrap(),
            "edited"
        );
    }

    #[test]
    fn test_create_project_writes_canonical_tokens() {
        let temp = tempfile::tempdir().unwrap();
        initialize(temp.path()).unwrap();
        let path =
            create_project(temp.path(), "Alpha", "Ship the thing.", Some("2025-07-01")).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let fields = tokens::decode(&text);
        assert_eq!(
            fields.get("project-status"),
            Some(&FieldValue::SingleSelect("in-progress".to_string()))
        );
        assert_eq!(
            fields.get("due_date"),
            Some(&FieldValue::DateTime("2025-07-01".to_string()))
        );
        assert!(fields.contains_key("created_date_time"));
        assert!(!crate::migrate::needs_migration(&text));

        let err = create_project(temp.path(), "Alpha", "", None).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_create_action_requires_project() {
        let temp = tempfile::tempdir().unwrap();
        initialize(temp.path()).unwrap();
        assert!(create_action(temp.path(), "Missing", "Task", "small", None).is_err());

        create_project(temp.path(), "Alpha", "", None).unwrap();
        let path = create_action(temp.path(), "Alpha", "Task", "small", None).unwrap();
        let fields = tokens::decode(&std::fs::read_to_string(path).unwrap());
        assert_eq!(
            fields.get("effort"),
            Some(&FieldValue::SingleSelect("small".to_string()))
        );
    }

    #[test]
    fn test_list_documents_sorted_markdown_only() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("b.md"), "b").unwrap();
        std::fs::write(temp.path().join("a.md"), "a").unwrap();
        std::fs::write(temp.path().join("NOTES.MD"), "n").unwrap();
        std::fs::write(temp.path().join("image.png"), [0u8; 4]).unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        let docs = list_documents(temp.path()).unwrap();
        let names: Vec<&str> = docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["NOTES", "a", "b"]);
    }

    #[test]
    fn test_period_elapsed() {
        let done = utc(2025, 4, 2, 10); // Wednesday
        assert!(!period_elapsed("daily", done, utc(2025, 4, 2, 23)));
        assert!(period_elapsed("daily", done, utc(2025, 4, 3, 1)));
        assert!(!period_elapsed("weekly", done, utc(2025, 4, 4, 9)));
        assert!(period_elapsed("weekly", done, utc(2025, 4, 7, 9)));
        assert!(!period_elapsed("monthly", done, utc(2025, 4, 28, 9)));
        assert!(period_elapsed("monthly", done, utc(2025, 5, 1, 9)));
        // Weekday habits do not reset on weekends.
        assert!(!period_elapsed("weekdays", done, utc(2025, 4, 5, 9)));
        assert!(period_elapsed("weekdays", done, utc(2025, 4, 7, 9)));
    }

    #[test]
    fn test_habit_reset_cycle() {
        let temp = tempfile::tempdir().unwrap();
        initialize(temp.path()).unwrap();
        let path = create_habit(temp.path(), "Stretch", "daily").unwrap();

        let done_at = utc(2025, 4, 2, 8);
        complete_habit(&path, done_at).unwrap();
        let fields = tokens::decode(&std::fs::read_to_string(&path).unwrap());
        assert_eq!(fields.get("habit-status"), Some(&FieldValue::Checkbox(true)));

        // Same day: nothing resets.
        let reset = check_and_reset_habits(temp.path(), utc(2025, 4, 2, 22)).unwrap();
        assert!(reset.is_empty());

        // Next day: box unchecks, history records the completion.
        let reset = check_and_reset_habits(temp.path(), utc(2025, 4, 3, 6)).unwrap();
        assert_eq!(reset, vec![path.clone()]);
        let text = std::fs::read_to_string(&path).unwrap();
        let fields = tokens::decode(&text);
        assert_eq!(
            fields.get("habit-status"),
            Some(&FieldValue::Checkbox(false))
        );
        assert!(text.contains("## History"));
        assert!(text.contains("- [x] 2025-04-02 (daily)"));
    }
}

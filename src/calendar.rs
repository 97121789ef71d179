//! Calendar aggregation over a document set.
//!
//! Pulls every due-date and focus-date field out of a set of documents
//! and flattens them into a date-sorted item list. A document carrying
//! both fields yields two items. Parsing is permissive: date-only and
//! full timestamps both work, anything unparsable is dropped and the
//! scan moves on.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::debug;

use crate::fsio;
use crate::migrate;
use crate::tokens::{self, FieldValue};

/// Which dated field produced an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Due,
    Focus,
}

/// Where a calendar item came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarSource {
    Document { path: PathBuf, field: DateField },
    /// An event produced by an external calendar sync; only the list is
    /// consumed here, the sync itself lives elsewhere.
    External,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarItem {
    pub name: String,
    pub source: CalendarSource,
    pub date: DateTime<Utc>,
    pub all_day: bool,
}

/// An already-synced event from an external calendar provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalEvent {
    pub title: String,
    pub start: DateTime<Utc>,
    pub all_day: bool,
}

/// Extract dated items from in-memory documents.
pub fn collect<'a>(
    documents: impl IntoIterator<Item = (&'a Path, &'a str)>,
) -> Vec<CalendarItem> {
    let mut items = Vec::new();
    for (path, raw) in documents {
        let text;
        let content = if migrate::needs_migration(raw) {
            text = migrate::migrate(raw);
            &text
        } else {
            raw
        };
        let fields = tokens::decode(content);
        for (field_name, date_field) in [("due_date", DateField::Due), ("focus_date", DateField::Focus)]
        {
            let Some(FieldValue::DateTime(value)) = fields.get(field_name) else {
                continue;
            };
            let Some((date, all_day)) = parse_date(value) else {
                debug!(path = %path.display(), value, "dropping unparsable date");
                continue;
            };
            items.push(CalendarItem {
                name: document_name(path),
                source: CalendarSource::Document {
                    path: path.to_path_buf(),
                    field: date_field,
                },
                date,
                all_day,
            });
        }
    }
    items.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
    items
}

/// Scan every markdown document under `space`. Unreadable files are
/// skipped and the scan continues.
pub fn collect_space(space: &Path) -> Vec<CalendarItem> {
    let pattern = format!("{}/**/*.md", space.display());
    let mut documents = Vec::new();
    if let Ok(paths) = glob::glob(&pattern) {
        for entry in paths.flatten() {
            match fsio::read_document(&entry) {
                Ok(content) => documents.push((entry, content)),
                Err(err) => {
                    debug!(path = %entry.display(), error = %err, "skipping unreadable document")
                }
            }
        }
    }
    collect(
        documents
            .iter()
            .map(|(path, content)| (path.as_path(), content.as_str())),
    )
}

/// Fold externally synced events into a document item list, keeping the
/// combined list date-sorted.
pub fn merge_external(mut items: Vec<CalendarItem>, events: &[ExternalEvent]) -> Vec<CalendarItem> {
    items.extend(events.iter().map(|event| CalendarItem {
        name: event.title.clone(),
        source: CalendarSource::External,
        date: event.start,
        all_day: event.all_day,
    }));
    items.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
    items
}

/// Permissive date parse: RFC 3339, a bare `YYYY-MM-DDTHH:MM:SS`
/// timestamp, or a date-only `YYYY-MM-DD` (reported as all-day).
pub fn parse_date(raw: &str) -> Option<(DateTime<Utc>, bool)> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some((parsed.with_timezone(&Utc), false));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some((Utc.from_utc_datetime(&naive), false));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some((Utc.from_utc_datetime(&midnight), true));
    }
    None
}

fn document_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

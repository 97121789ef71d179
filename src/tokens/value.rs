use std::fmt;

/// Canonical status vocabulary shared by `status` and `project-status` fields.
pub const STATUS_VALUES: [&str; 3] = ["in-progress", "waiting", "completed"];

/// Canonical effort vocabulary.
pub const EFFORT_VALUES: [&str; 4] = ["small", "medium", "large", "extra-large"];

/// Canonical habit frequency vocabulary.
pub const HABIT_FREQUENCY_VALUES: [&str; 4] = ["daily", "weekdays", "weekly", "monthly"];

/// Default status used when a legacy value cannot be mapped.
pub const DEFAULT_STATUS: &str = "in-progress";

/// Default effort used when a legacy multi-value effort token is empty.
pub const DEFAULT_EFFORT: &str = "medium";

/// Map any status string (legacy or canonical) onto the canonical
/// 3-value vocabulary. Total: unknown inputs fall back to
/// [`DEFAULT_STATUS`].
///
/// Legacy table:
/// - `not-started`, `active`, `planning` → `in-progress`
/// - `on-hold`, `waiting-for` → `waiting`
/// - `cancelled`, `canceled`, `done`, `complete` → `completed`
pub fn map_status(raw: &str) -> &'static str {
    lookup_status(raw.trim()).unwrap_or(DEFAULT_STATUS)
}

/// The known status table: canonical values map to themselves, legacy
/// values to their canonical replacement. `None` for anything outside
/// the table (callers decide whether that deserves a log line).
pub fn lookup_status(value: &str) -> Option<&'static str> {
    match value {
        "in-progress" => Some("in-progress"),
        "waiting" => Some("waiting"),
        "completed" => Some("completed"),
        "not-started" | "active" | "planning" => Some("in-progress"),
        "on-hold" | "waiting-for" => Some("waiting"),
        // Both historical spellings; the finished/abandoned distinction is
        // intentionally collapsed until product intent says otherwise.
        "cancelled" | "canceled" | "done" | "complete" => Some("completed"),
        _ => None,
    }
}

/// Returns true if `value` is a member of the canonical status vocabulary.
pub fn is_canonical_status(value: &str) -> bool {
    STATUS_VALUES.contains(&value)
}

/// GTD horizon category encoded in list-token kinds such as
/// `projects-list` or `projects-and-areas-list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Horizon {
    Projects,
    Areas,
    Goals,
    Visions,
}

impl Horizon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Horizon::Projects => "projects",
            Horizon::Areas => "areas",
            Horizon::Goals => "goals",
            Horizon::Visions => "visions",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "projects" => Some(Horizon::Projects),
            "areas" => Some(Horizon::Areas),
            "goals" => Some(Horizon::Goals),
            "visions" => Some(Horizon::Visions),
            _ => None,
        }
    }
}

/// Parse a list-token kind like `projects-list` or
/// `projects-and-areas-list` into its horizon segments.
///
/// Returns `None` for anything that is not a well-formed horizon list
/// kind (unknown segment, missing `-list` suffix).
pub fn parse_horizon_kind(kind: &str) -> Option<Vec<Horizon>> {
    let base = kind.strip_suffix("-list")?;
    let mut horizons = Vec::new();
    for segment in base.split("-and-") {
        horizons.push(Horizon::parse(segment)?);
    }
    if horizons.is_empty() {
        None
    } else {
        Some(horizons)
    }
}

/// Typed value of a metadata field, tagged by token kind.
///
/// Every value observed outside the codec is in canonical form: list
/// values are deduplicated and sorted, singleselect values are members
/// of their field's vocabulary once the migrator has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    SingleSelect(String),
    MultiSelect(Vec<String>),
    References(Vec<String>),
    /// A reference list scoped to one or more horizons, e.g. the
    /// `projects-and-areas-list` token kind.
    HorizonList(Vec<Horizon>, Vec<String>),
    DateTime(String),
    Checkbox(bool),
}

impl FieldValue {
    /// The token kind string this value encodes as.
    pub fn kind_str(&self) -> String {
        match self {
            FieldValue::SingleSelect(_) => "singleselect".to_string(),
            FieldValue::MultiSelect(_) => "multiselect".to_string(),
            FieldValue::References(_) => "references".to_string(),
            FieldValue::HorizonList(horizons, _) => {
                let segments: Vec<&str> = horizons.iter().map(Horizon::as_str).collect();
                format!("{}-list", segments.join("-and-"))
            }
            FieldValue::DateTime(_) => "datetime".to_string(),
            FieldValue::Checkbox(_) => "checkbox".to_string(),
        }
    }

    /// The set of referenced paths, if this value carries one.
    pub fn reference_paths(&self) -> Option<&[String]> {
        match self {
            FieldValue::References(paths) | FieldValue::HorizonList(_, paths) => Some(paths),
            _ => None,
        }
    }

    pub fn as_single(&self) -> Option<&str> {
        match self {
            FieldValue::SingleSelect(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&str> {
        match self {
            FieldValue::DateTime(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_checkbox(&self) -> Option<bool> {
        match self {
            FieldValue::Checkbox(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::SingleSelect(s) | FieldValue::DateTime(s) => write!(f, "{s}"),
            FieldValue::Checkbox(b) => write!(f, "{b}"),
            FieldValue::MultiSelect(items)
            | FieldValue::References(items)
            | FieldValue::HorizonList(_, items) => {
                write!(f, "{}", items.join(", "))
            }
        }
    }
}

/// Normalize a list payload: trim entries, drop empties, deduplicate,
/// sort lexicographically. Applied on every encode so reference sets
/// are stable on disk.
pub fn normalize_list(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = values
        .iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

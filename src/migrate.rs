//! Load-time migration of legacy metadata tokens to canonical form.
//!
//! The transform is a single pass over the document text, applied in a
//! fixed rule order because later rules depend on earlier renames:
//!
//! 1. `created_date` → `created_date_time` (token and heading)
//! 2. `focus_date_time` → `focus_date` (token and heading)
//! 3. multi-value status/project-status/effort tokens collapse to
//!    singleselect, first listed value winning
//! 4. legacy status vocabulary normalizes to
//!    `{in-progress, waiting, completed}`
//!
//! Two hard contracts, enforced by tests: `migrate` is idempotent, and
//! [`needs_migration`] is in lockstep with it:
//! `!needs_migration(x)` implies `migrate(x) == x`. Both sides are
//! built from the same regular expressions so they cannot drift apart.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::tokens;
use crate::tokens::value::{lookup_status, DEFAULT_EFFORT, DEFAULT_STATUS};

/// Token body shape shared with the codec: no brackets, or one level of
/// `[...]` nesting for JSON-array payloads.
const BODY: &str = r"(?:[^\[\]]|\[[^\[\]]*\])*";

fn created_date_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"\[!([a-z][a-z-]*):created_date:({BODY})\]")).unwrap()
    })
}

fn created_date_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^##[ \t]*Created Date[ \t]*$").unwrap())
}

fn focus_date_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"\[!([a-z][a-z-]*):focus_date_time:({BODY})\]")).unwrap()
    })
}

fn focus_date_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^##[ \t]*Focus Date Time[ \t]*$").unwrap())
}

fn multiselect_collapse_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"\[!multiselect:(status|project-status|effort):({BODY})\]"
        ))
        .unwrap()
    })
}

fn status_value_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"\[!singleselect:(status|project-status):({BODY})\]"
        ))
        .unwrap()
    })
}

/// Map a status value onto the canonical vocabulary, logging when the
/// input is outside the known legacy table. Total, never fails.
pub fn map_status(raw: &str) -> &'static str {
    let trimmed = raw.trim();
    match lookup_status(trimmed) {
        Some(mapped) => mapped,
        None => {
            warn!(value = trimmed, fallback = DEFAULT_STATUS, "unknown status value");
            DEFAULT_STATUS
        }
    }
}

/// Cheap membership pre-check over the same patterns [`migrate`]
/// rewrites. `false` guarantees `migrate` would return its input
/// unchanged.
pub fn needs_migration(text: &str) -> bool {
    if created_date_token_re().is_match(text)
        || created_date_heading_re().is_match(text)
        || focus_date_token_re().is_match(text)
        || focus_date_heading_re().is_match(text)
        || multiselect_collapse_re().is_match(text)
    {
        return true;
    }
    // Compare the raw payload, not a trimmed copy: rule 4 rewrites
    // padding away, so a padded canonical value still needs migration.
    status_value_re()
        .captures_iter(text)
        .any(|caps| &caps[2] != map_status(&caps[2]))
}

/// Upgrade legacy token forms to canonical form. Idempotent:
/// `migrate(migrate(x)) == migrate(x)`.
pub fn migrate(text: &str) -> String {
    // Rule 1: created_date → created_date_time.
    let text = created_date_token_re().replace_all(text, "[!$1:created_date_time:$2]");
    let text = created_date_heading_re().replace_all(&text, "## Created Date Time");

    // Rule 2: focus_date_time → focus_date.
    let text = focus_date_token_re().replace_all(&text, "[!$1:focus_date:$2]");
    let text = focus_date_heading_re().replace_all(&text, "## Focus Date");

    // Rule 3: collapse multi-value status/project-status/effort tokens,
    // first listed value winning.
    let text: Cow<'_, str> = multiselect_collapse_re().replace_all(&text, |caps: &regex::Captures| {
        let field = &caps[1];
        let first = tokens::parse_list_raw(&caps[2]).into_iter().next();
        let value = match first {
            Some(v) if !v.is_empty() => v,
            _ => default_for(field).to_string(),
        };
        format!("[!singleselect:{field}:{value}]")
    });

    // Rule 4: normalize the status vocabulary. Runs after rule 3 so
    // values collapsed out of multiselect tokens are normalized too.
    let text = status_value_re().replace_all(&text, |caps: &regex::Captures| {
        format!("[!singleselect:{}:{}]", &caps[1], map_status(&caps[2]))
    });

    text.into_owned()
}

fn default_for(field: &str) -> &'static str {
    if field == "effort" {
        DEFAULT_EFFORT
    } else {
        DEFAULT_STATUS
    }
}

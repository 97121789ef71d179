//! Inline metadata token codec.
//!
//! Documents embed typed metadata as inline tokens of the form
//! `[!kind:field:payload]`: a single bracket pair with no `]` inside.
//! Recognized kinds are `singleselect`, `multiselect`, `datetime`,
//! `checkbox`, `references` and the horizon list kinds
//! (`projects-list`, `projects-and-areas-list`, ...).
//!
//! Decoding never fails: anything that does not match the grammar is
//! plain prose and is left alone. Encoding always emits the canonical
//! form (list payloads as deduplicated, sorted JSON arrays), so a
//! decode/encode cycle over canonical text is byte-identical.

pub mod value;

use std::collections::BTreeMap;
use std::sync::OnceLock;

use percent_encoding::percent_decode_str;
use regex::Regex;

pub use value::{FieldValue, Horizon};

/// Token body characters: anything except brackets, plus one level of
/// `[...]` nesting so JSON-array payloads close correctly.
const BODY: &str = r"(?:[^\[\]]|\[[^\[\]]*\])*";

/// Outer token shape: kind, then the body up to the closing bracket.
/// The field/payload split happens after kind classification because
/// legacy reference tokens omit the field name.
fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"\[!([a-z][a-z-]*):({BODY})\]")).unwrap())
}

/// `field:payload` split for the token body.
fn body_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([a-z][a-z0-9_-]*):(.*)$").unwrap())
}

/// A decoded token occurrence inside a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub field: String,
    pub value: FieldValue,
    /// Byte range of the token text within the source document.
    pub span: (usize, usize),
}

/// Extract every recognized token from `text`.
///
/// Malformed or unrecognized tokens are skipped, not reported: they are
/// prose as far as this codec is concerned. When a field occurs more
/// than once the last occurrence wins.
pub fn decode(text: &str) -> BTreeMap<String, FieldValue> {
    scan(text)
        .into_iter()
        .map(|t| (t.field, t.value))
        .collect()
}

/// Like [`decode`] but keeps every occurrence along with its span.
pub fn scan(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for caps in token_re().captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let kind = &caps[1];
        let body = &caps[2];

        let (field, payload) = match body_re().captures(body) {
            Some(parts) => (parts[1].to_string(), parts[2].to_string()),
            None => {
                // Legacy two-segment form: `[!references:<payload>]` and the
                // horizon list kinds carry no field name; it defaults to the
                // kind itself. Other kinds require all three segments.
                if kind == "references" || value::parse_horizon_kind(kind).is_some() {
                    (kind.to_string(), body.to_string())
                } else {
                    continue;
                }
            }
        };

        if let Some(value) = parse_payload(kind, &field, &payload) {
            tokens.push(Token {
                field,
                value,
                span: (whole.start(), whole.end()),
            });
        }
    }
    tokens
}

/// Interpret a payload according to its token kind. `None` means the
/// token is malformed and stays prose.
fn parse_payload(kind: &str, field: &str, payload: &str) -> Option<FieldValue> {
    match kind {
        "singleselect" => {
            let raw = payload.trim();
            if raw.is_empty() {
                return None;
            }
            // Status-vocabulary fields never leak a raw legacy value past
            // this boundary, even when decoding text the migrator has not
            // seen yet.
            let canonical = if field == "status" || field == "project-status" {
                value::map_status(raw).to_string()
            } else {
                raw.to_string()
            };
            Some(FieldValue::SingleSelect(canonical))
        }
        "datetime" => {
            let raw = payload.trim();
            if raw.is_empty() {
                None
            } else {
                Some(FieldValue::DateTime(raw.to_string()))
            }
        }
        "checkbox" => match payload.trim() {
            "true" => Some(FieldValue::Checkbox(true)),
            "false" => Some(FieldValue::Checkbox(false)),
            _ => None,
        },
        "multiselect" => Some(FieldValue::MultiSelect(parse_list(payload))),
        "references" => Some(FieldValue::References(parse_list(payload))),
        other => value::parse_horizon_kind(other)
            .map(|horizons| FieldValue::HorizonList(horizons, parse_list(payload))),
    }
}

/// Parse a list payload: canonical JSON array, or the legacy
/// comma-separated form. Entries are defensively percent-decoded to
/// tolerate values escaped by older writers; output is normalized
/// (trimmed, deduplicated, sorted).
fn parse_list(payload: &str) -> Vec<String> {
    value::normalize_list(&parse_list_raw(payload))
}

/// Order-preserving list parse, no dedup or sort. The migrator needs
/// the original order to take the first listed value as primary.
pub(crate) fn parse_list_raw(payload: &str) -> Vec<String> {
    let raw = payload.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    let items: Vec<String> = match serde_json::from_str::<Vec<String>>(raw) {
        Ok(parsed) => parsed,
        Err(_) => raw.split(',').map(str::to_string).collect(),
    };

    items
        .iter()
        .map(|item| {
            let trimmed = item.trim();
            percent_decode_str(trimmed)
                .decode_utf8()
                .map(|cow| cow.into_owned())
                .unwrap_or_else(|_| trimmed.to_string())
        })
        .filter(|item| !item.is_empty())
        .collect()
}

/// Render a field value as canonical token text.
pub fn encode(field: &str, value: &FieldValue) -> String {
    format!("[!{}:{}:{}]", value.kind_str(), field, encode_payload(value))
}

fn encode_payload(value: &FieldValue) -> String {
    match value {
        FieldValue::SingleSelect(s) | FieldValue::DateTime(s) => s.clone(),
        FieldValue::Checkbox(b) => b.to_string(),
        FieldValue::MultiSelect(items)
        | FieldValue::References(items)
        | FieldValue::HorizonList(_, items) => {
            let normalized = value::normalize_list(items);
            serde_json::to_string(&normalized).unwrap_or_else(|_| "[]".to_string())
        }
    }
}

/// Replace the existing token for this kind+field in place, or insert
/// one under the field's canonical heading, appending a new
/// heading+token block at the end of the document when the heading is
/// absent.
pub fn upsert(text: &str, field: &str, value: &FieldValue) -> String {
    let token = encode(field, value);
    let kind = value.kind_str();

    // Replace the first existing token with the same kind and field.
    // Legacy two-segment reference tokens scan with field == kind, so
    // they are canonicalized here as well.
    let existing = scan(text)
        .into_iter()
        .find(|t| t.field == field && t.value.kind_str() == kind);
    if let Some(found) = existing {
        let (start, end) = found.span;
        let mut out = String::with_capacity(text.len() + token.len());
        out.push_str(&text[..start]);
        out.push_str(&token);
        out.push_str(&text[end..]);
        return out;
    }

    let heading = heading_for(field, value);
    if let Some(insert_at) = find_heading_end(text, &heading) {
        let mut out = String::with_capacity(text.len() + token.len() + 2);
        out.push_str(&text[..insert_at]);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&token);
        out.push('\n');
        out.push_str(&text[insert_at..]);
        return out;
    }

    let mut out = text.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&format!("\n## {heading}\n\n{token}\n"));
    out
}

/// Canonical heading a field's token lives under.
pub fn heading_for(field: &str, value: &FieldValue) -> String {
    if matches!(
        value,
        FieldValue::References(_) | FieldValue::HorizonList(_, _)
    ) {
        return "Reference Index".to_string();
    }
    field
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Byte offset just past the heading line `## {heading}`, or `None` if
/// the heading is not present.
pub(crate) fn find_heading_end(text: &str, heading: &str) -> Option<usize> {
    let needle = format!("## {heading}");
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim_end() == needle {
            return Some(offset + line.len());
        }
        offset += line.len();
    }
    // Heading present but on the final line without a newline.
    if text[offset..].trim_end() == needle {
        return Some(text.len());
    }
    None
}

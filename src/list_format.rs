//! List-format parsing for settings that hold a list encoded as a string.
//!
//! Two encodings are accepted: a JSON array of strings (`["a", "b"]`) and a
//! delimiter-separated string where commas and whitespace both separate
//! elements (`a, b c`). A value whose trimmed form starts with `[` is always
//! treated as JSON, so a malformed array is reported instead of being split.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Errors produced while interpreting a list-typed setting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListFormatError {
    #[error("invalid list format: {raw}")]
    InvalidFormat { raw: String },
    #[error("expected string, got {found}")]
    InvalidType { found: &'static str },
}

fn delimiter() -> &'static Regex {
    static DELIMITER: OnceLock<Regex> = OnceLock::new();
    DELIMITER.get_or_init(|| Regex::new(r"[,\s]+").expect("delimiter pattern is valid"))
}

/// Parses a string-encoded list into its elements.
pub fn parse(raw: &str) -> Result<Vec<String>, ListFormatError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str::<Vec<String>>(trimmed).map_err(|_| {
            ListFormatError::InvalidFormat {
                raw: raw.to_string(),
            }
        });
    }

    Ok(delimiter()
        .split(trimmed)
        .map(|element| element.trim().trim_matches(|c| c == '"' || c == '\''))
        .filter(|element| !element.is_empty())
        .map(str::to_string)
        .collect())
}

/// Whether `raw` is a well-formed list encoding.
pub fn is_valid(raw: &str) -> bool {
    parse(raw).is_ok()
}

/// Setting keys that hold string-encoded lists, in reporting order.
pub const LIST_KEYS: [&str; 9] = [
    "allowed_domains",
    "allowed_groups",
    "allowed_organizations",
    "team_ids",
    "role_values_none",
    "role_values_viewer",
    "role_values_editor",
    "role_values_admin",
    "role_values_grafana_admin",
];

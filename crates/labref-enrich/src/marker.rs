//! Placeholder detection.
//!
//! A reference entry such as `"PubMed search: pomodoro technique focus"` is a
//! search request rather than a citation. Only the first one in a record is
//! ever resolved.

use serde_json::Value;

/// Prefix marking a placeholder, compared ASCII case-insensitively.
pub const QUERY_MARKER: &str = "pubmed search:";

/// Returns the trimmed hint following the marker, or `None` for a literal citation.
pub fn parse_placeholder(entry: &str) -> Option<&str> {
    let head = entry.get(..QUERY_MARKER.len())?;
    if !head.eq_ignore_ascii_case(QUERY_MARKER) {
        return None;
    }
    // The marker ends with the first ':' of the entry.
    Some(entry[QUERY_MARKER.len()..].trim())
}

/// Hint of the first placeholder among `references`; non-text entries are skipped.
pub fn first_placeholder(references: &[Value]) -> Option<String> {
    references
        .iter()
        .filter_map(Value::as_str)
        .find_map(parse_placeholder)
        .map(str::to_string)
}

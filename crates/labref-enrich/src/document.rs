//! Loading, validating and writing the protocols document.

use labref_common::{LabrefError, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Top-level field holding the records.
pub const PROTOCOLS_FIELD: &str = "protocols";

pub fn load_document(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)?;
    let document: Value = serde_json::from_str(&raw)?;
    debug!(path = %path.display(), bytes = raw.len(), "Loaded document");
    Ok(document)
}

/// The `protocols` array, or a fatal [`LabrefError::InvalidInput`].
pub fn protocols_mut(document: &mut Value) -> Result<&mut Vec<Value>> {
    document
        .get_mut(PROTOCOLS_FIELD)
        .and_then(Value::as_array_mut)
        .ok_or_else(|| {
            LabrefError::InvalidInput(format!("field '{}' must be a list", PROTOCOLS_FIELD))
        })
}

/// Checks the schema without mutating anything.
pub fn validate(document: &Value) -> Result<usize> {
    document
        .get(PROTOCOLS_FIELD)
        .and_then(Value::as_array)
        .map(Vec::len)
        .ok_or_else(|| {
            LabrefError::InvalidInput(format!("field '{}' must be a list", PROTOCOLS_FIELD))
        })
}

/// Writes `document` as 2-space indented JSON with non-ASCII text kept as is.
pub fn save_document(path: &Path, document: &Value) -> Result<()> {
    fs::write(path, to_pretty_json(document)?)?;
    debug!(path = %path.display(), "Wrote document");
    Ok(())
}

pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut out = serde_json::to_string_pretty(value)?;
    out.push('\n');
    Ok(out)
}

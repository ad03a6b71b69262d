//! Deterministic JSON encoding for association metadata.
//!
//! Object keys are emitted in sorted order at every nesting level with compact
//! separators, so equal mappings always encode to identical bytes.

use serde_json::{Map, Value};

use crate::error::{TrackerError, TrackerResult};
use crate::models::Metadata;

pub fn encode_metadata(metadata: &Metadata) -> TrackerResult<String> {
    let canonical = canonicalize(Value::Object(metadata.clone()));
    Ok(serde_json::to_string(&canonical)?)
}

/// Decode a stored metadata column; an empty column is an empty mapping
pub fn decode_metadata(raw: &str) -> TrackerResult<Metadata> {
    if raw.trim().is_empty() {
        return Ok(Metadata::new());
    }

    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(TrackerError::Serialization(format!(
            "association metadata must be a JSON object, found {other}"
        ))),
    }
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, canonicalize(value)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

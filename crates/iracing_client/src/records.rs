//! Schema-less telemetry records.
//!
//! The telemetry endpoint does not commit to a fixed shape, so each record is
//! kept as a JSON object and the set of columns is derived from the data.

use crate::IracingError;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// One telemetry record: field name to JSON value.
pub type TelemetryRecord = Map<String, Value>;

/// Sorted union of all field names seen across `records`.
pub fn key_union(records: &[TelemetryRecord]) -> Vec<String> {
    records
        .iter()
        .flat_map(|r| r.keys())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Interpret a decoded payload as a list of records.
///
/// The payload must be a JSON array whose items are all objects.
pub fn records_from_value(value: Value) -> Result<Vec<TelemetryRecord>, IracingError> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(IracingError::Decode(format!(
                "expected a JSON array of records, got {}",
                kind(&other)
            )));
        }
    };
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(IracingError::Decode(format!(
                "record {idx} is {}, expected an object",
                kind(&other)
            ))),
        })
        .collect()
}

/// Render a single cell. Absent and null fields are empty.
pub fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(nested) => nested.to_string(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

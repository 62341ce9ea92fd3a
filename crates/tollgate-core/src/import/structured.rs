// ── Structured-record reader ──
//
// JSON input: one object, or an array of objects.

use serde_json::Value;

use super::ParseError;
use super::schema::{RawCell, RawRecord};

pub fn parse(raw: &str) -> Result<Vec<RawRecord>, ParseError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| ParseError::Json(e.to_string()))?;

    let objects = match value {
        Value::Object(map) => vec![map],
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                _ => Err(ParseError::NotRecords),
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(ParseError::NotRecords),
    };

    Ok(objects
        .into_iter()
        .enumerate()
        .map(|(idx, map)| RawRecord {
            row: idx + 1,
            cells: map
                .into_iter()
                .map(|(key, value)| (key, RawCell::from(value)))
                .collect(),
        })
        .collect())
}

impl From<Value> for RawCell {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self::Text(s),
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::Null => Self::Null,
            Value::Array(_) | Value::Object(_) => Self::Nested,
        }
    }
}

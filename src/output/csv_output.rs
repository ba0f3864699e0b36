//! CSV export
//!
//! One row per record. The header is the union of field names across all records
//! in first-seen order. Mappings and sequences go into their cell as
//! pretty-printed JSON.

use crate::listing::BusinessRecord;
use crate::ListingsError;
use serde_json::{Map, Value};
use std::io::Write;

/// Renders one JSON value as a CSV cell
fn cell_text(value: &Value) -> Result<String, ListingsError> {
    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => serde_json::to_string_pretty(value)?,
    })
}

fn record_fields(record: &BusinessRecord) -> Result<Map<String, Value>, ListingsError> {
    match serde_json::to_value(record)? {
        Value::Object(fields) => Ok(fields),
        other => {
            let mut fields = Map::new();
            fields.insert("value".to_string(), other);
            Ok(fields)
        }
    }
}

/// Writes records as CSV; an empty record set writes nothing at all
pub fn write_csv<W: Write>(records: &[BusinessRecord], writer: W) -> Result<(), ListingsError> {
    if records.is_empty() {
        return Ok(());
    }

    let rows = records
        .iter()
        .map(record_fields)
        .collect::<Result<Vec<_>, _>>()?;

    let mut header: Vec<String> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if !header.contains(key) {
                header.push(key.clone());
            }
        }
    }

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&header)?;
    for row in &rows {
        let cells = header
            .iter()
            .map(|key| row.get(key).map_or(Ok(String::new()), cell_text))
            .collect::<Result<Vec<_>, _>>()?;
        csv_writer.write_record(&cells)?;
    }
    csv_writer.flush()?;
    Ok(())
}

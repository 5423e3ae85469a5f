//! CSV boundary: input files to [`Table`]s, output rows to CSV.

use anyhow::{Context, Result};
use pbp_rust_core::table::Table;
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Joins list-valued cells such as a stint's player ids.
pub const LIST_SEPARATOR: &str = "|";

/// Parse a CSV stream with a header row into a table.
pub fn read_table_from<R: Read>(name: &'static str, reader: R) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read {} header", name))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read {} row {}", name, idx + 1))?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }

    Ok(Table::new(name, headers, rows)?)
}

pub fn read_table(name: &'static str, path: &Path) -> Result<Table> {
    let file = File::open(path).with_context(|| format!("Failed to open {} table: {}", name, path.display()))?;
    read_table_from(name, file)
}

/// `None` when the file does not exist; optional inputs only.
pub fn read_optional_table(name: &'static str, path: &Path) -> Result<Option<Table>> {
    if !path.exists() {
        return Ok(None);
    }
    read_table(name, path).map(Some)
}

// =============================================================================
// Output
// =============================================================================

/// A row type written as CSV.
///
/// `columns` is the header, written even when there are no rows.
pub trait CsvRecord: Serialize {
    fn columns() -> Vec<&'static str>;
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) if items.iter().all(is_scalar) => items
            .iter()
            .map(|item| cell(Some(item)))
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR),
        Some(other) => other.to_string(),
    }
}

/// Write rows as CSV and return the row count.
///
/// The header is the type's declared columns followed by any other keys the
/// rows carry, in first-seen order. Missing and null cells are empty.
pub fn write_rows_to<W: Write, T: CsvRecord>(writer: W, rows: &[T]) -> Result<usize> {
    let values = rows
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<Value>, _>>()
        .context("Failed to serialize output row")?;

    let mut headers: Vec<String> = T::columns().into_iter().map(str::to_string).collect();
    for value in &values {
        if let Value::Object(map) = value {
            for key in map.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }
    }

    let mut out = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    out.write_record(&headers)?;
    for value in &values {
        out.write_record(headers.iter().map(|h| cell(value.get(h.as_str()))))?;
    }
    out.flush()?;
    Ok(values.len())
}

pub fn write_rows<T: CsvRecord>(path: &Path, rows: &[T]) -> Result<usize> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_rows_to(file, rows)
}

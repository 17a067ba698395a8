//! Schema-driven field projection
//!
//! Walks each schema path over the extracted JSON tree and binds terminal
//! values to their aliases, producing one flat row per input document. The
//! schema describes the union of fields possibly present across documents,
//! so a missing intermediate segment is expected and yields `Null` rather
//! than failing the row.

use crate::pipeline::schema::ExtractionSchema;
use crate::pipeline::table::{FlatRow, NormalizedTable};
use serde_json::Value;

/// Fixed descent present in every document of this source format; schema
/// paths are relative to this sub-structure.
const ROOT_PATH: [&str; 2] = ["layout", "data"];

/// Project extracted records against the schema.
///
/// Output rows are positionally aligned with `records`: a `None` record
/// (extraction failure) still occupies a row of all-`Null` values so that
/// document-to-row alignment can be cross-checked downstream.
pub fn project(records: &[Option<Value>], schema: &ExtractionSchema) -> NormalizedTable {
    let mut table = NormalizedTable::new(schema.aliases());

    for record in records {
        table.rows.push(project_record(record.as_ref(), schema));
    }

    table
}

fn project_record(record: Option<&Value>, schema: &ExtractionSchema) -> FlatRow {
    let root = record.and_then(|r| walk(r, &ROOT_PATH));

    let mut row = FlatRow::new();
    for field in schema.fields() {
        let segments: Vec<&str> = field.path.iter().map(String::as_str).collect();
        let value = root
            .and_then(|r| walk(r, &segments))
            .cloned()
            .unwrap_or(Value::Null);
        row.insert(field.alias.clone(), value);
    }

    row
}

/// Walk key segments through nested mappings. Any non-mapping intermediate
/// or absent key terminates the walk with `None`.
fn walk<'a>(value: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for segment in segments {
        current = current.get(segment)?;
    }
    Some(current)
}

//! CSV artifact writer
//!
//! Writes the normalized table as the delimited-text artifact the sink layer
//! loads from. Header order follows `table.columns`; `Null` cells become
//! empty fields.

use crate::pipeline::table::NormalizedTable;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

/// Write the table to `path`, creating parent directories as needed.
pub fn write_csv(table: &NormalizedTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory: {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to open CSV output: {}", path.display()))?;

    writer
        .write_record(&table.columns)
        .context("failed to write CSV header")?;

    for row in &table.rows {
        let record: Vec<String> = table
            .columns
            .iter()
            .map(|col| render_cell(row.get(col.as_str()).unwrap_or(&Value::Null)))
            .collect();
        writer.write_record(&record).context("failed to write CSV row")?;
    }

    writer.flush().context("failed to flush CSV output")?;
    Ok(())
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

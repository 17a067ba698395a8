//! Analytical store sink
//!
//! SQLite-backed boundary that receives the normalized table and executes
//! externally authored SQL text. The core never inspects that SQL; loading
//! and transforming are driven entirely by the caller-supplied scripts.
//!
//! The connection is scoped to the store value; dropping it releases the
//! database even when a script fails mid-way.

use crate::pipeline::table::NormalizedTable;
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde_json::Value;
use std::path::Path;

/// Placeholder in load SQL for the CSV artifact location; substituted by the
/// caller before execution.
pub const CSV_PATH_PLACEHOLDER: &str = "{csv_path}";

/// Connection wrapper for the analytical database.
pub struct AnalyticsStore {
    conn: Connection,
}

impl AnalyticsStore {
    /// Open or create the database file.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory: {}", parent.display())
            })?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database: {}", path.display()))?;
        Ok(AnalyticsStore { conn })
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Ok(AnalyticsStore { conn })
    }

    /// Execute externally authored SQL text (one or more statements).
    pub fn execute_script(&self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .context("failed to execute SQL script")?;
        Ok(())
    }

    /// Register the normalized table under `name`, creating the table from
    /// the column list and bulk-inserting every row in one transaction.
    /// Returns the number of rows inserted.
    pub fn load_table(&mut self, name: &str, table: &NormalizedTable) -> Result<usize> {
        let column_list = table
            .columns
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; table.columns.len()].join(", ");

        let tx = self.conn.transaction().context("failed to begin transaction")?;

        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {id}; CREATE TABLE {id} ({columns});",
            id = quote_identifier(name),
            columns = column_list,
        ))
        .with_context(|| format!("failed to create table {name}"))?;

        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    quote_identifier(name),
                    column_list,
                    placeholders,
                ))
                .context("failed to prepare insert")?;

            for row in &table.rows {
                let params: Vec<rusqlite::types::Value> = table
                    .columns
                    .iter()
                    .map(|col| to_sql_value(row.get(col.as_str()).unwrap_or(&Value::Null)))
                    .collect();
                stmt.execute(rusqlite::params_from_iter(params))
                    .context("failed to insert row")?;
            }
        }

        tx.commit().context("failed to commit table load")?;
        Ok(table.rows.len())
    }

    /// Run a query and collect each result row through `f`.
    pub fn query_rows<T>(
        &self,
        sql: &str,
        f: impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .with_context(|| format!("failed to prepare query: {sql}"))?;
        let rows = stmt
            .query_map([], f)
            .context("query failed")?
            .collect::<rusqlite::Result<Vec<T>>>()
            .context("failed to read query results")?;
        Ok(rows)
    }
}

/// Read an SQL file and substitute the CSV artifact placeholder.
pub fn read_sql_with_csv_path(sql_path: &Path, csv_path: &Path) -> Result<String> {
    let sql = std::fs::read_to_string(sql_path)
        .with_context(|| format!("SQL file not found: {}", sql_path.display()))?;
    Ok(sql.replace(CSV_PATH_PLACEHOLDER, &csv_path.display().to_string()))
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn to_sql_value(value: &Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;

    match value {
        Value::Null => Sql::Null,
        Value::Bool(b) => Sql::Integer(*b as i64),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Sql::Integer(i)
            } else {
                Sql::Real(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Sql::Text(s.clone()),
        // Nested values are stringified by the normalizer; anything left over
        // is stored as its JSON rendering.
        other => Sql::Text(other.to_string()),
    }
}

//! Pipeline orchestration
//!
//! Sequences schema load -> extract -> project -> normalize -> sink. Only
//! two failure classes abort a run: an unusable schema config and a sink
//! failure (unwritable artifact, unreachable store, malformed external SQL).
//! Everything per-document is isolated and logged.

use crate::bench::StageClock;
use crate::pipeline::extract::extract_file;
use crate::pipeline::normalize::normalize;
use crate::pipeline::project::project;
use crate::pipeline::schema::ExtractionSchema;
use crate::pipeline::writer::write_csv;
use crate::store::{read_sql_with_csv_path, AnalyticsStore};
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

/// Name of the intermediate CSV artifact inside `output_dir`.
pub const CSV_ARTIFACT: &str = "table_dump.csv";
/// Name of the registered table in the analytical store.
pub const SOURCE_TABLE: &str = "source_data";

/// Paths driving one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// HTML documents to process, in output-row order.
    pub files: Vec<PathBuf>,
    pub schema_config_path: PathBuf,
    /// Directory receiving the CSV artifact.
    pub output_dir: PathBuf,
    pub db_path: PathBuf,
    /// Externally authored load SQL; may reference `{csv_path}`.
    pub load_sql_path: PathBuf,
    /// Externally authored transform SQL.
    pub transform_sql_path: PathBuf,
}

/// Run the full extraction pipeline.
pub fn run_pipeline(config: &PipelineConfig, clock: &StageClock) -> Result<()> {
    // No partial schema is usable, so this is the one pre-batch fatal error.
    let schema = clock.time("load_schema", || {
        ExtractionSchema::load(&config.schema_config_path)
    })?;
    info!(
        fields = schema.len(),
        config = %config.schema_config_path.display(),
        "loaded extraction schema"
    );

    let records: Vec<Option<Value>> = clock.time("extract", || {
        config.files.iter().map(|f| extract_file(f)).collect()
    });
    info!(
        documents = records.len(),
        extracted = records.iter().filter(|r| r.is_some()).count(),
        "extraction finished"
    );

    let table = clock.time("project", || project(&records, &schema));
    let table = clock.time("normalize", || normalize(table));

    let csv_path = config.output_dir.join(CSV_ARTIFACT);
    clock.time("write_csv", || write_csv(&table, &csv_path))?;
    info!(artifact = %csv_path.display(), "wrote intermediate CSV");

    clock.time("load_store", || -> Result<()> {
        let load_sql = read_sql_with_csv_path(&config.load_sql_path, &csv_path)?;
        let mut store = AnalyticsStore::open(&config.db_path)?;
        store.execute_script(&load_sql)?;
        let inserted = store.load_table(SOURCE_TABLE, &table)?;
        info!(rows = inserted, db = %config.db_path.display(), "loaded table into store");
        Ok(())
    })?;

    clock.time("transform_store", || -> Result<()> {
        let transform_sql = std::fs::read_to_string(&config.transform_sql_path)
            .with_context(|| {
                format!("SQL file not found: {}", config.transform_sql_path.display())
            })?;
        let store = AnalyticsStore::open(&config.db_path)?;
        store.execute_script(&transform_sql)?;
        info!("applied store transformations");
        Ok(())
    })?;

    Ok(())
}

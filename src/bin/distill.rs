//! distill: run the page-analytics ETL over a project directory
//!
//! Expects the conventional layout under the project root:
//!
//!   data/raw/scraped_html/<prefix>*.html   saved input pages
//!   config/schema_config.json              extraction schema
//!   sql/load.sql, sql/transform.sql        store load/transform SQL
//!   sql/mom_visits.sql, sql/mom_rank.sql,
//!   sql/relative_scale.sql                 analysis view SQL
//!
//! Outputs land in data/transformed/ (CSV artifact), db/ (SQLite file) and
//! data/visualizations/ (SVG charts).

use anyhow::{Context, Result};
use clap::Parser;
use distill::bench::StageClock;
use distill::pipeline::{run_pipeline, PipelineConfig};
use distill::{charts, create_views, ViewDefinition};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "distill")]
#[command(about = "Extract embedded analytics from saved web pages", long_about = None)]
struct Args {
    /// Project root containing config/, sql/ and data/ directories
    #[arg(value_name = "ROOT", default_value = ".")]
    root: PathBuf,

    /// Input file name prefix under data/raw/scraped_html/
    #[arg(long, default_value = "similarweb")]
    source_prefix: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!(error = ?e, "pipeline failed");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let root = &args.root;
    let raw_data_dir = root.join("data").join("raw").join("scraped_html");

    let files = discover_inputs(&raw_data_dir, &args.source_prefix)?;
    if files.is_empty() {
        warn!(
            dir = %raw_data_dir.display(),
            prefix = %args.source_prefix,
            "no HTML files found"
        );
        return Ok(());
    }

    info!(files = files.len(), "starting ETL pipeline");

    let db_path = root.join("db").join("scraped_data.db");
    let config = PipelineConfig {
        files,
        schema_config_path: root.join("config").join("schema_config.json"),
        output_dir: root.join("data").join("transformed"),
        db_path: db_path.clone(),
        load_sql_path: root.join("sql").join("load.sql"),
        transform_sql_path: root.join("sql").join("transform.sql"),
    };

    run_pipeline(&config, &StageClock::new())?;
    info!("pipeline finished");

    let views = vec![
        ViewDefinition::new("monthly_visit_changes", root.join("sql").join("mom_visits.sql")),
        ViewDefinition::new("monthly_rank_changes", root.join("sql").join("mom_rank.sql")),
        ViewDefinition::new("relative_ranking", root.join("sql").join("relative_scale.sql")),
    ];
    create_views(&db_path, &views)?;

    charts::render_all(&db_path, &root.join("data").join("visualizations"))?;

    Ok(())
}

/// Find `<prefix>*.html` files, sorted by name for stable row ordering.
fn discover_inputs(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read input directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            name.starts_with(prefix) && name.ends_with(".html")
        })
        .collect();

    files.sort();
    Ok(files)
}

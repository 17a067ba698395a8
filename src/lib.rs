//! # Distill - Embedded Analytics Extraction
//!
//! Extracts the JSON analytics blob embedded in saved web pages, flattens it
//! through a declarative `{alias, path}` schema, cleans scalars, and loads
//! the resulting table into an embedded analytical store for SQL-defined
//! views and month-over-month charts.
//!
//! ## Modules
//!
//! - **pipeline**: schema loading, blob extraction, projection, normalization,
//!   CSV output, and orchestration
//! - **store**: SQLite sink executing externally authored SQL
//! - **analysis**: named-view creation with per-view fault isolation
//! - **charts**: SVG line charts over the analysis views
//!
//! ## Quick Start
//!
//! ```rust
//! use distill::pipeline::{extract_document, project, normalize, ExtractionSchema, FieldMapping};
//!
//! let html = r#"<script>window.__APP_DATA__ = {"layout":{"data":{"x":1}}}</script>"#;
//! let record = extract_document(html, "example");
//!
//! let schema = ExtractionSchema::from_fields(vec![FieldMapping {
//!     alias: "X".to_string(),
//!     path: vec!["x".to_string()],
//! }])
//! .unwrap();
//!
//! let table = normalize(project(&[record], &schema));
//! assert_eq!(table.cell(0, "X"), &serde_json::json!(1));
//! ```

pub mod analysis;
pub mod bench;
pub mod charts;
pub mod pipeline;
pub mod store;

// Re-export commonly used types for convenience
pub use analysis::{create_views, ViewDefinition};
pub use bench::StageClock;
pub use pipeline::{
    extract_document, extract_file, normalize, project, run_pipeline, ConfigError,
    ExtractionSchema, FieldMapping, NormalizedTable, PipelineConfig,
};
pub use store::AnalyticsStore;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_project_normalize_round_trip() {
        let html = r#"<html><script>
            window.__APP_DATA__ = {"layout":{"data":{
                "domain":"example.com",
                "bounce":"42.5%"
            }}};
        </script></html>"#;

        let record = extract_document(html, "test");
        let schema = ExtractionSchema::from_fields(vec![
            FieldMapping {
                alias: "Domain".to_string(),
                path: vec!["domain".to_string()],
            },
            FieldMapping {
                alias: "bounce_rate_raw".to_string(),
                path: vec!["bounce".to_string()],
            },
        ])
        .unwrap();

        let table = normalize(project(&[record], &schema));

        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, "Domain"), &serde_json::json!("example.com"));
        assert_eq!(table.cell(0, "Bounce Rate Percent"), &serde_json::json!(42.5));
    }
}

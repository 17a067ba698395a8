//! Extraction-normalization pipeline
//!
//! Turns saved analytics pages into a flat table: locate the embedded JSON
//! blob, project it through the declarative schema, clean scalars, and hand
//! the result to the sink layer.

pub mod extract;
pub mod normalize;
pub mod project;
pub mod run;
pub mod schema;
pub mod table;
pub mod writer;

pub use extract::{extract_document, extract_file, SENTINEL};
pub use normalize::normalize;
pub use project::project;
pub use run::{run_pipeline, PipelineConfig, CSV_ARTIFACT, SOURCE_TABLE};
pub use schema::{ConfigError, ExtractionSchema, FieldMapping};
pub use table::{FlatRow, NormalizedTable};
pub use writer::write_csv;

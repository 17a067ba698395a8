//! Declarative extraction schema
//!
//! The schema is the single contract between the unstable page structure and
//! the stable downstream column set: a JSON list of `{alias, path}` mappings,
//! loaded once per pipeline run. Adding or removing a tracked metric is a
//! one-line config change, never a code change.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading the extraction schema. All of these are fatal
/// to a pipeline run; no document is processed against a partial schema.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("schema config not found at: {0}")]
    NotFound(String),

    #[error("schema config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid schema config: {0}")]
    Validation(String),
}

/// Maps a nested JSON path to a flat output column.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldMapping {
    /// Output column name.
    pub alias: String,
    /// Ordered key segments from the record root to the value.
    pub path: Vec<String>,
}

/// Ordered list of field mappings, read-only after loading.
#[derive(Debug, Clone)]
pub struct ExtractionSchema {
    fields: Vec<FieldMapping>,
}

impl ExtractionSchema {
    /// Load and validate a schema from a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::NotFound(format!("{}: {}", path.display(), e)))?;
        let fields: Vec<FieldMapping> = serde_json::from_str(&content)?;

        Self::from_fields(fields)
    }

    /// Validate an in-memory field list. Duplicate aliases and empty
    /// aliases/paths are configuration errors, not construction errors.
    pub fn from_fields(fields: Vec<FieldMapping>) -> Result<Self, ConfigError> {
        let mut seen: HashSet<&str> = HashSet::new();

        for field in &fields {
            if field.alias.is_empty() {
                return Err(ConfigError::Validation(
                    "mapping with empty alias".to_string(),
                ));
            }
            if field.path.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "mapping '{}' has an empty path",
                    field.alias
                )));
            }
            if !seen.insert(field.alias.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate alias '{}'",
                    field.alias
                )));
            }
        }

        Ok(ExtractionSchema { fields })
    }

    pub fn fields(&self) -> &[FieldMapping] {
        &self.fields
    }

    /// Output column names in schema order.
    pub fn aliases(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.alias.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

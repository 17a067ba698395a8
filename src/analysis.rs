//! Derived-view creation
//!
//! Executes externally authored view definitions over the loaded table.
//! View SQL is opaque to the core: a missing file or a failed statement is
//! logged against the view name and the remaining views still run.

use crate::store::AnalyticsStore;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// A named view and the SQL file that defines it.
#[derive(Debug, Clone)]
pub struct ViewDefinition {
    pub name: String,
    pub sql_path: PathBuf,
}

impl ViewDefinition {
    pub fn new(name: impl Into<String>, sql_path: impl Into<PathBuf>) -> Self {
        ViewDefinition {
            name: name.into(),
            sql_path: sql_path.into(),
        }
    }
}

/// Create each view in turn. Returns the number of views created; individual
/// failures are logged and skipped, never fatal.
pub fn create_views(db_path: &Path, views: &[ViewDefinition]) -> Result<usize> {
    let store = AnalyticsStore::open(db_path)?;
    let mut created = 0;

    for view in views {
        if !view.sql_path.exists() {
            warn!(view = %view.name, path = %view.sql_path.display(), "SQL file not found");
            continue;
        }

        let sql = match std::fs::read_to_string(&view.sql_path) {
            Ok(sql) => sql,
            Err(e) => {
                error!(view = %view.name, error = %e, "failed to read view SQL");
                continue;
            }
        };

        match store.execute_script(&sql) {
            Ok(()) => {
                info!(view = %view.name, "created view");
                created += 1;
            }
            Err(e) => error!(view = %view.name, error = %e, "failed to create view"),
        }
    }

    Ok(created)
}

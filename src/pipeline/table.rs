use serde_json::{Map, Value};

/// One flattened document: alias -> scalar, JSON string, or `Null` for a
/// missing value.
pub type FlatRow = Map<String, Value>;

/// The tabular intermediate between per-document extraction and the
/// analytical store. Column order is schema order; derived columns are
/// appended by the normalizer. Row order is input-document order and is
/// never changed after construction.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub columns: Vec<String>,
    pub rows: Vec<FlatRow>,
}

impl NormalizedTable {
    pub fn new(columns: Vec<String>) -> Self {
        NormalizedTable {
            columns,
            rows: Vec::new(),
        }
    }

    /// Number of rows, which always equals the number of input documents.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Register a derived column, keeping `columns` duplicate-free so that
    /// re-running normalization does not grow the header.
    pub fn ensure_column(&mut self, name: &str) {
        if !self.columns.iter().any(|c| c == name) {
            self.columns.push(name.to_string());
        }
    }

    /// Cell lookup; absent keys read as `Null`.
    pub fn cell(&self, row: usize, column: &str) -> &Value {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ensure_column_is_idempotent() {
        let mut table = NormalizedTable::new(vec!["a".to_string()]);
        table.ensure_column("b");
        table.ensure_column("b");
        assert_eq!(table.columns, vec!["a", "b"]);
    }

    #[test]
    fn test_cell_reads_null_for_missing() {
        let mut table = NormalizedTable::new(vec!["a".to_string()]);
        let mut row = FlatRow::new();
        row.insert("a".to_string(), json!(1));
        table.rows.push(row);

        assert_eq!(table.cell(0, "a"), &json!(1));
        assert_eq!(table.cell(0, "missing"), &Value::Null);
        assert_eq!(table.cell(9, "a"), &Value::Null);
    }
}

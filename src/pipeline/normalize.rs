//! Typed scalar cleaning
//!
//! Fixed post-projection rules: percentage strings become floats, visit
//! durations become whole seconds, and any column holding nested values is
//! serialized to a canonical JSON string, since the downstream sink is a
//! flat tabular format with no nested-type support.
//!
//! Normalization never drops or reorders rows; it only adds or overwrites
//! columns, so re-running it over an already-normalized table is a no-op.

use crate::pipeline::table::NormalizedTable;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

/// Source column holding percentage strings like `"42.5%"`.
pub const BOUNCE_RATE_RAW: &str = "bounce_rate_raw";
/// Derived float column.
pub const BOUNCE_RATE_PERCENT: &str = "Bounce Rate Percent";
/// Source column holding `HH:MM:SS` duration strings.
pub const AVG_VISIT_DURATION: &str = "Avg Visit Duration";
/// Derived integer-seconds column.
pub const AVG_VISIT_DURATION_SECONDS: &str = "Avg Visit Duration (Seconds)";

static DURATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2}):(\d{2})$").unwrap()
});

/// Apply all normalization rules, returning the same table with derived
/// columns populated and complex columns stringified.
pub fn normalize(mut table: NormalizedTable) -> NormalizedTable {
    derive_bounce_rate(&mut table);
    derive_visit_duration_seconds(&mut table);
    stringify_complex_columns(&mut table);
    table
}

fn derive_bounce_rate(table: &mut NormalizedTable) {
    table.ensure_column(BOUNCE_RATE_PERCENT);

    for row in &mut table.rows {
        let derived = row
            .get(BOUNCE_RATE_RAW)
            .and_then(Value::as_str)
            .and_then(parse_percent)
            .and_then(serde_json::Number::from_f64)
            .map_or(Value::Null, Value::Number);
        row.insert(BOUNCE_RATE_PERCENT.to_string(), derived);
    }
}

fn derive_visit_duration_seconds(table: &mut NormalizedTable) {
    table.ensure_column(AVG_VISIT_DURATION_SECONDS);

    for row in &mut table.rows {
        let derived = row
            .get(AVG_VISIT_DURATION)
            .and_then(Value::as_str)
            .and_then(parse_duration_seconds)
            .map_or(Value::Null, |s| Value::Number(s.into()));
        row.insert(AVG_VISIT_DURATION_SECONDS.to_string(), derived);
    }
}

/// `"42.5%"` -> `42.5`. Unparsable input is a missing value, not an error.
fn parse_percent(raw: &str) -> Option<f64> {
    raw.trim().trim_end_matches('%').parse::<f64>().ok()
}

/// `"01:02:03"` -> `3723`.
fn parse_duration_seconds(raw: &str) -> Option<i64> {
    let captures = DURATION_REGEX.captures(raw.trim())?;
    let hours: i64 = captures[1].parse().ok()?;
    let minutes: i64 = captures[2].parse().ok()?;
    let seconds: i64 = captures[3].parse().ok()?;
    if minutes >= 60 || seconds >= 60 {
        return None;
    }
    Some(hours * 3600 + minutes * 60 + seconds)
}

/// Serialize every cell of columns that hold nested values in any row.
/// `Null` cells stay `Null` (missing, not the string "null").
fn stringify_complex_columns(table: &mut NormalizedTable) {
    let complex: HashSet<String> = table
        .columns
        .iter()
        .filter(|col| {
            table
                .rows
                .iter()
                .any(|row| matches!(row.get(col.as_str()), Some(Value::Array(_) | Value::Object(_))))
        })
        .cloned()
        .collect();

    for row in &mut table.rows {
        for col in &complex {
            if let Some(value @ (Value::Array(_) | Value::Object(_))) = row.get(col) {
                let serialized = serde_json::to_string(value)
                    .unwrap_or_else(|_| "null".to_string());
                row.insert(col.clone(), Value::String(serialized));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::table::FlatRow;
    use serde_json::json;

    fn table_with(cells: &[(&str, Value)]) -> NormalizedTable {
        let columns: Vec<String> = cells.iter().map(|(c, _)| c.to_string()).collect();
        let mut table = NormalizedTable::new(columns);
        let mut row = FlatRow::new();
        for (col, value) in cells {
            row.insert(col.to_string(), value.clone());
        }
        table.rows.push(row);
        table
    }

    #[test]
    fn test_bounce_rate_parsed() {
        let table = normalize(table_with(&[(BOUNCE_RATE_RAW, json!("42.5%"))]));
        assert_eq!(table.cell(0, BOUNCE_RATE_PERCENT), &json!(42.5));
    }

    #[test]
    fn test_bounce_rate_unparsable_is_null() {
        let table = normalize(table_with(&[(BOUNCE_RATE_RAW, json!("oops"))]));
        assert_eq!(table.cell(0, BOUNCE_RATE_PERCENT), &Value::Null);
    }

    #[test]
    fn test_bounce_rate_missing_is_null() {
        let table = normalize(table_with(&[("Other", json!(1))]));
        assert_eq!(table.cell(0, BOUNCE_RATE_PERCENT), &Value::Null);
    }

    #[test]
    fn test_duration_parsed_to_seconds() {
        let table = normalize(table_with(&[(AVG_VISIT_DURATION, json!("01:02:03"))]));
        assert_eq!(table.cell(0, AVG_VISIT_DURATION_SECONDS), &json!(3723));
    }

    #[test]
    fn test_duration_unparsable_is_null() {
        for bad in ["1:2", "aa:bb:cc", "00:99:00", ""] {
            let table = normalize(table_with(&[(AVG_VISIT_DURATION, json!(bad))]));
            assert_eq!(table.cell(0, AVG_VISIT_DURATION_SECONDS), &Value::Null, "{bad}");
        }
    }

    #[test]
    fn test_complex_column_serialized() {
        let table = normalize(table_with(&[("History", json!([1, 2, 3]))]));
        assert_eq!(table.cell(0, "History"), &json!("[1,2,3]"));
    }

    #[test]
    fn test_null_in_complex_column_stays_null() {
        let columns = vec!["History".to_string()];
        let mut table = NormalizedTable::new(columns);
        let mut row = FlatRow::new();
        row.insert("History".to_string(), json!({"m1": 10}));
        table.rows.push(row);
        let mut empty = FlatRow::new();
        empty.insert("History".to_string(), Value::Null);
        table.rows.push(empty);

        let table = normalize(table);
        assert_eq!(table.cell(0, "History"), &json!(r#"{"m1":10}"#));
        assert_eq!(table.cell(1, "History"), &Value::Null);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let table = table_with(&[
            (BOUNCE_RATE_RAW, json!("17.3%")),
            (AVG_VISIT_DURATION, json!("00:10:00")),
            ("History", json!([5, 6])),
        ]);

        let once = normalize(table);
        let twice = normalize(once.clone());

        assert_eq!(once.columns, twice.columns);
        assert_eq!(once.rows, twice.rows);
    }

    #[test]
    fn test_rows_never_dropped_or_reordered() {
        let mut table = NormalizedTable::new(vec!["Domain".to_string()]);
        for name in ["a.com", "b.com", "c.com"] {
            let mut row = FlatRow::new();
            row.insert("Domain".to_string(), json!(name));
            table.rows.push(row);
        }

        let table = normalize(table);
        assert_eq!(table.len(), 3);
        assert_eq!(table.cell(0, "Domain"), &json!("a.com"));
        assert_eq!(table.cell(2, "Domain"), &json!("c.com"));
    }
}

//! CSV ingest and column-name normalization.
//!
//! Reading is deliberately dumb: every column gets the file's native typing
//! (integers, floats, or strings, decided per column) and nothing else. Business
//! rules live in the loaders and contracts.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::domain::{Table, Value};

static SEPARATOR_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\-]+").expect("valid separator regex"));

/// Cell texts treated as missing.
const NULL_TOKENS: [&str; 8] = ["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

/// Read a delimited file into a `Table`, keeping raw header names.
pub fn read_csv_table(path: &Path) -> Result<Table, String> {
    let file = File::open(path).map_err(|e| format!("failed to open: {e}"))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| format!("failed to read CSV headers: {e}"))?
        .clone();

    let mut raw: Vec<StringRecord> = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: header line plus 1-based numbering.
        let record = result.map_err(|e| format!("CSV parse error on line {}: {e}", idx + 2))?;
        raw.push(record);
    }

    let width = headers.len();
    let columns: Vec<String> = headers.iter().map(str::to_string).collect();

    let mut rows: Vec<Vec<Value>> = vec![Vec::with_capacity(width); raw.len()];
    for col in 0..width {
        let cells: Vec<Option<&str>> = raw.iter().map(|r| cell(r, col)).collect();
        for (row, value) in rows.iter_mut().zip(type_column(&cells)) {
            row.push(value);
        }
    }

    Ok(Table::new(columns, rows))
}

fn cell(record: &StringRecord, col: usize) -> Option<&str> {
    record.get(col).filter(|s| !NULL_TOKENS.contains(s))
}

/// Pick one native type for the whole column: all-integer, else all-numeric,
/// else string.
fn type_column(cells: &[Option<&str>]) -> Vec<Value> {
    let present = || cells.iter().flatten();

    if present().all(|s| s.parse::<i64>().is_ok()) {
        return cells
            .iter()
            .map(|&c| c.and_then(|s| s.parse().ok()).map_or(Value::Null, Value::Int))
            .collect();
    }
    if present().all(|s| s.parse::<f64>().is_ok()) {
        return cells
            .iter()
            .map(|&c| c.and_then(|s| s.parse().ok()).map_or(Value::Null, Value::Float))
            .collect();
    }
    cells
        .iter()
        .map(|&c| c.map_or(Value::Null, |s| Value::Str(s.to_string())))
        .collect()
}

/// Normalize a header: trim, strip a UTF-8 BOM, lowercase, and collapse runs
/// of whitespace or hyphens into a single underscore.
pub fn normalize_column_name(name: &str) -> String {
    let name = name.trim_start_matches('\u{feff}').trim().to_lowercase();
    SEPARATOR_RUN.replace_all(&name, "_").into_owned()
}

/// Normalize every header of `table`, then apply `renames`.
///
/// Headers that collide after normalization keep the first occurrence and
/// suffix later ones with `_1`, `_2`, ...
pub fn normalize_columns(table: &mut Table, renames: &[(&str, &str)], context: &str) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let normalized: Vec<(String, String)> = table
        .columns()
        .iter()
        .map(|raw| {
            let mut name = normalize_column_name(raw);
            if let Some((_, to)) = renames.iter().find(|(from, _)| *from == name.as_str()) {
                name = (*to).to_string();
            }
            (raw.clone(), name)
        })
        .collect();

    let mut final_names = Vec::with_capacity(normalized.len());
    for (raw, name) in normalized {
        let count = seen.entry(name.clone()).or_insert(0);
        if *count == 0 {
            final_names.push(name);
        } else {
            let renamed = format!("{name}_{count}");
            warn!(dataset = context, column = %raw, renamed = %renamed, "duplicate column after normalization");
            final_names.push(renamed);
        }
        *count += 1;
    }

    table.set_column_names(final_names);
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn normalizes_headers() {
        assert_eq!(normalize_column_name("  Avg Max Temp "), "avg_max_temp");
        assert_eq!(normalize_column_name("FIFA U-17 World Cup"), "fifa_u_17_world_cup");
        assert_eq!(normalize_column_name("a \t- b"), "a_b");
        assert_eq!(normalize_column_name("\u{feff}Agency"), "agency");
    }

    #[test]
    fn columns_get_native_types() {
        let file = write_csv("Agency,YearMonth,Volume,Note\nAgency_01,201301,80.676,\nAgency_02,201302,12,x\n");
        let table = read_csv_table(file.path()).unwrap();

        assert_eq!(table.columns(), &["Agency", "YearMonth", "Volume", "Note"]);
        assert_eq!(table.get(0, "YearMonth"), Some(&Value::Int(201301)));
        assert_eq!(table.get(1, "Volume"), Some(&Value::Float(12.0)));
        assert_eq!(table.get(0, "Note"), Some(&Value::Null));
        assert_eq!(table.get(1, "Note"), Some(&Value::Str("x".into())));
    }

    #[test]
    fn short_rows_are_padded_with_nulls() {
        let file = write_csv("a,b\n1\n2,3\n");
        let table = read_csv_table(file.path()).unwrap();
        assert_eq!(table.get(0, "b"), Some(&Value::Null));
        assert_eq!(table.get(1, "b"), Some(&Value::Int(3)));
    }

    #[test]
    fn renames_apply_after_normalization() {
        let file = write_csv("YearMonth,Regional Games ,Volume,volume\n201301,1,2,3\n");
        let mut table = read_csv_table(file.path()).unwrap();
        normalize_columns(&mut table, &[("yearmonth", "year_month")], "test");
        assert_eq!(table.columns(), &["year_month", "regional_games", "volume", "volume_1"]);
        assert_eq!(table.get(0, "volume_1"), Some(&Value::Int(3)));
    }
}

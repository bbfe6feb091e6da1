//! In-memory table model.
//!
//! A `Table` is an ordered list of column names plus row-major cells. It is the
//! representation of every Loaded Table and of the Unified Table. Cells carry
//! the file's native typing (`Int`, `Float`, `Str`) or `Null`.

use std::cmp::Ordering;
use std::fmt;

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell. Strings are not coerced.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Null | Value::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Sort order used for deterministic row ordering.
    ///
    /// Numbers compare numerically (ints and floats mixed), strings
    /// lexicographically, numbers before strings, and nulls always last.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Str(_), _) => Ordering::Greater,
            (_, Value::Str(_)) => Ordering::Less,
            (a, b) => {
                let (a, b) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
                a.total_cmp(&b)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

/// Read-only view of one row, addressable by column name.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Record<'a> {
    pub fn new(columns: &'a [String], values: &'a [Value]) -> Self {
        Self { columns, values }
    }

    pub fn get(&self, name: &str) -> Option<&'a Value> {
        let idx = self.columns.iter().position(|c| c == name)?;
        self.values.get(idx)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table; every row must have one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn record(&self, row: usize) -> Record<'_> {
        Record::new(&self.columns, &self.rows[row])
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        self.rows.iter().map(|r| Record::new(&self.columns, r))
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Iterate the cells of one column, top to bottom.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Value> + use<'a>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| &r[idx]))
    }

    /// Set a column, replacing it in place if it already exists, otherwise
    /// appending it on the right.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// Replace every column name at once; the count must not change.
    pub fn set_column_names(&mut self, names: Vec<String>) {
        debug_assert_eq!(names.len(), self.columns.len());
        self.columns = names;
    }

    pub fn null_count(&self, name: &str) -> usize {
        self.column(name)
            .map(|cells| cells.filter(|v| v.is_null()).count())
            .unwrap_or(0)
    }

    /// Number of distinct non-null values in a column.
    pub fn distinct_count(&self, name: &str) -> usize {
        let Some(cells) = self.column(name) else { return 0 };
        let mut seen: Vec<&Value> = cells.filter(|v| !v.is_null()).collect();
        seen.sort_by(|a, b| a.sort_cmp(b));
        seen.dedup_by(|a, b| a.sort_cmp(b) == Ordering::Equal);
        seen.len()
    }

    /// Stable sort by the given key columns. Returns the first missing key
    /// column name on failure.
    pub fn sort_by_columns(&mut self, keys: &[&str]) -> Result<(), String> {
        let idx = self.indices_of(keys)?;
        self.rows.sort_by(|a, b| {
            idx.iter()
                .map(|&i| a[i].sort_cmp(&b[i]))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        Ok(())
    }

    /// Project onto the given columns, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<Table, String> {
        let idx = self.indices_of(names)?;
        let rows = self
            .rows
            .iter()
            .map(|r| idx.iter().map(|&i| r[i].clone()).collect())
            .collect();
        Ok(Table::new(names.iter().map(|s| s.to_string()).collect(), rows))
    }

    /// Reorder columns. `order` must be a permutation of the current columns.
    pub fn reorder_columns(&mut self, order: &[String]) {
        let idx: Vec<usize> = order
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();
        debug_assert_eq!(idx.len(), self.columns.len());
        self.columns = idx.iter().map(|&i| self.columns[i].clone()).collect();
        for row in &mut self.rows {
            let mut old = std::mem::take(row);
            *row = idx.iter().map(|&i| std::mem::replace(&mut old[i], Value::Null)).collect();
        }
    }

    pub fn indices_of(&self, names: &[&str]) -> Result<Vec<usize>, String> {
        names
            .iter()
            .map(|name| self.column_index(name).ok_or_else(|| (*name).to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Value {
        Value::Str(v.to_string())
    }

    fn table() -> Table {
        Table::new(
            vec!["agency".into(), "year_month".into(), "volume".into()],
            vec![
                vec![s("Agency_02"), Value::Int(201302), Value::Float(3.5)],
                vec![s("Agency_01"), Value::Int(201302), Value::Null],
                vec![s("Agency_01"), Value::Int(201301), Value::Int(7)],
            ],
        )
    }

    #[test]
    fn sort_is_by_key_tuple() {
        let mut t = table();
        t.sort_by_columns(&["agency", "year_month"]).unwrap();
        let keys: Vec<_> = t
            .records()
            .map(|r| (r.get("agency").cloned(), r.get("year_month").cloned()))
            .collect();
        assert_eq!(keys[0], (Some(s("Agency_01")), Some(Value::Int(201301))));
        assert_eq!(keys[2], (Some(s("Agency_02")), Some(Value::Int(201302))));
    }

    #[test]
    fn nulls_sort_last() {
        let mut t = table();
        t.sort_by_columns(&["volume"]).unwrap();
        assert_eq!(t.get(0, "volume"), Some(&Value::Float(3.5)));
        assert_eq!(t.get(2, "volume"), Some(&Value::Null));
    }

    #[test]
    fn sort_reports_missing_key() {
        let mut t = table();
        assert_eq!(t.sort_by_columns(&["sku"]), Err("sku".to_string()));
    }

    #[test]
    fn set_column_replaces_or_appends() {
        let mut t = table();
        t.set_column("volume", vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(t.width(), 3);
        t.set_column("year", vec![Value::Int(2013); 3]);
        assert_eq!(t.columns().last().map(String::as_str), Some("year"));
        assert_eq!(t.get(1, "volume"), Some(&Value::Int(2)));
    }

    #[test]
    fn reorder_moves_cells_with_their_column() {
        let mut t = table();
        t.reorder_columns(&["volume".into(), "agency".into(), "year_month".into()]);
        assert_eq!(t.columns()[0], "volume");
        assert_eq!(t.rows()[0][1], s("Agency_02"));
    }

    #[test]
    fn counts_nulls_and_distinct_values() {
        let t = table();
        assert_eq!(t.null_count("volume"), 1);
        assert_eq!(t.distinct_count("agency"), 2);
        assert_eq!(t.null_count("absent"), 0);
    }
}

//! Run summary: dataset shapes, Unified Table characteristics, missing values,
//! and the merge report.
//!
//! Computing the summary and rendering it are separate so the numbers can be
//! checked in tests and serialized with `--report-json`.

use serde::Serialize;

use crate::data::merge::{MergeReport, SourceTables};
use crate::domain::{SourceName, Table, Value};

pub mod format;

pub use format::*;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetShape {
    pub dataset: SourceName,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMissing {
    pub column: String,
    pub missing: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub unified_rows: usize,
    pub unified_columns: usize,
    pub datasets: Vec<DatasetShape>,
    pub unique_agencies: usize,
    pub unique_skus: usize,
    pub year_month_min: Option<String>,
    pub year_month_max: Option<String>,
    pub distinct_months: usize,
    /// Columns with at least one null, in table order.
    pub missing: Vec<ColumnMissing>,
    pub merge: MergeReport,
}

impl PipelineSummary {
    pub fn build(unified: &Table, datasets: &SourceTables, merge: &MergeReport) -> Self {
        let (year_month_min, year_month_max) = min_max(unified, "year_month");

        let rows = unified.len();
        let missing = unified
            .columns()
            .iter()
            .map(|column| (column, unified.null_count(column)))
            .filter(|(_, count)| *count > 0)
            .map(|(column, count)| ColumnMissing {
                column: column.clone(),
                missing: count,
                percent: 100.0 * count as f64 / rows as f64,
            })
            .collect();

        Self {
            unified_rows: rows,
            unified_columns: unified.width(),
            datasets: datasets
                .iter()
                .map(|(dataset, table)| DatasetShape {
                    dataset: *dataset,
                    rows: table.len(),
                    columns: table.width(),
                })
                .collect(),
            unique_agencies: unified.distinct_count("agency"),
            unique_skus: unified.distinct_count("sku"),
            year_month_min,
            year_month_max,
            distinct_months: unified.distinct_count("year_month"),
            missing,
            merge: merge.clone(),
        }
    }
}

fn min_max(table: &Table, column: &str) -> (Option<String>, Option<String>) {
    let Some(cells) = table.column(column) else {
        return (None, None);
    };
    let present: Vec<&Value> = cells.filter(|v| !v.is_null()).collect();
    let min = present.iter().copied().min_by(|a, b| a.sort_cmp(b));
    let max = present.iter().copied().max_by(|a, b| a.sort_cmp(b));
    (min.map(Value::to_string), max.map(Value::to_string))
}

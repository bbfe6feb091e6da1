//! Joins the seven loaded tables into the Unified Table.
//!
//! The base table is `historical_volume`; every other source is left-joined
//! onto it in a fixed order. Each join is one `JoinStep` row: keys, expected
//! cardinality, which right-hand columns to bring over, and the indicator
//! column whose null count becomes the step's missing count.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::domain::{SourceName, Table, Value};
use crate::error::PipelineError;

/// Loaded tables keyed by source.
pub type SourceTables = BTreeMap<SourceName, Table>;

/// Final row order of the Unified Table.
pub const UNIFIED_SORT_KEY: [&str; 3] = ["agency", "sku", "year_month"];

/// Leading columns of the Unified Table, in order. Anything not listed
/// follows alphabetically.
pub const COLUMN_PRIORITY: &[&[&str]] = &[
    &["agency", "sku"],
    &["year_month", "year", "month"],
    &["volume"],
    &["price", "sales", "promotions", "total_revenue", "promo_ratio"],
    &[
        "total_events",
        "easter_day",
        "good_friday",
        "new_year",
        "christmas",
        "labor_day",
        "independence_day",
        "revolution_day_memorial",
        "regional_games",
        "fifa_u17_world_cup",
        "football_gold_cup",
        "beer_capital",
        "music_fest",
    ],
    &["avg_max_temp", "temp_category"],
    &[
        "avg_population_2017",
        "avg_yearly_household_income_2017",
        "income_quintile",
        "population_segment",
    ],
    &[
        "industry_volume",
        "industry_volume_yoy_growth",
        "industry_volume_mom_growth",
        "soda_volume",
        "soda_volume_yoy_growth",
        "soda_volume_mom_growth",
    ],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Keys unique on both sides.
    OneToOne,
    /// Keys unique on the right side.
    ManyToOne,
}

impl Cardinality {
    pub fn as_str(self) -> &'static str {
        match self {
            Cardinality::OneToOne => "1:1",
            Cardinality::ManyToOne => "m:1",
        }
    }
}

/// Right-hand columns carried into the join (keys are always included).
#[derive(Debug, Clone, Copy)]
pub enum RightColumns {
    Only(&'static [&'static str]),
    AllExcept(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
pub struct JoinStep {
    pub source: SourceName,
    pub keys: &'static [&'static str],
    pub cardinality: Cardinality,
    pub columns: RightColumns,
    pub indicator: &'static str,
    pub report_key: &'static str,
    /// Human label used in the text report.
    pub label: &'static str,
}

pub static JOIN_STEPS: [JoinStep; 6] = [
    JoinStep {
        source: SourceName::PriceSalesPromotion,
        keys: &["agency", "sku", "year_month"],
        cardinality: Cardinality::OneToOne,
        columns: RightColumns::Only(&["price", "sales", "promotions", "total_revenue", "promo_ratio"]),
        indicator: "price",
        report_key: "price_sales_missing",
        label: "Price/Sales",
    },
    JoinStep {
        source: SourceName::EventCalendar,
        keys: &["year_month"],
        cardinality: Cardinality::ManyToOne,
        columns: RightColumns::AllExcept(&["year", "month"]),
        indicator: "total_events",
        report_key: "event_calendar_missing",
        label: "Events",
    },
    JoinStep {
        source: SourceName::Weather,
        keys: &["agency", "year_month"],
        cardinality: Cardinality::ManyToOne,
        columns: RightColumns::Only(&["avg_max_temp", "temp_category"]),
        indicator: "avg_max_temp",
        report_key: "weather_missing",
        label: "Weather",
    },
    JoinStep {
        source: SourceName::Demographics,
        keys: &["agency"],
        cardinality: Cardinality::ManyToOne,
        columns: RightColumns::Only(&[
            "avg_population_2017",
            "avg_yearly_household_income_2017",
            "income_quintile",
            "population_segment",
        ]),
        indicator: "avg_population_2017",
        report_key: "demographics_missing",
        label: "Demographics",
    },
    JoinStep {
        source: SourceName::IndustryVolume,
        keys: &["year_month"],
        cardinality: Cardinality::ManyToOne,
        columns: RightColumns::Only(&[
            "industry_volume",
            "industry_volume_yoy_growth",
            "industry_volume_mom_growth",
        ]),
        indicator: "industry_volume",
        report_key: "industry_volume_missing",
        label: "Industry Volume",
    },
    JoinStep {
        source: SourceName::IndustrySodaSales,
        keys: &["year_month"],
        cardinality: Cardinality::ManyToOne,
        columns: RightColumns::Only(&["soda_volume", "soda_volume_yoy_growth", "soda_volume_mom_growth"]),
        indicator: "soda_volume",
        report_key: "industry_soda_missing",
        label: "Industry Soda",
    },
];

/// Missing count of one join step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinStats {
    pub dataset: SourceName,
    pub report_key: &'static str,
    #[serde(skip)]
    pub label: &'static str,
    pub missing: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub initial_rows: usize,
    pub final_rows: usize,
    pub final_columns: usize,
    pub joins: Vec<JoinStats>,
}

impl MergeReport {
    /// Missing count by report key (e.g. `weather_missing`).
    pub fn missing_for(&self, report_key: &str) -> Option<usize> {
        self.joins.iter().find(|j| j.report_key == report_key).map(|j| j.missing)
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub table: Table,
    pub report: MergeReport,
}

/// Runs the join chain. Stateless: every call returns a fresh report.
#[derive(Debug, Clone, Copy, Default)]
pub struct Merger;

impl Merger {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip_all)]
    pub fn merge_all(&self, tables: &SourceTables) -> Result<MergeOutcome, PipelineError> {
        let base = require(tables, SourceName::HistoricalVolume)?;
        let mut report = MergeReport {
            initial_rows: base.len(),
            ..MergeReport::default()
        };
        info!(rows = base.len(), "starting merge from historical_volume");

        let mut unified = base.clone();
        for step in &JOIN_STEPS {
            let right = require(tables, step.source)?;
            let (joined, indicator) = left_join(&unified, right, step)?;
            unified = joined;

            let missing = unified.null_count(&indicator);
            if missing > 0 {
                warn!(dataset = %step.source, missing, "missing {} data for {missing} records", step.label);
            }
            report.joins.push(JoinStats {
                dataset: step.source,
                report_key: step.report_key,
                label: step.label,
                missing,
            });
        }

        unified
            .sort_by_columns(&UNIFIED_SORT_KEY)
            .map_err(|column| PipelineError::MissingColumn {
                dataset: "unified".to_string(),
                column,
            })?;
        let order = column_order(unified.columns());
        unified.reorder_columns(&order);

        report.final_rows = unified.len();
        report.final_columns = unified.width();
        info!(rows = report.final_rows, columns = report.final_columns, "merge complete");

        Ok(MergeOutcome { table: unified, report })
    }
}

fn require(tables: &SourceTables, source: SourceName) -> Result<&Table, PipelineError> {
    tables.get(&source).ok_or_else(|| PipelineError::DataNotLoadedYet {
        what: format!("Dataset '{source}'"),
    })
}

/// Priority groups first, then the remaining columns alphabetically.
pub fn column_order(columns: &[String]) -> Vec<String> {
    let mut remaining: HashSet<&str> = columns.iter().map(String::as_str).collect();
    let mut ordered = Vec::with_capacity(columns.len());

    for name in COLUMN_PRIORITY.iter().flat_map(|group| group.iter()) {
        if remaining.remove(name) {
            ordered.push((*name).to_string());
        }
    }

    let mut rest: Vec<&str> = remaining.into_iter().collect();
    rest.sort_unstable();
    ordered.extend(rest.into_iter().map(str::to_string));
    ordered
}

/// Hashable form of a key cell. Integral floats hash like the equal integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyPart {
    Int(i64),
    Float(u64),
    Str(String),
}

fn key_part(value: &Value) -> Option<KeyPart> {
    match value {
        Value::Null => None,
        Value::Int(v) => Some(KeyPart::Int(*v)),
        Value::Float(v) if v.is_nan() => None,
        Value::Float(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Some(KeyPart::Int(*v as i64)),
        Value::Float(v) => Some(KeyPart::Float(v.to_bits())),
        Value::Str(s) => Some(KeyPart::Str(s.clone())),
    }
}

/// `None` when any key cell is null; such rows never match.
fn row_key(row: &[Value], idx: &[usize]) -> Option<Vec<KeyPart>> {
    idx.iter().map(|&i| key_part(&row[i])).collect()
}

/// Map each distinct non-null key to its first row; error if any key repeats.
fn unique_index(
    table: &Table,
    idx: &[usize],
    step: &JoinStep,
    side: &'static str,
) -> Result<HashMap<Vec<KeyPart>, usize>, PipelineError> {
    let mut index: HashMap<Vec<KeyPart>, usize> = HashMap::with_capacity(table.len());
    let mut counts: HashMap<Vec<KeyPart>, usize> = HashMap::new();
    let mut example = None;

    for (row_idx, row) in table.rows().iter().enumerate() {
        let Some(key) = row_key(row, idx) else { continue };
        if index.contains_key(&key) {
            example.get_or_insert(row_idx);
            *counts.entry(key).or_insert(1) += 1;
        } else {
            index.insert(key, row_idx);
        }
    }

    match example {
        None => Ok(index),
        Some(row_idx) => {
            let row = &table.rows()[row_idx];
            let example = idx.iter().map(|&i| row[i].to_string()).collect::<Vec<_>>().join(", ");
            Err(PipelineError::MergeCardinalityViolation {
                step: step.source,
                expected: step.cardinality.as_str(),
                side,
                keys: step.keys.iter().map(|k| (*k).to_string()).collect(),
                duplicate_keys: counts.len(),
                example: format!("({example})"),
            })
        }
    }
}

/// Left join `right` onto `left` for one step. Returns the joined table and
/// the final name of the step's indicator column.
fn left_join(left: &Table, right: &Table, step: &JoinStep) -> Result<(Table, String), PipelineError> {
    let right = select_right(right, step)?;

    let left_idx = left.indices_of(step.keys).map_err(|column| PipelineError::MissingColumn {
        dataset: "unified".to_string(),
        column,
    })?;
    let right_key_idx = right.indices_of(step.keys).map_err(|column| PipelineError::MissingColumn {
        dataset: step.source.to_string(),
        column,
    })?;

    let right_index = unique_index(&right, &right_key_idx, step, "right")?;
    if step.cardinality == Cardinality::OneToOne {
        unique_index(left, &left_idx, step, "left")?;
    }

    // Right-hand value columns: everything but the keys.
    let value_idx: Vec<usize> = (0..right.width()).filter(|i| !right_key_idx.contains(i)).collect();
    let value_names: HashSet<&str> = value_idx.iter().map(|&i| right.columns()[i].as_str()).collect();
    let is_key = |name: &str| step.keys.contains(&name);

    let mut columns: Vec<String> = left
        .columns()
        .iter()
        .map(|c| {
            if !is_key(c.as_str()) && value_names.contains(c.as_str()) {
                format!("{c}_x")
            } else {
                c.clone()
            }
        })
        .collect();
    let left_names: HashSet<&str> = left.columns().iter().map(String::as_str).collect();
    let mut indicator = step.indicator.to_string();
    for &i in &value_idx {
        let name = &right.columns()[i];
        if left_names.contains(name.as_str()) {
            if name == step.indicator {
                indicator = format!("{name}_y");
            }
            columns.push(format!("{name}_y"));
        } else {
            columns.push(name.clone());
        }
    }

    let mut matched = 0usize;
    let rows: Vec<Vec<Value>> = left
        .rows()
        .iter()
        .map(|row| {
            let hit = row_key(row, &left_idx).and_then(|key| right_index.get(&key).copied());
            let mut out = Vec::with_capacity(columns.len());
            out.extend(row.iter().cloned());
            match hit {
                Some(r) => {
                    matched += 1;
                    let right_row = &right.rows()[r];
                    out.extend(value_idx.iter().map(|&i| right_row[i].clone()));
                }
                None => out.extend(std::iter::repeat_n(Value::Null, value_idx.len())),
            }
            out
        })
        .collect();

    debug!(
        dataset = %step.source,
        cardinality = step.cardinality.as_str(),
        left_rows = left.len(),
        right_rows = right.len(),
        matched,
        "joined"
    );
    Ok((Table::new(columns, rows), indicator))
}

fn select_right(right: &Table, step: &JoinStep) -> Result<Table, PipelineError> {
    let names: Vec<&str> = match step.columns {
        RightColumns::Only(columns) => step.keys.iter().chain(columns).copied().collect(),
        RightColumns::AllExcept(excluded) => right
            .columns()
            .iter()
            .map(String::as_str)
            .filter(|c| !excluded.contains(c))
            .collect(),
    };
    right.select(&names).map_err(|column| PipelineError::MissingColumn {
        dataset: step.source.to_string(),
        column,
    })
}

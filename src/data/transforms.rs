//! Source-specific derived columns.
//!
//! Every transform has the same shape, `fn(&mut Table, SourceName)`, so the
//! loader strategy table can hold them as plain function pointers. Derived
//! cells are null whenever an input cell is null or non-numeric; validation
//! (run afterwards) is what rejects bad inputs.

use crate::domain::{SourceName, Table, Value};
use crate::error::PipelineError;
use crate::schema::contracts::EVENT_FLAGS;

pub type Transform = fn(&mut Table, SourceName) -> Result<(), PipelineError>;

/// Guard added to the `promo_ratio` denominator so zero-revenue rows divide
/// cleanly (they come out as a tiny ratio, not null).
pub const PROMO_RATIO_EPSILON: f64 = 1e-9;

/// Upper bounds of the temperature buckets; anything above the last is `hot`.
const TEMP_BUCKETS: [(f64, &str); 4] = [(15.0, "very_cold"), (20.0, "cold"), (25.0, "moderate"), (30.0, "warm")];

/// Upper bounds of the population buckets; anything above the last is `xlarge`.
const POPULATION_BUCKETS: [(f64, &str); 3] = [(1.7e6, "small"), (2.0e6, "medium"), (2.5e6, "large")];

const QUINTILE_LABELS: [&str; 5] = ["Q1", "Q2", "Q3", "Q4", "Q5"];

pub fn historical_volume(table: &mut Table, source: SourceName) -> Result<(), PipelineError> {
    add_year_month_parts(table, source)
}

pub fn price_sales_promotion(table: &mut Table, source: SourceName) -> Result<(), PipelineError> {
    add_year_month_parts(table, source)?;

    let sales = column_values(table, source, "sales")?;
    let promotions = column_values(table, source, "promotions")?;

    let total_revenue: Vec<Value> = sales.iter().zip(&promotions).map(|(s, p)| add(s, p)).collect();
    let promo_ratio: Vec<Value> = promotions
        .iter()
        .zip(&total_revenue)
        .map(|(p, total)| match (p.as_f64(), total.as_f64()) {
            (Some(p), Some(total)) => float_or_null(p / (total + PROMO_RATIO_EPSILON)),
            _ => Value::Null,
        })
        .collect();

    table.set_column("total_revenue", total_revenue);
    table.set_column("promo_ratio", promo_ratio);
    Ok(())
}

pub fn event_calendar(table: &mut Table, source: SourceName) -> Result<(), PipelineError> {
    add_year_month_parts(table, source)?;

    let idx = table
        .indices_of(&EVENT_FLAGS)
        .map_err(|column| missing_column(source, column))?;

    let total_events: Vec<Value> = table
        .rows()
        .iter()
        .map(|row| sum_skipping_nulls(idx.iter().map(|&i| &row[i])))
        .collect();

    table.set_column("total_events", total_events);
    Ok(())
}

pub fn weather(table: &mut Table, source: SourceName) -> Result<(), PipelineError> {
    add_year_month_parts(table, source)?;

    let categories: Vec<Value> = column_values(table, source, "avg_max_temp")?
        .iter()
        .map(|v| match v.as_f64() {
            Some(t) if !t.is_nan() => Value::Str(bucket(t, &TEMP_BUCKETS, "hot").to_string()),
            _ => Value::Null,
        })
        .collect();

    table.set_column("temp_category", categories);
    Ok(())
}

pub fn demographics(table: &mut Table, source: SourceName) -> Result<(), PipelineError> {
    let income = column_values(table, source, "avg_yearly_household_income_2017")?;
    let quintiles = quintile_labels(&income).map_err(|message| PipelineError::InvalidTransform {
        dataset: source,
        message,
    })?;

    let segments: Vec<Value> = column_values(table, source, "avg_population_2017")?
        .iter()
        .map(|v| match v.as_f64() {
            Some(p) if p >= 0.0 => Value::Str(bucket(p, &POPULATION_BUCKETS, "xlarge").to_string()),
            _ => Value::Null,
        })
        .collect();

    table.set_column("income_quintile", quintiles);
    table.set_column("population_segment", segments);
    Ok(())
}

pub fn industry_volume(table: &mut Table, source: SourceName) -> Result<(), PipelineError> {
    add_year_month_parts(table, source)?;
    add_growth_columns(table, source, "industry_volume")
}

pub fn industry_soda_sales(table: &mut Table, source: SourceName) -> Result<(), PipelineError> {
    add_year_month_parts(table, source)?;
    add_growth_columns(table, source, "soda_volume")
}

/// `year = year_month div 100`, `month = year_month mod 100` (floor semantics).
fn add_year_month_parts(table: &mut Table, source: SourceName) -> Result<(), PipelineError> {
    let (years, months): (Vec<Value>, Vec<Value>) = column_values(table, source, "year_month")?
        .iter()
        .map(|v| match v {
            Value::Int(v) => (Value::Int(v.div_euclid(100)), Value::Int(v.rem_euclid(100))),
            Value::Float(v) if v.is_finite() => {
                (Value::Float((v / 100.0).floor()), Value::Float(v.rem_euclid(100.0)))
            }
            _ => (Value::Null, Value::Null),
        })
        .unzip();

    table.set_column("year", years);
    table.set_column("month", months);
    Ok(())
}

/// Month-over-month and year-over-year percent change of `column` over the
/// table sorted by `year_month`.
fn add_growth_columns(table: &mut Table, source: SourceName, column: &str) -> Result<(), PipelineError> {
    table
        .sort_by_columns(&["year_month"])
        .map_err(|column| missing_column(source, column))?;

    let values = column_values(table, source, column)?;
    table.set_column(&format!("{column}_yoy_growth"), pct_change(&values, 12));
    table.set_column(&format!("{column}_mom_growth"), pct_change(&values, 1));
    Ok(())
}

/// `(x[i] - x[i - lag]) / x[i - lag]`; null for the first `lag` rows and
/// wherever either operand is null.
pub fn pct_change(values: &[Value], lag: usize) -> Vec<Value> {
    (0..values.len())
        .map(|i| {
            if i < lag {
                return Value::Null;
            }
            match (values[i].as_f64(), values[i - lag].as_f64()) {
                (Some(cur), Some(prev)) => float_or_null((cur - prev) / prev),
                _ => Value::Null,
            }
        })
        .collect()
}

/// Equal-frequency 5-way bucketing with linearly interpolated quantile edges.
/// Buckets are right-closed and the lowest edge is included in Q1.
pub fn quintile_labels(values: &[Value]) -> Result<Vec<Value>, String> {
    let mut sorted: Vec<f64> = values.iter().filter_map(Value::as_f64).filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return Ok(vec![Value::Null; values.len()]);
    }
    sorted.sort_by(f64::total_cmp);

    let edges: Vec<f64> = (0..=5).map(|k| quantile(&sorted, k as f64 / 5.0)).collect();
    if edges.windows(2).any(|w| w[0] == w[1]) {
        return Err(format!(
            "Bin edges must be unique for income quintiles: {edges:?} (need at least 5 distinct incomes)"
        ));
    }

    Ok(values
        .iter()
        .map(|v| match v.as_f64() {
            Some(x) if !x.is_nan() => edges[1..]
                .iter()
                .position(|&edge| x <= edge)
                .map_or(Value::Null, |i| Value::Str(QUINTILE_LABELS[i].to_string())),
            _ => Value::Null,
        })
        .collect())
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn bucket(value: f64, buckets: &[(f64, &'static str)], overflow: &'static str) -> &'static str {
    buckets
        .iter()
        .find(|(upper, _)| value <= *upper)
        .map_or(overflow, |&(_, label)| label)
}

fn add(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_add(*b)
            .map_or_else(|| Value::Float(*a as f64 + *b as f64), Value::Int),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => float_or_null(a + b),
            _ => Value::Null,
        },
    }
}

/// Row sum that skips nulls; a string cell makes the sum null.
fn sum_skipping_nulls<'a>(cells: impl Iterator<Item = &'a Value>) -> Value {
    // `None` once the integer sum overflows; the float sum takes over.
    let mut int_sum: Option<i64> = Some(0);
    let mut float_sum: f64 = 0.0;
    let mut saw_float = false;
    for cell in cells {
        match cell {
            Value::Null => {}
            Value::Int(v) => {
                int_sum = int_sum.and_then(|sum| sum.checked_add(*v));
                float_sum += *v as f64;
            }
            Value::Float(v) => {
                saw_float = true;
                float_sum += v;
            }
            Value::Str(_) => return Value::Null,
        }
    }
    match int_sum {
        Some(sum) if !saw_float => Value::Int(sum),
        _ => float_or_null(float_sum),
    }
}

fn float_or_null(v: f64) -> Value {
    if v.is_nan() { Value::Null } else { Value::Float(v) }
}

fn column_values(table: &Table, source: SourceName, column: &str) -> Result<Vec<Value>, PipelineError> {
    table
        .column(column)
        .map(|cells| cells.cloned().collect())
        .ok_or_else(|| missing_column(source, column.to_string()))
}

fn missing_column(source: SourceName, column: String) -> PipelineError {
    PipelineError::MissingColumn {
        dataset: source.to_string(),
        column,
    }
}

//! Record contracts.
//!
//! A contract is a declarative list of `(field, kind, constraints)` evaluated
//! uniformly against one record at a time. Validation is pure and exhaustive:
//! every failing field of a record is reported, and no state is carried
//! between records.
//!
//! Type checks are lax in the usual way for tabular inputs: an integer field
//! accepts integral floats and integer strings, a float field accepts integers
//! and numeric strings, and string fields are matched after trimming.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{Record, Value};

pub mod contracts;

pub use contracts::contract_for;

static AGENCY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Agency_\d+$").expect("valid agency regex"));
static SKU_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^SKU_\d+$").expect("valid sku regex"));

/// Primitive type a field must coerce to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    Int,
    Float,
}

/// Identifier shapes used across contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPattern {
    /// `Agency_<digits>`
    Agency,
    /// `SKU_<digits>`
    Sku,
}

impl IdPattern {
    fn regex(self) -> &'static Regex {
        match self {
            IdPattern::Agency => &*AGENCY_RE,
            IdPattern::Sku => &*SKU_RE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    Pattern(IdPattern),
    /// Inclusive lower bound.
    Ge(f64),
    /// Inclusive upper bound.
    Le(f64),
    /// Exclusive lower bound.
    Gt(f64),
    /// `YYYYMM` decomposition check, optionally bounding the year.
    YearMonth { years: Option<(i64, i64)> },
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub constraints: &'static [Constraint],
}

#[derive(Debug, Clone, Copy)]
pub struct RecordContract {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A field value after type coercion.
#[derive(Debug, Clone, Copy)]
enum Coerced<'a> {
    Str(&'a str),
    Int(i64),
    Float(f64),
}

impl Coerced<'_> {
    fn as_f64(self) -> Option<f64> {
        match self {
            Coerced::Int(v) => Some(v as f64),
            Coerced::Float(v) => Some(v),
            Coerced::Str(_) => None,
        }
    }
}

impl RecordContract {
    /// Check one record. Returns every field violation found.
    pub fn validate(&self, record: &Record<'_>) -> Result<(), Vec<FieldViolation>> {
        let violations: Vec<FieldViolation> = self
            .fields
            .iter()
            .flat_map(|field| check_field(field, record.get(field.name)))
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

fn check_field(field: &FieldSpec, value: Option<&Value>) -> Vec<FieldViolation> {
    let violation = |message: String| FieldViolation {
        field: field.name,
        message,
    };

    let value = match value {
        None | Some(Value::Null) => return vec![violation("Field required".to_string())],
        Some(v) => v,
    };

    let coerced = match coerce(value, field.kind) {
        Ok(c) => c,
        Err(message) => return vec![violation(message)],
    };

    field
        .constraints
        .iter()
        .filter_map(|constraint| check_constraint(*constraint, coerced).err())
        .map(violation)
        .collect()
}

fn coerce(value: &Value, kind: FieldKind) -> Result<Coerced<'_>, String> {
    match (kind, value) {
        (FieldKind::Str, Value::Str(s)) => Ok(Coerced::Str(s.trim())),
        (FieldKind::Str, _) => Err("Input should be a valid string".to_string()),

        (FieldKind::Int, Value::Int(v)) => Ok(Coerced::Int(*v)),
        (FieldKind::Int, Value::Float(v)) if v.is_finite() && v.fract() == 0.0 => Ok(Coerced::Int(*v as i64)),
        (FieldKind::Int, Value::Float(_)) => {
            Err("Input should be a valid integer, got a number with a fractional part".to_string())
        }
        (FieldKind::Int, Value::Str(s)) => s
            .trim()
            .parse::<i64>()
            .map(Coerced::Int)
            .map_err(|_| "Input should be a valid integer, unable to parse string as an integer".to_string()),

        (FieldKind::Float, Value::Int(v)) => Ok(Coerced::Float(*v as f64)),
        (FieldKind::Float, Value::Float(v)) => Ok(Coerced::Float(*v)),
        (FieldKind::Float, Value::Str(s)) => s
            .trim()
            .parse::<f64>()
            .map(Coerced::Float)
            .map_err(|_| "Input should be a valid number, unable to parse string as a number".to_string()),

        (_, Value::Null) => Err("Field required".to_string()),
    }
}

fn check_constraint(constraint: Constraint, value: Coerced<'_>) -> Result<(), String> {
    match constraint {
        Constraint::Pattern(pattern) => match value {
            Coerced::Str(s) if pattern.regex().is_match(s) => Ok(()),
            _ => Err(format!("String should match pattern '{}'", pattern.regex().as_str())),
        },
        Constraint::Ge(bound) => match value.as_f64() {
            Some(v) if v >= bound => Ok(()),
            _ => Err(format!("Input should be greater than or equal to {bound}")),
        },
        Constraint::Le(bound) => match value.as_f64() {
            Some(v) if v <= bound => Ok(()),
            _ => Err(format!("Input should be less than or equal to {bound}")),
        },
        Constraint::Gt(bound) => match value.as_f64() {
            Some(v) if v > bound => Ok(()),
            _ => Err(format!("Input should be greater than {bound}")),
        },
        Constraint::YearMonth { years } => match value {
            Coerced::Int(v) => check_year_month(v, years),
            _ => Err("year_month must be an integer".to_string()),
        },
    }
}

/// Split `YYYYMM` into `(year, month)` with floor semantics.
pub fn split_year_month(v: i64) -> (i64, i64) {
    (v.div_euclid(100), v.rem_euclid(100))
}

/// The single year-month rule shared by every contract that has the field.
pub fn check_year_month(v: i64, years: Option<(i64, i64)>) -> Result<(), String> {
    let (year, month) = split_year_month(v);
    if !(1..=12).contains(&month) {
        return Err(format!("Invalid month in year_month: {v}"));
    }
    if let Some((lo, hi)) = years {
        if !(lo..=hi).contains(&year) {
            return Err(format!("Invalid year in year_month: {v}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_month_month_bounds() {
        assert!(check_year_month(201301, None).is_ok());
        assert!(check_year_month(201312, None).is_ok());
        assert!(check_year_month(201313, None).is_err());
        assert!(check_year_month(201300, None).is_err());
    }

    #[test]
    fn year_month_year_bounds_only_when_requested() {
        assert!(check_year_month(210101, None).is_ok());
        let err = check_year_month(210101, Some((2000, 2100))).unwrap_err();
        assert!(err.contains("Invalid year"));
        assert!(check_year_month(200001, Some((2000, 2100))).is_ok());
    }

    #[test]
    fn split_uses_floor_division() {
        assert_eq!(split_year_month(201407), (2014, 7));
    }

    #[test]
    fn integral_float_coerces_to_int() {
        assert!(matches!(coerce(&Value::Float(3.0), FieldKind::Int), Ok(Coerced::Int(3))));
        assert!(coerce(&Value::Float(3.5), FieldKind::Int).is_err());
        assert!(matches!(coerce(&Value::Str(" 12 ".into()), FieldKind::Int), Ok(Coerced::Int(12))));
    }

    #[test]
    fn strings_are_not_numbers_and_numbers_are_not_strings() {
        assert!(coerce(&Value::Int(1), FieldKind::Str).is_err());
        assert!(coerce(&Value::Str("abc".into()), FieldKind::Float).is_err());
    }

    #[test]
    fn pattern_matches_trimmed_identifier() {
        let c = Constraint::Pattern(IdPattern::Agency);
        assert!(check_constraint(c, Coerced::Str("Agency_01")).is_ok());
        assert!(check_constraint(c, Coerced::Str("agency_01")).is_err());
        assert!(check_constraint(Constraint::Pattern(IdPattern::Sku), Coerced::Str("SKU_9")).is_ok());
    }
}

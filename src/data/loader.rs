//! Per-source loading.
//!
//! All seven sources share one fixed sequence of steps:
//!
//! - read the CSV with native typing
//! - normalize headers and apply the source's rename table
//! - run the source transform (derived columns)
//! - validate every row against the source contract (optional)
//! - stable sort by the source key
//!
//! What differs per source is data, not code: each source is one `SourceSpec`
//! row in `SOURCE_SPECS`.

use std::path::PathBuf;

use tracing::{debug, info, instrument};

use crate::data::transforms::{self, Transform};
use crate::domain::{SourceName, Table};
use crate::error::PipelineError;
use crate::io::ingest::{normalize_columns, read_csv_table};
use crate::schema::{RecordContract, contract_for};

const YEAR_MONTH_RENAME: (&str, &str) = ("yearmonth", "year_month");

/// Loader strategy for one source.
#[derive(Debug, Clone, Copy)]
pub struct SourceSpec {
    pub source: SourceName,
    /// `(normalized name, canonical name)` pairs applied after header
    /// normalization.
    pub renames: &'static [(&'static str, &'static str)],
    pub transform: Transform,
    pub sort_key: &'static [&'static str],
}

impl SourceSpec {
    pub fn contract(&self) -> &'static RecordContract {
        contract_for(self.source)
    }
}

/// One row per source, in `SourceName::ALL` order.
pub static SOURCE_SPECS: [SourceSpec; 7] = [
    SourceSpec {
        source: SourceName::HistoricalVolume,
        renames: &[YEAR_MONTH_RENAME],
        transform: transforms::historical_volume,
        sort_key: &["agency", "sku", "year_month"],
    },
    SourceSpec {
        source: SourceName::PriceSalesPromotion,
        renames: &[YEAR_MONTH_RENAME],
        transform: transforms::price_sales_promotion,
        sort_key: &["agency", "sku", "year_month"],
    },
    SourceSpec {
        source: SourceName::EventCalendar,
        renames: &[
            YEAR_MONTH_RENAME,
            ("fifa_u_17_world_cup", "fifa_u17_world_cup"),
            ("regional_games_", "regional_games"),
        ],
        transform: transforms::event_calendar,
        sort_key: &["year_month"],
    },
    SourceSpec {
        source: SourceName::Weather,
        renames: &[YEAR_MONTH_RENAME],
        transform: transforms::weather,
        sort_key: &["agency", "year_month"],
    },
    SourceSpec {
        source: SourceName::Demographics,
        renames: &[],
        transform: transforms::demographics,
        sort_key: &["agency"],
    },
    SourceSpec {
        source: SourceName::IndustryVolume,
        renames: &[YEAR_MONTH_RENAME],
        transform: transforms::industry_volume,
        sort_key: &["year_month"],
    },
    SourceSpec {
        source: SourceName::IndustrySodaSales,
        renames: &[YEAR_MONTH_RENAME],
        transform: transforms::industry_soda_sales,
        sort_key: &["year_month"],
    },
];

pub fn spec_for(source: SourceName) -> &'static SourceSpec {
    // `SOURCE_SPECS` is laid out in `SourceName` declaration order.
    &SOURCE_SPECS[source as usize]
}

/// Loads one source file into a validated, sorted `Table`.
#[derive(Debug, Clone)]
pub struct SourceLoader {
    spec: &'static SourceSpec,
    path: PathBuf,
}

impl SourceLoader {
    pub fn new(source: SourceName, path: impl Into<PathBuf>) -> Self {
        Self {
            spec: spec_for(source),
            path: path.into(),
        }
    }

    #[instrument(skip(self), fields(dataset = %self.spec.source))]
    pub fn load(&self, validate: bool) -> Result<Table, PipelineError> {
        let source = self.spec.source;

        if !self.path.exists() {
            return Err(PipelineError::SourceFileMissing {
                dataset: source,
                path: self.path.clone(),
            });
        }

        let mut table = read_csv_table(&self.path).map_err(|message| PipelineError::SourceRead {
            dataset: source,
            path: self.path.clone(),
            message,
        })?;
        debug!(path = %self.path.display(), rows = table.len(), "read source file");

        normalize_columns(&mut table, self.spec.renames, source.as_str());
        (self.spec.transform)(&mut table, source)?;

        if validate {
            validate_table(&table, self.spec.contract(), source)?;
        }

        table
            .sort_by_columns(self.spec.sort_key)
            .map_err(|column| PipelineError::MissingColumn {
                dataset: source.to_string(),
                column,
            })?;

        info!(rows = table.len(), columns = table.width(), "loaded {source}");
        Ok(table)
    }
}

/// Check every row; fail with the failure count and the first failing row's
/// violations.
fn validate_table(table: &Table, contract: &RecordContract, source: SourceName) -> Result<(), PipelineError> {
    let mut failed_rows = 0;
    let mut first_failure = None;

    for (idx, record) in table.records().enumerate() {
        if let Err(violations) = contract.validate(&record) {
            failed_rows += 1;
            if first_failure.is_none() {
                let detail = violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
                first_failure = Some(format!("row {}: {detail}", idx + 1));
            }
        }
    }

    match first_failure {
        None => {
            debug!(contract = contract.name, rows = table.len(), "validation passed");
            Ok(())
        }
        Some(first_failure) => Err(PipelineError::ValidationFailed {
            dataset: source,
            failed_rows,
            total_rows: table.len(),
            first_failure,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::domain::Value;

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn spec_table_matches_source_order() {
        for source in SourceName::ALL {
            assert_eq!(spec_for(source).source, source);
        }
    }

    #[test]
    fn loads_and_sorts_historical_volume() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "hv.csv",
            "Agency,SKU,YearMonth,Volume\n\
             Agency_02,SKU_01,201301,5.0\n\
             Agency_01,SKU_02,201302,7.5\n\
             Agency_01,SKU_02,201301,3\n",
        );

        let table = SourceLoader::new(SourceName::HistoricalVolume, path).load(true).unwrap();
        assert_eq!(table.columns(), &["agency", "sku", "year_month", "volume", "year", "month"]);
        assert_eq!(table.get(0, "year_month"), Some(&Value::Int(201301)));
        assert_eq!(table.get(0, "agency"), Some(&Value::Str("Agency_01".into())));
        assert_eq!(table.get(2, "agency"), Some(&Value::Str("Agency_02".into())));
    }

    #[test]
    fn validation_failure_reports_counts_and_first_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "hv.csv",
            "Agency,SKU,YearMonth,Volume\n\
             Agency_01,SKU_01,201301,1\n\
             Agency_01,SKU_01,201313,1\n\
             Bad,SKU_01,201302,1\n",
        );

        let err = SourceLoader::new(SourceName::HistoricalVolume, path).load(true).unwrap_err();
        match err {
            PipelineError::ValidationFailed {
                failed_rows,
                total_rows,
                first_failure,
                ..
            } => {
                assert_eq!((failed_rows, total_rows), (2, 3));
                assert!(first_failure.starts_with("row 2: year_month"), "{first_failure}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn validation_can_be_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "hv.csv", "Agency,SKU,YearMonth,Volume\nAgency_01,SKU_01,201313,-1\n");
        let table = SourceLoader::new(SourceName::HistoricalVolume, path).load(false).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn missing_file_is_reported_with_its_dataset() {
        let err = SourceLoader::new(SourceName::Weather, "/nonexistent/weather.csv")
            .load(true)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::SourceFileMissing {
                dataset: SourceName::Weather,
                ..
            }
        ));
    }

    #[test]
    fn event_calendar_headers_are_renamed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "ec.csv",
            "YearMonth,Easter Day,Good Friday,New Year,Christmas,Labor Day,Independence Day,\
             Revolution Day Memorial,Regional Games ,FIFA U-17 World Cup,Football Gold Cup,Beer Capital,Music Fest\n\
             201302,0,0,0,0,0,0,0,1,1,0,0,0\n",
        );

        let table = SourceLoader::new(SourceName::EventCalendar, path).load(true).unwrap();
        assert!(table.has_column("fifa_u17_world_cup"));
        assert!(table.has_column("regional_games"));
        assert_eq!(table.get(0, "total_events"), Some(&Value::Int(2)));
    }

    #[test]
    fn transform_needs_its_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "psp.csv", "Agency,SKU,YearMonth,Price\nAgency_01,SKU_01,201301,10\n");
        let err = SourceLoader::new(SourceName::PriceSalesPromotion, path)
            .load(true)
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { ref column, .. } if column == "sales"));
    }
}

//! Names shared by every layer: the seven sources and the output formats.
//!
//! Both are closed sets. Parsing an unknown token is an error that carries the
//! list of valid names so callers can report it directly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// One of the seven raw tabular inputs.
///
/// Declaration order is the canonical load order and the order used by
/// every `BTreeMap<SourceName, _>` in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceName {
    HistoricalVolume,
    PriceSalesPromotion,
    EventCalendar,
    Weather,
    Demographics,
    IndustryVolume,
    IndustrySodaSales,
}

impl SourceName {
    pub const ALL: [SourceName; 7] = [
        SourceName::HistoricalVolume,
        SourceName::PriceSalesPromotion,
        SourceName::EventCalendar,
        SourceName::Weather,
        SourceName::Demographics,
        SourceName::IndustryVolume,
        SourceName::IndustrySodaSales,
    ];

    /// Dataset name used by the façade (`load_dataset`, `get_dataset`).
    pub fn as_str(self) -> &'static str {
        match self {
            SourceName::HistoricalVolume => "historical_volume",
            SourceName::PriceSalesPromotion => "price_sales_promotion",
            SourceName::EventCalendar => "event_calendar",
            SourceName::Weather => "weather",
            SourceName::Demographics => "demographics",
            SourceName::IndustryVolume => "industry_volume",
            SourceName::IndustrySodaSales => "industry_soda_sales",
        }
    }

    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|s| s.as_str().to_string()).collect()
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceName {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceName::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| PipelineError::UnknownDatasetName {
                name: s.to_string(),
                available: SourceName::names(),
            })
    }
}

/// On-disk format for the unified table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Columnar, compressed; the default.
    Parquet,
    Csv,
    /// Arrow IPC file.
    Feather,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Csv => "csv",
            OutputFormat::Feather => "feather",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = PipelineError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parquet" => Ok(OutputFormat::Parquet),
            "csv" => Ok(OutputFormat::Csv),
            "feather" => Ok(OutputFormat::Feather),
            _ => Err(PipelineError::UnsupportedOutputFormat {
                format: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_names_round_trip_through_from_str() {
        for source in SourceName::ALL {
            assert_eq!(source.as_str().parse::<SourceName>().unwrap(), source);
        }
    }

    #[test]
    fn unknown_dataset_lists_valid_names() {
        let err = "sales".parse::<SourceName>().unwrap_err();
        match err {
            PipelineError::UnknownDatasetName { name, available } => {
                assert_eq!(name, "sales");
                assert_eq!(available.len(), 7);
                assert!(available.contains(&"industry_soda_sales".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn output_format_is_case_insensitive() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!(" Feather ".parse::<OutputFormat>().unwrap(), OutputFormat::Feather);
        assert!(matches!(
            "xlsx".parse::<OutputFormat>(),
            Err(PipelineError::UnsupportedOutputFormat { .. })
        ));
    }
}

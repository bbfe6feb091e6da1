//! YAML config manifest and path resolution.
//!
//! The manifest has one required table, `data_source`, mapping each of the
//! seven sources to a file path. Other top-level keys are tolerated; unknown
//! keys inside `data_source` are not.
//!
//! Relative paths resolve against a base directory, by default the parent of
//! the directory holding the config file (`config/config.yaml` → project
//! root).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::domain::SourceName;
use crate::error::PipelineError;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// The `data_source` table. Paths are stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataSourcePaths {
    #[serde(deserialize_with = "non_empty_path")]
    pub historical_volume: String,
    #[serde(
        rename = "prices_sales_promotions",
        alias = "price_sales_promotion",
        deserialize_with = "non_empty_path"
    )]
    pub price_sales_promotion: String,
    #[serde(deserialize_with = "non_empty_path")]
    pub event_calendar: String,
    #[serde(deserialize_with = "non_empty_path")]
    pub weather: String,
    #[serde(deserialize_with = "non_empty_path")]
    pub demographics: String,
    #[serde(alias = "industry+volume", deserialize_with = "non_empty_path")]
    pub industry_volume: String,
    #[serde(deserialize_with = "non_empty_path")]
    pub industry_soda_sales: String,
}

impl DataSourcePaths {
    pub fn get(&self, source: SourceName) -> &str {
        match source {
            SourceName::HistoricalVolume => &self.historical_volume,
            SourceName::PriceSalesPromotion => &self.price_sales_promotion,
            SourceName::EventCalendar => &self.event_calendar,
            SourceName::Weather => &self.weather,
            SourceName::Demographics => &self.demographics,
            SourceName::IndustryVolume => &self.industry_volume,
            SourceName::IndustrySodaSales => &self.industry_soda_sales,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    pub data_source: DataSourcePaths,
}

fn non_empty_path<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(serde::de::Error::custom("File path cannot be empty"));
    }
    Ok(trimmed.to_string())
}

/// Reads the manifest and turns it into absolute per-source paths.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    config_path: PathBuf,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ConfigResolver {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self {
            config_path: config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> Result<AppConfig, PipelineError> {
        if !self.config_path.is_file() {
            return Err(PipelineError::ConfigNotFound {
                path: self.config_path.clone(),
            });
        }

        let raw = fs::read_to_string(&self.config_path).map_err(|e| PipelineError::ConfigSchemaInvalid {
            path: self.config_path.clone(),
            message: e.to_string(),
        })?;

        serde_yaml::from_str(&raw).map_err(|e| PipelineError::ConfigSchemaInvalid {
            path: self.config_path.clone(),
            message: e.to_string(),
        })
    }

    /// Directory relative source paths are joined onto when no explicit base
    /// is given.
    pub fn default_base_dir(&self) -> PathBuf {
        match self.config_path.parent().and_then(Path::parent) {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Absolute path of every source, in canonical source order.
    pub fn resolve(&self, base_dir: Option<&Path>) -> Result<BTreeMap<SourceName, PathBuf>, PipelineError> {
        let config = self.load()?;
        let base = base_dir.map_or_else(|| self.default_base_dir(), Path::to_path_buf);

        let mut resolved = BTreeMap::new();
        for source in SourceName::ALL {
            let joined = base.join(config.data_source.get(source));
            let path = std::path::absolute(&joined).map_err(|e| PipelineError::ConfigSchemaInvalid {
                path: self.config_path.clone(),
                message: format!("cannot resolve path for {source}: {e}"),
            })?;
            debug!(dataset = %source, path = %path.display(), "resolved data path");
            resolved.insert(source, path);
        }
        Ok(resolved)
    }

    /// Resolve and check that every file exists; lists all missing sources
    /// at once.
    pub fn validate_files_exist(&self, base_dir: Option<&Path>) -> Result<BTreeMap<SourceName, PathBuf>, PipelineError> {
        let resolved = self.resolve(base_dir)?;
        let missing: Vec<(SourceName, PathBuf)> = resolved
            .iter()
            .filter(|(_, path)| !path.exists())
            .map(|(source, path)| (*source, path.clone()))
            .collect();

        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(PipelineError::MissingDataFiles { missing })
        }
    }
}

//! `DataPipeline`: the single entry point callers use.
//!
//! It owns the config resolver, the loaded tables, and the last merge result:
//!
//! - `load_all` checks the config, loads the seven sources in parallel, then
//!   merges them
//! - `load_dataset` loads one source on its own
//! - accessors hand out loaded tables, the Unified Table and the merge report
//! - `save` and `summary` work on the Unified Table

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{error, info, instrument};

use crate::config::ConfigResolver;
use crate::data::loader::SourceLoader;
use crate::data::merge::{MergeOutcome, MergeReport, Merger, SourceTables};
use crate::domain::{OutputFormat, SourceName, Table};
use crate::error::PipelineError;
use crate::report::PipelineSummary;

#[derive(Debug)]
pub struct DataPipeline {
    resolver: ConfigResolver,
    base_dir: Option<PathBuf>,
    paths: Option<BTreeMap<SourceName, PathBuf>>,
    datasets: SourceTables,
    unified: Option<MergeOutcome>,
    merger: Merger,
}

impl DataPipeline {
    /// `config_path` defaults to `config/config.yaml`; `base_dir` defaults to
    /// the config file's grandparent directory.
    pub fn new(config_path: Option<PathBuf>, base_dir: Option<PathBuf>) -> Self {
        Self {
            resolver: ConfigResolver::new(config_path),
            base_dir,
            paths: None,
            datasets: SourceTables::new(),
            unified: None,
            merger: Merger::new(),
        }
    }

    pub fn config_path(&self) -> &Path {
        self.resolver.config_path()
    }

    /// Parse the manifest and check that every data file exists.
    pub fn validate_config(&self) -> Result<BTreeMap<SourceName, PathBuf>, PipelineError> {
        match self.resolver.validate_files_exist(self.base_dir.as_deref()) {
            Ok(paths) => {
                info!(config = %self.config_path().display(), "configuration validated");
                Ok(paths)
            }
            Err(err) => {
                error!(config = %self.config_path().display(), "configuration validation failed: {err}");
                Err(err)
            }
        }
    }

    /// Load one source by name and keep it for `get_dataset`.
    pub fn load_dataset(&mut self, name: &str, validate: bool) -> Result<&Table, PipelineError> {
        let source: SourceName = name.parse()?;
        let path = self.path_for(source)?;

        info!(dataset = %source, "loading dataset");
        let table = SourceLoader::new(source, path).load(validate)?;
        self.datasets.insert(source, table);
        Ok(&self.datasets[&source])
    }

    /// Validate the config, load every source, and merge.
    ///
    /// Loads run concurrently; if several fail, the error of the first source
    /// in canonical order is returned. Previously loaded state is replaced
    /// only when the whole run succeeds.
    #[instrument(skip(self))]
    pub fn load_all(&mut self, validate: bool) -> Result<&Table, PipelineError> {
        info!("starting data load");
        let paths = self.validate_config()?;

        let results: Vec<Result<(SourceName, Table), PipelineError>> = SourceName::ALL
            .par_iter()
            .map(|&source| {
                SourceLoader::new(source, paths[&source].clone())
                    .load(validate)
                    .map(|table| (source, table))
            })
            .collect();

        let mut datasets = SourceTables::new();
        for result in results {
            let (source, table) = result?;
            datasets.insert(source, table);
        }

        info!("merging all datasets");
        let outcome = self.merger.merge_all(&datasets)?;

        self.paths = Some(paths);
        self.datasets = datasets;
        let unified = self.unified.insert(outcome);
        info!("data load complete");
        Ok(&unified.table)
    }

    pub fn get_dataset(&self, name: &str) -> Result<&Table, PipelineError> {
        let source: SourceName = name.parse()?;
        self.datasets.get(&source).ok_or_else(|| PipelineError::DataNotLoadedYet {
            what: format!("Dataset '{source}'"),
        })
    }

    pub fn get_unified_table(&self) -> Result<&Table, PipelineError> {
        self.unified.as_ref().map(|u| &u.table).ok_or_else(unified_not_loaded)
    }

    /// Report of the last successful merge, if any.
    pub fn merge_report(&self) -> Option<&MergeReport> {
        self.unified.as_ref().map(|u| &u.report)
    }

    /// Write the Unified Table. `format` is `parquet`, `csv` or `feather`
    /// (case-insensitive).
    pub fn save(&self, path: &Path, format: &str) -> Result<(), PipelineError> {
        let table = self.get_unified_table()?;
        let format: OutputFormat = format.parse()?;
        info!(path = %path.display(), %format, "saving unified table");
        crate::io::export::write_table(path, table, format)
    }

    pub fn summary(&self) -> Result<PipelineSummary, PipelineError> {
        let unified = self.unified.as_ref().ok_or_else(unified_not_loaded)?;
        Ok(PipelineSummary::build(&unified.table, &self.datasets, &unified.report))
    }

    fn path_for(&mut self, source: SourceName) -> Result<PathBuf, PipelineError> {
        if self.paths.is_none() {
            self.paths = Some(self.resolver.resolve(self.base_dir.as_deref())?);
        }
        self.paths
            .as_ref()
            .and_then(|paths| paths.get(&source).cloned())
            .ok_or_else(|| PipelineError::DataNotLoadedYet {
                what: format!("Path for '{source}'"),
            })
    }
}

fn unified_not_loaded() -> PipelineError {
    PipelineError::DataNotLoadedYet {
        what: "Unified data".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_fail_before_loading() {
        let pipeline = DataPipeline::new(Some(PathBuf::from("/nonexistent/config.yaml")), None);

        assert!(matches!(
            pipeline.get_unified_table(),
            Err(PipelineError::DataNotLoadedYet { .. })
        ));
        assert!(matches!(
            pipeline.get_dataset("weather"),
            Err(PipelineError::DataNotLoadedYet { .. })
        ));
        assert!(matches!(
            pipeline.get_dataset("sales"),
            Err(PipelineError::UnknownDatasetName { .. })
        ));
        assert!(pipeline.merge_report().is_none());
        assert!(pipeline.summary().is_err());
    }

    #[test]
    fn save_requires_loaded_data() {
        let pipeline = DataPipeline::new(None, None);
        let err = pipeline.save(Path::new("out.parquet"), "parquet").unwrap_err();
        assert_eq!(err.exit_code(), 70);
    }

    #[test]
    fn load_all_reports_missing_config() {
        let mut pipeline = DataPipeline::new(Some(PathBuf::from("/nonexistent/config.yaml")), None);
        assert!(matches!(
            pipeline.load_all(true),
            Err(PipelineError::ConfigNotFound { .. })
        ));
    }
}

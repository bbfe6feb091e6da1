//! Error types.
//!
//! `PipelineError` is the typed taxonomy raised by the library (config, load,
//! merge, export). `AppError` is what the binary reports: a message plus the
//! process exit code, built from any `PipelineError`.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::SourceName;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Config file not found: {}", .path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config '{}': {message}", .path.display())]
    ConfigSchemaInvalid { path: PathBuf, message: String },

    #[error("Missing data files:\n{}", format_missing(.missing))]
    MissingDataFiles { missing: Vec<(SourceName, PathBuf)> },

    #[error("Data file not found for {dataset}: {}", .path.display())]
    SourceFileMissing { dataset: SourceName, path: PathBuf },

    #[error("Failed to read {dataset} from '{}': {message}", .path.display())]
    SourceRead {
        dataset: SourceName,
        path: PathBuf,
        message: String,
    },

    #[error("{dataset}: required column `{column}` is missing")]
    MissingColumn { dataset: String, column: String },

    #[error("{dataset}: {message}")]
    InvalidTransform { dataset: SourceName, message: String },

    #[error("Validation failed for {failed_rows} of {total_rows} {dataset} records\nFirst error: {first_failure}")]
    ValidationFailed {
        dataset: SourceName,
        failed_rows: usize,
        total_rows: usize,
        first_failure: String,
    },

    #[error(
        "Merge of {step} is not {expected}: {duplicate_keys} duplicated key(s) on the {side} side on ({}), e.g. {example}",
        .keys.join(", ")
    )]
    MergeCardinalityViolation {
        step: SourceName,
        expected: &'static str,
        side: &'static str,
        keys: Vec<String>,
        duplicate_keys: usize,
        example: String,
    },

    #[error("Unknown dataset: {name}. Available: {}", .available.join(", "))]
    UnknownDatasetName { name: String, available: Vec<String> },

    #[error("{what} not loaded. Call load_all() first.")]
    DataNotLoadedYet { what: String },

    #[error("Unsupported format: {format}. Use 'parquet', 'csv', or 'feather'")]
    UnsupportedOutputFormat { format: String },

    #[error("Failed to write '{}': {message}", .path.display())]
    Export { path: PathBuf, message: String },
}

fn format_missing(missing: &[(SourceName, PathBuf)]) -> String {
    missing
        .iter()
        .map(|(name, path)| format!("  - {name}: {}", path.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

impl PipelineError {
    /// Process exit code used when this error terminates the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::ConfigNotFound { .. }
            | PipelineError::ConfigSchemaInvalid { .. }
            | PipelineError::MissingDataFiles { .. }
            | PipelineError::SourceFileMissing { .. }
            | PipelineError::SourceRead { .. }
            | PipelineError::UnknownDatasetName { .. }
            | PipelineError::UnsupportedOutputFormat { .. } => 2,
            PipelineError::MissingColumn { .. }
            | PipelineError::InvalidTransform { .. }
            | PipelineError::ValidationFailed { .. } => 3,
            PipelineError::MergeCardinalityViolation { .. } => 4,
            PipelineError::Export { .. } => 5,
            PipelineError::DataNotLoadedYet { .. } => 70,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

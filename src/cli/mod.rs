//! Command-line parsing for the `stallion` binary.
//!
//! Argument parsing and command dispatch stay separate from the loading and
//! merging code, which lives in the library.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::DEFAULT_CONFIG_PATH;
use crate::domain::OutputFormat;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "stallion", version, about = "Stallion beverages data pipeline")]
pub struct Cli {
    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a named pipeline.
    Run(RunArgs),
    /// Parse the config and check that every data file exists.
    Check(CheckArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Name of the pipeline to run (`feature_builder`).
    #[arg(long)]
    pub pipeline: String,

    /// Path to the config file.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Where to save the unified table (nothing is saved when omitted).
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, ignore_case = true, default_value_t = FormatArg::Parquet)]
    pub format: FormatArg,

    /// Skip per-record validation.
    #[arg(long)]
    pub no_validate: bool,

    /// Also write the run summary and merge report as JSON.
    #[arg(long = "report-json", value_name = "PATH")]
    pub report_json: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct CheckArgs {
    /// Path to the config file.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Parquet,
    Csv,
    Feather,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Parquet => OutputFormat::Parquet,
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Feather => OutputFormat::Feather,
        }
    }
}

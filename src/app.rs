//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - dispatches to the named pipeline
//! - prints the summary and writes the optional JSON report

use std::fs;
use std::path::Path;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info};

use crate::cli::{CheckArgs, Command, RunArgs};
use crate::config::ConfigResolver;
use crate::error::AppError;
use crate::report::{PipelineSummary, format_summary};

pub mod pipeline;

/// Pipelines `stallion run --pipeline` knows about.
pub const PIPELINES: [&str; 1] = ["feature_builder"];

/// Entry point for the `stallion` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` is optional; it may set RUST_LOG before the subscriber reads it.
    let _ = dotenvy::dotenv();

    let cli = crate::cli::Cli::parse();
    crate::logging::init_logging(cli.log_json);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Check(args) => handle_check(args),
    }
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let name = args.pipeline.trim().to_ascii_lowercase();
    if !PIPELINES.contains(&name.as_str()) {
        error!("Pipeline {} not found", args.pipeline);
        return Err(AppError::new(
            1,
            format!("Pipeline {} not found. Available: {}", args.pipeline, PIPELINES.join(", ")),
        ));
    }

    let options = pipeline::FeatureBuilderOptions {
        config: args.config,
        output: args.output,
        format: args.format.into(),
        validate: !args.no_validate,
    };

    let started = Instant::now();
    let result = pipeline::run_feature_builder(&options);
    info!("Run time: {name} ran in {}", pipeline::format_elapsed(started.elapsed()));
    let run = result?;

    println!("{}", format_summary(&run.summary));

    if let Some(path) = &args.report_json {
        write_report_json(path, &run.summary)?;
    }
    Ok(())
}

fn handle_check(args: CheckArgs) -> Result<(), AppError> {
    let paths = ConfigResolver::new(Some(args.config)).validate_files_exist(None)?;
    for (source, path) in &paths {
        println!("{:30} {}", source.as_str(), path.display());
    }
    println!("All {} data files found.", paths.len());
    Ok(())
}

fn write_report_json(path: &Path, summary: &PipelineSummary) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| AppError::new(5, format!("Failed to serialize run report: {e}")))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::new(5, format!("Failed to create '{}': {e}", parent.display())))?;
    }
    fs::write(path, json).map_err(|e| AppError::new(5, format!("Failed to write '{}': {e}", path.display())))?;
    info!(path = %path.display(), "wrote run report");
    Ok(())
}

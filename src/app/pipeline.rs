//! The `feature_builder` pipeline: load + merge everything, optionally save.
//!
//! Printing is left to the caller; this returns what was computed.

use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::data::DataPipeline;
use crate::domain::OutputFormat;
use crate::error::PipelineError;
use crate::report::PipelineSummary;

#[derive(Debug, Clone)]
pub struct FeatureBuilderOptions {
    pub config: PathBuf,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub validate: bool,
}

/// All computed outputs of a single `feature_builder` run.
#[derive(Debug)]
pub struct RunOutput {
    pub summary: PipelineSummary,
    pub saved_to: Option<PathBuf>,
}

pub fn run_feature_builder(options: &FeatureBuilderOptions) -> Result<RunOutput, PipelineError> {
    info!("starting feature builder pipeline");

    let mut pipeline = DataPipeline::new(Some(options.config.clone()), None);
    pipeline.load_all(options.validate)?;
    let summary = pipeline.summary()?;

    match &options.output {
        Some(path) => pipeline.save(path, options.format.as_str())?,
        None => info!("no output path specified, skipping save"),
    }

    info!("feature builder pipeline completed");
    Ok(RunOutput {
        summary,
        saved_to: options.output.clone(),
    })
}

/// Human-readable elapsed time: `850 ms`, `2.35 sec`, `3 min 4.5 sec`,
/// `1 hour 2 min 3 sec`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs_f64();
    let hours = (total / 3600.0).floor();
    let mins = ((total - hours * 3600.0) / 60.0).floor();
    let secs = total - hours * 3600.0 - mins * 60.0;

    if hours > 0.0 {
        format!("{hours} hour {mins} min {} sec", round2(secs))
    } else if mins > 0.0 {
        format!("{mins} min {} sec", round2(secs))
    } else if secs >= 0.1 {
        format!("{} sec", round2(secs))
    } else {
        format!("{} ms", (secs * 1000.0).round())
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

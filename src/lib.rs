//! `stallion-data` library crate.
//!
//! The binary (`stallion`) is a thin wrapper around this library so that:
//!
//! - loading, validation and merging are testable without spawning processes
//! - other front-ends (notebook bindings, a scheduler job) can reuse `DataPipeline`
//!
//! The usual entry point is [`data::DataPipeline`].

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod report;
pub mod schema;

pub use data::DataPipeline;
pub use error::{AppError, PipelineError};

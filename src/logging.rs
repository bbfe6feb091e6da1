//! Tracing subscriber setup for the binary.
//!
//! `RUST_LOG` wins when set (it may come from `.env`); otherwise the crate logs
//! at info and dependencies at warn. Logs go to stderr so stdout carries only
//! the run summary.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

pub const DEFAULT_DIRECTIVE: &str = "stallion_data=info,warn";

pub fn init_logging(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
    };

    // A subscriber may already be installed (tests, embedding).
    let _ = result;
}

//! Input/output helpers.
//!
//! - CSV ingest + header normalization (`ingest`)
//! - Unified Table export to parquet/CSV/feather (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;

//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the closed sets of names (`SourceName`, `OutputFormat`)
//! - the in-memory table model (`Table`, `Value`, `Record`)

pub mod table;
pub mod types;

pub use table::*;
pub use types::*;

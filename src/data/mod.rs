//! Loading and merging the seven sources.
//!
//! - per-source derived columns (`transforms`)
//! - per-source load strategy and the shared load sequence (`loader`)
//! - the join chain producing the Unified Table (`merge`)
//! - the `DataPipeline` façade (`pipeline`)

pub mod loader;
pub mod merge;
pub mod pipeline;
pub mod transforms;

pub use loader::{SourceLoader, SourceSpec, spec_for};
pub use merge::{MergeOutcome, MergeReport, Merger, SourceTables};
pub use pipeline::DataPipeline;

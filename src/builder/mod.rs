//! Trace-to-model reconstruction.
//!
//! This module handles:
//! - Per-record dispatch over the raw event kinds
//! - Per-thread call and region stacks
//! - Region live sets and bulk destruction
//! - Object id collision remapping

pub mod state;
pub mod trace_builder;

// Re-export main types
pub use state::{RegionTable, ThreadState};
pub use trace_builder::{build_model, remap_oid, BuildSummary, BuilderConfig, TraceBuilder};

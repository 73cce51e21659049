//! Contour Trace
//!
//! Reconstructs an execution model of a traced program from a low-level
//! event trace: static contours per loaded type, one contour chain per
//! object (one level per class in its ancestry), one contour per method
//! invocation, and an ordered stream of model events.
//!
//! This crate provides the core implementation for the
//! `contour-trace` CLI tool.
//!
//! ## Getting Started
//!
//! ```bash
//! contour-trace build --input trace.jsonl --output model.json --summary
//! contour-trace validate --file model.json
//! ```
//!
//! Library users drive [`builder::TraceBuilder`] (or [`builder::build_model`])
//! with their own [`schema::StaticResolver`] and [`model::ModelSink`].

pub mod builder;
pub mod commands;
pub mod contour;
pub mod model;
pub mod output;
pub mod parser;
pub mod schema;
pub mod utils;

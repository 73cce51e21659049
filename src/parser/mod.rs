//! Raw trace parsing.
//!
//! This module handles:
//! - Reading JSON Lines / JSON array trace files
//! - Mapping kind tags onto the closed event-kind enum
//! - Object identifier parsing

pub mod raw_event;
pub mod trace_reader;

// Re-export main types
pub use raw_event::{parse_oid, RawEvent, RawEventKind};
pub use trace_reader::{parse_record, parse_trace_str, read_trace};

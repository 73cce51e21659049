//! Execution model events, sink interface and output document.
//!
//! This module handles:
//! - Model-mutation event definitions
//! - Batched delivery to a `ModelSink`
//! - The serializable model document (contour snapshot + events)

pub mod document;
pub mod events;
pub mod sink;

// Re-export main types
pub use document::{snapshot_contours, to_document, ContourRecord, MemberRecord, ModelDocument};
pub use events::{EventPayload, ModelEvent, MonitorAction, ScopeAction, ThreadAction, ThreadRef};
pub use sink::{EventBatcher, ExecutionModel, ModelSink};

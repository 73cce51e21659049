//! Output writers for built models.
//!
//! This module handles writing data to disk:
//! - JSON model documents (pretty)
//! - Reading documents back for validation

pub mod json;

// Re-export main functions
pub use json::{document_to_string, read_document, write_document};

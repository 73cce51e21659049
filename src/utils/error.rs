//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use crate::contour::ContourId;
use thiserror::Error;

/// Errors raised by the contour store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContourError {
    #[error("no static contour for type {0}")]
    StaticNotFound(String),

    #[error("no instance contour for {type_name}@{oid:#x}")]
    InstanceNotFound { type_name: String, oid: u64 },

    #[error("type {0} has no static node")]
    UnknownType(String),

    #[error("type {0} cannot be instantiated")]
    NotInstantiable(String),

    #[error("unknown contour {0}")]
    UnknownContour(ContourId),

    #[error("method {0} has no static node")]
    UnknownMethod(String),
}

/// Errors that abort a trace build
///
/// Every variant except `Contour` carries the offending raw record so the
/// diagnostic names it.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("method exit with empty call stack on thread {thread}: {record}")]
    StackUnderflow { thread: String, record: String },

    #[error("record is missing required field '{field}': {record}")]
    MissingField { field: &'static str, record: String },

    #[error("invalid value '{value}' for field '{field}': {record}")]
    InvalidValue {
        field: &'static str,
        value: String,
        record: String,
    },

    #[error("invalid method signature '{signature}': {record}")]
    InvalidSignature { signature: String, record: String },

    #[error("contour lookup failed: {source}; record: {record}")]
    Lookup {
        #[source]
        source: ContourError,
        record: String,
    },

    #[error(transparent)]
    Contour(#[from] ContourError),
}

/// Errors that can occur while reading raw traces and declarations
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to read input: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid trace format: {0}")]
    InvalidFormat(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

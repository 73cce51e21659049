//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod build;
pub mod utils;

// Re-export main command functions
pub use build::{execute_build, validate_args, BuildArgs};
pub use utils::{display_schema, display_version, validate_model_file};

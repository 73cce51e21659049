//! Build command implementation.
//!
//! The build command:
//! 1. Loads type declarations (optional)
//! 2. Reads the raw trace
//! 3. Folds records into the contour model
//! 4. Writes the model document

use crate::builder::{build_model, BuilderConfig, BuildSummary};
use crate::contour::ContourStore;
use crate::model::{to_document, ExecutionModel};
use crate::output::write_document;
use crate::parser::read_trace;
use crate::schema::SchemaTable;
use crate::utils::config::DEFAULT_BATCH_SIZE;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;

/// Largest accepted batch size
const MAX_BATCH_SIZE: usize = 1_000_000;

/// Arguments for the build command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct BuildArgs {
    /// Raw trace file (JSON Lines or JSON array)
    pub input: PathBuf,

    /// Output path for the JSON model document
    pub output_json: PathBuf,

    /// Type declarations file (optional)
    pub declarations: Option<PathBuf>,

    /// Events per sink batch
    pub batch_size: usize,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for BuildArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output_json: PathBuf::from("model.json"),
            declarations: None,
            batch_size: DEFAULT_BATCH_SIZE,
            print_summary: false,
        }
    }
}

/// Execute the build command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Declarations or trace file cannot be read
/// * The trace violates a model invariant (the record is named)
/// * Output file cannot be written
pub fn execute_build(args: BuildArgs) -> Result<BuildSummary> {
    let start_time = Instant::now();

    info!("Starting build for trace: {}", args.input.display());

    info!("Step 1/4: Loading declarations...");
    let mut schema = match &args.declarations {
        Some(path) => SchemaTable::load_declarations(path)
            .with_context(|| format!("Failed to load declarations from {}", path.display()))?,
        None => {
            debug!("No declarations given; all types will be synthesized");
            SchemaTable::new()
        }
    };

    info!("Step 2/4: Reading trace...");
    let records = read_trace(&args.input)
        .with_context(|| format!("Failed to read trace {}", args.input.display()))?;
    debug!("Read {} raw records", records.len());

    info!("Step 3/4: Building contour model...");
    let mut store = ContourStore::new();
    let mut model = ExecutionModel::new();
    let config = BuilderConfig {
        batch_size: args.batch_size,
    };
    let summary = build_model(&records, &mut store, &mut schema, &mut model, config)
        .context("Failed to build model from trace")?;

    info!(
        "Model has {} contours ({} static, {} objects, {} method invocations)",
        store.len(),
        store.static_count(),
        store.object_count(),
        store.method_count()
    );

    info!("Step 4/4: Writing output file...");
    let counts = model.counts_by_kind();
    let source = args.input.display().to_string();
    let document = to_document(&source, summary.clone(), &store, &schema, model.into_events());
    write_document(&document, &args.output_json).context("Failed to write model JSON")?;

    info!("✓ Model written to: {}", args.output_json.display());

    if args.print_summary {
        println!("\n{}", "=".repeat(80));
        println!("MODEL SUMMARY");
        println!("{}", "=".repeat(80));
        println!("Trace:           {}", source);
        println!("Records:         {}", summary.records);
        println!("Skipped:         {}", summary.skipped);
        println!("Events:          {} in {} batches", summary.emitted, summary.batches);
        println!("Contours:        {}", store.len());
        println!("Threads:         {}", summary.threads);
        println!("Objects:         {} ({} destroyed)", summary.objects, summary.destroyed);
        println!("\nEvents by kind:");
        for (kind, count) in &counts {
            println!("  {:<20} {}", kind, count);
        }
        println!("{}", "=".repeat(80));
    }

    let elapsed = start_time.elapsed();
    info!("Build completed in {:.2}s", elapsed.as_secs_f64());

    Ok(summary)
}

/// Validate build arguments
///
/// **Public** - can be called before execute_build for early validation
pub fn validate_args(args: &BuildArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Input trace path cannot be empty");
    }

    if !args.input.is_file() {
        anyhow::bail!("Input trace not found: {}", args.input.display());
    }

    if let Some(declarations) = &args.declarations {
        if !declarations.is_file() {
            anyhow::bail!("Declarations file not found: {}", declarations.display());
        }
    }

    if args.batch_size == 0 {
        anyhow::bail!("batch_size must be greater than 0");
    }

    if args.batch_size > MAX_BATCH_SIZE {
        anyhow::bail!("batch_size is too large (max {})", MAX_BATCH_SIZE);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn trace_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"kind":"SYSTEM_START","timestamp":0}}"#).unwrap();
        file
    }

    #[test]
    fn test_validate_args_valid() {
        let input = trace_file();
        let args = BuildArgs {
            input: input.path().to_path_buf(),
            ..Default::default()
        };

        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_args_empty_input() {
        assert!(validate_args(&BuildArgs::default()).is_err());
    }

    #[test]
    fn test_validate_args_missing_input() {
        let args = BuildArgs {
            input: PathBuf::from("/nonexistent/trace.jsonl"),
            ..Default::default()
        };

        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_missing_declarations() {
        let input = trace_file();
        let args = BuildArgs {
            input: input.path().to_path_buf(),
            declarations: Some(PathBuf::from("/nonexistent/decls.json")),
            ..Default::default()
        };

        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_batch_size_zero() {
        let input = trace_file();
        let args = BuildArgs {
            input: input.path().to_path_buf(),
            batch_size: 0,
            ..Default::default()
        };

        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_execute_build_writes_document() {
        let input = trace_file();
        let out_dir = tempfile::tempdir().unwrap();
        let output = out_dir.path().join("model.json");
        let args = BuildArgs {
            input: input.path().to_path_buf(),
            output_json: output.clone(),
            ..Default::default()
        };

        let summary = execute_build(args).unwrap();
        assert_eq!(summary.records, 1);
        assert_eq!(summary.emitted, 1);
        assert!(output.exists());
    }
}

//! Contour Trace CLI
//!
//! Reconstructs a contour model of program state (static, instance and
//! method contours plus an ordered event stream) from a raw execution trace.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use contour_trace::commands::{
    display_schema, display_version, execute_build, validate_args, validate_model_file, BuildArgs,
};
use contour_trace::utils::config::DEFAULT_BATCH_SIZE;

/// Contour Trace - execution model reconstruction from raw traces
#[derive(Parser, Debug)]
#[command(name = "contour-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a contour model from a raw trace
    Build {
        /// Raw trace file (JSON Lines or JSON array)
        #[arg(short, long, env = "CONTOUR_TRACE_INPUT")]
        input: PathBuf,

        /// Output path for the JSON model
        #[arg(short, long, default_value = "model.json")]
        output: PathBuf,

        /// Type declarations file (JSON)
        #[arg(short, long)]
        declarations: Option<PathBuf>,

        /// Events per sink batch
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate a model JSON file
    Validate {
        /// Path to model JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Build {
            input,
            output,
            declarations,
            batch_size,
            summary,
        } => {
            let args = BuildArgs {
                input,
                output_json: output,
                declarations,
                batch_size,
                print_summary: summary,
            };

            // Validate args first
            validate_args(&args)?;

            execute_build(args)?;
        }

        Commands::Validate { file } => {
            validate_model_file(file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

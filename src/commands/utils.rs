use crate::output::read_document;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Validate a model JSON file
pub fn validate_model_file(file_path: PathBuf) -> Result<()> {
    println!("Validating model: {}", file_path.display());

    let document = read_document(&file_path)
        .with_context(|| format!("Failed to read model {}", file_path.display()))?;

    if document.version != SCHEMA_VERSION {
        anyhow::bail!(
            "Unsupported model version {} (expected {})",
            document.version,
            SCHEMA_VERSION
        );
    }

    println!("✓ Valid model JSON");
    println!("  Version: {}", document.version);
    println!("  Source: {}", document.source);
    println!("  Generated: {}", document.generated_at);
    println!("  Contours: {}", document.contours.len());
    println!("  Events: {}", document.events.len());
    println!("  Skipped Records: {}", document.summary.skipped);

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Contour Trace Model Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string          - Schema version (e.g., '1.0.0')");
        println!("  generated_at: string     - ISO 8601 timestamp");
        println!("  source: string           - Trace file the model was built from");
        println!("  summary: object          - Record, event and object counters");
        println!("  contours: array          - Final contour snapshot, creation order");
        println!("    id: number             - Contour id");
        println!("    ordinal: number        - Per-category sequence number");
        println!("    kind: string           - static | instance | array | method");
        println!("    schema: string         - Type name or method key");
        println!("    parent: number?        - Enclosing contour");
        println!("    child: number?         - More-derived level (instances)");
        println!("    virtual: bool          - True for non-concrete instance levels");
        println!("    members: array         - {{name, value}} slots");
        println!("  events: array            - Emitted model events, in order");
        println!("    number: number         - Sequence number, from 1");
        println!("    timestamp: number      - Trace timestamp");
        println!("    thread: object         - System or {{id, contour}}");
        println!("    line: number?          - Source line (if available)");
        println!("    payload: object        - Kind-tagged event data");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Contour Trace v{}", env!("CARGO_PKG_VERSION"));
    println!("Model Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Reconstructs a contour model of program state from execution traces.");
}

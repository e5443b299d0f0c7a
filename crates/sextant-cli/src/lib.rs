//! CLI logic for the Sextant diagram compiler.
//!
//! This module contains the core CLI logic: load a snapshot, regenerate
//! code from it and write everything beneath the output root.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use log::info;

use sextant::{Compiler, SextantError, persist::SaveReport};

/// Run the Sextant CLI application
///
/// This function loads the snapshot, compiles it with the configured
/// backend and writes the canonical snapshot and generated files.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `SextantError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Snapshot syntax or model errors
/// - Code generation errors
/// - Write errors
pub fn run(args: &Args) -> Result<SaveReport, SextantError> {
    info!(snapshot_path = args.snapshot; "Compiling snapshot");

    let mut app_config = config::load_config(args.config.as_ref())?;
    if let Some(output) = &args.output {
        app_config = app_config.with_output_root(output);
    }
    if let Some(backend) = args.backend {
        app_config = app_config.with_backend(backend);
    }

    let compiler = Compiler::new(app_config);
    let database = compiler.load(&args.snapshot)?;
    let report = compiler.save(&database)?;

    info!(
        output_root = compiler.config().output().root().display().to_string(),
        written = report.written().len(),
        unchanged = report.unchanged().len();
        "Code generated successfully"
    );

    Ok(report)
}

//! Command-line argument definitions for the Sextant CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control the snapshot to compile, the output
//! root, the backend, configuration file selection, and logging verbosity.

use clap::Parser;

use sextant::codegen::Backend;

/// Command-line arguments for the Sextant diagram compiler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the `database.json` snapshot
    #[arg(help = "Path to the snapshot file")]
    pub snapshot: String,

    /// Output root for the snapshot and generated files (overrides config)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Code generation backend (overrides config)
    #[arg(short, long)]
    pub backend: Option<Backend>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

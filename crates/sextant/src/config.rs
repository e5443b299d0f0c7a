//! Configuration types for the Sextant compiler.
//!
//! This module provides configuration structures that control where output
//! is written and which backend renders it. All types implement
//! [`serde::Deserialize`] for flexible loading from external sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level application configuration combining output and codegen settings.
//! - [`OutputConfig`] - Controls the output root and the snapshot file name.
//! - [`CodegenConfig`] - Controls which [`Backend`] renders the services.
//!
//! # Example
//!
//! ```
//! # use sextant::config::AppConfig;
//! // Use default configuration
//! let config = AppConfig::default();
//! assert_eq!(config.output().snapshot_file(), "database.json");
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::codegen::Backend;

/// Top-level application configuration combining output and codegen settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Output configuration section.
    #[serde(default)]
    output: OutputConfig,

    /// Code generation configuration section.
    #[serde(default)]
    codegen: CodegenConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified output and codegen configurations.
    ///
    /// # Arguments
    ///
    /// * `output` - Output root and snapshot file settings.
    /// * `codegen` - Backend selection.
    pub fn new(output: OutputConfig, codegen: CodegenConfig) -> Self {
        Self { output, codegen }
    }

    /// Returns the output configuration.
    pub fn output(&self) -> &OutputConfig {
        &self.output
    }

    /// Returns the code generation configuration.
    pub fn codegen(&self) -> &CodegenConfig {
        &self.codegen
    }

    /// Returns a copy with the output root replaced.
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output.root = root.into();
        self
    }

    /// Returns a copy with the backend replaced.
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.codegen.backend = backend;
        self
    }
}

/// Where the persistence writer puts its files.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory that receives the snapshot and generated files.
    #[serde(default = "default_root")]
    root: PathBuf,

    /// Snapshot file name, relative to `root`.
    #[serde(default = "default_snapshot_file")]
    snapshot_file: String,
}

fn default_root() -> PathBuf {
    PathBuf::from("generated")
}

fn default_snapshot_file() -> String {
    "database.json".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            snapshot_file: default_snapshot_file(),
        }
    }
}

impl OutputConfig {
    /// Creates a new [`OutputConfig`].
    ///
    /// # Arguments
    ///
    /// * `root` - Output root directory.
    /// * `snapshot_file` - Snapshot file name relative to `root`.
    pub fn new(root: impl Into<PathBuf>, snapshot_file: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            snapshot_file: snapshot_file.into(),
        }
    }

    /// Returns the output root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the snapshot file name.
    pub fn snapshot_file(&self) -> &str {
        &self.snapshot_file
    }
}

/// Code generation settings.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CodegenConfig {
    /// [`Backend`] used to render services.
    #[serde(default)]
    backend: Backend,
}

impl CodegenConfig {
    /// Creates a new [`CodegenConfig`] with the specified backend.
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Returns the configured [`Backend`].
    pub fn backend(&self) -> Backend {
        self.backend
    }
}

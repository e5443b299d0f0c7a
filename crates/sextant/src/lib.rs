//! Sextant - compile sequence diagrams of communicating services into code.
//!
//! Snapshot loading, flattening, code generation and persistence for the
//! Sextant diagram model. The model itself and the interactive editing
//! session live in `sextant-core` and are re-exported here.

pub mod codegen;
pub mod config;
pub mod flatten;
pub mod persist;
pub mod snapshot;

mod error;

pub use sextant_core::{ErrorKind, ModelError, command, edit, identifier, model, session};

pub use error::SextantError;

use std::{fs, path::Path};

use log::{debug, info, trace};

use codegen::{GeneratedFile, generate_checked};
use config::AppConfig;
use flatten::FlatService;
use model::Database;
use persist::{SaveReport, Writer, queue::SaveQueue};

/// Entry point for compiling Sextant databases.
///
/// This provides an API for processing a database through the loading,
/// flattening, code generation and persistence stages.
///
/// # Examples
///
/// ```rust,no_run
/// use sextant::{Compiler, config::AppConfig};
///
/// let compiler = Compiler::new(AppConfig::default());
///
/// // Load and validate a snapshot
/// let database = compiler.load("database.json")
///     .expect("Failed to load");
///
/// // Regenerate code and the canonical snapshot under the output root
/// let report = compiler.save(&database)
///     .expect("Failed to save");
/// println!("{} files written", report.written().len());
/// ```
#[derive(Debug, Default)]
pub struct Compiler {
    config: AppConfig,
}

impl Compiler {
    /// Create a new compiler with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration including output and codegen settings
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration this compiler was built with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse and validate snapshot source text.
    ///
    /// # Errors
    ///
    /// Returns `SextantError::Load` carrying the source for syntax errors or
    /// model invariant violations.
    pub fn parse(&self, source: &str) -> Result<Database, SextantError> {
        info!("Parsing snapshot");

        let database = snapshot::from_json(source)
            .map_err(|err| SextantError::new_load_error(err, source))?;

        debug!("Snapshot parsed successfully");
        trace!(database:?; "Parsed database");

        Ok(database)
    }

    /// Read, parse and validate the snapshot at `path`.
    ///
    /// # Errors
    ///
    /// Returns `SextantError::Io` if the file cannot be read, otherwise see
    /// [`Compiler::parse`].
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Database, SextantError> {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Reading snapshot");
        let source = fs::read_to_string(path)?;
        self.parse(&source)
    }

    /// Flatten `database` into per-service declarations.
    ///
    /// # Errors
    ///
    /// Returns `SextantError::Flatten` if a step references an unknown environment.
    pub fn flatten(&self, database: &Database) -> Result<Vec<FlatService>, SextantError> {
        Ok(flatten::flatten(database)?)
    }

    /// Flatten `database` and render it with the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `SextantError::Flatten` or `SextantError::Codegen`.
    pub fn generate(&self, database: &Database) -> Result<Vec<GeneratedFile>, SextantError> {
        let services = self.flatten(database)?;
        let adapter = self.config.codegen().backend().adapter();
        Ok(generate_checked(adapter.as_ref(), &services)?)
    }

    /// A [`Writer`] for the configured output root.
    pub fn writer(&self) -> Writer {
        Writer::from_config(self.config.output())
    }

    /// Write the canonical snapshot and the generated files.
    ///
    /// # Errors
    ///
    /// See [`Writer::save`].
    pub fn save(&self, database: &Database) -> Result<SaveReport, SextantError> {
        let adapter = self.config.codegen().backend().adapter();
        self.writer().save(database, adapter.as_ref())
    }

    /// Start a background [`SaveQueue`] for the configured output root and backend.
    ///
    /// # Errors
    ///
    /// Returns `SextantError::Io` if the worker thread cannot be spawned.
    pub fn spawn_queue(&self) -> Result<SaveQueue, SextantError> {
        let adapter = self.config.codegen().backend().adapter();
        Ok(SaveQueue::new(self.writer(), adapter)?)
    }
}

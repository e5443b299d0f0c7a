//! Persistence writer.
//!
//! [`Writer::save`] compiles a [`Database`] and writes the result beneath an
//! output root:
//!
//! 1. flatten the model and run the adapter (nothing touches disk if either fails)
//! 2. write the canonical snapshot
//! 3. write every generated file
//!
//! Each file goes to a temporary file in its target directory and is then
//! renamed over the destination, so a failed write never leaves a partially
//! written file behind. The file set as a whole is not transactional: when
//! one write fails, files written before it stay on disk. Every failure is
//! collected into a single [`WriteError`].

pub mod queue;

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use tempfile::NamedTempFile;
use thiserror::Error;

use sextant_core::model::Database;

use crate::{
    SextantError,
    codegen::{Adapter, CodegenError, generate_checked},
    config::OutputConfig,
    flatten::flatten,
    snapshot,
};

/// Paths touched by a successful save.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SaveReport {
    written: Vec<PathBuf>,
    unchanged: Vec<PathBuf>,
}

impl SaveReport {
    /// Files whose content was (re)written.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Files that already held the expected content and were left alone.
    pub fn unchanged(&self) -> &[PathBuf] {
        &self.unchanged
    }
}

/// One or more files could not be written.
#[derive(Debug, Error)]
#[error("failed to write {}", describe_failures(.failures))]
pub struct WriteError {
    failures: Vec<(PathBuf, io::Error)>,
}

impl WriteError {
    /// Every failing path with its cause, in write order.
    pub fn failures(&self) -> &[(PathBuf, io::Error)] {
        &self.failures
    }
}

fn describe_failures(failures: &[(PathBuf, io::Error)]) -> String {
    failures
        .iter()
        .map(|(path, err)| format!("`{}` ({err})", path.display()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileStatus {
    Written,
    Unchanged,
}

/// Writes snapshots and generated files beneath an output root.
#[derive(Debug, Clone)]
pub struct Writer {
    root: PathBuf,
    snapshot_file: String,
}

impl Writer {
    /// Create a writer for `root`, storing the snapshot as `snapshot_file`.
    pub fn new(root: impl Into<PathBuf>, snapshot_file: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            snapshot_file: snapshot_file.into(),
        }
    }

    /// Create a writer from the output section of the configuration.
    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(config.root(), config.snapshot_file())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of the snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.root.join(&self.snapshot_file)
    }

    /// Compile `database` with `adapter` and write the snapshot and all
    /// generated files.
    ///
    /// # Errors
    ///
    /// - [`SextantError::Flatten`] or [`SextantError::Codegen`] before any write
    /// - [`SextantError::Write`] naming every file that could not be written
    pub fn save(
        &self,
        database: &Database,
        adapter: &dyn Adapter,
    ) -> Result<SaveReport, SextantError> {
        info!(
            root = self.root.display().to_string(),
            adapter = adapter.name();
            "Saving database"
        );

        let services = flatten(database)?;
        let files = generate_checked(adapter, &services)?;
        if let Some(clash) = files
            .iter()
            .find(|file| Path::new(file.filename()) == Path::new(&self.snapshot_file))
        {
            return Err(CodegenError::DuplicateFile {
                adapter: adapter.name(),
                filename: clash.filename().to_string(),
            }
            .into());
        }
        let snapshot = snapshot::to_json(database).map_err(io::Error::from)?;

        let outputs = std::iter::once((self.snapshot_path(), snapshot)).chain(
            files.into_iter().map(|file| {
                let path = self.root.join(file.filename());
                (path, file.content().to_string())
            }),
        );

        let mut report = SaveReport::default();
        let mut failures = Vec::new();
        for (path, content) in outputs {
            match write_file(&path, content.as_bytes()) {
                Ok(FileStatus::Written) => {
                    debug!(path = path.display().to_string(); "File written");
                    report.written.push(path);
                }
                Ok(FileStatus::Unchanged) => {
                    debug!(path = path.display().to_string(); "File unchanged");
                    report.unchanged.push(path);
                }
                Err(err) => {
                    warn!(path = path.display().to_string(), err:%; "Failed to write file");
                    failures.push((path, err));
                }
            }
        }

        if !failures.is_empty() {
            return Err(WriteError { failures }.into());
        }

        info!(
            written = report.written.len(),
            unchanged = report.unchanged.len();
            "Database saved"
        );
        Ok(report)
    }
}

/// Replace `path` with `content` through a temporary file in the same
/// directory. Leaves the file untouched if it already holds `content`.
fn write_file(path: &Path, content: &[u8]) -> io::Result<FileStatus> {
    if fs::read(path).is_ok_and(|existing| existing == content) {
        return Ok(FileStatus::Unchanged);
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(content)?;
    file.as_file().sync_all()?;
    file.persist(path)?;
    Ok(FileStatus::Written)
}

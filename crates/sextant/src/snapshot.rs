//! Canonical `database.json` snapshots.
//!
//! The snapshot is pretty-printed JSON with two-space indentation, fields in
//! a fixed order and entities in creation order, terminated by a newline.
//! Serializing the same database always yields the same bytes.
//!
//! Loading runs in two phases: JSON syntax and shape (errors carry a line
//! and column), then the model invariants.

use std::{fs, io, path::Path};

use log::{debug, info};
use thiserror::Error;

use sextant_core::{
    ModelError,
    model::{Database, RawDatabase},
};

/// Errors raised while loading a snapshot.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read snapshot: {0}")]
    Io(#[from] io::Error),

    #[error("snapshot is not valid JSON at line {line}, column {column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("snapshot violates the diagram model: {0}")]
    Invalid(#[from] ModelError),
}

impl LoadError {
    /// Byte offset of a syntax error within `src`, if this is one.
    pub fn offset_in(&self, src: &str) -> Option<usize> {
        let LoadError::Syntax { line, column, .. } = self else {
            return None;
        };
        let line_start: usize = src
            .split_inclusive('\n')
            .take(line.saturating_sub(1))
            .map(str::len)
            .sum();
        Some((line_start + column.saturating_sub(1)).min(src.len()))
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::Syntax {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}

/// Serialize `database` to its canonical JSON form.
///
/// # Errors
///
/// Returns a [`serde_json::Error`] only if serialization itself fails, which
/// cannot happen for the model's plain data.
pub fn to_json(database: &Database) -> Result<String, serde_json::Error> {
    let mut json = serde_json::to_string_pretty(database)?;
    json.push('\n');
    Ok(json)
}

/// Parse and validate a snapshot.
///
/// # Errors
///
/// Returns [`LoadError::Syntax`] for malformed JSON or an unexpected shape,
/// and [`LoadError::Invalid`] if the content breaks a model invariant.
pub fn from_json(src: &str) -> Result<Database, LoadError> {
    let raw: RawDatabase = serde_json::from_str(src)?;
    let database = Database::try_from(raw)?;
    debug!(
        environments = database.environments().len(),
        diagrams = database.diagrams().len();
        "Snapshot parsed"
    );
    Ok(database)
}

/// Read and validate the snapshot at `path`.
///
/// # Errors
///
/// See [`from_json`]; also returns [`LoadError::Io`] if the file cannot be read.
pub fn load(path: impl AsRef<Path>) -> Result<Database, LoadError> {
    let path = path.as_ref();
    info!(path = path.display().to_string(); "Loading snapshot");
    let src = fs::read_to_string(path)?;
    from_json(&src)
}

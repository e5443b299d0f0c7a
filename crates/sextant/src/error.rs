//! Error types for Sextant operations.
//!
//! This module provides the main error type [`SextantError`] which wraps
//! the error conditions of every pipeline stage.

use std::io;

use thiserror::Error;

use sextant_core::ModelError;

use crate::{codegen::CodegenError, flatten::FlattenError, persist::WriteError, snapshot::LoadError};

/// The main error type for Sextant operations.
///
/// # Diagnostic Variants
///
/// The `Load` variant keeps the snapshot source next to the error so a
/// syntax error can be reported with a labeled span.
#[derive(Debug, Error)]
pub enum SextantError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("{err}")]
    Load { err: LoadError, src: Option<String> },

    #[error(transparent)]
    Flatten(#[from] FlattenError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("save queue is closed")]
    QueueClosed,
}

impl From<LoadError> for SextantError {
    fn from(err: LoadError) -> Self {
        Self::Load { err, src: None }
    }
}

impl SextantError {
    /// Create a new `Load` error with the snapshot source it was parsed from.
    pub fn new_load_error(err: LoadError, src: impl Into<String>) -> Self {
        Self::Load {
            err,
            src: Some(src.into()),
        }
    }
}

//! Error adapter for converting SextantError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.
//!
//! # Snapshot Syntax Errors
//!
//! When a snapshot fails to parse, the error is rendered with a labeled span
//! pointing at the offending position in the snapshot source.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use sextant::{SextantError, snapshot::LoadError};

/// Adapter for a snapshot syntax error.
///
/// This adapter wraps a [`LoadError`] together with the snapshot source and
/// implements [`MietteDiagnostic`] to enable rich error formatting in the CLI.
pub struct SnapshotDiagnostic<'a> {
    /// The wrapped error
    err: &'a LoadError,
    /// Source code for displaying snippets
    src: &'a str,
}

impl<'a> SnapshotDiagnostic<'a> {
    /// Create a new snapshot diagnostic.
    pub fn new(err: &'a LoadError, src: &'a str) -> Self {
        Self { err, src }
    }
}

impl fmt::Debug for SnapshotDiagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotDiagnostic")
            .field("err", &self.err)
            .finish()
    }
}

impl fmt::Display for SnapshotDiagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.err {
            LoadError::Syntax { message, .. } => write!(f, "invalid snapshot: {message}"),
            other => fmt::Display::fmt(other, f),
        }
    }
}

impl std::error::Error for SnapshotDiagnostic<'_> {}

impl MietteDiagnostic for SnapshotDiagnostic<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("sextant::load::syntax"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(
            "snapshots are JSON objects with `environments` and `diagrams` arrays",
        ))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let offset = self.err.offset_in(self.src)?;
        let len = usize::from(offset < self.src.len());
        let span = SourceSpan::new(offset.into(), len);
        Some(Box::new(std::iter::once(LabeledSpan::new_primary_with_span(
            Some("here".to_string()),
            span,
        ))))
    }
}

/// Adapter for [`SextantError`] variants without source information.
///
/// This adapter handles errors such as I/O errors, model errors, code
/// generation errors and write errors.
pub struct ErrorAdapter<'a>(pub &'a SextantError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            SextantError::Io(_) => "sextant::io",
            SextantError::Model(_) => "sextant::model",
            SextantError::Load { .. } => "sextant::load",
            SextantError::Flatten(_) => "sextant::flatten",
            SextantError::Codegen(_) => "sextant::codegen",
            SextantError::Write(_) => "sextant::write",
            SextantError::Config(_) => "sextant::config",
            SextantError::QueueClosed => "sextant::queue",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match &self.0 {
            SextantError::Write(_) => Some(Box::new(
                "files written before the failure were kept; run again once the paths are writable",
            )),
            SextantError::Codegen(_) => Some(Box::new("no files were written")),
            _ => None,
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// A reportable error that can be rendered by miette.
///
/// This enum wraps either a snapshot diagnostic or a plain error,
/// providing a uniform interface for error rendering.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A snapshot error with source location information.
    Diagnostic(SnapshotDiagnostic<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Diagnostic(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a [`SextantError`] into a list of reportable errors.
///
/// A snapshot syntax error with its source attached becomes a
/// [`Reportable::Diagnostic`]; every other error becomes a single
/// [`Reportable::Error`].
pub fn to_reportables(err: &SextantError) -> Vec<Reportable<'_>> {
    match err {
        SextantError::Load {
            err: load_err @ LoadError::Syntax { .. },
            src: Some(src),
        } => vec![Reportable::Diagnostic(SnapshotDiagnostic::new(load_err, src))],
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

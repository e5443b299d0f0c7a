//! Code generation from flattened service declarations.
//!
//! This module provides the [`Adapter`] trait that defines the interface for
//! rendering [`FlatService`] declarations into source files. It is the last
//! pure stage of the pipeline; the [`persist`](crate::persist) module writes
//! its output.
//!
//! # Pipeline Position
//!
//! ```text
//! Database
//!     ↓ flatten
//! FlatService IR
//!     ↓ codegen (this module)
//! Generated files
//!     ↓ persist
//! Output root
//! ```
//!
//! # Available Backends
//!
//! - [`typescript`] — one module per service plus an `index.ts`
//! - [`rust`] — one module per service plus a `lib.rs`, built with `quote`
//!
//! # Output Checks
//!
//! [`generate_checked`] runs an adapter and rejects output with duplicate or
//! escaping paths, or that drops a declared operation or call. Nothing is
//! written when a check fails.

pub mod naming;
pub mod rust;
pub mod typescript;

use std::{
    collections::HashSet,
    fmt::{self, Display},
    path::{Component, Path, PathBuf},
    str::FromStr,
};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sextant_core::identifier::EnvironmentId;

use crate::flatten::FlatService;

/// Header line placed at the top of every generated file.
pub const GENERATED_HEADER: &str = "@generated by sextant. Do not edit manually.";

/// One file produced by an [`Adapter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    filename: String,
    content: String,
    service: Option<EnvironmentId>,
}

impl GeneratedFile {
    /// A file that implements a single service.
    pub fn for_service(
        service: EnvironmentId,
        filename: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            service: Some(service),
        }
    }

    /// A file that is not owned by any single service (index, manifest, ...).
    pub fn shared(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            service: None,
        }
    }

    /// Path relative to the output root, `/`-separated.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// The service this file implements, if any.
    pub fn service(&self) -> Option<EnvironmentId> {
        self.service
    }
}

/// Errors raised while generating code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    #[error("adapter `{adapter}` produced `{filename}` more than once")]
    DuplicateFile {
        adapter: &'static str,
        filename: String,
    },

    #[error("adapter `{adapter}` produced `{filename}`, which is not a relative path inside the output root")]
    InvalidPath {
        adapter: &'static str,
        filename: String,
    },

    #[error("adapter `{adapter}` dropped `{event}` declared by service `{service}`")]
    MissingDeclaration {
        adapter: &'static str,
        service: EnvironmentId,
        event: String,
    },

    #[error("adapter `{adapter}` failed to render `{filename}`: {message}")]
    Render {
        adapter: &'static str,
        filename: String,
        message: String,
    },
}

/// Abstraction for code generation backends.
///
/// Implementors must be pure: the output may depend only on the services
/// passed in, never on the clock or the filesystem, so regenerating from an
/// unchanged model yields identical files.
pub trait Adapter {
    /// Backend name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Render all services into files.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::Render`] if a file cannot be produced.
    fn generate(&self, services: &[FlatService]) -> Result<Vec<GeneratedFile>, CodegenError>;

    /// How `event` is spelled in this backend's output, used to verify that
    /// every declaration made it into the files of its service.
    fn quote_event(&self, event: &str) -> String;
}

/// Available code generation backends.
///
/// The names match external configuration strings (snake_case).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// TypeScript interfaces (default)
    #[default]
    Typescript,
    /// Rust traits
    Rust,
}

impl Backend {
    /// Instantiate the adapter for this backend.
    pub fn adapter(self) -> Box<dyn Adapter + Send + Sync> {
        match self {
            Backend::Typescript => Box::new(typescript::TypescriptAdapter),
            Backend::Rust => Box::new(rust::RustAdapter),
        }
    }
}

impl FromStr for Backend {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "typescript" => Ok(Self::Typescript),
            "rust" => Ok(Self::Rust),
            _ => Err("Unsupported code generation backend"),
        }
    }
}

impl From<Backend> for &'static str {
    fn from(val: Backend) -> Self {
        match val {
            Backend::Typescript => "typescript",
            Backend::Rust => "rust",
        }
    }
}

impl Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: &'static str = (*self).into();
        write!(f, "{s}")
    }
}

/// Run `adapter` and validate its output.
///
/// # Errors
///
/// - Any [`CodegenError`] returned by the adapter
/// - [`CodegenError::InvalidPath`] for absolute, empty or `..` paths
/// - [`CodegenError::DuplicateFile`] if two filenames name the same path,
///   e.g. `a/b.ts` and `a//b.ts`
/// - [`CodegenError::MissingDeclaration`] if a service's files omit one of its
///   operations or calls
pub fn generate_checked(
    adapter: &dyn Adapter,
    services: &[FlatService],
) -> Result<Vec<GeneratedFile>, CodegenError> {
    info!(adapter = adapter.name(), services = services.len(); "Generating code");
    let files = adapter.generate(services)?;

    let mut filenames = HashSet::with_capacity(files.len());
    for file in &files {
        if !is_contained(file.filename()) {
            return Err(CodegenError::InvalidPath {
                adapter: adapter.name(),
                filename: file.filename().to_string(),
            });
        }
        let path: PathBuf = Path::new(file.filename()).components().collect();
        if !filenames.insert(path) {
            return Err(CodegenError::DuplicateFile {
                adapter: adapter.name(),
                filename: file.filename().to_string(),
            });
        }
    }

    for service in services {
        let owned: Vec<&str> = files
            .iter()
            .filter(|file| file.service() == Some(service.id()))
            .map(GeneratedFile::content)
            .collect();

        let missing = service
            .operations()
            .iter()
            .chain(service.calls())
            .find(|event| {
                let quoted = adapter.quote_event(event);
                !owned.iter().any(|content| content.contains(&quoted))
            });
        if let Some(event) = missing {
            return Err(CodegenError::MissingDeclaration {
                adapter: adapter.name(),
                service: service.id(),
                event: event.clone(),
            });
        }
    }

    debug!(adapter = adapter.name(), files = files.len(); "Generated files checked");
    Ok(files)
}

fn is_contained(filename: &str) -> bool {
    let path = Path::new(filename);
    !filename.is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

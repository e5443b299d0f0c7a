//! Error types for model mutations.
//!
//! Every rejected command is reported as a [`ModelError`]. A rejected command
//! never leaves the [`Database`](crate::model::Database) partially updated.

use std::fmt;

use thiserror::Error;

use crate::identifier::{DiagramId, EnvironmentId};

/// Broad category of a [`ModelError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The command itself is invalid (self-loop, unknown endpoint, bad insertion index).
    Validation,
    /// The command targets an entity that does not exist.
    NotFound,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "validation error"),
            ErrorKind::NotFound => write!(f, "not found"),
        }
    }
}

/// Errors raised when a command or a loaded model violates the model invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("environment `{0}` does not exist")]
    EnvironmentNotFound(EnvironmentId),

    #[error("diagram `{0}` does not exist")]
    DiagramNotFound(DiagramId),

    #[error("diagram `{diagram}` has no step at index {index} ({len} steps)")]
    StepNotFound {
        diagram: DiagramId,
        index: usize,
        len: usize,
    },

    #[error("a step cannot connect environment `{0}` to itself")]
    SelfLoop(EnvironmentId),

    #[error("step endpoint `{0}` is not a known environment")]
    UnknownEndpoint(EnvironmentId),

    #[error("cannot insert a step at index {index} in diagram `{diagram}` ({len} steps)")]
    InsertOutOfRange {
        diagram: DiagramId,
        index: usize,
        len: usize,
    },

    #[error("environment id `{0}` is defined more than once")]
    DuplicateEnvironment(EnvironmentId),

    #[error("diagram id `{0}` is defined more than once")]
    DuplicateDiagram(DiagramId),
}

impl ModelError {
    /// Returns whether this is a validation or a not-found failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelError::EnvironmentNotFound(_)
            | ModelError::DiagramNotFound(_)
            | ModelError::StepNotFound { .. } => ErrorKind::NotFound,
            ModelError::SelfLoop(_)
            | ModelError::UnknownEndpoint(_)
            | ModelError::InsertOutOfRange { .. }
            | ModelError::DuplicateEnvironment(_)
            | ModelError::DuplicateDiagram(_) => ErrorKind::Validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let env = EnvironmentId::from("env-1");
        let diagram = DiagramId::from("diagram-1");

        assert_eq!(ModelError::SelfLoop(env).kind(), ErrorKind::Validation);
        assert_eq!(ModelError::UnknownEndpoint(env).kind(), ErrorKind::Validation);
        assert_eq!(ModelError::EnvironmentNotFound(env).kind(), ErrorKind::NotFound);
        assert_eq!(ModelError::DiagramNotFound(diagram).kind(), ErrorKind::NotFound);
        assert_eq!(
            ModelError::StepNotFound {
                diagram,
                index: 4,
                len: 2
            }
            .kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_display() {
        let err = ModelError::StepNotFound {
            diagram: DiagramId::from("diagram-1"),
            index: 4,
            len: 2,
        };
        assert_eq!(
            err.to_string(),
            "diagram `diagram-1` has no step at index 4 (2 steps)"
        );
    }
}

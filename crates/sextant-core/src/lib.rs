//! Sextant Core Types and Definitions
//!
//! This crate provides the diagram model and editing logic for Sextant
//! sequence diagrams. It includes:
//!
//! - **Identifiers**: String-interned identifiers ([`identifier::Id`]) and typed ids
//! - **Model**: The [`model::Database`] aggregate with environments, steps and diagrams
//! - **Commands**: Named mutations and the reducer that applies them ([`command`] module)
//! - **Edit**: The two-click step-creation state machine ([`edit`] module)
//! - **Session**: The command surface exposed to a UI shell ([`session::Session`])

pub mod command;
pub mod edit;
pub mod error;
pub mod identifier;
pub mod model;
pub mod session;

pub use error::{ErrorKind, ModelError};

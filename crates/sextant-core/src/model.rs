//! Diagram model types.
//!
//! The model is an arena: the [`Database`] owns every [`Environment`] and
//! [`SequenceDiagram`], and all cross-references are id lookups.
//!
//! # Organization
//!
//! - [`database`] - The root aggregate and its mutation operations
//! - [`diagram`] - Entities: [`Environment`], [`Step`], [`SequenceDiagram`]

pub mod database;
pub mod diagram;

pub use database::*;
pub use diagram::*;

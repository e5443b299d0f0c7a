//! Flattening pass: reduce a [`Database`] to per-service declarations.
//!
//! # Pipeline Position
//!
//! ```text
//! Database (diagrams of ordered steps)
//!     ↓ flatten (this module)
//! FlatService IR (operations + calls per environment)
//!     ↓ codegen
//! Generated files
//! ```
//!
//! Diagrams are visited in creation order and steps in position order. Each
//! step adds its event to the receiver's operations and to the sender's
//! calls; repeated event names keep their first position. The output only
//! depends on the database, so an unchanged model flattens to identical IR.

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};
use thiserror::Error;

use sextant_core::{
    identifier::{DiagramId, EnvironmentId},
    model::Database,
};

/// Declarations of one environment, ready for code generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatService {
    id: EnvironmentId,
    name: String,
    operations: Vec<String>,
    calls: Vec<String>,
}

impl FlatService {
    /// Create a service declaration directly.
    pub fn new(
        id: EnvironmentId,
        name: impl Into<String>,
        operations: Vec<String>,
        calls: Vec<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            operations,
            calls,
        }
    }

    pub fn id(&self) -> EnvironmentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Events this service receives, first-seen order, no duplicates.
    pub fn operations(&self) -> &[String] {
        &self.operations
    }

    /// Events this service sends, first-seen order, no duplicates.
    pub fn calls(&self) -> &[String] {
        &self.calls
    }
}

/// A step points at an environment the database does not contain.
///
/// Unreachable for a database built through its own operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "step {index} of diagram `{diagram}` references unknown environment `{environment}` (model invariant violated)"
)]
pub struct FlattenError {
    pub diagram: DiagramId,
    pub index: usize,
    pub environment: EnvironmentId,
}

#[derive(Default)]
struct Declarations {
    operations: IndexSet<String>,
    calls: IndexSet<String>,
}

/// Flatten `database` into one [`FlatService`] per environment, in environment creation order.
///
/// # Errors
///
/// Returns [`FlattenError`] if a step references a missing environment.
pub fn flatten(database: &Database) -> Result<Vec<FlatService>, FlattenError> {
    let mut declarations: IndexMap<EnvironmentId, Declarations> = database
        .environments()
        .map(|environment| (environment.id(), Declarations::default()))
        .collect();

    for diagram in database.diagrams() {
        for (index, step) in diagram.steps().iter().enumerate() {
            let dangling = |environment| FlattenError {
                diagram: diagram.id(),
                index,
                environment,
            };

            declarations
                .get_mut(&step.to())
                .ok_or_else(|| dangling(step.to()))?
                .operations
                .insert(step.event().to_string());
            declarations
                .get_mut(&step.from())
                .ok_or_else(|| dangling(step.from()))?
                .calls
                .insert(step.event().to_string());
        }
    }

    let services: Vec<FlatService> = database
        .environments()
        .zip(declarations.into_values())
        .map(|(environment, declared)| FlatService {
            id: environment.id(),
            name: environment.name().to_string(),
            operations: declared.operations.into_iter().collect(),
            calls: declared.calls.into_iter().collect(),
        })
        .collect();

    debug!(services = services.len(); "Database flattened");
    trace!(services:?; "Flattened IR");
    Ok(services)
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// A database with `2..5` environments and one diagram of random steps
    /// between distinct environments.
    fn database_strategy() -> impl Strategy<Value = Database> {
        (2usize..5)
            .prop_flat_map(|count| {
                let step = (0..count, 1..count, "[a-c]{0,2}");
                (Just(count), prop::collection::vec(step, 0..12))
            })
            .prop_map(|(count, steps)| {
                let mut db = Database::new();
                let environments: Vec<_> = (0..count)
                    .map(|i| db.add_environment(format!("Env {i}")))
                    .collect();
                let diagram = db.add_diagram("Random");
                for (index, (from, offset, event)) in steps.into_iter().enumerate() {
                    let to = (from + offset) % count;
                    db.add_step(diagram, environments[from], environments[to], index)
                        .unwrap();
                    db.edit_step_event(diagram, index, event).unwrap();
                }
                db
            })
    }

    // ===================
    // Property Test Functions
    // ===================

    fn check_every_step_is_declared(db: Database) -> Result<(), TestCaseError> {
        let ir = flatten(&db)?;
        let service = |id: EnvironmentId| ir.iter().find(|service| service.id() == id);

        prop_assert_eq!(ir.len(), db.environments().len());
        for diagram in db.diagrams() {
            for step in diagram.steps() {
                let from = service(step.from())
                    .ok_or_else(|| TestCaseError::fail("missing sender"))?;
                let to = service(step.to())
                    .ok_or_else(|| TestCaseError::fail("missing receiver"))?;
                prop_assert!(from.calls().iter().any(|call| call == step.event()));
                prop_assert!(to.operations().iter().any(|op| op == step.event()));
            }
        }
        Ok(())
    }

    fn check_declarations_are_unique(db: Database) -> Result<(), TestCaseError> {
        for service in flatten(&db)? {
            let operations: IndexSet<_> = service.operations().iter().collect();
            let calls: IndexSet<_> = service.calls().iter().collect();
            prop_assert_eq!(operations.len(), service.operations().len());
            prop_assert_eq!(calls.len(), service.calls().len());
        }
        Ok(())
    }

    fn check_deterministic(db: Database) -> Result<(), TestCaseError> {
        prop_assert_eq!(flatten(&db)?, flatten(&db.clone())?);
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn every_step_is_declared(db in database_strategy()) {
            check_every_step_is_declared(db)?;
        }

        #[test]
        fn declarations_are_unique(db in database_strategy()) {
            check_declarations_are_unique(db)?;
        }

        #[test]
        fn flatten_is_deterministic(db in database_strategy()) {
            check_deterministic(db)?;
        }
    }
}

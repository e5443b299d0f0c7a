//! The [`Database`] aggregate and its mutation operations.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    error::ModelError,
    identifier::{DiagramId, EnvironmentId},
    model::{Environment, SequenceDiagram, Step},
};

/// Root aggregate owning every environment and sequence diagram of one editing session.
///
/// Environments and diagrams live in insertion-ordered arenas keyed by their
/// stable ids. Steps refer to environments only by id, and every mutation
/// keeps those references valid:
///
/// - every step endpoint names an existing environment,
/// - no step connects an environment to itself,
/// - step positions within a diagram are contiguous.
///
/// Generated ids are never reused, even after a delete, so a stale id keeps
/// failing with a not-found error instead of naming a newer entity.
///
/// Serialized through [`RawDatabase`]; deserialization re-checks all
/// invariants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "RawDatabase", into = "RawDatabase")]
pub struct Database {
    environments: IndexMap<EnvironmentId, Environment>,
    diagrams: IndexMap<DiagramId, SequenceDiagram>,
    /// Highest generated environment number handed out so far.
    last_environment: usize,
    /// Highest generated diagram number handed out so far.
    last_diagram: usize,
}

/// Unvalidated, list-based form of a [`Database`] as it appears on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDatabase {
    #[serde(default)]
    pub environments: Vec<Environment>,
    #[serde(default)]
    pub diagrams: Vec<SequenceDiagram>,
}

impl Database {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Environments in creation order.
    pub fn environments(&self) -> impl ExactSizeIterator<Item = &Environment> {
        self.environments.values()
    }

    /// Look up an environment by id.
    pub fn environment(&self, id: EnvironmentId) -> Option<&Environment> {
        self.environments.get(&id)
    }

    /// Returns `true` if `id` names an existing environment.
    pub fn contains_environment(&self, id: EnvironmentId) -> bool {
        self.environments.contains_key(&id)
    }

    /// Diagrams in creation order.
    pub fn diagrams(&self) -> impl ExactSizeIterator<Item = &SequenceDiagram> {
        self.diagrams.values()
    }

    /// Look up a diagram by id.
    pub fn diagram(&self, id: DiagramId) -> Option<&SequenceDiagram> {
        self.diagrams.get(&id)
    }

    /// Create an environment with a fresh id.
    pub fn add_environment(&mut self, name: impl Into<String>) -> EnvironmentId {
        let environments = &self.environments;
        let id = EnvironmentId::fresh(&mut self.last_environment, |candidate| {
            environments.contains_key(&candidate)
        });
        self.environments.insert(id, Environment::new(id, name));
        id
    }

    /// Rename an environment in place.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EnvironmentNotFound`] if `id` is unknown.
    pub fn rename_environment(
        &mut self,
        id: EnvironmentId,
        name: impl Into<String>,
    ) -> Result<(), ModelError> {
        let environment = self
            .environments
            .get_mut(&id)
            .ok_or(ModelError::EnvironmentNotFound(id))?;
        environment.set_name(name.into());
        Ok(())
    }

    /// Delete an environment, cascading to every step that references it.
    ///
    /// Returns the number of steps removed across all diagrams.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EnvironmentNotFound`] if `id` is unknown.
    pub fn delete_environment(&mut self, id: EnvironmentId) -> Result<usize, ModelError> {
        self.environments
            .shift_remove(&id)
            .ok_or(ModelError::EnvironmentNotFound(id))?;

        let removed: usize = self
            .diagrams
            .values_mut()
            .map(|diagram| diagram.purge(id))
            .sum();
        debug!(environment:% = id, removed_steps = removed; "Environment deleted");
        Ok(removed)
    }

    /// Create an empty diagram with a fresh id, appended after existing diagrams.
    pub fn add_diagram(&mut self, title: impl Into<String>) -> DiagramId {
        let id = self.fresh_diagram_id();
        self.diagrams.insert(id, SequenceDiagram::new(id, title));
        id
    }

    /// Change a diagram's title.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DiagramNotFound`] if `id` is unknown.
    pub fn rename_diagram(
        &mut self,
        id: DiagramId,
        title: impl Into<String>,
    ) -> Result<(), ModelError> {
        self.diagram_mut(id)?.set_title(title.into());
        Ok(())
    }

    /// Remove a diagram and all of its steps. Environments are kept.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DiagramNotFound`] if `id` is unknown.
    pub fn delete_diagram(&mut self, id: DiagramId) -> Result<SequenceDiagram, ModelError> {
        self.diagrams
            .shift_remove(&id)
            .ok_or(ModelError::DiagramNotFound(id))
    }

    /// Copy a diagram (title, environments and steps) into a new diagram appended at the end.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DiagramNotFound`] if `id` is unknown.
    pub fn duplicate_diagram(&mut self, id: DiagramId) -> Result<DiagramId, ModelError> {
        if !self.diagrams.contains_key(&id) {
            return Err(ModelError::DiagramNotFound(id));
        }
        let new_id = self.fresh_diagram_id();
        let copy = self
            .diagram(id)
            .ok_or(ModelError::DiagramNotFound(id))?
            .duplicate(new_id);
        self.diagrams.insert(new_id, copy);
        Ok(new_id)
    }

    /// Attach an environment to a diagram so it gets a column before any step uses it.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DiagramNotFound`] or [`ModelError::EnvironmentNotFound`].
    pub fn attach_environment(
        &mut self,
        diagram: DiagramId,
        environment: EnvironmentId,
    ) -> Result<(), ModelError> {
        if !self.contains_environment(environment) {
            return Err(ModelError::EnvironmentNotFound(environment));
        }
        self.diagram_mut(diagram)?.attach(environment);
        Ok(())
    }

    /// Insert a step with an empty event at `index`, shifting later steps down.
    ///
    /// `index == steps.len()` appends.
    ///
    /// # Errors
    ///
    /// - [`ModelError::DiagramNotFound`] if the diagram is unknown
    /// - [`ModelError::SelfLoop`] if `from == to`
    /// - [`ModelError::UnknownEndpoint`] if either endpoint is unknown
    /// - [`ModelError::InsertOutOfRange`] if `index > steps.len()`
    pub fn add_step(
        &mut self,
        diagram: DiagramId,
        from: EnvironmentId,
        to: EnvironmentId,
        index: usize,
    ) -> Result<(), ModelError> {
        if from == to {
            return Err(ModelError::SelfLoop(from));
        }
        if let Some(unknown) = [from, to]
            .into_iter()
            .find(|endpoint| !self.contains_environment(*endpoint))
        {
            return Err(ModelError::UnknownEndpoint(unknown));
        }

        let target = self.diagram_mut(diagram)?;
        let len = target.steps().len();
        if index > len {
            return Err(ModelError::InsertOutOfRange {
                diagram,
                index,
                len,
            });
        }
        target.insert_step(index, Step::new(from, to, String::new()));
        Ok(())
    }

    /// Replace the event text of the step at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DiagramNotFound`] or [`ModelError::StepNotFound`].
    pub fn edit_step_event(
        &mut self,
        diagram: DiagramId,
        index: usize,
        event: impl Into<String>,
    ) -> Result<(), ModelError> {
        let target = self.diagram_mut(diagram)?;
        let len = target.steps().len();
        target
            .step_mut(index)
            .ok_or(ModelError::StepNotFound {
                diagram,
                index,
                len,
            })?
            .set_event(event.into());
        Ok(())
    }

    /// Remove the step at `index`, shifting later steps up.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DiagramNotFound`] or [`ModelError::StepNotFound`].
    pub fn delete_step(&mut self, diagram: DiagramId, index: usize) -> Result<Step, ModelError> {
        let target = self.diagram_mut(diagram)?;
        let len = target.steps().len();
        if index >= len {
            return Err(ModelError::StepNotFound {
                diagram,
                index,
                len,
            });
        }
        Ok(target.remove_step(index))
    }

    /// Check every model invariant.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, scanning diagrams in order.
    pub fn validate(&self) -> Result<(), ModelError> {
        for diagram in self.diagrams.values() {
            if let Some(unknown) = diagram
                .environments()
                .find(|environment| !self.contains_environment(*environment))
            {
                return Err(ModelError::EnvironmentNotFound(unknown));
            }
            for step in diagram.steps() {
                if step.from() == step.to() {
                    return Err(ModelError::SelfLoop(step.from()));
                }
                for endpoint in [step.from(), step.to()] {
                    if !self.contains_environment(endpoint) {
                        return Err(ModelError::UnknownEndpoint(endpoint));
                    }
                }
            }
        }
        Ok(())
    }

    fn fresh_diagram_id(&mut self) -> DiagramId {
        let diagrams = &self.diagrams;
        DiagramId::fresh(&mut self.last_diagram, |candidate| {
            diagrams.contains_key(&candidate)
        })
    }

    fn diagram_mut(&mut self, id: DiagramId) -> Result<&mut SequenceDiagram, ModelError> {
        self.diagrams
            .get_mut(&id)
            .ok_or(ModelError::DiagramNotFound(id))
    }
}

// IndexMap equality ignores order; creation order drives flattening and codegen.
impl PartialEq for Database {
    fn eq(&self, other: &Self) -> bool {
        self.environments.iter().eq(other.environments.iter())
            && self.diagrams.iter().eq(other.diagrams.iter())
    }
}

impl Eq for Database {}

impl TryFrom<RawDatabase> for Database {
    type Error = ModelError;

    fn try_from(raw: RawDatabase) -> Result<Self, Self::Error> {
        let mut environments = IndexMap::with_capacity(raw.environments.len());
        for environment in raw.environments {
            let id = environment.id();
            if environments.insert(id, environment).is_some() {
                return Err(ModelError::DuplicateEnvironment(id));
            }
        }

        let mut seen = HashSet::with_capacity(raw.diagrams.len());
        let mut diagrams = IndexMap::with_capacity(raw.diagrams.len());
        for diagram in raw.diagrams {
            let id = diagram.id();
            if !seen.insert(id) {
                return Err(ModelError::DuplicateDiagram(id));
            }
            diagrams.insert(id, diagram);
        }

        // Loaded ids seed the generators so new ids continue after them.
        let last_environment = environments
            .keys()
            .filter_map(|id| id.number())
            .max()
            .unwrap_or(0);
        let last_diagram = diagrams
            .keys()
            .filter_map(|id| id.number())
            .max()
            .unwrap_or(0);

        let database = Self {
            environments,
            diagrams,
            last_environment,
            last_diagram,
        };
        database.validate()?;
        Ok(database)
    }
}

impl From<Database> for RawDatabase {
    fn from(database: Database) -> Self {
        Self {
            environments: database.environments.into_values().collect(),
            diagrams: database.diagrams.into_values().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn two_party() -> (Database, DiagramId, EnvironmentId, EnvironmentId) {
        let mut db = Database::new();
        let a = db.add_environment("A");
        let b = db.add_environment("B");
        let diagram = db.add_diagram("Handshake");
        (db, diagram, a, b)
    }

    #[test]
    fn test_add_environment_generates_unique_ids() {
        let mut db = Database::new();
        let a = db.add_environment("A");
        let b = db.add_environment("A");

        assert_ne!(a, b);
        assert_eq!(db.environments().len(), 2);
    }

    #[test]
    fn test_deleted_environment_id_is_not_reused() {
        let mut db = Database::new();
        let stale = db.add_environment("Old");
        db.delete_environment(stale).unwrap();

        let fresh = db.add_environment("New");

        assert_ne!(fresh, stale);
        let err = db.rename_environment(stale, "Renamed").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(db.environment(fresh).unwrap().name(), "New");
    }

    #[test]
    fn test_deleted_diagram_id_is_not_reused() {
        let mut db = Database::new();
        let first = db.add_diagram("First");
        let second = db.add_diagram("Second");
        db.delete_diagram(second).unwrap();

        let copy = db.duplicate_diagram(first).unwrap();
        let added = db.add_diagram("Third");

        assert_ne!(copy, second);
        assert_ne!(added, second);
        assert_ne!(added, copy);
        assert!(matches!(
            db.rename_diagram(second, "Gone"),
            Err(ModelError::DiagramNotFound(_))
        ));
    }

    #[test]
    fn test_loaded_ids_seed_generators() {
        let raw = RawDatabase {
            environments: vec![
                Environment::new(EnvironmentId::numbered(7), "Seven"),
                Environment::new(EnvironmentId::from("custom"), "Custom"),
            ],
            diagrams: vec![SequenceDiagram::new(DiagramId::numbered(3), "Three")],
        };
        let mut db = Database::try_from(raw).unwrap();

        assert_eq!(db.add_environment("Next"), "env-8");
        assert_eq!(db.add_diagram("Next"), "diagram-4");
    }

    #[test]
    fn test_rename_environment_keeps_identity() {
        let (mut db, _, a, _) = two_party();
        db.rename_environment(a, "Gateway").unwrap();

        assert_eq!(db.environment(a).unwrap().name(), "Gateway");
        assert_eq!(db.environment(a).unwrap().id(), a);
    }

    #[test]
    fn test_rename_unknown_environment() {
        let mut db = Database::new();
        let err = db
            .rename_environment(EnvironmentId::from("ghost"), "x")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_add_step_inserts_empty_event_and_shifts() {
        let (mut db, diagram, a, b) = two_party();
        db.add_step(diagram, a, b, 0).unwrap();
        db.edit_step_event(diagram, 0, "second").unwrap();
        db.add_step(diagram, b, a, 0).unwrap();

        let steps = db.diagram(diagram).unwrap().steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0], Step::new(b, a, ""));
        assert_eq!(steps[1], Step::new(a, b, "second"));
    }

    #[test]
    fn test_add_step_appends_at_len() {
        let (mut db, diagram, a, b) = two_party();
        db.add_step(diagram, a, b, 0).unwrap();
        db.add_step(diagram, b, a, 1).unwrap();

        assert_eq!(db.diagram(diagram).unwrap().steps()[1].from(), b);
    }

    #[test]
    fn test_add_step_rejects_self_loop() {
        let (mut db, diagram, a, _) = two_party();
        let err = db.add_step(diagram, a, a, 0).unwrap_err();

        assert_eq!(err, ModelError::SelfLoop(a));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(db.diagram(diagram).unwrap().steps().is_empty());
    }

    #[test]
    fn test_add_step_rejects_unknown_endpoint() {
        let (mut db, diagram, a, _) = two_party();
        let ghost = EnvironmentId::from("ghost");
        let err = db.add_step(diagram, a, ghost, 0).unwrap_err();

        assert_eq!(err, ModelError::UnknownEndpoint(ghost));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_add_step_rejects_out_of_range_index() {
        let (mut db, diagram, a, b) = two_party();
        let err = db.add_step(diagram, a, b, 1).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(db.diagram(diagram).unwrap().steps().is_empty());
    }

    #[test]
    fn test_edit_and_delete_out_of_range() {
        let (mut db, diagram, _, _) = two_party();

        let edit = db.edit_step_event(diagram, 0, "x").unwrap_err();
        let delete = db.delete_step(diagram, 0).unwrap_err();

        assert_eq!(edit.kind(), ErrorKind::NotFound);
        assert_eq!(delete.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_delete_step_renumbers() {
        let (mut db, diagram, a, b) = two_party();
        for (index, event) in ["one", "two", "three"].iter().enumerate() {
            db.add_step(diagram, a, b, index).unwrap();
            db.edit_step_event(diagram, index, *event).unwrap();
        }

        let removed = db.delete_step(diagram, 1).unwrap();

        assert_eq!(removed.event(), "two");
        let events: Vec<_> = db
            .diagram(diagram)
            .unwrap()
            .steps()
            .iter()
            .map(Step::event)
            .collect();
        assert_eq!(events, ["one", "three"]);
    }

    #[test]
    fn test_delete_environment_cascades_across_diagrams() {
        let (mut db, first, a, b) = two_party();
        let c = db.add_environment("C");
        let second = db.add_diagram("Other");
        db.add_step(first, a, b, 0).unwrap();
        db.edit_step_event(first, 0, "ping").unwrap();
        db.add_step(second, b, c, 0).unwrap();
        db.add_step(second, c, a, 1).unwrap();

        let removed = db.delete_environment(a).unwrap();

        assert_eq!(removed, 2);
        assert!(db.environment(a).is_none());
        assert!(
            db.diagrams()
                .flat_map(|diagram| diagram.steps())
                .all(|step| !step.involves(a))
        );
        assert!(db.diagrams().all(|diagram| !diagram.references(a)));
        assert_eq!(db.diagram(second).unwrap().steps().len(), 1);
        db.validate().unwrap();
    }

    #[test]
    fn test_delete_unknown_environment() {
        let mut db = Database::new();
        assert_eq!(
            db.delete_environment(EnvironmentId::from("ghost"))
                .unwrap_err()
                .kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_duplicate_diagram_copies_content() {
        let (mut db, diagram, a, b) = two_party();
        db.add_step(diagram, a, b, 0).unwrap();

        let copy = db.duplicate_diagram(diagram).unwrap();

        assert_ne!(copy, diagram);
        let original = db.diagram(diagram).unwrap();
        let duplicated = db.diagram(copy).unwrap();
        assert_eq!(duplicated.title(), original.title());
        assert_eq!(duplicated.steps(), original.steps());
        assert_eq!(db.diagrams().last().unwrap().id(), copy);
    }

    #[test]
    fn test_attach_environment() {
        let (mut db, diagram, a, _) = two_party();
        db.attach_environment(diagram, a).unwrap();

        assert!(db.diagram(diagram).unwrap().references(a));
        assert!(
            db.attach_environment(diagram, EnvironmentId::from("ghost"))
                .is_err()
        );
    }

    #[test]
    fn test_raw_round_trip_preserves_order() {
        let (mut db, diagram, a, b) = two_party();
        db.add_step(diagram, b, a, 0).unwrap();

        let raw = RawDatabase::from(db.clone());
        let back = Database::try_from(raw).unwrap();

        assert_eq!(back, db);
    }

    #[test]
    fn test_try_from_rejects_dangling_step() {
        let a = EnvironmentId::from("a");
        let ghost = EnvironmentId::from("ghost");
        let raw = RawDatabase {
            environments: vec![Environment::new(a, "A")],
            diagrams: vec![SequenceDiagram::with_content(
                DiagramId::from("d"),
                "t",
                [a],
                vec![Step::new(a, ghost, "ping")],
            )],
        };

        assert_eq!(
            Database::try_from(raw).unwrap_err(),
            ModelError::UnknownEndpoint(ghost)
        );
    }

    #[test]
    fn test_try_from_rejects_duplicate_ids() {
        let a = EnvironmentId::from("a");
        let raw = RawDatabase {
            environments: vec![Environment::new(a, "A"), Environment::new(a, "Again")],
            diagrams: vec![],
        };

        assert_eq!(
            Database::try_from(raw).unwrap_err(),
            ModelError::DuplicateEnvironment(a)
        );
    }
}

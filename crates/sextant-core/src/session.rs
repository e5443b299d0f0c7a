//! The editing session: the boundary between the UI shell and the model.
//!
//! A [`Session`] owns the [`Database`] and one [`EditState`] per diagram.
//! The shell reports user actions through the `on_*` callbacks and
//! [`Session::select`], then re-renders from [`Session::database`] and
//! [`Session::selection`].
//!
//! Pending selections store a row index. Commands that move rows clear the
//! pending selections they can affect (see [`Command::selection_impact`]),
//! so a selection never points at a stale row.

use std::collections::HashMap;

use log::{debug, warn};

use crate::{
    command::{Command, CommandOutcome, SelectionImpact},
    edit::{EditEvent, EditState},
    error::ModelError,
    identifier::{DiagramId, EnvironmentId},
    model::Database,
};

/// Name given to environments created from the shell.
pub const DEFAULT_ENVIRONMENT_NAME: &str = "New environment";

/// Title given to diagrams created from the shell.
pub const DEFAULT_DIAGRAM_TITLE: &str = "Untitled diagram";

/// A single-editor session over one [`Database`].
#[derive(Debug, Clone, Default)]
pub struct Session {
    database: Database,
    selections: HashMap<DiagramId, EditState>,
}

impl Session {
    /// Start a session over a loaded or fresh database.
    pub fn new(database: Database) -> Self {
        Self {
            database,
            selections: HashMap::new(),
        }
    }

    /// Borrow the current model.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Take an owned copy of the model, unaffected by later edits.
    pub fn snapshot(&self) -> Database {
        self.database.clone()
    }

    /// End the session and return the model.
    pub fn into_database(self) -> Database {
        self.database
    }

    /// Current step-creation state of `diagram`.
    pub fn selection(&self, diagram: DiagramId) -> EditState {
        self.selections.get(&diagram).copied().unwrap_or_default()
    }

    /// Apply a command and reconcile pending selections.
    ///
    /// # Errors
    ///
    /// Returns the [`ModelError`] if the model rejects the command. Nothing
    /// changes in that case.
    pub fn dispatch(&mut self, command: Command) -> Result<CommandOutcome, ModelError> {
        let impact = command.selection_impact();
        let outcome = self.database.apply(command)?;
        match impact {
            SelectionImpact::None => {}
            SelectionImpact::Diagram(diagram) => {
                self.selections.remove(&diagram);
            }
            SelectionImpact::All => self.selections.clear(),
        }
        Ok(outcome)
    }

    /// Feed a cell click in `diagram` to that diagram's state machine.
    ///
    /// # Errors
    ///
    /// - [`ModelError::DiagramNotFound`] if `diagram` is unknown; the click is ignored.
    /// - The model's error if it rejects the committed step. The state machine
    ///   is back to [`EditState::Idle`] either way.
    pub fn select(
        &mut self,
        diagram: DiagramId,
        environment: EnvironmentId,
        index: usize,
    ) -> Result<(), ModelError> {
        if self.database.diagram(diagram).is_none() {
            return Err(ModelError::DiagramNotFound(diagram));
        }

        let transition =
            self.selection(diagram)
                .transition(diagram, EditEvent::Select { environment, index });
        self.selections.insert(diagram, transition.state);

        for effect in transition.effects {
            if let Err(err) = self.database.apply(effect) {
                warn!(diagram:% = diagram, err:%; "Step rejected");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Insert an empty step at `index`.
    ///
    /// # Errors
    ///
    /// See [`Database::add_step`].
    pub fn on_add_step(
        &mut self,
        diagram: DiagramId,
        from: EnvironmentId,
        to: EnvironmentId,
        index: usize,
    ) -> Result<(), ModelError> {
        self.dispatch(Command::AddStep {
            diagram,
            from,
            to,
            index,
        })
        .map(drop)
    }

    /// Replace the event text of the step at `index`.
    ///
    /// # Errors
    ///
    /// See [`Database::edit_step_event`].
    pub fn on_edit_event(
        &mut self,
        diagram: DiagramId,
        new_event: impl Into<String>,
        index: usize,
    ) -> Result<(), ModelError> {
        self.dispatch(Command::EditStepEvent {
            diagram,
            index,
            event: new_event.into(),
        })
        .map(drop)
    }

    /// Remove the step at `index`.
    ///
    /// # Errors
    ///
    /// See [`Database::delete_step`].
    pub fn on_delete_step(&mut self, diagram: DiagramId, index: usize) -> Result<(), ModelError> {
        self.dispatch(Command::DeleteStep { diagram, index }).map(drop)
    }

    /// Rename an environment.
    ///
    /// # Errors
    ///
    /// See [`Database::rename_environment`].
    pub fn on_edit_environment(
        &mut self,
        new_name: impl Into<String>,
        id: EnvironmentId,
    ) -> Result<(), ModelError> {
        self.dispatch(Command::RenameEnvironment {
            id,
            name: new_name.into(),
        })
        .map(drop)
    }

    /// Create an environment from `diagram`'s "add" button and attach it there.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DiagramNotFound`] if `diagram` is unknown; no
    /// environment is created in that case.
    pub fn on_create_environment(
        &mut self,
        diagram: DiagramId,
    ) -> Result<EnvironmentId, ModelError> {
        if self.database.diagram(diagram).is_none() {
            return Err(ModelError::DiagramNotFound(diagram));
        }

        let id = self.database.add_environment(DEFAULT_ENVIRONMENT_NAME);
        self.dispatch(Command::AttachEnvironment {
            diagram,
            environment: id,
        })?;
        debug!(environment:% = id, diagram:% = diagram; "Environment created");
        Ok(id)
    }

    /// Delete an environment and every step that references it.
    ///
    /// # Errors
    ///
    /// See [`Database::delete_environment`].
    pub fn on_delete_environment(&mut self, id: EnvironmentId) -> Result<(), ModelError> {
        self.dispatch(Command::DeleteEnvironment { id }).map(drop)
    }

    /// Create an empty diagram.
    pub fn on_add_diagram(&mut self, title: Option<String>) -> DiagramId {
        let title = title.unwrap_or_else(|| DEFAULT_DIAGRAM_TITLE.to_string());
        self.database.add_diagram(title)
    }

    /// Change a diagram's title.
    ///
    /// # Errors
    ///
    /// See [`Database::rename_diagram`].
    pub fn on_rename_diagram(
        &mut self,
        id: DiagramId,
        title: impl Into<String>,
    ) -> Result<(), ModelError> {
        self.dispatch(Command::RenameDiagram {
            id,
            title: title.into(),
        })
        .map(drop)
    }

    /// Delete a diagram.
    ///
    /// # Errors
    ///
    /// See [`Database::delete_diagram`].
    pub fn on_delete_diagram(&mut self, id: DiagramId) -> Result<(), ModelError> {
        self.dispatch(Command::DeleteDiagram { id }).map(drop)
    }

    /// Duplicate a diagram.
    ///
    /// # Errors
    ///
    /// See [`Database::duplicate_diagram`].
    pub fn on_duplicate_diagram(&mut self, id: DiagramId) -> Result<DiagramId, ModelError> {
        self.database.duplicate_diagram(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorKind, model::Step};

    fn session() -> (Session, DiagramId, EnvironmentId, EnvironmentId) {
        let mut db = Database::new();
        let a = db.add_environment("A");
        let b = db.add_environment("B");
        let diagram = db.add_diagram("Handshake");
        (Session::new(db), diagram, a, b)
    }

    #[test]
    fn test_two_click_commit() {
        let (mut session, diagram, a, b) = session();

        session.select(diagram, a, 0).unwrap();
        session.select(diagram, b, 0).unwrap();

        let steps = session.database().diagram(diagram).unwrap().steps();
        assert_eq!(steps, &[Step::new(a, b, "")]);
        assert_eq!(session.selection(diagram), EditState::Idle);
    }

    #[test]
    fn test_cancellation() {
        let (mut session, diagram, a, _) = session();

        session.select(diagram, a, 0).unwrap();
        assert!(session.selection(diagram).is_selected(a, 0));
        session.select(diagram, a, 0).unwrap();

        assert!(session.database().diagram(diagram).unwrap().steps().is_empty());
        assert_eq!(session.selection(diagram), EditState::Idle);
    }

    #[test]
    fn test_rejected_step_does_not_rearm() {
        let (mut session, diagram, a, b) = session();

        session.select(diagram, a, 0).unwrap();
        // Environment `a` disappears between the two clicks.
        session.database.delete_environment(a).unwrap();
        let err = session.select(diagram, b, 0).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(session.selection(diagram), EditState::Idle);
        assert!(session.database().diagram(diagram).unwrap().steps().is_empty());
    }

    #[test]
    fn test_step_change_clears_pending_selection_in_same_diagram() {
        let (mut session, diagram, a, b) = session();
        let other = session.on_add_diagram(Some("Other".to_string()));
        session.on_add_step(diagram, a, b, 0).unwrap();

        session.select(diagram, a, 1).unwrap();
        session.select(other, b, 0).unwrap();
        session.on_delete_step(diagram, 0).unwrap();

        assert_eq!(session.selection(diagram), EditState::Idle);
        assert!(session.selection(other).is_selected(b, 0));
    }

    #[test]
    fn test_environment_delete_clears_all_pending_selections() {
        let (mut session, diagram, a, b) = session();
        let other = session.on_add_diagram(None);
        let c = session.on_create_environment(other).unwrap();

        session.select(diagram, a, 0).unwrap();
        session.select(other, b, 0).unwrap();
        session.on_delete_environment(c).unwrap();

        assert_eq!(session.selection(diagram), EditState::Idle);
        assert_eq!(session.selection(other), EditState::Idle);
    }

    #[test]
    fn test_text_edits_keep_pending_selection() {
        let (mut session, diagram, a, b) = session();
        session.on_add_step(diagram, a, b, 0).unwrap();

        session.select(diagram, b, 1).unwrap();
        session.on_edit_event(diagram, "ping", 0).unwrap();
        session.on_edit_environment("Gateway", a).unwrap();

        assert!(session.selection(diagram).is_selected(b, 1));
        assert_eq!(session.database().environment(a).unwrap().name(), "Gateway");
    }

    #[test]
    fn test_select_in_unknown_diagram() {
        let (mut session, _, a, _) = session();
        let ghost = DiagramId::from("ghost");

        let err = session.select(ghost, a, 0).unwrap_err();

        assert_eq!(err, ModelError::DiagramNotFound(ghost));
        assert_eq!(session.selection(ghost), EditState::Idle);
    }

    #[test]
    fn test_create_environment_attaches_to_diagram() {
        let (mut session, diagram, _, _) = session();

        let id = session.on_create_environment(diagram).unwrap();

        let db = session.database();
        assert_eq!(db.environment(id).unwrap().name(), DEFAULT_ENVIRONMENT_NAME);
        assert!(db.diagram(diagram).unwrap().references(id));
    }

    #[test]
    fn test_edit_deleted_environment_after_recreate() {
        let (mut session, diagram, a, _) = session();
        session.on_delete_environment(a).unwrap();

        let created = session.on_create_environment(diagram).unwrap();

        assert_ne!(created, a);
        let err = session.on_edit_environment("Renamed", a).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let environment = session.database().environment(created).unwrap();
        assert_eq!(environment.name(), DEFAULT_ENVIRONMENT_NAME);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let (mut session, diagram, a, b) = session();
        let snapshot = session.snapshot();

        session.on_add_step(diagram, a, b, 0).unwrap();

        assert!(snapshot.diagram(diagram).unwrap().steps().is_empty());
        assert_eq!(session.database().diagram(diagram).unwrap().steps().len(), 1);
    }

    #[test]
    fn test_diagram_lifecycle() {
        let (mut session, diagram, a, b) = session();
        session.on_add_step(diagram, a, b, 0).unwrap();

        let copy = session.on_duplicate_diagram(diagram).unwrap();
        session.on_rename_diagram(copy, "Copy").unwrap();
        session.on_delete_diagram(diagram).unwrap();

        let db = session.into_database();
        assert_eq!(db.diagrams().len(), 1);
        assert_eq!(db.diagram(copy).unwrap().title(), "Copy");
        assert_eq!(db.diagram(copy).unwrap().steps().len(), 1);
    }
}

//! Named model commands and the reducer that applies them.
//!
//! The editor shell never mutates the [`Database`] directly: it emits a
//! [`Command`], and [`Database::apply`] either performs it completely or
//! rejects it with a [`ModelError`] and leaves the database untouched.

use log::debug;

use crate::{
    error::ModelError,
    identifier::{DiagramId, EnvironmentId},
    model::Database,
};

/// A single model mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddEnvironment {
        name: String,
    },
    RenameEnvironment {
        id: EnvironmentId,
        name: String,
    },
    DeleteEnvironment {
        id: EnvironmentId,
    },
    AddDiagram {
        title: String,
    },
    RenameDiagram {
        id: DiagramId,
        title: String,
    },
    DeleteDiagram {
        id: DiagramId,
    },
    DuplicateDiagram {
        id: DiagramId,
    },
    AttachEnvironment {
        diagram: DiagramId,
        environment: EnvironmentId,
    },
    AddStep {
        diagram: DiagramId,
        from: EnvironmentId,
        to: EnvironmentId,
        index: usize,
    },
    EditStepEvent {
        diagram: DiagramId,
        index: usize,
        event: String,
    },
    DeleteStep {
        diagram: DiagramId,
        index: usize,
    },
}

impl Command {
    /// Short command name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddEnvironment { .. } => "addEnvironment",
            Command::RenameEnvironment { .. } => "renameEnvironment",
            Command::DeleteEnvironment { .. } => "deleteEnvironment",
            Command::AddDiagram { .. } => "addDiagram",
            Command::RenameDiagram { .. } => "renameDiagram",
            Command::DeleteDiagram { .. } => "deleteDiagram",
            Command::DuplicateDiagram { .. } => "duplicateDiagram",
            Command::AttachEnvironment { .. } => "attachEnvironment",
            Command::AddStep { .. } => "addStep",
            Command::EditStepEvent { .. } => "editStepEvent",
            Command::DeleteStep { .. } => "deleteStep",
        }
    }

    /// Which pending step-creation selections this command can invalidate.
    ///
    /// Inserting or removing a step moves the rows of its own diagram.
    /// Deleting an environment can remove steps anywhere.
    pub fn selection_impact(&self) -> SelectionImpact {
        match self {
            Command::AddStep { diagram, .. }
            | Command::DeleteStep { diagram, .. }
            | Command::DeleteDiagram { id: diagram } => SelectionImpact::Diagram(*diagram),
            Command::DeleteEnvironment { .. } => SelectionImpact::All,
            Command::AddEnvironment { .. }
            | Command::RenameEnvironment { .. }
            | Command::AddDiagram { .. }
            | Command::RenameDiagram { .. }
            | Command::DuplicateDiagram { .. }
            | Command::AttachEnvironment { .. }
            | Command::EditStepEvent { .. } => SelectionImpact::None,
        }
    }
}

/// Scope of pending selections a [`Command`] invalidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionImpact {
    None,
    Diagram(DiagramId),
    All,
}

/// What a successfully applied [`Command`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command changed the model and created nothing new.
    Applied,
    /// A new environment was created.
    EnvironmentCreated(EnvironmentId),
    /// A new diagram was created.
    DiagramCreated(DiagramId),
}

impl Database {
    /// Apply a command to the database.
    ///
    /// # Errors
    ///
    /// Returns the [`ModelError`] of the underlying operation. The database is
    /// unchanged when an error is returned.
    pub fn apply(&mut self, command: Command) -> Result<CommandOutcome, ModelError> {
        let command_name = command.name();
        let outcome = match command {
            Command::AddEnvironment { name } => {
                CommandOutcome::EnvironmentCreated(self.add_environment(name))
            }
            Command::RenameEnvironment { id, name } => {
                self.rename_environment(id, name)?;
                CommandOutcome::Applied
            }
            Command::DeleteEnvironment { id } => {
                self.delete_environment(id)?;
                CommandOutcome::Applied
            }
            Command::AddDiagram { title } => {
                CommandOutcome::DiagramCreated(self.add_diagram(title))
            }
            Command::RenameDiagram { id, title } => {
                self.rename_diagram(id, title)?;
                CommandOutcome::Applied
            }
            Command::DeleteDiagram { id } => {
                self.delete_diagram(id)?;
                CommandOutcome::Applied
            }
            Command::DuplicateDiagram { id } => {
                CommandOutcome::DiagramCreated(self.duplicate_diagram(id)?)
            }
            Command::AttachEnvironment {
                diagram,
                environment,
            } => {
                self.attach_environment(diagram, environment)?;
                CommandOutcome::Applied
            }
            Command::AddStep {
                diagram,
                from,
                to,
                index,
            } => {
                self.add_step(diagram, from, to, index)?;
                CommandOutcome::Applied
            }
            Command::EditStepEvent {
                diagram,
                index,
                event,
            } => {
                self.edit_step_event(diagram, index, event)?;
                CommandOutcome::Applied
            }
            Command::DeleteStep { diagram, index } => {
                self.delete_step(diagram, index)?;
                CommandOutcome::Applied
            }
        };
        debug!(command = command_name, outcome:?; "Command applied");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_reports_created_ids() {
        let mut db = Database::new();

        let env = db
            .apply(Command::AddEnvironment {
                name: "Gateway".to_string(),
            })
            .unwrap();
        let diagram = db
            .apply(Command::AddDiagram {
                title: "Login".to_string(),
            })
            .unwrap();

        let CommandOutcome::EnvironmentCreated(env) = env else {
            panic!("Expected EnvironmentCreated, got {env:?}");
        };
        let CommandOutcome::DiagramCreated(diagram) = diagram else {
            panic!("Expected DiagramCreated, got {diagram:?}");
        };
        assert_eq!(db.environment(env).unwrap().name(), "Gateway");
        assert_eq!(db.diagram(diagram).unwrap().title(), "Login");
    }

    #[test]
    fn test_rejected_command_leaves_database_untouched() {
        let mut db = Database::new();
        let a = db.add_environment("A");
        let diagram = db.add_diagram("Login");
        let before = db.clone();

        let result = db.apply(Command::AddStep {
            diagram,
            from: a,
            to: a,
            index: 0,
        });

        assert_eq!(result, Err(ModelError::SelfLoop(a)));
        assert_eq!(db, before);
    }

    #[test]
    fn test_selection_impact() {
        let diagram = DiagramId::from("d");
        assert_eq!(
            Command::DeleteStep { diagram, index: 0 }.selection_impact(),
            SelectionImpact::Diagram(diagram)
        );
        assert_eq!(
            Command::DeleteEnvironment {
                id: EnvironmentId::from("a")
            }
            .selection_impact(),
            SelectionImpact::All
        );
        assert_eq!(
            Command::EditStepEvent {
                diagram,
                index: 0,
                event: "ping".to_string()
            }
            .selection_impact(),
            SelectionImpact::None
        );
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;
    use crate::model::RawDatabase;

    // ===================
    // Strategies
    // ===================

    /// Environment and diagram ids drawn from a small pool so commands often
    /// hit existing entities and sometimes miss.
    fn environment_strategy() -> impl Strategy<Value = EnvironmentId> {
        (0usize..5).prop_map(EnvironmentId::numbered)
    }

    fn diagram_strategy() -> impl Strategy<Value = DiagramId> {
        (0usize..3).prop_map(DiagramId::numbered)
    }

    fn command_strategy() -> impl Strategy<Value = Command> {
        prop_oneof![
            "[a-z]{0,6}".prop_map(|name| Command::AddEnvironment { name }),
            (environment_strategy(), "[a-z]{0,6}")
                .prop_map(|(id, name)| Command::RenameEnvironment { id, name }),
            environment_strategy().prop_map(|id| Command::DeleteEnvironment { id }),
            "[a-z]{0,6}".prop_map(|title| Command::AddDiagram { title }),
            diagram_strategy().prop_map(|id| Command::DeleteDiagram { id }),
            diagram_strategy().prop_map(|id| Command::DuplicateDiagram { id }),
            (
                diagram_strategy(),
                environment_strategy(),
                environment_strategy(),
                0usize..6
            )
                .prop_map(|(diagram, from, to, index)| Command::AddStep {
                    diagram,
                    from,
                    to,
                    index
                }),
            (diagram_strategy(), 0usize..6, "[a-z]{0,6}").prop_map(|(diagram, index, event)| {
                Command::EditStepEvent {
                    diagram,
                    index,
                    event,
                }
            }),
            (diagram_strategy(), 0usize..6)
                .prop_map(|(diagram, index)| Command::DeleteStep { diagram, index }),
        ]
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Any sequence of commands, accepted or rejected, leaves a valid database.
    fn check_commands_preserve_invariants(commands: Vec<Command>) -> Result<(), TestCaseError> {
        let mut db = Database::new();
        for command in commands {
            let before = db.clone();
            if db.apply(command).is_err() {
                prop_assert_eq!(&db, &before, "rejected command mutated the database");
            }
            prop_assert!(db.validate().is_ok(), "invariant violated: {:?}", db);
        }
        Ok(())
    }

    /// The list form of any reachable database converts back to an equal database.
    fn check_raw_round_trip(commands: Vec<Command>) -> Result<(), TestCaseError> {
        let mut db = Database::new();
        for command in commands {
            let _ = db.apply(command);
        }

        let back = Database::try_from(RawDatabase::from(db.clone()));
        prop_assert_eq!(back, Ok(db));
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn commands_preserve_invariants(
            commands in prop::collection::vec(command_strategy(), 0..40)
        ) {
            check_commands_preserve_invariants(commands)?;
        }

        #[test]
        fn raw_round_trip(commands in prop::collection::vec(command_strategy(), 0..40)) {
            check_raw_round_trip(commands)?;
        }
    }
}

//! Two-click step creation.
//!
//! The user picks an origin cell (environment + row), then a destination
//! cell. The second click commits an `addStep` command; clicking the same cell
//! twice cancels the gesture.
//!
//! ```text
//! Idle                    --SELECT(e, i)-->   EnvironmentChosen(e, i)
//! EnvironmentChosen(e, i) --SELECT(e, i)-->   Idle                        (cancel)
//! EnvironmentChosen(e, i) --SELECT(e', i')--> Idle, emit AddStep(e -> e', i')
//! ```
//!
//! [`EditState::transition`] is pure: it returns the next state and the
//! commands to apply. The caller applies them to the model.

use log::trace;

use crate::{
    command::Command,
    identifier::{DiagramId, EnvironmentId},
};

/// State of one diagram's step-creation gesture.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    /// No pending selection.
    #[default]
    Idle,
    /// The origin of a new step is selected; waiting for the destination.
    EnvironmentChosen {
        environment: EnvironmentId,
        index: usize,
    },
}

/// Input to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditEvent {
    /// The user clicked the cell of `environment` at row `index`.
    Select {
        environment: EnvironmentId,
        index: usize,
    },
}

/// Result of a single transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// The state after the event.
    pub state: EditState,
    /// Commands the caller must apply, in order.
    pub effects: Vec<Command>,
}

impl Transition {
    fn to(state: EditState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }
}

impl EditState {
    /// Compute the next state for `event` in `diagram`.
    ///
    /// The insertion index of a committed step is the row of the second
    /// click. The state is [`EditState::Idle`] after every completed or
    /// cancelled gesture, whether or not the model later accepts the command.
    pub fn transition(self, diagram: DiagramId, event: EditEvent) -> Transition {
        let EditEvent::Select { environment, index } = event;

        let transition = match self {
            EditState::Idle => Transition::to(EditState::EnvironmentChosen { environment, index }),
            EditState::EnvironmentChosen {
                environment: chosen,
                index: chosen_index,
            } if chosen == environment && chosen_index == index => Transition::to(EditState::Idle),
            EditState::EnvironmentChosen {
                environment: from, ..
            } => Transition {
                state: EditState::Idle,
                effects: vec![Command::AddStep {
                    diagram,
                    from,
                    to: environment,
                    index,
                }],
            },
        };

        trace!(
            diagram:% = diagram,
            from:? = self,
            to:? = transition.state,
            effects = transition.effects.len();
            "Edit transition"
        );
        transition
    }

    /// The pending selection, if any.
    pub fn pending_selection(&self) -> Option<(EnvironmentId, usize)> {
        match *self {
            EditState::Idle => None,
            EditState::EnvironmentChosen { environment, index } => Some((environment, index)),
        }
    }

    /// Returns `true` if the cell (`environment`, `index`) is the pending selection.
    pub fn is_selected(&self, environment: EnvironmentId, index: usize) -> bool {
        self.pending_selection() == Some((environment, index))
    }
}

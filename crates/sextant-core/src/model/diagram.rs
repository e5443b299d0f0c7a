//! Entity types held by the [`Database`](super::Database).
//!
//! - [`Environment`] - A named participant (service)
//! - [`Step`] - A directed event between two environments
//! - [`SequenceDiagram`] - An ordered list of steps over a set of environments
//!
//! Entities refer to each other only by id. Mutation goes through the
//! database, which keeps the cross-references valid.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::identifier::{DiagramId, EnvironmentId};

/// A named participant in the sequence diagrams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    id: EnvironmentId,
    name: String,
}

impl Environment {
    /// Create a new environment.
    pub fn new(id: EnvironmentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Get the stable identifier.
    pub fn id(&self) -> EnvironmentId {
        self.id
    }

    /// Get the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// A directed message from one environment to another.
///
/// `event` may be empty while the user is still typing it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Step {
    from: EnvironmentId,
    to: EnvironmentId,
    event: String,
}

impl Step {
    /// Create a new step.
    pub fn new(from: EnvironmentId, to: EnvironmentId, event: impl Into<String>) -> Self {
        Self {
            from,
            to,
            event: event.into(),
        }
    }

    /// The environment issuing the event.
    pub fn from(&self) -> EnvironmentId {
        self.from
    }

    /// The environment receiving the event.
    pub fn to(&self) -> EnvironmentId {
        self.to
    }

    /// The event name.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Returns `true` if either endpoint is `environment`.
    pub fn involves(&self, environment: EnvironmentId) -> bool {
        self.from == environment || self.to == environment
    }

    pub(crate) fn set_event(&mut self, event: String) {
        self.event = event;
    }
}

/// An ordered sequence of steps over a set of environments.
///
/// The position of a step in [`steps`](Self::steps) is its index; insertions
/// and removals shift later steps so positions stay contiguous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceDiagram {
    id: DiagramId,
    title: String,
    #[serde(default)]
    environments: IndexSet<EnvironmentId>,
    #[serde(default)]
    steps: Vec<Step>,
}

impl SequenceDiagram {
    /// Create an empty diagram.
    pub fn new(id: DiagramId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            environments: IndexSet::new(),
            steps: Vec::new(),
        }
    }

    /// Create a diagram with the given environments and steps.
    pub fn with_content(
        id: DiagramId,
        title: impl Into<String>,
        environments: impl IntoIterator<Item = EnvironmentId>,
        steps: Vec<Step>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            environments: environments.into_iter().collect(),
            steps,
        }
    }

    pub fn id(&self) -> DiagramId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Environments shown in this diagram, in the order they were attached.
    pub fn environments(&self) -> impl ExactSizeIterator<Item = EnvironmentId> + '_ {
        self.environments.iter().copied()
    }

    /// Returns `true` if `environment` is attached to this diagram.
    pub fn references(&self, environment: EnvironmentId) -> bool {
        self.environments.contains(&environment)
    }

    /// Steps in position order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The step at `index`, if any.
    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub(crate) fn set_title(&mut self, title: String) {
        self.title = title;
    }

    pub(crate) fn attach(&mut self, environment: EnvironmentId) {
        self.environments.insert(environment);
    }

    pub(crate) fn insert_step(&mut self, index: usize, step: Step) {
        self.attach(step.from());
        self.attach(step.to());
        self.steps.insert(index, step);
    }

    pub(crate) fn step_mut(&mut self, index: usize) -> Option<&mut Step> {
        self.steps.get_mut(index)
    }

    pub(crate) fn remove_step(&mut self, index: usize) -> Step {
        self.steps.remove(index)
    }

    /// Drop every step touching `environment` and detach it. Returns the number of removed steps.
    pub(crate) fn purge(&mut self, environment: EnvironmentId) -> usize {
        let before = self.steps.len();
        self.steps.retain(|step| !step.involves(environment));
        self.environments.shift_remove(&environment);
        before - self.steps.len()
    }

    pub(crate) fn duplicate(&self, id: DiagramId) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }
}

// IndexSet equality ignores order; attachment order is part of the model.
impl PartialEq for SequenceDiagram {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.environments.iter().eq(other.environments.iter())
            && self.steps == other.steps
    }
}

impl Eq for SequenceDiagram {}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(name: &str) -> EnvironmentId {
        EnvironmentId::from(name)
    }

    #[test]
    fn test_insert_step_attaches_endpoints() {
        let mut diagram = SequenceDiagram::new(DiagramId::from("d"), "Checkout");
        diagram.insert_step(0, Step::new(env("a"), env("b"), "ping"));

        assert!(diagram.references(env("a")));
        assert!(diagram.references(env("b")));
        assert_eq!(diagram.steps().len(), 1);
    }

    #[test]
    fn test_purge_removes_steps_and_detaches() {
        let mut diagram = SequenceDiagram::with_content(
            DiagramId::from("d"),
            "Checkout",
            [env("a"), env("b"), env("c")],
            vec![
                Step::new(env("a"), env("b"), "ping"),
                Step::new(env("b"), env("c"), "forward"),
                Step::new(env("c"), env("a"), "reply"),
            ],
        );

        let removed = diagram.purge(env("a"));

        assert_eq!(removed, 2);
        assert_eq!(diagram.steps(), &[Step::new(env("b"), env("c"), "forward")]);
        assert!(!diagram.references(env("a")));
    }

    #[test]
    fn test_equality_respects_environment_order() {
        let id = DiagramId::from("d");
        let left = SequenceDiagram::with_content(id, "t", [env("a"), env("b")], vec![]);
        let right = SequenceDiagram::with_content(id, "t", [env("b"), env("a")], vec![]);

        assert_ne!(left, right);
    }
}

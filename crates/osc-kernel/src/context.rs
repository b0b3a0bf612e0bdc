//! Per-tick evaluation context
//!
//! Everything an element reads during a tick comes from here and reflects
//! the world as it was when the tick began. Everything an element changes is
//! pushed as an [`Effect`] and applied by the driver once the tick is over.

use crate::world::{EntityCommand, MapApi, Pose, WorldSnapshot};
use osc_symbol::Scope;
use osc_syntax::{ElementId, EntityRef, ScenarioObject, StoryboardElementState};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Final outcome of a scenario run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// Ran to completion without failures
    Success,
    /// Action failure, explicit failure request, fatal error or limit exceeded
    Failure,
}

impl Display for Verdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("SUCCESS"),
            Self::Failure => f.write_str("FAILURE"),
        }
    }
}

/// Deferred change produced during a tick
#[derive(Debug, Clone)]
pub enum Effect {
    /// Command for the entity surface
    Entity(EntityCommand),
    /// Add a declared entity to the simulation
    AddEntity {
        /// Declared object
        object: Arc<ScenarioObject>,
        /// Initial pose
        pose: Pose,
    },
    /// Remove an entity from the simulation
    DeleteEntity {
        /// Entity
        entity: EntityRef,
    },
    /// Assign a parameter, resolved from `scope`
    SetParameter {
        /// Scope the reference is resolved in
        scope: Scope,
        /// Parameter reference
        reference: String,
        /// New value as text
        value: String,
    },
    /// End the run with a verdict
    Verdict(Verdict),
}

/// Action that failed recoverably during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionFailure {
    /// Tick number
    pub tick: u64,
    /// Simulation time
    pub time: f64,
    /// Failing element
    pub element: String,
    /// Error message
    pub message: String,
}

/// State of one element as observed at the start of a tick
#[derive(Debug, Clone, Default)]
pub struct ElementObservation {
    /// Current state
    pub state: StoryboardElementState,
    /// States passed through during the previous tick
    pub visited: SmallVec<[StoryboardElementState; 4]>,
}

/// Element states at the start of a tick, indexed by [`ElementId`]
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    elements: Vec<ElementObservation>,
}

impl StateSnapshot {
    /// Snapshot from observations in element order
    #[must_use]
    pub fn new(elements: Vec<ElementObservation>) -> Self {
        Self { elements }
    }

    /// Observation for one element
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&ElementObservation> {
        self.elements.get(id.0)
    }

    /// True if the element is in `state` or passed through it last tick
    #[must_use]
    pub fn was_in(&self, id: ElementId, state: StoryboardElementState) -> bool {
        self.get(id)
            .is_some_and(|observed| observed.state == state || observed.visited.contains(&state))
    }
}

/// Context threaded through one storyboard tick
pub struct TickContext<'w> {
    /// Tick number, starting at 0
    pub tick: u64,
    /// Simulation time at the start of the tick
    pub time: f64,
    /// Step size in seconds
    pub step: f64,
    /// Entity states at the start of the tick
    pub world: &'w WorldSnapshot,
    /// Map queries
    pub map: &'w dyn MapApi,
    states: StateSnapshot,
    effects: Vec<Effect>,
    failures: Vec<ActionFailure>,
}

impl<'w> TickContext<'w> {
    /// Context for tick `tick`
    #[must_use]
    pub fn new(tick: u64, step: f64, world: &'w WorldSnapshot, map: &'w dyn MapApi) -> Self {
        Self {
            tick,
            time: world.time,
            step,
            world,
            map,
            states: StateSnapshot::default(),
            effects: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Element states at the start of the tick
    #[inline]
    #[must_use]
    pub fn states(&self) -> &StateSnapshot {
        &self.states
    }

    pub(crate) fn set_states(&mut self, states: StateSnapshot) {
        self.states = states;
    }

    /// Queue an effect
    pub fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Queue an entity command
    pub fn command(&mut self, command: EntityCommand) {
        self.effects.push(Effect::Entity(command));
    }

    /// Record a recoverable failure
    pub fn fail(&mut self, element: impl Into<String>, message: impl Into<String>) {
        self.failures.push(ActionFailure {
            tick: self.tick,
            time: self.time,
            element: element.into(),
            message: message.into(),
        });
    }

    /// Effects queued so far
    #[must_use]
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Failures recorded so far
    #[must_use]
    pub fn failures(&self) -> &[ActionFailure] {
        &self.failures
    }

    /// Consume the context, yielding queued effects and failures
    #[must_use]
    pub fn finish(self) -> (Vec<Effect>, Vec<ActionFailure>) {
        (self.effects, self.failures)
    }
}

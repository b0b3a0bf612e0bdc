//! Action execution protocol
//!
//! The storyboard calls [`Action::start`] once when the owning element enters
//! `runningState`. Unless [`Action::ends_immediately`] holds, it then calls
//! [`Action::run`] and [`Action::accomplished`] once per tick, starting with
//! the following tick, until the action is accomplished or cancelled.

mod global;
mod routing;
mod speed;
mod speed_profile;
mod teleport;

pub use global::{AddEntityAction, CustomCommandAction, DeleteEntityAction, ParameterSetAction};
pub use routing::{AcquirePositionAction, AssignRouteAction};
pub use speed::SpeedAction;
pub use speed_profile::SpeedProfileAction;
pub use teleport::TeleportAction;

use crate::context::TickContext;
use crate::error::{EntityError, ScenarioError};
use crate::world::EntityStatus;
use osc_symbol::Scope;
use osc_syntax::{ActionDefinition, EntityRef};
use std::fmt::Debug;

/// What an action sees while it executes
pub struct ActionContext<'a, 'w> {
    /// Owning element name
    pub element: &'a str,
    /// Owning element scope
    pub scope: &'a Scope,
    /// Entities the action applies to
    pub actors: &'a [EntityRef],
    /// Tick context
    pub tick: &'a mut TickContext<'w>,
}

impl ActionContext<'_, '_> {
    /// Snapshot status of an actor
    ///
    /// # Errors
    /// - resolution error if the entity was never declared
    /// - [`EntityError::NotInSimulation`] if it is declared but absent
    pub fn status(&self, entity: &EntityRef) -> Result<&EntityStatus, ScenarioError> {
        self.scope.entity(entity)?;
        Ok(self.tick.world.require(entity)?)
    }

    /// Failure attributed to this action
    #[must_use]
    pub fn failure(&self, message: impl Into<String>) -> ScenarioError {
        ScenarioError::action(self.element, message)
    }
}

/// Executable action
pub trait Action: Debug + Send {
    /// Invoked once on entry to `runningState`
    ///
    /// # Errors
    /// Failures propagate as scenario-level errors.
    fn start(&mut self, cx: &mut ActionContext<'_, '_>) -> Result<(), ScenarioError>;

    /// Invoked once per tick while running
    ///
    /// # Errors
    /// Failures propagate as scenario-level errors.
    fn run(&mut self, cx: &mut ActionContext<'_, '_>) -> Result<(), ScenarioError> {
        let _ = cx;
        Ok(())
    }

    /// Queried after [`Action::run`]
    fn accomplished(&self, cx: &ActionContext<'_, '_>) -> bool;

    /// The action never needs a running phase
    fn ends_immediately(&self) -> bool;
}

/// Runtime action for a definition
#[must_use]
pub fn instantiate(definition: &ActionDefinition) -> Box<dyn Action> {
    match definition.clone() {
        ActionDefinition::Teleport { position } => Box::new(TeleportAction::new(position)),
        ActionDefinition::Speed { target, dynamics } => Box::new(SpeedAction::new(target, dynamics)),
        ActionDefinition::SpeedProfile {
            entity_ref,
            entries,
        } => Box::new(SpeedProfileAction::new(entity_ref, entries)),
        ActionDefinition::AcquirePosition {
            position,
            tolerance,
        } => Box::new(AcquirePositionAction::new(position, tolerance)),
        ActionDefinition::AssignRoute { waypoints } => Box::new(AssignRouteAction::new(waypoints)),
        ActionDefinition::ParameterSet {
            parameter_ref,
            value,
        } => Box::new(ParameterSetAction::new(parameter_ref, value)),
        ActionDefinition::AddEntity {
            entity_ref,
            position,
        } => Box::new(AddEntityAction::new(entity_ref, position)),
        ActionDefinition::DeleteEntity { entity_ref } => {
            Box::new(DeleteEntityAction::new(entity_ref))
        }
        ActionDefinition::CustomCommand { command, arguments } => {
            Box::new(CustomCommandAction::new(command, arguments))
        }
    }
}

/// Speeds within this band count as reached
pub(crate) const SPEED_TOLERANCE: f64 = 0.01;

/// Acceleration needed to go from `from` to `to` in `time` seconds; `None` for a step
pub(crate) fn acceleration_for_time(from: f64, to: f64, time: Option<f64>) -> Option<f64> {
    match time {
        Some(time) if time > 0.0 => Some((to - from).abs() / time),
        _ => None,
    }
}

pub(crate) fn require_actors(cx: &ActionContext<'_, '_>) -> Result<(), ScenarioError> {
    if cx.actors.is_empty() {
        return Err(cx.failure("no actors to apply the action to"));
    }
    Ok(())
}

pub(crate) fn not_in_simulation(entity: &EntityRef) -> ScenarioError {
    EntityError::NotInSimulation(entity.to_string()).into()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acceleration_for_time_handles_step() {
        assert_eq!(acceleration_for_time(0.0, 10.0, None), None);
        assert_eq!(acceleration_for_time(0.0, 10.0, Some(0.0)), None);
        assert_eq!(acceleration_for_time(10.0, 0.0, Some(5.0)), Some(2.0));
    }

    #[test]
    fn instantiate_matches_definition() {
        let definition: ActionDefinition =
            serde_json::from_str(r#"{"teleport":{"position":{"world":{"x":1.0,"y":2.0}}}}"#)
                .unwrap();
        let action = instantiate(&definition);
        assert!(action.ends_immediately());
    }
}

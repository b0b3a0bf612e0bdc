//! Global actions
//!
//! These act on the scenario rather than on actors, so they ignore the
//! actor list and complete in the tick they start.

use super::{not_in_simulation, Action, ActionContext};
use crate::context::{Effect, Verdict};
use crate::error::ScenarioError;
use crate::world::resolve_position;
use osc_syntax::{EntityRef, Position};
use tracing::{info, warn};

/// Assigns a new value to a parameter once the tick is over
#[derive(Debug, Clone)]
pub struct ParameterSetAction {
    reference: String,
    value: String,
}

impl ParameterSetAction {
    /// Set `reference` to `value`
    #[must_use]
    pub fn new(reference: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            value: value.into(),
        }
    }
}

impl Action for ParameterSetAction {
    fn start(&mut self, cx: &mut ActionContext<'_, '_>) -> Result<(), ScenarioError> {
        // reject bad references and literals now rather than when applied
        cx.scope.parameter(&self.reference)?.reparse(&self.value)?;
        cx.tick.push(Effect::SetParameter {
            scope: cx.scope.clone(),
            reference: self.reference.clone(),
            value: self.value.clone(),
        });
        Ok(())
    }

    fn accomplished(&self, _: &ActionContext<'_, '_>) -> bool {
        true
    }

    fn ends_immediately(&self) -> bool {
        true
    }
}

/// Inserts a declared entity into the simulation
#[derive(Debug, Clone)]
pub struct AddEntityAction {
    entity: EntityRef,
    position: Position,
}

impl AddEntityAction {
    /// Add `entity` at `position`
    #[must_use]
    pub fn new(entity: EntityRef, position: Position) -> Self {
        Self { entity, position }
    }
}

impl Action for AddEntityAction {
    fn start(&mut self, cx: &mut ActionContext<'_, '_>) -> Result<(), ScenarioError> {
        let object = cx.scope.entity(&self.entity)?;
        if cx.scope.global().is_added_entity(&self.entity) {
            return Err(cx.failure(format!("entity \"{}\" is already added", self.entity)));
        }
        let pose = resolve_position(&self.position, cx.tick.world, cx.tick.map)?;
        cx.tick.push(Effect::AddEntity { object, pose });
        Ok(())
    }

    fn accomplished(&self, _: &ActionContext<'_, '_>) -> bool {
        true
    }

    fn ends_immediately(&self) -> bool {
        true
    }
}

/// Removes an entity from the simulation
#[derive(Debug, Clone)]
pub struct DeleteEntityAction {
    entity: EntityRef,
}

impl DeleteEntityAction {
    /// Delete `entity`
    #[must_use]
    pub fn new(entity: EntityRef) -> Self {
        Self { entity }
    }
}

impl Action for DeleteEntityAction {
    fn start(&mut self, cx: &mut ActionContext<'_, '_>) -> Result<(), ScenarioError> {
        cx.scope.entity(&self.entity)?;
        if !cx.scope.global().is_added_entity(&self.entity) {
            return Err(not_in_simulation(&self.entity));
        }
        cx.tick.push(Effect::DeleteEntity {
            entity: self.entity.clone(),
        });
        Ok(())
    }

    fn accomplished(&self, _: &ActionContext<'_, '_>) -> bool {
        true
    }

    fn ends_immediately(&self) -> bool {
        true
    }
}

/// Host command
///
/// Recognised commands:
/// - `exitSuccess` / `exitFailure` end the run with that verdict
/// - `echo` / `log` write their arguments to the log
#[derive(Debug, Clone)]
pub struct CustomCommandAction {
    command: String,
    arguments: Vec<String>,
}

impl CustomCommandAction {
    /// Command with arguments
    #[must_use]
    pub fn new(command: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            command: command.into(),
            arguments,
        }
    }
}

impl Action for CustomCommandAction {
    fn start(&mut self, cx: &mut ActionContext<'_, '_>) -> Result<(), ScenarioError> {
        match self.command.as_str() {
            "exitSuccess" => cx.tick.push(Effect::Verdict(Verdict::Success)),
            "exitFailure" => {
                warn!(element = cx.element, arguments = ?self.arguments, "exitFailure requested");
                cx.tick.push(Effect::Verdict(Verdict::Failure));
            }
            "echo" | "log" => {
                info!(element = cx.element, "{}", self.arguments.join(" "));
            }
            other => return Err(cx.failure(format!("unknown command \"{other}\""))),
        }
        Ok(())
    }

    fn accomplished(&self, _: &ActionContext<'_, '_>) -> bool {
        true
    }

    fn ends_immediately(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::testing::{scope_with, with_context, world_with};
    use osc_syntax::{ParameterValue, WorldPosition};

    #[test]
    fn parameter_set_is_deferred() {
        let scope = scope_with(&[]);
        scope.define("gap", ParameterValue::Double(10.0));
        let world = world_with(&[]);
        let mut action = ParameterSetAction::new("$gap", "25.5");

        let (result, effects) = with_context(&scope, &world, &[], |cx| action.start(cx));
        result.unwrap();

        assert!(matches!(
            &effects[0],
            Effect::SetParameter { reference, value, .. } if reference == "$gap" && value == "25.5"
        ));
        assert_eq!(scope.parameter("gap").unwrap(), ParameterValue::Double(10.0));
    }

    #[test]
    fn parameter_set_rejects_bad_literal() {
        let scope = scope_with(&[]);
        scope.define("count", ParameterValue::Integer(1));
        let world = world_with(&[]);
        let mut action = ParameterSetAction::new("count", "many");

        let (result, effects) = with_context(&scope, &world, &[], |cx| action.start(cx));
        assert!(!result.unwrap_err().is_recoverable());
        assert!(effects.is_empty());
    }

    #[test]
    fn add_then_delete_entity() {
        let scope = scope_with(&["npc"]);
        let world = world_with(&[]);
        let npc = EntityRef::new("npc");

        let mut add = AddEntityAction::new(npc.clone(), Position::World(WorldPosition::new(1.0, 2.0)));
        let (result, effects) = with_context(&scope, &world, &[], |cx| add.start(cx));
        result.unwrap();
        assert!(matches!(&effects[0], Effect::AddEntity { object, .. } if object.name == "npc"));

        let mut delete = DeleteEntityAction::new(npc.clone());
        let (result, _) = with_context(&scope, &world, &[], |cx| delete.start(cx));
        assert!(result.unwrap_err().is_recoverable());

        scope.global_mut().add_entity(&npc).unwrap();
        let (result, effects) = with_context(&scope, &world, &[], |cx| delete.start(cx));
        result.unwrap();
        assert!(matches!(&effects[0], Effect::DeleteEntity { entity } if *entity == npc));
    }

    #[test]
    fn exit_commands_set_verdict() {
        let scope = scope_with(&[]);
        let world = world_with(&[]);

        let mut exit = CustomCommandAction::new("exitFailure", vec!["too close".into()]);
        let (result, effects) = with_context(&scope, &world, &[], |cx| exit.start(cx));
        result.unwrap();
        assert!(matches!(effects[0], Effect::Verdict(Verdict::Failure)));

        let mut unknown = CustomCommandAction::new("reboot", Vec::new());
        let (result, _) = with_context(&scope, &world, &[], |cx| unknown.start(cx));
        assert!(result.unwrap_err().is_recoverable());
    }
}

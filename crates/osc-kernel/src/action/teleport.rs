//! Teleport action

use super::{require_actors, Action, ActionContext};
use crate::context::Effect;
use crate::error::ScenarioError;
use crate::world::{resolve_position, EntityCommand};
use osc_syntax::Position;
use tracing::debug;

/// Places every actor at a position; actors not yet in the simulation are added
#[derive(Debug, Clone)]
pub struct TeleportAction {
    position: Position,
}

impl TeleportAction {
    /// Teleport to `position`
    #[must_use]
    pub fn new(position: Position) -> Self {
        Self { position }
    }
}

impl Action for TeleportAction {
    fn start(&mut self, cx: &mut ActionContext<'_, '_>) -> Result<(), ScenarioError> {
        require_actors(cx)?;
        let pose = resolve_position(&self.position, cx.tick.world, cx.tick.map)?;

        for actor in cx.actors {
            let object = cx.scope.entity(actor)?;
            if cx.scope.global().is_added_entity(actor) {
                cx.tick.command(EntityCommand::Teleport {
                    entity: actor.clone(),
                    pose,
                });
            } else {
                cx.tick.push(Effect::AddEntity { object, pose });
            }
            debug!(entity = %actor, x = pose.x, y = pose.y, "teleport");
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
    use crate::world::Pose;
    use osc_syntax::{EntityRef, WorldPosition};

    #[test]
    fn adds_absent_actor_and_moves_present_one() {
        let scope = scope_with(&["ego", "npc"]);
        scope.global_mut().add_entity(&EntityRef::new("npc")).unwrap();
        let world = world_with(&[("npc", 0.0, 0.0)]);
        let actors = [EntityRef::new("ego"), EntityRef::new("npc")];
        let mut action = TeleportAction::new(Position::World(WorldPosition::new(5.0, 1.0)));

        let (result, effects) = with_context(&scope, &world, &actors, |cx| action.start(cx));

        result.unwrap();
        assert!(matches!(&effects[0], Effect::AddEntity { object, .. } if object.name == "ego"));
        assert!(matches!(
            &effects[1],
            Effect::Entity(EntityCommand::Teleport { pose, .. }) if *pose == Pose::new(5.0, 1.0, 0.0)
        ));
        assert!(action.ends_immediately());
    }

    #[test]
    fn undeclared_actor_is_fatal() {
        let scope = scope_with(&[]);
        let world = world_with(&[]);
        let actors = [EntityRef::new("ghost")];
        let mut action = TeleportAction::new(Position::World(WorldPosition::default()));

        let (result, _) = with_context(&scope, &world, &actors, |cx| action.start(cx));
        assert!(!result.unwrap_err().is_recoverable());
    }
}

//! Routing actions

use super::{require_actors, Action, ActionContext};
use crate::error::ScenarioError;
use crate::world::{resolve_position, EntityCommand, Pose};
use osc_syntax::Position;

/// Drives every actor to a position; accomplished once all are within tolerance
#[derive(Debug, Clone)]
pub struct AcquirePositionAction {
    position: Position,
    tolerance: f64,
    goal: Option<Pose>,
}

impl AcquirePositionAction {
    /// Acquire `position` within `tolerance` metres
    #[must_use]
    pub fn new(position: Position, tolerance: f64) -> Self {
        Self {
            position,
            tolerance,
            goal: None,
        }
    }
}

impl Action for AcquirePositionAction {
    fn start(&mut self, cx: &mut ActionContext<'_, '_>) -> Result<(), ScenarioError> {
        require_actors(cx)?;
        let goal = resolve_position(&self.position, cx.tick.world, cx.tick.map)?;
        for actor in cx.actors {
            cx.status(actor)?;
            cx.tick.command(EntityCommand::AcquirePosition {
                entity: actor.clone(),
                goal,
            });
        }
        self.goal = Some(goal);
        Ok(())
    }

    fn accomplished(&self, cx: &ActionContext<'_, '_>) -> bool {
        let Some(goal) = self.goal else {
            return false;
        };
        cx.actors.iter().all(|actor| {
            cx.tick
                .world
                .status(actor)
                .is_some_and(|status| status.pose.distance(&goal) <= self.tolerance)
        })
    }

    fn ends_immediately(&self) -> bool {
        false
    }
}

/// Hands every actor a route through the given waypoints
#[derive(Debug, Clone)]
pub struct AssignRouteAction {
    waypoints: Vec<Position>,
}

impl AssignRouteAction {
    /// Route through `waypoints`
    #[must_use]
    pub fn new(waypoints: Vec<Position>) -> Self {
        Self { waypoints }
    }
}

impl Action for AssignRouteAction {
    fn start(&mut self, cx: &mut ActionContext<'_, '_>) -> Result<(), ScenarioError> {
        require_actors(cx)?;
        if self.waypoints.is_empty() {
            return Err(cx.failure("route has no waypoints"));
        }
        let waypoints = self
            .waypoints
            .iter()
            .map(|position| resolve_position(position, cx.tick.world, cx.tick.map))
            .collect::<Result<Vec<_>, _>>()?;

        for actor in cx.actors {
            cx.status(actor)?;
            cx.tick.command(EntityCommand::AssignRoute {
                entity: actor.clone(),
                waypoints: waypoints.clone(),
            });
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
    use crate::context::Effect;
    use osc_syntax::{EntityRef, WorldPosition};

    #[test]
    fn acquire_position_waits_for_arrival() {
        let scope = scope_with(&["ego"]);
        let actors = [EntityRef::new("ego")];
        let mut action =
            AcquirePositionAction::new(Position::World(WorldPosition::new(50.0, 0.0)), 1.0);

        let far = world_with(&[("ego", 0.0, 5.0)]);
        let (result, effects) = with_context(&scope, &far, &actors, |cx| action.start(cx));
        result.unwrap();
        assert!(matches!(
            &effects[0],
            Effect::Entity(EntityCommand::AcquirePosition { goal, .. }) if goal.x == 50.0
        ));
        let (done, _) = with_context(&scope, &far, &actors, |cx| action.accomplished(cx));
        assert!(!done);

        let near = world_with(&[("ego", 49.5, 0.0)]);
        let (done, _) = with_context(&scope, &near, &actors, |cx| action.accomplished(cx));
        assert!(done);
    }

    #[test]
    fn assign_route_resolves_every_waypoint() {
        let scope = scope_with(&["ego"]);
        let world = world_with(&[("ego", 0.0, 5.0)]);
        let actors = [EntityRef::new("ego")];
        let mut action = AssignRouteAction::new(vec![
            Position::World(WorldPosition::new(10.0, 0.0)),
            Position::World(WorldPosition::new(20.0, 5.0)),
        ]);

        let (result, effects) = with_context(&scope, &world, &actors, |cx| action.start(cx));
        result.unwrap();
        match &effects[0] {
            Effect::Entity(EntityCommand::AssignRoute { waypoints, .. }) => {
                assert_eq!(waypoints.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(action.ends_immediately());
    }
}

//! Speed action

use super::{acceleration_for_time, require_actors, Action, ActionContext, SPEED_TOLERANCE};
use crate::error::ScenarioError;
use crate::world::EntityCommand;
use osc_syntax::{
    DynamicsDimension, DynamicsShape, EntityRef, RelativeSpeedType, SpeedTarget,
    TransitionDynamics,
};
use tracing::debug;

/// Changes every actor's speed
///
/// A step change ends immediately; other shapes run until each actor's
/// observed speed matches its target.
#[derive(Debug, Clone)]
pub struct SpeedAction {
    target: SpeedTarget,
    dynamics: TransitionDynamics,
    targets: Vec<(EntityRef, f64)>,
}

impl SpeedAction {
    /// Speed change toward `target`
    #[must_use]
    pub fn new(target: SpeedTarget, dynamics: TransitionDynamics) -> Self {
        Self {
            target,
            dynamics,
            targets: Vec::new(),
        }
    }

    fn target_speed(&self, cx: &ActionContext<'_, '_>) -> Result<f64, ScenarioError> {
        match &self.target {
            SpeedTarget::Absolute { value } => Ok(*value),
            SpeedTarget::Relative {
                entity_ref,
                value,
                value_type,
            } => {
                let reference = cx.status(entity_ref)?.speed;
                Ok(match value_type {
                    RelativeSpeedType::Delta => reference + value,
                    RelativeSpeedType::Factor => reference * value,
                })
            }
        }
    }

    fn acceleration(&self, current: f64, target: f64) -> Option<f64> {
        let TransitionDynamics {
            shape,
            dimension,
            value,
        } = self.dynamics;
        match (shape, dimension) {
            (DynamicsShape::Step, _) => None,
            (DynamicsShape::Linear, DynamicsDimension::Rate) => (value > 0.0).then_some(value),
            (DynamicsShape::Linear, DynamicsDimension::Time) => {
                acceleration_for_time(current, target, Some(value))
            }
            (DynamicsShape::Linear, DynamicsDimension::Distance) => (value > 0.0)
                .then(|| (target * target - current * current).abs() / (2.0 * value)),
        }
    }
}

impl Action for SpeedAction {
    fn start(&mut self, cx: &mut ActionContext<'_, '_>) -> Result<(), ScenarioError> {
        require_actors(cx)?;
        let target = self.target_speed(cx)?;

        self.targets.clear();
        for actor in cx.actors {
            let current = cx.status(actor)?.speed;
            let acceleration = self.acceleration(current, target);
            cx.tick.command(EntityCommand::SetTargetSpeed {
                entity: actor.clone(),
                speed: target,
                acceleration,
            });
            debug!(entity = %actor, current, target, ?acceleration, "speed change");
            self.targets.push((actor.clone(), target));
        }
        Ok(())
    }

    fn accomplished(&self, cx: &ActionContext<'_, '_>) -> bool {
        self.targets.iter().all(|(entity, target)| {
            cx.tick
                .world
                .status(entity)
                .is_some_and(|status| (status.speed - target).abs() <= SPEED_TOLERANCE)
        })
    }

    fn ends_immediately(&self) -> bool {
        self.dynamics.shape == DynamicsShape::Step
    }
}

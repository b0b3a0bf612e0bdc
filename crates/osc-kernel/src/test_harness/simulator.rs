//! Kinematic world
//!
//! Point-mass entities with acceleration-limited speed tracking and
//! waypoint following. Deterministic, so scenario tests can assert on exact
//! ticks.

use crate::error::EntityError;
use crate::world::{EntityApi, EntityCommand, EntityStatus, LanePose, MapApi, Pose, WorldSnapshot};
use indexmap::IndexMap;
use osc_syntax::{EntityRef, ScenarioObject};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone)]
struct Body {
    object: Arc<ScenarioObject>,
    pose: Pose,
    lane: Option<LanePose>,
    speed: f64,
    target_speed: f64,
    acceleration: Option<f64>,
    route: VecDeque<Pose>,
    stop_at_end: bool,
}

impl Body {
    fn new(object: Arc<ScenarioObject>, pose: Pose, map: &dyn MapApi) -> Self {
        Self {
            object,
            pose,
            lane: map.to_lane(&pose),
            speed: 0.0,
            target_speed: 0.0,
            acceleration: None,
            route: VecDeque::new(),
            stop_at_end: false,
        }
    }

    fn track_speed(&mut self, step: f64) {
        self.speed = match self.acceleration {
            None => self.target_speed,
            Some(acceleration) => {
                let delta = self.target_speed - self.speed;
                let limit = acceleration * step;
                if delta.abs() <= limit {
                    self.target_speed
                } else {
                    self.speed + limit.copysign(delta)
                }
            }
        };
    }

    fn advance(&mut self, step: f64) {
        let mut remaining = self.speed * step;
        while remaining > 0.0 {
            let Some(waypoint) = self.route.front().copied() else {
                let (sin, cos) = self.pose.heading.sin_cos();
                self.pose.x += remaining * cos;
                self.pose.y += remaining * sin;
                return;
            };

            let distance = self.pose.distance(&waypoint);
            if distance > 0.0 {
                self.pose.heading = (waypoint.y - self.pose.y).atan2(waypoint.x - self.pose.x);
            }
            if distance > remaining {
                let (sin, cos) = self.pose.heading.sin_cos();
                self.pose.x += remaining * cos;
                self.pose.y += remaining * sin;
                return;
            }

            self.pose.x = waypoint.x;
            self.pose.y = waypoint.y;
            remaining -= distance;
            self.route.pop_front();
            if self.route.is_empty() && self.stop_at_end {
                self.speed = 0.0;
                self.target_speed = 0.0;
                self.stop_at_end = false;
                return;
            }
        }
    }
}

/// [`EntityApi`] over point-mass bodies
#[derive(Debug, Clone, Default)]
pub struct KinematicWorld {
    time: f64,
    bodies: IndexMap<EntityRef, Body>,
}

impl KinematicWorld {
    /// Empty world at time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulation time
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// True if the entity is present
    #[must_use]
    pub fn contains(&self, entity: &EntityRef) -> bool {
        self.bodies.contains_key(entity)
    }

    fn body(&mut self, entity: &EntityRef) -> Result<&mut Body, EntityError> {
        self.bodies
            .get_mut(entity)
            .ok_or_else(|| EntityError::NotInSimulation(entity.to_string()))
    }
}

impl EntityApi for KinematicWorld {
    fn snapshot(&self) -> WorldSnapshot {
        let mut snapshot = WorldSnapshot::new(self.time);
        for (entity, body) in &self.bodies {
            snapshot.insert(EntityStatus {
                entity: entity.clone(),
                pose: body.pose,
                lane: body.lane,
                speed: body.speed,
            });
        }
        snapshot
    }

    fn apply(&mut self, command: EntityCommand, map: &dyn MapApi) -> Result<(), EntityError> {
        trace!(?command, "entity command");
        match command {
            EntityCommand::Spawn { object, pose } => {
                self.bodies
                    .insert(object.entity_ref(), Body::new(object, pose, map));
            }
            EntityCommand::Despawn { entity } => {
                self.bodies
                    .shift_remove(&entity)
                    .ok_or_else(|| EntityError::NotInSimulation(entity.to_string()))?;
            }
            EntityCommand::Teleport { entity, pose } => {
                let body = self.body(&entity)?;
                body.pose = pose;
                body.lane = map.to_lane(&pose);
                body.route.clear();
            }
            EntityCommand::SetTargetSpeed {
                entity,
                speed,
                acceleration,
            } => {
                let body = self.body(&entity)?;
                body.target_speed = speed.min(body.object.definition.max_speed);
                body.acceleration = acceleration;
                if acceleration.is_none() {
                    body.speed = body.target_speed;
                }
            }
            EntityCommand::AssignRoute { entity, waypoints } => {
                if waypoints.is_empty() {
                    return Err(EntityError::NoRoute(entity.to_string()));
                }
                let body = self.body(&entity)?;
                body.route = waypoints.into();
                body.stop_at_end = false;
            }
            EntityCommand::AcquirePosition { entity, goal } => {
                let body = self.body(&entity)?;
                body.route = VecDeque::from([goal]);
                body.stop_at_end = true;
            }
        }
        Ok(())
    }

    fn update(&mut self, step: f64, map: &dyn MapApi) {
        self.time += step;
        for body in self.bodies.values_mut() {
            body.track_speed(step);
            body.advance(step);
            body.lane = map.to_lane(&body.pose);
        }
    }
}

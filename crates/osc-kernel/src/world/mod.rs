//! Surfaces the interpreter drives
//!
//! [`EntityApi`] is the entity query/command surface; [`MapApi`] projects
//! lane positions and measures along lanes. The storyboard never talks to
//! either directly during a tick: it reads a [`WorldSnapshot`] taken at the
//! start of the tick and emits [`EntityCommand`]s that the driver applies
//! afterwards.

use crate::error::{EntityError, ScenarioError};
use indexmap::IndexMap;
use osc_syntax::{EntityRef, LanePosition, Position, ScenarioObject, WorldPosition};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cartesian pose
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// East
    pub x: f64,
    /// North
    pub y: f64,
    /// Up
    pub z: f64,
    /// Heading in radians
    pub heading: f64,
}

impl Pose {
    /// Pose on the ground plane
    #[must_use]
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            heading,
        }
    }

    /// Euclidean distance in the ground plane
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<&WorldPosition> for Pose {
    fn from(position: &WorldPosition) -> Self {
        Self {
            x: position.x,
            y: position.y,
            z: position.z,
            heading: position.h,
        }
    }
}

/// Lane-relative pose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LanePose {
    /// Lane identifier
    pub lane_id: i64,
    /// Arc length along the lane
    pub s: f64,
    /// Lateral offset
    pub offset: f64,
}

impl From<&LanePosition> for LanePose {
    fn from(position: &LanePosition) -> Self {
        Self {
            lane_id: position.lane_id,
            s: position.s,
            offset: position.offset,
        }
    }
}

/// Observable state of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityStatus {
    /// Entity
    pub entity: EntityRef,
    /// World pose
    pub pose: Pose,
    /// Lane pose, when the entity is on a lane
    pub lane: Option<LanePose>,
    /// Longitudinal speed in m/s
    pub speed: f64,
}

/// Entity states at the start of a tick
#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    /// Simulation time in seconds
    pub time: f64,
    entities: IndexMap<EntityRef, EntityStatus>,
}

impl WorldSnapshot {
    /// Snapshot at `time`
    #[must_use]
    pub fn new(time: f64) -> Self {
        Self {
            time,
            entities: IndexMap::new(),
        }
    }

    /// Record an entity
    pub fn insert(&mut self, status: EntityStatus) {
        self.entities.insert(status.entity.clone(), status);
    }

    /// Status of an entity present in the simulation
    #[must_use]
    pub fn status(&self, entity: &EntityRef) -> Option<&EntityStatus> {
        self.entities.get(entity)
    }

    /// Status, or [`EntityError::NotInSimulation`]
    ///
    /// # Errors
    /// The entity is not present.
    pub fn require(&self, entity: &EntityRef) -> Result<&EntityStatus, EntityError> {
        self.status(entity)
            .ok_or_else(|| EntityError::NotInSimulation(entity.to_string()))
    }

    /// All present entities
    pub fn iter(&self) -> impl Iterator<Item = &EntityStatus> {
        self.entities.values()
    }

    /// Number of present entities
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True when no entity is present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Command issued to the entity surface
#[derive(Debug, Clone, PartialEq)]
pub enum EntityCommand {
    /// Insert an entity
    Spawn {
        /// Declared object
        object: Arc<ScenarioObject>,
        /// Initial pose
        pose: Pose,
    },
    /// Remove an entity
    Despawn {
        /// Entity
        entity: EntityRef,
    },
    /// Move an entity instantly
    Teleport {
        /// Entity
        entity: EntityRef,
        /// New pose
        pose: Pose,
    },
    /// Track a new speed
    SetTargetSpeed {
        /// Entity
        entity: EntityRef,
        /// Target speed in m/s
        speed: f64,
        /// Acceleration magnitude; `None` jumps immediately
        acceleration: Option<f64>,
    },
    /// Drive through waypoints
    AssignRoute {
        /// Entity
        entity: EntityRef,
        /// Waypoints in order
        waypoints: Vec<Pose>,
    },
    /// Drive to a goal and stop there
    AcquirePosition {
        /// Entity
        entity: EntityRef,
        /// Goal
        goal: Pose,
    },
}

impl EntityCommand {
    /// Entity the command targets
    #[must_use]
    pub fn entity(&self) -> EntityRef {
        match self {
            Self::Spawn { object, .. } => object.entity_ref(),
            Self::Despawn { entity }
            | Self::Teleport { entity, .. }
            | Self::SetTargetSpeed { entity, .. }
            | Self::AssignRoute { entity, .. }
            | Self::AcquirePosition { entity, .. } => entity.clone(),
        }
    }
}

/// Entity query/command surface
pub trait EntityApi {
    /// Current state of every present entity
    fn snapshot(&self) -> WorldSnapshot;

    /// Apply a command
    ///
    /// # Errors
    /// The command cannot be applied to the named entity.
    fn apply(&mut self, command: EntityCommand, map: &dyn MapApi) -> Result<(), EntityError>;

    /// Advance by `step` seconds
    fn update(&mut self, step: f64, map: &dyn MapApi);
}

/// Map/geometry queries; `None` means "not representable on this map"
#[cfg_attr(test, mockall::automock)]
pub trait MapApi {
    /// World pose of a lane position
    fn to_world(&self, lane: &LanePose) -> Option<Pose>;

    /// Lane position of a world pose
    fn to_lane(&self, pose: &Pose) -> Option<LanePose>;

    /// Distance along lanes, following successor links
    fn longitudinal_distance(&self, from: &LanePose, to: &LanePose) -> Option<f64>;
}

/// Resolve a position against the snapshot and the map
///
/// # Errors
/// - [`EntityError::NotInSimulation`] for relative positions to absent entities
/// - [`EntityError::NotRepresentable`] for lane positions the map cannot express
pub fn resolve_position(
    position: &Position,
    world: &WorldSnapshot,
    map: &dyn MapApi,
) -> Result<Pose, ScenarioError> {
    match position {
        Position::World(world_position) => Ok(Pose::from(world_position)),
        Position::Lane(lane_position) => {
            let lane = LanePose::from(lane_position);
            map.to_world(&lane).ok_or_else(|| {
                EntityError::NotRepresentable(format!("lane {} s={}", lane.lane_id, lane.s)).into()
            })
        }
        Position::RelativeWorld(relative) => {
            let base = world.require(&relative.entity_ref)?.pose;
            Ok(Pose {
                x: base.x + relative.dx,
                y: base.y + relative.dy,
                z: base.z + relative.dz,
                heading: base.heading,
            })
        }
    }
}

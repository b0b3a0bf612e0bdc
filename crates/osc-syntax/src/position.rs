//! Positions

use crate::entity::EntityRef;
use serde::{Deserialize, Serialize};

/// Position in one of the supported coordinate systems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Position {
    /// Absolute cartesian position
    World(WorldPosition),
    /// Longitudinal/lateral position on a lane
    Lane(LanePosition),
    /// Offset from another entity's current position
    RelativeWorld(RelativeWorldPosition),
}

/// Absolute cartesian position with orientation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPosition {
    /// East
    pub x: f64,
    /// North
    pub y: f64,
    /// Up
    #[serde(default)]
    pub z: f64,
    /// Heading
    #[serde(default)]
    pub h: f64,
    /// Pitch
    #[serde(default)]
    pub p: f64,
    /// Roll
    #[serde(default)]
    pub r: f64,
}

impl WorldPosition {
    /// Position on the ground plane with zero orientation
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }
}

/// Position along a lane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanePosition {
    /// Lane identifier
    pub lane_id: i64,
    /// Arc length along the lane
    pub s: f64,
    /// Lateral offset from the lane centre
    #[serde(default)]
    pub offset: f64,
}

/// Offset relative to another entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelativeWorldPosition {
    /// Reference entity
    pub entity_ref: EntityRef,
    /// Offset along x
    pub dx: f64,
    /// Offset along y
    pub dy: f64,
    /// Offset along z
    #[serde(default)]
    pub dz: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_position_defaults_orientation() {
        let position: Position = serde_yaml::from_str("world: { x: 1.0, y: 2.0 }").unwrap();
        assert_eq!(position, Position::World(WorldPosition::new(1.0, 2.0)));
    }

    #[test]
    fn lane_position_from_yaml() {
        let position: Position =
            serde_yaml::from_str("lane: { laneId: 3, s: 12.5 }").unwrap();

        match position {
            Position::Lane(lane) => {
                assert_eq!(lane.lane_id, 3);
                assert!((lane.s - 12.5).abs() < f64::EPSILON);
                assert!(lane.offset.abs() < f64::EPSILON);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

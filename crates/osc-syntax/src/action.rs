//! Action definitions
//!
//! These are the declarative forms read from scenario files and catalogs.
//! The runtime behaviour lives in the kernel.

use crate::entity::EntityRef;
use crate::position::Position;
use serde::{Deserialize, Serialize};

/// Declarative action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ActionDefinition {
    /// Place every actor at a position instantly
    Teleport {
        /// Target position
        position: Position,
    },
    /// Change every actor's speed
    Speed {
        /// Target speed
        target: SpeedTarget,
        /// How the speed changes over time
        #[serde(default)]
        dynamics: TransitionDynamics,
    },
    /// Follow a sequence of speed targets
    SpeedProfile {
        /// Optional reference entity; entries are then relative to its speed
        #[serde(default)]
        entity_ref: Option<EntityRef>,
        /// Profile entries, executed in order
        entries: Vec<SpeedProfileEntry>,
    },
    /// Drive towards a position until it is reached
    AcquirePosition {
        /// Destination
        position: Position,
        /// Arrival tolerance in metres
        #[serde(default = "default_tolerance")]
        tolerance: f64,
    },
    /// Drive through a list of waypoints
    AssignRoute {
        /// Waypoints, in order
        waypoints: Vec<Position>,
    },
    /// Assign a new value to a parameter
    ParameterSet {
        /// Parameter name, possibly `::`-qualified, with or without `$`
        parameter_ref: String,
        /// New value as text
        value: String,
    },
    /// Insert an entity into the world
    AddEntity {
        /// Entity to add
        entity_ref: EntityRef,
        /// Initial position
        position: Position,
    },
    /// Remove an entity from the world
    DeleteEntity {
        /// Entity to remove
        entity_ref: EntityRef,
    },
    /// Run a host command
    CustomCommand {
        /// Command name
        command: String,
        /// Arguments
        #[serde(default)]
        arguments: Vec<String>,
    },
}

impl ActionDefinition {
    /// True for actions that act on the scenario rather than on actors
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(
            self,
            Self::ParameterSet { .. }
                | Self::AddEntity { .. }
                | Self::DeleteEntity { .. }
                | Self::CustomCommand { .. }
        )
    }

    /// Short kind name for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Teleport { .. } => "TeleportAction",
            Self::Speed { .. } => "SpeedAction",
            Self::SpeedProfile { .. } => "SpeedProfileAction",
            Self::AcquirePosition { .. } => "AcquirePositionAction",
            Self::AssignRoute { .. } => "AssignRouteAction",
            Self::ParameterSet { .. } => "ParameterSetAction",
            Self::AddEntity { .. } => "AddEntityAction",
            Self::DeleteEntity { .. } => "DeleteEntityAction",
            Self::CustomCommand { .. } => "CustomCommandAction",
        }
    }
}

fn default_tolerance() -> f64 {
    1.0
}

/// Target of a speed action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SpeedTarget {
    /// Fixed speed in m/s
    Absolute {
        /// Target speed
        value: f64,
    },
    /// Speed derived from another entity
    Relative {
        /// Reference entity
        entity_ref: EntityRef,
        /// Delta or factor
        value: f64,
        /// Interpretation of `value`
        #[serde(default)]
        value_type: RelativeSpeedType,
    },
}

/// Interpretation of a relative speed value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelativeSpeedType {
    /// Reference speed plus value
    #[default]
    Delta,
    /// Reference speed times value
    Factor,
}

/// Shape of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DynamicsShape {
    /// Jump to the target immediately
    #[default]
    Step,
    /// Constant rate of change
    Linear,
}

/// What the dynamics value measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DynamicsDimension {
    /// Rate of change per second
    Rate,
    /// Duration in seconds
    #[default]
    Time,
    /// Distance travelled in metres
    Distance,
}

/// Transition dynamics for speed changes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionDynamics {
    /// Transition shape
    #[serde(default)]
    pub shape: DynamicsShape,
    /// Dimension of `value`
    #[serde(default)]
    pub dimension: DynamicsDimension,
    /// Rate, duration or distance
    #[serde(default)]
    pub value: f64,
}

/// One step of a speed profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedProfileEntry {
    /// Target speed (or delta, relative to the reference entity)
    pub speed: f64,
    /// Time to reach it; a step change when absent
    #[serde(default)]
    pub time: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_action_from_yaml() {
        let yaml = r"
speed:
  target:
    absolute: { value: 10.0 }
  dynamics: { shape: linear, dimension: rate, value: 2.0 }
";
        let action: ActionDefinition = serde_yaml::from_str(yaml).unwrap();

        match action {
            ActionDefinition::Speed { target, dynamics } => {
                assert_eq!(target, SpeedTarget::Absolute { value: 10.0 });
                assert_eq!(dynamics.shape, DynamicsShape::Linear);
                assert_eq!(dynamics.dimension, DynamicsDimension::Rate);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parameter_set_is_global() {
        let yaml = "parameterSet: { parameterRef: speed, value: \"3\" }";
        let action: ActionDefinition = serde_yaml::from_str(yaml).unwrap();

        assert!(action.is_global());
        assert_eq!(action.kind(), "ParameterSetAction");
    }

    #[test]
    fn teleport_is_private() {
        let yaml = "teleport: { position: { world: { x: 0, y: 0 } } }";
        let action: ActionDefinition = serde_yaml::from_str(yaml).unwrap();
        assert!(!action.is_global());
    }
}

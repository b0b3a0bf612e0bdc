//! Condition and trigger definitions

use crate::entity::EntityRef;
use crate::position::Position;
use crate::rule::Rule;
use crate::storyboard::{StoryboardElementState, StoryboardElementType};
use serde::{Deserialize, Serialize};

/// When a condition reports true relative to its raw evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionEdge {
    /// Raw value
    #[default]
    None,
    /// false -> true
    Rising,
    /// true -> false
    Falling,
    /// Any change
    RisingOrFalling,
}

/// Named condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionDefinition {
    /// Condition name
    pub name: String,
    /// Edge detection
    #[serde(default)]
    pub edge: ConditionEdge,
    /// What is evaluated
    #[serde(flatten)]
    pub kind: ConditionKind,
}

/// Condition family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionKind {
    /// Condition on scenario-level values
    ByValue(ByValueCondition),
    /// Condition on entity state
    ByEntity(ByEntityCondition),
}

/// Conditions on scenario-level values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ByValueCondition {
    /// Compare simulation time
    SimulationTime {
        /// Threshold in seconds
        value: f64,
        /// Comparison
        rule: Rule,
    },
    /// Compare a parameter
    Parameter {
        /// Parameter name, possibly `::`-qualified
        parameter_ref: String,
        /// Literal parsed as the parameter's type
        value: String,
        /// Comparison
        rule: Rule,
    },
    /// Observe a storyboard element's state
    StoryboardElementState {
        /// Kind of the observed element
        storyboard_element_type: StoryboardElementType,
        /// Element name, possibly `::`-qualified
        storyboard_element_ref: String,
        /// State or transition to watch for
        state: StoryboardElementState,
    },
}

/// Conditions on entity state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByEntityCondition {
    /// Entities to test
    pub triggering_entities: TriggeringEntities,
    /// Test applied to each entity
    pub entity_condition: EntityCondition,
}

/// Entities a by-entity condition is tested against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggeringEntities {
    /// How per-entity results combine
    #[serde(default)]
    pub triggering_entities_rule: TriggeringEntitiesRule,
    /// Entities
    pub entity_refs: Vec<EntityRef>,
}

/// How per-entity results combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggeringEntitiesRule {
    /// True if any entity satisfies the test
    #[default]
    Any,
    /// True if every entity satisfies the test
    All,
}

/// Test applied to a single entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EntityCondition {
    /// Entity within `tolerance` of a position
    ReachPosition {
        /// Target
        position: Position,
        /// Radius in metres
        tolerance: f64,
    },
    /// Compare entity speed
    Speed {
        /// Threshold in m/s
        value: f64,
        /// Comparison
        rule: Rule,
    },
    /// Compare distance to a position
    Distance {
        /// Reference position
        position: Position,
        /// Threshold in metres
        value: f64,
        /// Comparison
        rule: Rule,
    },
    /// Compare distance to another entity
    RelativeDistance {
        /// Reference entity
        entity_ref: EntityRef,
        /// Threshold in metres
        value: f64,
        /// Comparison
        rule: Rule,
    },
}

/// Disjunction of condition groups
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerDefinition {
    /// Groups; the trigger fires when any group is true
    #[serde(default)]
    pub condition_groups: Vec<ConditionGroupDefinition>,
}

/// Conjunction of conditions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionGroupDefinition {
    /// Conditions; the group is true when all are true
    pub conditions: Vec<ConditionDefinition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulation_time_condition_from_yaml() {
        let yaml = r"
name: after_two_seconds
edge: rising
byValue:
  simulationTime: { value: 2.0, rule: greaterThan }
";
        let condition: ConditionDefinition = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(condition.edge, ConditionEdge::Rising);
        assert_eq!(
            condition.kind,
            ConditionKind::ByValue(ByValueCondition::SimulationTime {
                value: 2.0,
                rule: Rule::GreaterThan,
            })
        );
    }

    #[test]
    fn by_entity_condition_from_yaml() {
        let yaml = r"
name: ego_fast
byEntity:
  triggeringEntities:
    triggeringEntitiesRule: all
    entityRefs: [ego, npc]
  entityCondition:
    speed: { value: 5.0, rule: greaterOrEqual }
";
        let condition: ConditionDefinition = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(condition.edge, ConditionEdge::None);
        match condition.kind {
            ConditionKind::ByEntity(by_entity) => {
                assert_eq!(
                    by_entity.triggering_entities.triggering_entities_rule,
                    TriggeringEntitiesRule::All
                );
                assert_eq!(by_entity.triggering_entities.entity_refs.len(), 2);
            }
            ConditionKind::ByValue(_) => panic!("expected by-entity condition"),
        }
    }

    #[test]
    fn empty_trigger_has_no_groups() {
        let trigger: TriggerDefinition = serde_yaml::from_str("{}").unwrap();
        assert!(trigger.condition_groups.is_empty());
    }
}

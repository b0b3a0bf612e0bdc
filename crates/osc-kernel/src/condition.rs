//! Condition evaluation

use crate::context::TickContext;
use crate::error::ScenarioError;
use crate::world::{resolve_position, EntityStatus};
use osc_symbol::Scope;
use osc_syntax::{
    ByEntityCondition, ByValueCondition, ConditionDefinition, ConditionEdge, ConditionKind,
    EntityCondition, EntityRef, Position, RelativeWorldPosition, StoryboardElementHandle, StoryboardElementType,
    TriggeringEntitiesRule, TypeMismatch,
};
use smallvec::SmallVec;
use tracing::trace;

/// Runtime condition with edge memory
#[derive(Debug, Clone)]
pub struct Condition {
    definition: ConditionDefinition,
    last: Option<bool>,
    triggering: SmallVec<[EntityRef; 2]>,
}

impl Condition {
    /// Condition with no evaluation history
    #[must_use]
    pub fn new(definition: ConditionDefinition) -> Self {
        Self {
            definition,
            last: None,
            triggering: SmallVec::new(),
        }
    }

    /// Condition name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Entities that satisfied the last evaluation of a by-entity condition
    #[must_use]
    pub fn triggering_entities(&self) -> &[EntityRef] {
        &self.triggering
    }

    /// Forget edge history
    pub fn reset(&mut self) {
        self.last = None;
        self.triggering.clear();
    }

    /// Evaluate and apply edge detection
    ///
    /// Edges need a previous sample: the first evaluation after a reset never
    /// reports an edge.
    ///
    /// # Errors
    /// Resolution and type errors for referenced parameters and elements;
    /// map errors for positions.
    pub fn evaluate(&mut self, scope: &Scope, cx: &TickContext<'_>) -> Result<bool, ScenarioError> {
        self.triggering.clear();
        let raw = match &self.definition.kind {
            ConditionKind::ByValue(condition) => evaluate_by_value(condition, scope, cx)?,
            ConditionKind::ByEntity(condition) => {
                evaluate_by_entity(condition, scope, cx, &mut self.triggering)?
            }
        };

        let value = match self.definition.edge {
            ConditionEdge::None => raw,
            ConditionEdge::Rising => self.last == Some(false) && raw,
            ConditionEdge::Falling => self.last == Some(true) && !raw,
            ConditionEdge::RisingOrFalling => self.last.is_some_and(|last| last != raw),
        };
        self.last = Some(raw);

        trace!(condition = %self.definition.name, raw, value, "condition evaluated");
        Ok(value)
    }

    /// Resolve every name the condition refers to without evaluating it
    ///
    /// # Errors
    /// The resolution and type errors [`Condition::evaluate`] would report.
    pub fn check(&self, scope: &Scope) -> Result<(), ScenarioError> {
        match &self.definition.kind {
            ConditionKind::ByValue(ByValueCondition::SimulationTime { .. }) => Ok(()),
            ConditionKind::ByValue(ByValueCondition::Parameter {
                parameter_ref,
                value,
                rule,
            }) => {
                scope.parameter(parameter_ref)?.compare(*rule, value)?;
                Ok(())
            }
            ConditionKind::ByValue(ByValueCondition::StoryboardElementState {
                storyboard_element_type,
                storyboard_element_ref,
                ..
            }) => {
                resolve_element(scope, *storyboard_element_type, storyboard_element_ref)?;
                Ok(())
            }
            ConditionKind::ByEntity(condition) => {
                for entity_ref in &condition.triggering_entities.entity_refs {
                    scope.entity(entity_ref)?;
                }
                match &condition.entity_condition {
                    EntityCondition::RelativeDistance { entity_ref, .. }
                    | EntityCondition::ReachPosition {
                        position: Position::RelativeWorld(RelativeWorldPosition { entity_ref, .. }),
                        ..
                    }
                    | EntityCondition::Distance {
                        position: Position::RelativeWorld(RelativeWorldPosition { entity_ref, .. }),
                        ..
                    } => {
                        scope.entity(entity_ref)?;
                    }
                    _ => {}
                }
                Ok(())
            }
        }
    }
}

fn resolve_element(
    scope: &Scope,
    kind: StoryboardElementType,
    reference: &str,
) -> Result<StoryboardElementHandle, ScenarioError> {
    let handle = scope.resolve::<StoryboardElementHandle>(reference)?;
    if handle.kind != kind {
        return Err(TypeMismatch {
            expected: kind.as_str(),
            actual: handle.kind.as_str(),
        }
        .into());
    }
    Ok(handle)
}

fn evaluate_by_value(
    condition: &ByValueCondition,
    scope: &Scope,
    cx: &TickContext<'_>,
) -> Result<bool, ScenarioError> {
    match condition {
        ByValueCondition::SimulationTime { value, rule } => Ok(rule.apply(&cx.time, value)),
        ByValueCondition::Parameter {
            parameter_ref,
            value,
            rule,
        } => Ok(scope.parameter(parameter_ref)?.compare(*rule, value)?),
        ByValueCondition::StoryboardElementState {
            storyboard_element_type,
            storyboard_element_ref,
            state,
        } => {
            let handle = resolve_element(scope, *storyboard_element_type, storyboard_element_ref)?;
            Ok(cx.states().was_in(handle.id, *state))
        }
    }
}

fn evaluate_by_entity(
    condition: &ByEntityCondition,
    scope: &Scope,
    cx: &TickContext<'_>,
    triggering: &mut SmallVec<[EntityRef; 2]>,
) -> Result<bool, ScenarioError> {
    let entities = &condition.triggering_entities;
    let mut satisfied = 0usize;

    for entity_ref in &entities.entity_refs {
        // undeclared entities are authoring errors
        scope.entity(entity_ref)?;
        let Some(status) = cx.world.status(entity_ref) else {
            continue;
        };
        if test_entity(&condition.entity_condition, status, cx)? {
            satisfied += 1;
            triggering.push(entity_ref.clone());
        }
    }

    let result = match entities.triggering_entities_rule {
        TriggeringEntitiesRule::Any => satisfied > 0,
        TriggeringEntitiesRule::All => {
            !entities.entity_refs.is_empty() && satisfied == entities.entity_refs.len()
        }
    };
    if !result {
        triggering.clear();
    }
    Ok(result)
}

fn test_entity(
    condition: &EntityCondition,
    status: &EntityStatus,
    cx: &TickContext<'_>,
) -> Result<bool, ScenarioError> {
    Ok(match condition {
        EntityCondition::ReachPosition {
            position,
            tolerance,
        } => {
            let target = resolve_position(position, cx.world, cx.map)?;
            status.pose.distance(&target) <= *tolerance
        }
        EntityCondition::Speed { value, rule } => rule.apply(&status.speed, value),
        EntityCondition::Distance {
            position,
            value,
            rule,
        } => {
            let target = resolve_position(position, cx.world, cx.map)?;
            rule.apply(&status.pose.distance(&target), value)
        }
        EntityCondition::RelativeDistance {
            entity_ref,
            value,
            rule,
        } => match cx.world.status(entity_ref) {
            Some(other) => rule.apply(&relative_distance(status, other, cx), value),
            None => false,
        },
    })
}

/// Distance along lanes when the map can measure it, straight-line otherwise
fn relative_distance(a: &EntityStatus, b: &EntityStatus, cx: &TickContext<'_>) -> f64 {
    if let (Some(from), Some(to)) = (&a.lane, &b.lane) {
        let along = cx
            .map
            .longitudinal_distance(from, to)
            .or_else(|| cx.map.longitudinal_distance(to, from));
        if let Some(distance) = along {
            return distance.abs();
        }
    }
    a.pose.distance(&b.pose)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{MockMapApi, Pose, WorldSnapshot};
    use osc_symbol::GlobalEnvironment;
    use osc_syntax::{
        ObjectDefinition, ParameterValue, Rule, ScenarioObject, TriggeringEntities,
    };

    fn time_condition(edge: ConditionEdge, threshold: f64) -> Condition {
        Condition::new(ConditionDefinition {
            name: "time".into(),
            edge,
            kind: ConditionKind::ByValue(ByValueCondition::SimulationTime {
                value: threshold,
                rule: Rule::GreaterThan,
            }),
        })
    }

    fn scope() -> Scope {
        let scope = Scope::new(GlobalEnvironment::default());
        for name in ["ego", "npc"] {
            scope
                .global_mut()
                .declare_entity(ScenarioObject::new(name, ObjectDefinition::default()))
                .unwrap();
        }
        scope
    }

    fn sample(condition: &mut Condition, scope: &Scope, time: f64) -> bool {
        let world = WorldSnapshot::new(time);
        let map = MockMapApi::new();
        let cx = TickContext::new(0, 0.1, &world, &map);
        condition.evaluate(scope, &cx).unwrap()
    }

    #[test]
    fn plain_condition_follows_raw_value() {
        let scope = scope();
        let mut condition = time_condition(ConditionEdge::None, 1.0);

        assert!(!sample(&mut condition, &scope, 0.5));
        assert!(sample(&mut condition, &scope, 1.5));
        assert!(sample(&mut condition, &scope, 2.0));
    }

    #[test]
    fn rising_edge_fires_once() {
        let scope = scope();
        let mut condition = time_condition(ConditionEdge::Rising, 1.0);

        assert!(!sample(&mut condition, &scope, 0.5));
        assert!(sample(&mut condition, &scope, 1.5));
        assert!(!sample(&mut condition, &scope, 2.0));
    }

    #[test]
    fn first_sample_is_never_an_edge() {
        let scope = scope();
        let mut condition = time_condition(ConditionEdge::Rising, 1.0);
        assert!(!sample(&mut condition, &scope, 5.0));

        condition.reset();
        assert!(!sample(&mut condition, &scope, 5.0));
    }

    #[test]
    fn falling_edge() {
        let scope = scope();
        let mut condition = Condition::new(ConditionDefinition {
            name: "early".into(),
            edge: ConditionEdge::Falling,
            kind: ConditionKind::ByValue(ByValueCondition::SimulationTime {
                value: 1.0,
                rule: Rule::LessThan,
            }),
        });

        assert!(!sample(&mut condition, &scope, 0.0));
        assert!(sample(&mut condition, &scope, 1.0));
        assert!(!sample(&mut condition, &scope, 2.0));
    }

    #[test]
    fn parameter_condition_reads_scope() {
        let scope = scope();
        scope.define("limit", ParameterValue::Integer(3));
        let mut condition = Condition::new(ConditionDefinition {
            name: "limit_reached".into(),
            edge: ConditionEdge::None,
            kind: ConditionKind::ByValue(ByValueCondition::Parameter {
                parameter_ref: "$limit".into(),
                value: "3".into(),
                rule: Rule::GreaterOrEqual,
            }),
        });

        assert!(sample(&mut condition, &scope, 0.0));
        scope.set_parameter("limit", "2").unwrap();
        assert!(!sample(&mut condition, &scope, 0.0));
    }

    #[test]
    fn missing_parameter_is_fatal() {
        let scope = scope();
        let mut condition = Condition::new(ConditionDefinition {
            name: "missing".into(),
            edge: ConditionEdge::None,
            kind: ConditionKind::ByValue(ByValueCondition::Parameter {
                parameter_ref: "nope".into(),
                value: "1".into(),
                rule: Rule::EqualTo,
            }),
        });
        let world = WorldSnapshot::new(0.0);
        let map = MockMapApi::new();
        let cx = TickContext::new(0, 0.1, &world, &map);

        let err = condition.evaluate(&scope, &cx).unwrap_err();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn speed_condition_records_triggering_entities() {
        let scope = scope();
        let mut world = WorldSnapshot::new(0.0);
        for (name, speed) in [("ego", 12.0), ("npc", 3.0)] {
            world.insert(EntityStatus {
                entity: EntityRef::new(name),
                pose: Pose::default(),
                lane: None,
                speed,
            });
        }
        let map = MockMapApi::new();
        let cx = TickContext::new(0, 0.1, &world, &map);

        let definition = |rule| ConditionDefinition {
            name: "fast".into(),
            edge: ConditionEdge::None,
            kind: ConditionKind::ByEntity(ByEntityCondition {
                triggering_entities: TriggeringEntities {
                    triggering_entities_rule: rule,
                    entity_refs: vec![EntityRef::new("ego"), EntityRef::new("npc")],
                },
                entity_condition: EntityCondition::Speed {
                    value: 10.0,
                    rule: Rule::GreaterThan,
                },
            }),
        };

        let mut any = Condition::new(definition(TriggeringEntitiesRule::Any));
        assert!(any.evaluate(&scope, &cx).unwrap());
        assert_eq!(any.triggering_entities(), &[EntityRef::new("ego")]);

        let mut all = Condition::new(definition(TriggeringEntitiesRule::All));
        assert!(!all.evaluate(&scope, &cx).unwrap());
        assert!(all.triggering_entities().is_empty());
    }

    #[test]
    fn check_resolves_without_evaluating() {
        let scope = scope();
        scope.define("limit", ParameterValue::Integer(3));
        let parameter = |literal: &str| {
            Condition::new(ConditionDefinition {
                name: "limit_reached".into(),
                edge: ConditionEdge::None,
                kind: ConditionKind::ByValue(ByValueCondition::Parameter {
                    parameter_ref: "limit".into(),
                    value: literal.into(),
                    rule: Rule::EqualTo,
                }),
            })
        };
        assert!(parameter("3").check(&scope).is_ok());
        assert!(parameter("three").check(&scope).is_err());

        let close_to = |other: &str| {
            Condition::new(ConditionDefinition {
                name: "close".into(),
                edge: ConditionEdge::None,
                kind: ConditionKind::ByEntity(ByEntityCondition {
                    triggering_entities: TriggeringEntities {
                        triggering_entities_rule: TriggeringEntitiesRule::Any,
                        entity_refs: vec![EntityRef::new("ego")],
                    },
                    entity_condition: EntityCondition::RelativeDistance {
                        entity_ref: EntityRef::new(other),
                        value: 5.0,
                        rule: Rule::LessThan,
                    },
                }),
            })
        };
        assert!(close_to("npc").check(&scope).is_ok());
        let err = close_to("ghost").check(&scope).unwrap_err();
        assert_eq!(err.to_string(), "no such variable named \"ghost\"");
    }

    #[test]
    fn undeclared_triggering_entity_is_fatal() {
        let scope = scope();
        let mut condition = Condition::new(ConditionDefinition {
            name: "ghost".into(),
            edge: ConditionEdge::None,
            kind: ConditionKind::ByEntity(ByEntityCondition {
                triggering_entities: TriggeringEntities {
                    triggering_entities_rule: TriggeringEntitiesRule::Any,
                    entity_refs: vec![EntityRef::new("ghost")],
                },
                entity_condition: EntityCondition::Speed {
                    value: 0.0,
                    rule: Rule::GreaterThan,
                },
            }),
        });
        let world = WorldSnapshot::new(0.0);
        let map = MockMapApi::new();
        let cx = TickContext::new(0, 0.1, &world, &map);

        assert!(condition.evaluate(&scope, &cx).is_err());
    }
}

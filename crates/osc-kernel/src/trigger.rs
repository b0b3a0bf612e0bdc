//! Triggers
//!
//! A trigger is a disjunction of condition groups, each group a conjunction
//! of conditions. Once the combined expression is true the trigger latches
//! and stays fired until [`Trigger::reset`].

use crate::condition::Condition;
use crate::context::TickContext;
use crate::error::ScenarioError;
use osc_symbol::Scope;
use osc_syntax::{ConditionDefinition, EntityRef, TriggerDefinition};
use std::collections::HashSet;
use tracing::debug;

/// Conjunction of conditions
#[derive(Debug, Clone, Default)]
pub struct ConditionGroup {
    conditions: Vec<Condition>,
}

impl ConditionGroup {
    /// Group from conditions
    #[must_use]
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    /// Every condition is sampled, so edge memory sees every tick
    fn evaluate(
        &mut self,
        scope: &Scope,
        cx: &TickContext<'_>,
        triggering: &mut Vec<EntityRef>,
    ) -> Result<bool, ScenarioError> {
        let mut all = true;
        let mut entities = Vec::new();
        for condition in &mut self.conditions {
            if condition.evaluate(scope, cx)? {
                entities.extend_from_slice(condition.triggering_entities());
            } else {
                all = false;
            }
        }
        if all {
            triggering.extend(entities);
        }
        Ok(all)
    }

    fn reset(&mut self) {
        self.conditions.iter_mut().for_each(Condition::reset);
    }

    fn check(&self, scope: &Scope) -> Result<(), ScenarioError> {
        self.conditions.iter().try_for_each(|condition| condition.check(scope))
    }
}

/// Latching disjunction of condition groups
#[derive(Debug, Clone, Default)]
pub struct Trigger {
    groups: Vec<ConditionGroup>,
    fired: bool,
    triggering: Vec<EntityRef>,
}

impl Trigger {
    /// Trigger from groups
    #[must_use]
    pub fn new(groups: Vec<ConditionGroup>) -> Self {
        Self {
            groups,
            fired: false,
            triggering: Vec::new(),
        }
    }

    /// Trigger with a single condition
    #[must_use]
    pub fn single(condition: ConditionDefinition) -> Self {
        Self::new(vec![ConditionGroup::new(vec![Condition::new(condition)])])
    }

    /// Runtime trigger for a definition
    #[must_use]
    pub fn from_definition(definition: &TriggerDefinition) -> Self {
        Self::new(
            definition
                .condition_groups
                .iter()
                .map(|group| {
                    ConditionGroup::new(group.conditions.iter().cloned().map(Condition::new).collect())
                })
                .collect(),
        )
    }

    /// True once the trigger has fired
    #[inline]
    #[must_use]
    pub fn is_fired(&self) -> bool {
        self.fired
    }

    /// Entities that satisfied by-entity conditions when the trigger fired
    #[must_use]
    pub fn triggering_entities(&self) -> &[EntityRef] {
        &self.triggering
    }

    /// Evaluate; returns the latched value
    ///
    /// A trigger without groups never fires.
    ///
    /// # Errors
    /// Propagates condition errors.
    pub fn evaluate(&mut self, scope: &Scope, cx: &TickContext<'_>) -> Result<bool, ScenarioError> {
        if self.fired {
            return Ok(true);
        }

        let mut any = false;
        let mut triggering = Vec::new();
        for group in &mut self.groups {
            any |= group.evaluate(scope, cx, &mut triggering)?;
        }

        if any {
            let mut seen = HashSet::new();
            triggering.retain(|entity| seen.insert(entity.clone()));
            debug!(tick = cx.tick, time = cx.time, ?triggering, "trigger fired");
            self.fired = true;
            self.triggering = triggering;
        }
        Ok(self.fired)
    }

    /// Resolve the references of every condition in `scope`
    ///
    /// # Errors
    /// The first resolution or type error found.
    pub fn check(&self, scope: &Scope) -> Result<(), ScenarioError> {
        self.groups.iter().try_for_each(|group| group.check(scope))
    }

    /// Clear the latch and all edge memory
    pub fn reset(&mut self) {
        self.fired = false;
        self.triggering.clear();
        self.groups.iter_mut().for_each(ConditionGroup::reset);
    }
}

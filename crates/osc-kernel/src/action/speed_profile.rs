//! Speed profile action

use super::{acceleration_for_time, require_actors, Action, ActionContext, SPEED_TOLERANCE};
use crate::error::ScenarioError;
use crate::world::EntityCommand;
use osc_syntax::{EntityRef, SpeedProfileEntry};
use tracing::debug;

/// Works through speed targets in order, moving on once every actor holds
/// the current one
#[derive(Debug, Clone)]
pub struct SpeedProfileAction {
    entity_ref: Option<EntityRef>,
    entries: Vec<SpeedProfileEntry>,
    cursor: usize,
    targets: Vec<(EntityRef, f64)>,
}

impl SpeedProfileAction {
    /// Profile over `entries`, relative to `entity_ref` when given
    #[must_use]
    pub fn new(entity_ref: Option<EntityRef>, entries: Vec<SpeedProfileEntry>) -> Self {
        Self {
            entity_ref,
            entries,
            cursor: 0,
            targets: Vec::new(),
        }
    }

    /// Index of the entry being executed
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn issue(&mut self, cx: &mut ActionContext<'_, '_>) -> Result<(), ScenarioError> {
        let entry = self.entries[self.cursor];
        let base = match &self.entity_ref {
            Some(reference) => cx.status(reference)?.speed,
            None => 0.0,
        };
        let target = base + entry.speed;

        self.targets.clear();
        for actor in cx.actors {
            let current = cx.status(actor)?.speed;
            cx.tick.command(EntityCommand::SetTargetSpeed {
                entity: actor.clone(),
                speed: target,
                acceleration: acceleration_for_time(current, target, entry.time),
            });
            self.targets.push((actor.clone(), target));
        }
        debug!(element = cx.element, entry = self.cursor, target, "speed profile entry");
        Ok(())
    }

    fn reached(&self, cx: &ActionContext<'_, '_>) -> bool {
        self.targets.iter().all(|(entity, target)| {
            cx.tick
                .world
                .status(entity)
                .is_some_and(|status| (status.speed - target).abs() <= SPEED_TOLERANCE)
        })
    }

    fn is_last(&self) -> bool {
        self.cursor + 1 >= self.entries.len()
    }
}

impl Action for SpeedProfileAction {
    fn start(&mut self, cx: &mut ActionContext<'_, '_>) -> Result<(), ScenarioError> {
        require_actors(cx)?;
        if self.entries.is_empty() {
            return Err(cx.failure("speed profile has no entries"));
        }
        self.cursor = 0;
        self.issue(cx)
    }

    fn run(&mut self, cx: &mut ActionContext<'_, '_>) -> Result<(), ScenarioError> {
        if !self.is_last() && self.reached(cx) {
            self.cursor += 1;
            self.issue(cx)?;
        }
        Ok(())
    }

    fn accomplished(&self, cx: &ActionContext<'_, '_>) -> bool {
        self.is_last() && self.reached(cx)
    }

    fn ends_immediately(&self) -> bool {
        false
    }
}

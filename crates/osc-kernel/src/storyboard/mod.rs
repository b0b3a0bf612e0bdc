//! Storyboard execution
//!
//! The storyboard is an arena of elements indexed by [`ElementId`]. Each
//! tick walks the tree from the root:
//!
//! - a standby element whose start trigger fires passes through
//!   `startTransition` into `runningState`; containers then tick their
//!   children in the same tick, actions call [`Action::start`]
//! - a running element whose stop trigger fires is cancelled together with
//!   everything below it
//! - a running action is run and queried from the tick after it started
//! - a running container completes once its children satisfy its
//!   [`Completion`] rule
//!
//! Element states are snapshotted at the start of the tick so that
//! storyboard-state conditions never observe changes made later in the same
//! tick.

mod builder;

pub use builder::{ElementSpec, StoryboardBuilder};

use crate::action::{Action, ActionContext};
use crate::context::{ElementObservation, StateSnapshot, TickContext};
use crate::error::ScenarioError;
use crate::state_machine::StateRecord;
use crate::trigger::Trigger;
use osc_symbol::Scope;
use osc_syntax::{
    Completion, ElementId, EntityRef, Priority, StoryboardElementHandle, StoryboardElementState,
    StoryboardElementType,
};
use tracing::{debug, warn};

use StoryboardElementState::{
    CompleteState, RunningState, StandbyState, StartTransition, StopTransition,
};

#[derive(Debug)]
enum Body {
    Container,
    Action(Box<dyn Action>),
}

#[derive(Debug)]
struct ElementNode {
    handle: StoryboardElementHandle,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    scope: Scope,
    record: StateRecord,
    start_trigger: Option<Trigger>,
    stop_trigger: Option<Trigger>,
    completion: Completion,
    priority: Priority,
    maximum_execution_count: u32,
    execution_count: u32,
    select_triggering_entities: bool,
    selected: Vec<EntityRef>,
    body: Body,
}

impl ElementNode {
    fn state(&self) -> StoryboardElementState {
        self.record.state()
    }
}

/// Initialization action, run before any story starts
#[derive(Debug)]
struct InitAction {
    name: String,
    actors: Vec<EntityRef>,
    action: Box<dyn Action>,
    started: bool,
    done: bool,
}

/// Runtime storyboard
#[derive(Debug)]
pub struct Storyboard {
    nodes: Vec<ElementNode>,
    init: Vec<InitAction>,
    scope: Scope,
}

impl Storyboard {
    /// Advance the storyboard by one tick
    ///
    /// While initializing, each tick starts the next initialization action
    /// and nothing else, so every placement is applied before the next
    /// action observes the world. Once all have started, unfinished
    /// initialization actions keep running alongside the stories.
    ///
    /// # Errors
    /// Fatal errors abort the tick. Recoverable failures are recorded on
    /// `cx` and the failing element completes.
    pub fn tick(&mut self, cx: &mut TickContext<'_>) -> Result<(), ScenarioError> {
        cx.set_states(self.observe());

        if self.is_initializing() {
            return self.start_next_init(cx);
        }
        self.run_init(cx)?;
        self.tick_element(ElementId(0), cx)
    }

    /// True until every initialization action has started
    ///
    /// Initialization ticks take no simulation time.
    #[must_use]
    pub fn is_initializing(&self) -> bool {
        self.init.iter().any(|init| !init.started)
    }

    /// State of the storyboard root
    #[must_use]
    pub fn state(&self) -> StoryboardElementState {
        self.nodes[0].state()
    }

    /// True once the root reached `completeState`
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state() == CompleteState
    }

    /// State of one element
    #[must_use]
    pub fn element_state(&self, id: ElementId) -> Option<StoryboardElementState> {
        self.nodes.get(id.0).map(ElementNode::state)
    }

    /// Times an element has entered `runningState` (or been skipped) since its
    /// enclosing element last started
    #[must_use]
    pub fn execution_count(&self, id: ElementId) -> Option<u32> {
        self.nodes.get(id.0).map(|node| node.execution_count)
    }

    /// Handle of one element
    #[must_use]
    pub fn handle(&self, id: ElementId) -> Option<&StoryboardElementHandle> {
        self.nodes.get(id.0).map(|node| &node.handle)
    }

    /// Every element handle, root first
    pub fn elements(&self) -> impl Iterator<Item = &StoryboardElementHandle> {
        self.nodes.iter().map(|node| &node.handle)
    }

    /// Scope the storyboard was built in
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Resolve every trigger's references in its element's scope
    ///
    /// Runs on the finished tree, so triggers may name elements declared
    /// after them.
    ///
    /// # Errors
    /// The first resolution or type error found.
    pub fn check_references(&self) -> Result<(), ScenarioError> {
        for node in &self.nodes {
            for trigger in [&node.start_trigger, &node.stop_trigger].into_iter().flatten() {
                trigger.check(&node.scope)?;
            }
        }
        Ok(())
    }

    fn observe(&mut self) -> StateSnapshot {
        StateSnapshot::new(
            self.nodes
                .iter_mut()
                .map(|node| ElementObservation {
                    state: node.record.state(),
                    visited: node.record.take_visited(),
                })
                .collect(),
        )
    }

    fn start_next_init(&mut self, cx: &mut TickContext<'_>) -> Result<(), ScenarioError> {
        let Some(init) = self.init.iter_mut().find(|init| !init.started) else {
            return Ok(());
        };
        init.started = true;
        let mut acx = ActionContext {
            element: &init.name,
            scope: &self.scope,
            actors: &init.actors,
            tick: &mut *cx,
        };
        let outcome = init
            .action
            .start(&mut acx)
            .map(|()| init.action.ends_immediately());
        Self::settle_init(init, outcome, cx)
    }

    fn run_init(&mut self, cx: &mut TickContext<'_>) -> Result<(), ScenarioError> {
        for init in self.init.iter_mut().filter(|init| !init.done) {
            // started on the previous tick at the latest, so run() is due
            let mut acx = ActionContext {
                element: &init.name,
                scope: &self.scope,
                actors: &init.actors,
                tick: &mut *cx,
            };
            let outcome = init
                .action
                .run(&mut acx)
                .map(|()| init.action.accomplished(&acx));
            Self::settle_init(init, outcome, cx)?;
        }
        Ok(())
    }

    fn settle_init(
        init: &mut InitAction,
        outcome: Result<bool, ScenarioError>,
        cx: &mut TickContext<'_>,
    ) -> Result<(), ScenarioError> {
        match outcome {
            Ok(done) => {
                init.done = done;
                Ok(())
            }
            Err(error) if error.is_recoverable() => {
                warn!(element = %init.name, %error, "init action failed");
                cx.fail(init.name.as_str(), error.to_string());
                init.done = true;
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    fn tick_element(&mut self, id: ElementId, cx: &mut TickContext<'_>) -> Result<(), ScenarioError> {
        match self.nodes[id.0].state() {
            StandbyState => self.tick_standby(id, cx),
            RunningState => self.tick_running(id, cx),
            StartTransition | StopTransition | CompleteState => Ok(()),
        }
    }

    fn tick_standby(&mut self, id: ElementId, cx: &mut TickContext<'_>) -> Result<(), ScenarioError> {
        let node = &mut self.nodes[id.0];
        let fired = match &mut node.start_trigger {
            Some(trigger) => trigger.evaluate(&node.scope, cx)?,
            None => true,
        };
        if !fired {
            return Ok(());
        }

        if node.handle.kind == StoryboardElementType::Event {
            let running = self.running_siblings(id);
            match self.nodes[id.0].priority {
                Priority::Overwrite => {
                    for sibling in running {
                        debug!(element = %self.nodes[sibling.0].handle.name, "overwritten");
                        self.cancel(sibling, cx)?;
                    }
                }
                Priority::Skip if !running.is_empty() => return self.skip(id, cx),
                Priority::Skip | Priority::Parallel => {}
            }
        }
        self.start(id, cx)
    }

    fn start(&mut self, id: ElementId, cx: &mut TickContext<'_>) -> Result<(), ScenarioError> {
        self.transition(id, StartTransition, cx)?;
        self.transition(id, RunningState, cx)?;
        self.nodes[id.0].execution_count += 1;

        if self.nodes[id.0].handle.kind == StoryboardElementType::Act {
            self.select_triggering_entities(id);
        }

        match self.nodes[id.0].body {
            Body::Action(_) => {
                let outcome = self.with_action(id, cx, |action, acx| {
                    action.start(acx).map(|()| action.ends_immediately())
                });
                match outcome {
                    Some(Ok(true)) => self.finish(id, cx),
                    Some(Ok(false)) | None => Ok(()),
                    Some(Err(error)) => self.recover(id, error, cx),
                }
            }
            Body::Container => {
                for child in self.nodes[id.0].children.clone() {
                    self.tick_element(child, cx)?;
                }
                self.check_completion(id, cx)
            }
        }
    }

    fn tick_running(&mut self, id: ElementId, cx: &mut TickContext<'_>) -> Result<(), ScenarioError> {
        let node = &mut self.nodes[id.0];
        if let Some(trigger) = &mut node.stop_trigger {
            if trigger.evaluate(&node.scope, cx)? {
                debug!(element = %node.handle.name, "stop trigger fired");
                return self.cancel(id, cx);
            }
        }

        match self.nodes[id.0].body {
            Body::Action(_) => {
                // start() ran this tick; run() waits for the next one
                if self.nodes[id.0].record.running_since() >= Some(cx.tick) {
                    return Ok(());
                }
                let outcome = self.with_action(id, cx, |action, acx| {
                    action.run(acx)?;
                    Ok(action.accomplished(acx))
                });
                match outcome {
                    Some(Ok(true)) => self.finish(id, cx),
                    Some(Ok(false)) | None => Ok(()),
                    Some(Err(error)) => self.recover(id, error, cx),
                }
            }
            Body::Container => {
                for child in self.nodes[id.0].children.clone() {
                    self.tick_element(child, cx)?;
                }
                self.check_completion(id, cx)
            }
        }
    }

    fn check_completion(&mut self, id: ElementId, cx: &mut TickContext<'_>) -> Result<(), ScenarioError> {
        let node = &self.nodes[id.0];
        if node.state() != RunningState {
            return Ok(());
        }
        let complete = |child: &ElementId| self.nodes[child.0].state() == CompleteState;
        let done = node.children.is_empty()
            || match node.completion {
                Completion::AllOf => node.children.iter().all(complete),
                Completion::AnyOf => node.children.iter().any(complete),
            };
        if !done {
            return Ok(());
        }

        if node.completion == Completion::AnyOf {
            for child in node.children.clone() {
                self.cancel(child, cx)?;
            }
        }
        self.finish(id, cx)
    }

    /// Normal completion; re-arms the element while executions remain
    fn finish(&mut self, id: ElementId, cx: &mut TickContext<'_>) -> Result<(), ScenarioError> {
        self.transition(id, StopTransition, cx)?;
        self.transition(id, CompleteState, cx)?;

        let node = &self.nodes[id.0];
        if node.execution_count < node.maximum_execution_count {
            debug!(
                element = %node.handle.name,
                execution = node.execution_count,
                maximum = node.maximum_execution_count,
                "re-arming"
            );
            self.rearm(id);
        }
        Ok(())
    }

    /// Complete an event without running it
    fn skip(&mut self, id: ElementId, cx: &mut TickContext<'_>) -> Result<(), ScenarioError> {
        debug!(element = %self.nodes[id.0].handle.name, "skipped");
        self.nodes[id.0].execution_count += 1;
        self.finish(id, cx)
    }

    /// Force an element and its descendants to `completeState`
    ///
    /// Cancelled elements are never re-armed and never run again.
    fn cancel(&mut self, id: ElementId, cx: &mut TickContext<'_>) -> Result<(), ScenarioError> {
        for child in self.nodes[id.0].children.clone() {
            self.cancel(child, cx)?;
        }
        if matches!(self.nodes[id.0].state(), StandbyState | RunningState) {
            self.nodes[id.0].record.mark_cancelled();
            self.transition(id, StopTransition, cx)?;
            self.transition(id, CompleteState, cx)?;
        }
        Ok(())
    }

    /// Fresh standby record for `id`, fully reset descendants
    fn rearm(&mut self, id: ElementId) {
        let node = &mut self.nodes[id.0];
        node.record.rearm();
        node.selected.clear();
        for trigger in [&mut node.start_trigger, &mut node.stop_trigger].into_iter().flatten() {
            trigger.reset();
        }
        for child in node.children.clone() {
            self.rearm(child);
            self.nodes[child.0].execution_count = 0;
        }
    }

    /// Record a recoverable failure and complete the element, or propagate
    fn recover(
        &mut self,
        id: ElementId,
        error: ScenarioError,
        cx: &mut TickContext<'_>,
    ) -> Result<(), ScenarioError> {
        if !error.is_recoverable() {
            return Err(error);
        }
        let name = &self.nodes[id.0].handle.name;
        warn!(element = %name, %error, "action failed");
        cx.fail(name.as_str(), error.to_string());
        self.finish(id, cx)
    }

    fn transition(
        &mut self,
        id: ElementId,
        to: StoryboardElementState,
        cx: &TickContext<'_>,
    ) -> Result<(), ScenarioError> {
        let node = &mut self.nodes[id.0];
        let from = node.record.state();
        node.record.transition(to, cx.tick)?;
        debug!(
            element = %node.handle.name,
            kind = %node.handle.kind,
            %from,
            %to,
            tick = cx.tick,
            "transition"
        );
        Ok(())
    }

    fn running_siblings(&self, id: ElementId) -> Vec<ElementId> {
        let Some(parent) = self.nodes[id.0].parent else {
            return Vec::new();
        };
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .filter(|sibling| *sibling != id && self.nodes[sibling.0].state() == RunningState)
            .collect()
    }

    /// Hand the act's triggering entities to groups that asked for them
    fn select_triggering_entities(&mut self, act: ElementId) {
        let triggering = self.nodes[act.0]
            .start_trigger
            .as_ref()
            .map(|trigger| trigger.triggering_entities().to_vec())
            .unwrap_or_default();
        for group in self.nodes[act.0].children.clone() {
            let node = &mut self.nodes[group.0];
            if node.select_triggering_entities {
                node.selected.clone_from(&triggering);
            }
        }
    }

    /// Actors of the nearest enclosing maneuver group
    fn actors_of(&self, id: ElementId) -> Vec<EntityRef> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = &self.nodes[current.0];
            if node.handle.kind == StoryboardElementType::ManeuverGroup {
                let mut actors = node.scope.actors().to_vec();
                for entity in &node.selected {
                    if !actors.contains(entity) {
                        actors.push(entity.clone());
                    }
                }
                return actors;
            }
            cursor = node.parent;
        }
        self.nodes[id.0].scope.actors().to_vec()
    }

    fn with_action<R>(
        &mut self,
        id: ElementId,
        cx: &mut TickContext<'_>,
        f: impl FnOnce(&mut dyn Action, &mut ActionContext<'_, '_>) -> R,
    ) -> Option<R> {
        let actors = self.actors_of(id);
        let node = &mut self.nodes[id.0];
        let Body::Action(action) = &mut node.body else {
            return None;
        };
        let mut acx = ActionContext {
            element: &node.handle.name,
            scope: &node.scope,
            actors: &actors,
            tick: &mut *cx,
        };
        Some(f(action.as_mut(), &mut acx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{MockMapApi, WorldSnapshot};
    use osc_symbol::GlobalEnvironment;

    /// Completes once the tick number reaches `at`
    #[derive(Debug)]
    struct UntilTick {
        at: u64,
        immediate: bool,
    }

    impl Action for UntilTick {
        fn start(&mut self, _: &mut ActionContext<'_, '_>) -> Result<(), ScenarioError> {
            Ok(())
        }

        fn accomplished(&self, cx: &ActionContext<'_, '_>) -> bool {
            cx.tick.tick >= self.at
        }

        fn ends_immediately(&self) -> bool {
            self.immediate
        }
    }

    fn chain(builder: &mut StoryboardBuilder) -> ElementId {
        let mut parent = builder.root();
        for (kind, name) in [
            (StoryboardElementType::Story, "story"),
            (StoryboardElementType::Act, "act"),
            (StoryboardElementType::ManeuverGroup, "group"),
            (StoryboardElementType::Maneuver, "maneuver"),
            (StoryboardElementType::Event, "event"),
        ] {
            parent = builder.add_element(parent, ElementSpec::new(kind, name)).unwrap();
        }
        parent
    }

    fn tick(storyboard: &mut Storyboard, n: u64) {
        let world = WorldSnapshot::new(0.1 * n as f64);
        let map = MockMapApi::new();
        let mut cx = TickContext::new(n, 0.1, &world, &map);
        storyboard.tick(&mut cx).unwrap();
    }

    #[test]
    fn immediate_action_completes_in_one_tick() {
        let scope = Scope::new(GlobalEnvironment::default());
        let mut builder = StoryboardBuilder::new(&scope);
        let event = chain(&mut builder);
        let action = builder
            .add_action(event, "instant", Box::new(UntilTick { at: 0, immediate: true }))
            .unwrap();
        let mut storyboard = builder.build();

        tick(&mut storyboard, 0);
        assert_eq!(storyboard.element_state(action), Some(CompleteState));
        assert!(storyboard.is_complete());
    }

    #[test]
    fn deferred_action_waits_a_tick() {
        let scope = Scope::new(GlobalEnvironment::default());
        let mut builder = StoryboardBuilder::new(&scope);
        let event = chain(&mut builder);
        let action = builder
            .add_action(event, "slow", Box::new(UntilTick { at: 0, immediate: false }))
            .unwrap();
        let mut storyboard = builder.build();

        tick(&mut storyboard, 0);
        assert_eq!(storyboard.element_state(action), Some(RunningState));
        tick(&mut storyboard, 1);
        assert_eq!(storyboard.element_state(action), Some(CompleteState));
    }

    #[test]
    fn re_arms_until_maximum_execution_count() {
        let scope = Scope::new(GlobalEnvironment::default());
        let mut builder = StoryboardBuilder::new(&scope);
        let mut parent = builder.root();
        for (kind, name) in [
            (StoryboardElementType::Story, "story"),
            (StoryboardElementType::Act, "act"),
            (StoryboardElementType::ManeuverGroup, "group"),
            (StoryboardElementType::Maneuver, "maneuver"),
        ] {
            parent = builder.add_element(parent, ElementSpec::new(kind, name)).unwrap();
        }
        let event = builder
            .add_element(
                parent,
                ElementSpec::new(StoryboardElementType::Event, "repeat")
                    .with_maximum_execution_count(3),
            )
            .unwrap();
        builder
            .add_action(event, "once", Box::new(UntilTick { at: 0, immediate: true }))
            .unwrap();
        let mut storyboard = builder.build();

        tick(&mut storyboard, 0);
        assert_eq!(storyboard.element_state(event), Some(StandbyState));
        tick(&mut storyboard, 1);
        assert_eq!(storyboard.execution_count(event), Some(2));
        tick(&mut storyboard, 2);
        assert_eq!(storyboard.element_state(event), Some(CompleteState));
        assert_eq!(storyboard.execution_count(event), Some(3));
        assert!(storyboard.is_complete());
    }
}

//! Testing utilities for the OSC workspace
//!
//! Shared test helpers, fixtures, and assertions.

#![allow(missing_docs)]

use osc_kernel::action::{Action, ActionContext};
use osc_kernel::storyboard::{ElementSpec, StoryboardBuilder};
use osc_kernel::test_harness::StraightLaneMap;
use osc_kernel::trigger::Trigger;
use osc_kernel::{ActionFailure, Effect, ScenarioError, Storyboard, TickContext, WorldSnapshot};
use osc_symbol::{GlobalEnvironment, Scope};
use osc_syntax::{
    ByValueCondition, ConditionDefinition, ConditionEdge, ConditionKind, ElementId,
    ObjectDefinition, Rule, ScenarioObject, StoryboardElementState, StoryboardElementType,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Protocol call observed by a [`ProbeAction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Start(u64),
    Run(u64),
}

/// Shared record of protocol calls
pub type CallLog = Arc<Mutex<Vec<Call>>>;

/// Action that records its protocol calls and reports accomplished from a
/// given tick on
#[derive(Debug)]
pub struct ProbeAction {
    accomplished_at: Option<u64>,
    immediate: bool,
    log: CallLog,
}

impl ProbeAction {
    /// Accomplished from tick `tick` on
    pub fn until(tick: u64) -> (Self, CallLog) {
        Self::build(Some(tick), false)
    }

    /// Ends immediately
    pub fn immediate() -> (Self, CallLog) {
        Self::build(None, true)
    }

    /// Never accomplished
    pub fn forever() -> (Self, CallLog) {
        Self::build(None, false)
    }

    fn build(accomplished_at: Option<u64>, immediate: bool) -> (Self, CallLog) {
        let log = CallLog::default();
        (
            Self {
                accomplished_at,
                immediate,
                log: Arc::clone(&log),
            },
            log,
        )
    }
}

impl Action for ProbeAction {
    fn start(&mut self, cx: &mut ActionContext<'_, '_>) -> Result<(), ScenarioError> {
        self.log.lock().push(Call::Start(cx.tick.tick));
        Ok(())
    }

    fn run(&mut self, cx: &mut ActionContext<'_, '_>) -> Result<(), ScenarioError> {
        self.log.lock().push(Call::Run(cx.tick.tick));
        Ok(())
    }

    fn accomplished(&self, cx: &ActionContext<'_, '_>) -> bool {
        self.accomplished_at.is_some_and(|at| cx.tick.tick >= at)
    }

    fn ends_immediately(&self) -> bool {
        self.immediate
    }
}

/// Action whose start always fails recoverably
#[derive(Debug, Default)]
pub struct FailingAction;

impl Action for FailingAction {
    fn start(&mut self, cx: &mut ActionContext<'_, '_>) -> Result<(), ScenarioError> {
        Err(cx.failure("probe failure"))
    }

    fn accomplished(&self, _: &ActionContext<'_, '_>) -> bool {
        false
    }

    fn ends_immediately(&self) -> bool {
        false
    }
}

/// Ids of a story -> act -> group -> maneuver chain
#[derive(Debug, Clone, Copy)]
pub struct Chain {
    pub story: ElementId,
    pub act: ElementId,
    pub group: ElementId,
    pub maneuver: ElementId,
}

/// Empty outermost scope with the given entities declared
pub fn scope_with_entities(names: &[&str]) -> Scope {
    let scope = Scope::new(GlobalEnvironment::default());
    for name in names {
        scope
            .global_mut()
            .declare_entity(ScenarioObject::new(*name, ObjectDefinition::default()))
            .unwrap();
    }
    scope
}

/// Story, act, group and maneuver named `{prefix}_story` etc.
pub fn chain(builder: &mut StoryboardBuilder, prefix: &str, act: ElementSpec) -> Chain {
    let story = builder
        .add_element(
            builder.root(),
            ElementSpec::new(StoryboardElementType::Story, format!("{prefix}_story")),
        )
        .unwrap();
    let act = builder.add_element(story, act).unwrap();
    let group = builder
        .add_element(
            act,
            ElementSpec::new(StoryboardElementType::ManeuverGroup, format!("{prefix}_group")),
        )
        .unwrap();
    let maneuver = builder
        .add_element(
            group,
            ElementSpec::new(StoryboardElementType::Maneuver, format!("{prefix}_maneuver")),
        )
        .unwrap();
    Chain {
        story,
        act,
        group,
        maneuver,
    }
}

/// Plain act spec
pub fn act(name: &str) -> ElementSpec {
    ElementSpec::new(StoryboardElementType::Act, name)
}

/// Plain event spec
pub fn event(name: &str) -> ElementSpec {
    ElementSpec::new(StoryboardElementType::Event, name)
}

/// Condition on simulation time
pub fn time_condition(rule: Rule, value: f64) -> ConditionDefinition {
    ConditionDefinition {
        name: format!("time_{rule}_{value}"),
        edge: ConditionEdge::None,
        kind: ConditionKind::ByValue(ByValueCondition::SimulationTime { value, rule }),
    }
}

/// Fires once simulation time is greater than `value`
pub fn after(value: f64) -> Trigger {
    Trigger::single(time_condition(Rule::GreaterThan, value))
}

/// Fires when the referenced element is (or just was) in `state`
pub fn on_state(
    kind: StoryboardElementType,
    reference: &str,
    state: StoryboardElementState,
) -> Trigger {
    Trigger::single(ConditionDefinition {
        name: format!("{reference}_{state}"),
        edge: ConditionEdge::None,
        kind: ConditionKind::ByValue(ByValueCondition::StoryboardElementState {
            storyboard_element_type: kind,
            storyboard_element_ref: reference.into(),
            state,
        }),
    })
}

/// Tick with an empty world at `tick * step` seconds
pub fn tick_empty(
    storyboard: &mut Storyboard,
    tick: u64,
    step: f64,
) -> Result<(Vec<Effect>, Vec<ActionFailure>), ScenarioError> {
    #[allow(clippy::cast_precision_loss)]
    let world = WorldSnapshot::new(tick as f64 * step);
    tick_with(storyboard, tick, step, &world)
}

/// Tick against a prepared world snapshot
pub fn tick_with(
    storyboard: &mut Storyboard,
    tick: u64,
    step: f64,
    world: &WorldSnapshot,
) -> Result<(Vec<Effect>, Vec<ActionFailure>), ScenarioError> {
    let map = StraightLaneMap::default();
    let mut cx = TickContext::new(tick, step, world, &map);
    storyboard.tick(&mut cx)?;
    Ok(cx.finish())
}

/// Cut-in scenario on a straight two-lane road, as a scenario file
pub const CUT_IN_SCENARIO: &str = r"
parameterDeclarations:
  - { name: ego_speed, parameterType: double, value: '10' }
  - { name: trigger_gap, parameterType: double, value: '20' }
entities:
  - name: ego
    object: { category: vehicle, maxSpeed: 40 }
  - name: npc
    object: { category: vehicle, maxSpeed: 40 }
roadNetwork:
  lanes:
    - { id: 1, length: 1000, successor: null }
    - { id: 2, startY: 3.5, length: 1000 }
storyboard:
  init:
    - entityRef: ego
      action:
        teleport:
          position: { lane: { laneId: 1, s: 0 } }
    - entityRef: npc
      action:
        teleport:
          position: { lane: { laneId: 2, s: 40 } }
    - entityRef: ego
      action:
        speed:
          target: { absolute: { value: 10 } }
    - entityRef: npc
      action:
        speed:
          target: { absolute: { value: 5 } }
  stories:
    - name: cut_in
      acts:
        - name: act
          maneuverGroups:
            - name: npc_group
              actors: { entityRefs: [npc] }
              maneuvers:
                - name: merge_maneuver
                  events:
                    - name: change_lane
                      startTrigger:
                        conditionGroups:
                          - conditions:
                              - name: gap_closed
                                byEntity:
                                  triggeringEntities:
                                    triggeringEntitiesRule: any
                                    entityRefs: [ego]
                                  entityCondition:
                                    relativeDistance: { entityRef: npc, value: 20, rule: lessThan }
                      actions:
                        - name: merge
                          teleport:
                            position: { relativeWorld: { entityRef: npc, dx: 0, dy: -3.5 } }
            - name: ego_group
              actors: { entityRefs: [ego] }
              maneuvers:
                - name: brake
                  events:
                    - name: brake_event
                      startTrigger:
                        conditionGroups:
                          - conditions:
                              - name: npc_merged
                                byValue:
                                  storyboardElementState:
                                    storyboardElementType: event
                                    storyboardElementRef: npc_group::merge_maneuver::change_lane
                                    state: completeState
                      actions:
                        - name: slow_down
                          speed:
                            target: { absolute: { value: 5 } }
                            dynamics: { shape: linear, dimension: rate, value: 5 }
                    - name: done
                      startTrigger:
                        conditionGroups:
                          - conditions:
                              - name: braked
                                byValue:
                                  storyboardElementState:
                                    storyboardElementType: event
                                    storyboardElementRef: brake_event
                                    state: completeState
                      actions:
                        - name: finish
                          customCommand: { command: exitSuccess }
";

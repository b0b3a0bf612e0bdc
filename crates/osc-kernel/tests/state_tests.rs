use osc_kernel::state_machine::{allowed_transitions, validate_transition, StateRecord};
use osc_kernel::test_harness::StraightLaneMap;
use osc_kernel::trigger::Trigger;
use osc_kernel::{TickContext, WorldSnapshot};
use osc_symbol::{GlobalEnvironment, Scope};
use osc_syntax::Rule;
use osc_syntax::StoryboardElementState::{
    self, CompleteState, RunningState, StandbyState, StartTransition, StopTransition,
};
use osc_test_utils::time_condition;
use proptest::prelude::*;

fn any_state() -> impl Strategy<Value = StoryboardElementState> {
    prop_oneof![
        Just(StandbyState),
        Just(StartTransition),
        Just(RunningState),
        Just(StopTransition),
        Just(CompleteState),
    ]
}

#[test]
fn test_standby_transitions() {
    assert!(validate_transition(StandbyState, StartTransition).is_ok());
    assert!(validate_transition(StandbyState, StopTransition).is_ok());

    // Invalid
    assert!(validate_transition(StandbyState, RunningState).is_err());
    assert!(validate_transition(StandbyState, CompleteState).is_err());
}

#[test]
fn test_complete_is_terminal() {
    assert!(allowed_transitions(CompleteState).is_empty());
    assert!(validate_transition(CompleteState, StandbyState).is_err());
}

#[test]
fn test_error_names_both_states() {
    let err = validate_transition(RunningState, StartTransition).unwrap_err();
    assert_eq!(err.to_string(), "illegal transition runningState -> startTransition");
}

proptest! {
    /// Tenet: the transition table is the only source of legality
    #[test]
    fn prop_all_transitions_are_subset_of_allowed(from in any_state(), to in any_state()) {
        let res = validate_transition(from, to);
        let allowed = allowed_transitions(from);

        if res.is_ok() {
            prop_assert!(allowed.contains(&to));
        } else {
            prop_assert!(!allowed.contains(&to));
        }
    }

    /// Tenet: a record never leaves a state it cannot legally leave
    #[test]
    fn prop_record_only_moves_forward(steps in prop::collection::vec(any_state(), 0..20)) {
        let mut record = StateRecord::new();
        for (tick, to) in steps.into_iter().enumerate() {
            let before = record.state();
            match record.transition(to, tick as u64) {
                Ok(()) => prop_assert_eq!(record.state(), to),
                Err(_) => prop_assert_eq!(record.state(), before),
            }
        }
    }

    /// Tenet: once fired, a trigger stays fired until reset
    #[test]
    fn prop_latch_is_monotonic(times in prop::collection::vec(0.0f64..10.0, 1..30)) {
        let scope = Scope::new(GlobalEnvironment::default());
        let map = StraightLaneMap::default();
        let mut trigger = Trigger::single(time_condition(Rule::GreaterThan, 5.0));

        let mut seen = false;
        for (tick, time) in times.into_iter().enumerate() {
            let world = WorldSnapshot::new(time);
            let cx = TickContext::new(tick as u64, 0.1, &world, &map);
            seen |= time > 5.0;
            prop_assert_eq!(trigger.evaluate(&scope, &cx).unwrap(), seen);
        }
    }
}

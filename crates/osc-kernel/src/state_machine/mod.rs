//! Storyboard element life cycle
//!
//! `standbyState -> startTransition -> runningState -> stopTransition -> completeState`.
//! Standby may also go straight to `stopTransition` when an element is
//! cancelled or skipped before it ever starts.

use crate::error::StateMachineError;
use osc_syntax::StoryboardElementState;
use smallvec::SmallVec;

/// Validates a state transition.
///
/// # Errors
/// Returns [`StateMachineError::IllegalTransition`] for anything outside the table.
pub fn validate_transition(
    from: StoryboardElementState,
    to: StoryboardElementState,
) -> Result<(), StateMachineError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(StateMachineError::IllegalTransition { from, to })
    }
}

/// States reachable from `from` in one transition
#[must_use]
pub fn allowed_transitions(from: StoryboardElementState) -> Vec<StoryboardElementState> {
    use StoryboardElementState::{
        CompleteState, RunningState, StandbyState, StartTransition, StopTransition,
    };
    match from {
        StandbyState => vec![StartTransition, StopTransition],
        StartTransition => vec![RunningState],
        RunningState => vec![StopTransition],
        StopTransition => vec![CompleteState],
        CompleteState => vec![],
    }
}

fn allowed(from: StoryboardElementState, to: StoryboardElementState) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}

/// Per-instance state record
///
/// Tracks the current state and every state entered since the last call to
/// [`StateRecord::take_visited`], so observers can see the instantaneous
/// transition states.
#[derive(Debug, Clone, Default)]
pub struct StateRecord {
    state: StoryboardElementState,
    visited: SmallVec<[StoryboardElementState; 4]>,
    running_since: Option<u64>,
    cancelled: bool,
}

impl StateRecord {
    /// Fresh record in `standbyState`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> StoryboardElementState {
        self.state
    }

    /// Tick on which `runningState` was entered
    #[inline]
    #[must_use]
    pub fn running_since(&self) -> Option<u64> {
        self.running_since
    }

    /// True if the element was stopped by its container or its own stop trigger
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Advance to `to` on tick `tick`
    ///
    /// # Errors
    /// Returns [`StateMachineError::IllegalTransition`] if `to` is not reachable.
    pub fn transition(
        &mut self,
        to: StoryboardElementState,
        tick: u64,
    ) -> Result<(), StateMachineError> {
        validate_transition(self.state, to)?;
        if to == StoryboardElementState::RunningState {
            self.running_since = Some(tick);
        }
        self.state = to;
        self.visited.push(to);
        Ok(())
    }

    /// Flag the record as cancelled
    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    /// Replace with a fresh standby record, keeping this tick's visited states
    ///
    /// Re-entering standby is recorded as a visit so observers see the loop.
    pub fn rearm(&mut self) {
        let mut visited = std::mem::take(&mut self.visited);
        visited.push(StoryboardElementState::StandbyState);
        *self = Self {
            visited,
            ..Self::default()
        };
    }

    /// States entered since the previous call
    pub fn take_visited(&mut self) -> SmallVec<[StoryboardElementState; 4]> {
        std::mem::take(&mut self.visited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use StoryboardElementState::*;

    #[test]
    fn full_life_cycle() {
        let mut record = StateRecord::new();
        for (tick, to) in [StartTransition, RunningState, StopTransition, CompleteState]
            .into_iter()
            .enumerate()
        {
            record.transition(to, tick as u64).unwrap();
        }

        assert_eq!(record.state(), CompleteState);
        assert_eq!(record.running_since(), Some(1));
        assert_eq!(
            record.take_visited().as_slice(),
            &[StartTransition, RunningState, StopTransition, CompleteState]
        );
        assert!(record.take_visited().is_empty());
    }

    #[test]
    fn no_skipping() {
        let mut record = StateRecord::new();
        assert!(record.transition(RunningState, 0).is_err());
        assert!(record.transition(CompleteState, 0).is_err());
        assert_eq!(record.state(), StandbyState);
    }

    #[test]
    fn rearm_keeps_visited() {
        let mut record = StateRecord::new();
        record.transition(StopTransition, 0).unwrap();
        record.transition(CompleteState, 0).unwrap();
        record.mark_cancelled();
        record.rearm();

        assert_eq!(record.state(), StandbyState);
        assert!(!record.is_cancelled());
        assert_eq!(
            record.take_visited().as_slice(),
            &[StopTransition, CompleteState, StandbyState]
        );
    }
}

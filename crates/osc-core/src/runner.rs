//! Scenario run driver
//!
//! One step is one tick: snapshot the world, tick the storyboard against the
//! snapshot, apply the buffered effects, then advance the world. Effects are
//! applied in the order the storyboard produced them.

use crate::config::InterpreterConfig;
use crate::error::InterpreterError;
use crate::report::RunReport;
use crate::scenario::ScenarioFile;
use osc_kernel::test_harness::{KinematicWorld, StraightLaneMap};
use osc_kernel::{
    ActionFailure, Effect, EntityApi, EntityCommand, LoadedScenario, MapApi, ScenarioError,
    Storyboard, TickContext, Verdict,
};
use osc_symbol::Scope;
use tracing::{error, info, warn};

/// Drives a loaded scenario against an entity surface and a map
pub struct ScenarioRunner<W = KinematicWorld, M = StraightLaneMap> {
    name: String,
    config: InterpreterConfig,
    scope: Scope,
    storyboard: Storyboard,
    world: W,
    map: M,
    tick: u64,
    time: f64,
    requested: Option<Verdict>,
    failures: Vec<ActionFailure>,
}

impl ScenarioRunner {
    /// Runner over the built-in kinematic world and the file's road network
    ///
    /// # Errors
    /// Invalid configuration or any load-time scenario error.
    pub fn from_file(file: &ScenarioFile, config: InterpreterConfig) -> Result<Self, InterpreterError> {
        config.validate()?;
        let name = file
            .path
            .file_stem()
            .map_or_else(|| "scenario".to_string(), |stem| stem.to_string_lossy().into_owned());
        Ok(Self::new(file.load()?, KinematicWorld::new(), file.map(), config).with_name(name))
    }
}

impl<W: EntityApi, M: MapApi> ScenarioRunner<W, M> {
    /// Runner for an already loaded scenario
    #[must_use]
    pub fn new(loaded: LoadedScenario, world: W, map: M, config: InterpreterConfig) -> Self {
        Self {
            name: "scenario".to_string(),
            config,
            scope: loaded.scope,
            storyboard: loaded.storyboard,
            world,
            map,
            tick: 0,
            time: 0.0,
            requested: None,
            failures: Vec::new(),
        }
    }

    /// Name used in reports
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Ticks executed so far
    #[inline]
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulation time
    #[inline]
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// The storyboard being driven
    #[must_use]
    pub fn storyboard(&self) -> &Storyboard {
        &self.storyboard
    }

    /// The entity surface
    #[must_use]
    pub fn world(&self) -> &W {
        &self.world
    }

    /// Outermost scenario scope
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Recoverable failures recorded so far
    #[must_use]
    pub fn failures(&self) -> &[ActionFailure] {
        &self.failures
    }

    /// Verdict requested by a custom command, if any
    #[must_use]
    pub fn requested_verdict(&self) -> Option<Verdict> {
        self.requested
    }

    /// Execute one tick
    ///
    /// Ticks spent starting initialization actions do not advance the world.
    ///
    /// # Errors
    /// Fatal scenario errors. Recoverable failures are recorded instead.
    pub fn step(&mut self) -> Result<(), ScenarioError> {
        let initializing = self.storyboard.is_initializing();
        let snapshot = self.world.snapshot();

        let mut cx = TickContext::new(self.tick, self.config.step_time, &snapshot, &self.map);
        self.storyboard.tick(&mut cx)?;
        let (effects, failures) = cx.finish();
        self.failures.extend(failures);

        for effect in effects {
            self.apply(effect)?;
        }

        if !initializing {
            self.world.update(self.config.step_time, &self.map);
            self.time += self.config.step_time;
        }
        self.tick += 1;
        Ok(())
    }

    /// Step until a verdict is reached
    ///
    /// The run ends when a custom command requests a verdict, the storyboard
    /// completes, a limit is exceeded, or a fatal error occurs. Any recorded
    /// failure makes the verdict FAILURE.
    pub fn run(&mut self) -> RunReport {
        info!(scenario = %self.name, step = self.config.step_time, "running scenario");

        let (verdict, reason) = loop {
            if let Some(verdict) = self.requested {
                break (verdict, None);
            }
            if self.storyboard.is_complete() {
                break (Verdict::Success, None);
            }
            if let Some(reason) = self.limit_exceeded() {
                warn!(tick = self.tick, time = self.time, %reason, "giving up");
                break (Verdict::Failure, Some(reason));
            }
            if let Err(error) = self.step() {
                error!(tick = self.tick, time = self.time, %error, "scenario aborted");
                break (Verdict::Failure, Some(error.to_string()));
            }
        };

        let verdict = if self.failures.is_empty() {
            verdict
        } else {
            Verdict::Failure
        };
        info!(
            scenario = %self.name,
            %verdict,
            ticks = self.tick,
            time = self.time,
            failures = self.failures.len(),
            "scenario finished"
        );

        RunReport {
            scenario: self.name.clone(),
            verdict,
            ticks: self.tick,
            simulation_time: self.time,
            failures: self.failures.clone(),
            reason,
        }
    }

    fn limit_exceeded(&self) -> Option<String> {
        if let Some(max) = self.config.max_ticks {
            if self.tick >= max {
                return Some(format!("tick limit of {max} reached"));
            }
        }
        if let Some(limit) = self.config.time_limit {
            if self.time > limit {
                return Some(format!("time limit of {limit}s exceeded"));
            }
        }
        None
    }

    fn apply(&mut self, effect: Effect) -> Result<(), ScenarioError> {
        match effect {
            Effect::Entity(command) => self.command(command),
            Effect::AddEntity { object, pose } => {
                let entity = object.entity_ref();
                let added = self.scope.global_mut().add_entity(&entity)?;
                if added {
                    self.command(EntityCommand::Spawn { object, pose });
                } else {
                    self.command(EntityCommand::Teleport { entity, pose });
                }
            }
            Effect::DeleteEntity { entity } => {
                self.scope.global_mut().remove_entity(&entity);
                self.command(EntityCommand::Despawn { entity });
            }
            Effect::SetParameter {
                scope,
                reference,
                value,
            } => {
                scope.set_parameter(&reference, &value)?;
            }
            Effect::Verdict(verdict) => {
                info!(%verdict, tick = self.tick, "verdict requested");
                self.requested.get_or_insert(verdict);
            }
        }
        Ok(())
    }

    fn command(&mut self, command: EntityCommand) {
        let entity = command.entity();
        if let Err(error) = self.world.apply(command, &self.map) {
            warn!(%entity, %error, "entity command failed");
            self.failures.push(ActionFailure {
                tick: self.tick,
                time: self.time,
                element: entity.to_string(),
                message: error.to_string(),
            });
        }
    }
}

impl<W, M> std::fmt::Debug for ScenarioRunner<W, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioRunner")
            .field("name", &self.name)
            .field("tick", &self.tick)
            .field("time", &self.time)
            .field("requested", &self.requested)
            .field("failures", &self.failures.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osc_test_utils::CUT_IN_SCENARIO;

    fn runner(config: InterpreterConfig) -> ScenarioRunner {
        let file = ScenarioFile::from_yaml_str(CUT_IN_SCENARIO).unwrap();
        ScenarioRunner::from_file(&file, config).unwrap()
    }

    #[test]
    fn initialization_takes_no_time() {
        let mut runner = runner(InterpreterConfig::default());

        for _ in 0..4 {
            runner.step().unwrap();
            assert!(runner.time().abs() < f64::EPSILON);
        }
        assert!(!runner.storyboard().is_initializing());
        assert!(runner.world().contains(&"ego".into()));
        assert!(runner.world().contains(&"npc".into()));
        assert!(runner.scope().global().is_added_entity(&"npc".into()));

        runner.step().unwrap();
        assert!(runner.time() > 0.0);
    }

    #[test]
    fn tick_limit_fails_the_run() {
        let report = runner(InterpreterConfig::default().with_max_ticks(10)).run();

        assert_eq!(report.verdict, Verdict::Failure);
        assert_eq!(report.ticks, 10);
        assert_eq!(report.reason.as_deref(), Some("tick limit of 10 reached"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let file = ScenarioFile::from_yaml_str(CUT_IN_SCENARIO).unwrap();
        let err = ScenarioRunner::from_file(&file, InterpreterConfig::default().with_step_time(-1.0))
            .unwrap_err();
        assert!(matches!(err, InterpreterError::Config(_)));
    }
}

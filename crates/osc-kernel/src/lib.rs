//! OSC Kernel
//!
//! Storyboard execution for scenario documents:
//! 1. **Loading**: [`ScenarioLoader`] resolves a [`osc_syntax::ScenarioDefinition`]
//!    into a populated scope and a runtime [`Storyboard`]
//! 2. **Ticking**: each simulation step the driver snapshots the world,
//!    ticks the storyboard through a [`TickContext`], then applies the
//!    buffered [`Effect`]s
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use osc_kernel::prelude::*;
//!
//! let loaded = ScenarioLoader::new().load(&definition)?;
//! let mut storyboard = loaded.storyboard;
//!
//! let snapshot = world.snapshot();
//! let mut cx = TickContext::new(tick, step, &snapshot, &map);
//! storyboard.tick(&mut cx)?;
//! let (effects, failures) = cx.finish();
//! ```

pub mod action;
pub mod condition;
pub mod context;
pub mod error;
pub mod loader;
pub mod state_machine;
pub mod storyboard;
pub mod trigger;
pub mod world;

// Test harness
pub mod test_harness;

pub use context::{ActionFailure, Effect, StateSnapshot, TickContext, Verdict};
pub use error::{EntityError, ScenarioError, StateMachineError};
pub use loader::{CatalogSource, LoadedScenario, ScenarioLoader, YamlCatalogSource};
pub use storyboard::{ElementSpec, Storyboard, StoryboardBuilder};
pub use world::{EntityApi, EntityCommand, EntityStatus, LanePose, MapApi, Pose, WorldSnapshot};

/// Common imports
pub mod prelude {
    pub use crate::action::{instantiate, Action, ActionContext};
    pub use crate::condition::Condition;
    pub use crate::context::{ActionFailure, Effect, TickContext, Verdict};
    pub use crate::error::{EntityError, ScenarioError};
    pub use crate::loader::{LoadedScenario, ScenarioLoader};
    pub use crate::storyboard::{ElementSpec, Storyboard, StoryboardBuilder};
    pub use crate::test_harness::{KinematicWorld, StraightLaneMap};
    pub use crate::trigger::{ConditionGroup, Trigger};
    pub use crate::world::{EntityApi, EntityCommand, MapApi, Pose, WorldSnapshot};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

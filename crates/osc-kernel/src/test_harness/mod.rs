//! In-process simulation harness
//!
//! [`KinematicWorld`] and [`StraightLaneMap`] stand in for the external
//! dynamics and map services, so scenarios can run end to end in tests and
//! from the command line.

mod road;
mod simulator;

pub use road::{LaneDefinition, StraightLaneMap, HALF_LANE_WIDTH};
pub use simulator::KinematicWorld;

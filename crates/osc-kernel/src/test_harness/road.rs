//! Straight-lane map
//!
//! Each lane is a straight segment with an optional successor. Enough
//! geometry to exercise lane positions and along-lane distances without a
//! real road network.

use crate::world::{LanePose, MapApi, Pose};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Half of the lane width used when projecting world poses onto lanes
pub const HALF_LANE_WIDTH: f64 = 1.75;

/// One straight lane segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneDefinition {
    /// Lane identifier
    pub id: i64,
    /// Start point east
    #[serde(default)]
    pub start_x: f64,
    /// Start point north
    #[serde(default)]
    pub start_y: f64,
    /// Direction of travel in radians
    #[serde(default)]
    pub heading: f64,
    /// Segment length
    pub length: f64,
    /// Lane entered at the end of this one
    #[serde(default)]
    pub successor: Option<i64>,
}

/// [`MapApi`] over straight lane segments
#[derive(Debug, Clone, Default)]
pub struct StraightLaneMap {
    lanes: IndexMap<i64, LaneDefinition>,
}

impl StraightLaneMap {
    /// Map from lane segments
    #[must_use]
    pub fn new(lanes: impl IntoIterator<Item = LaneDefinition>) -> Self {
        Self {
            lanes: lanes.into_iter().map(|lane| (lane.id, lane)).collect(),
        }
    }

    /// Lane by id
    #[must_use]
    pub fn lane(&self, id: i64) -> Option<&LaneDefinition> {
        self.lanes.get(&id)
    }

    /// Number of lanes
    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// True when the map has no lanes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }
}

impl MapApi for StraightLaneMap {
    fn to_world(&self, lane: &LanePose) -> Option<Pose> {
        let definition = self.lanes.get(&lane.lane_id)?;
        if !(0.0..=definition.length).contains(&lane.s) {
            return None;
        }
        let (sin, cos) = definition.heading.sin_cos();
        Some(Pose::new(
            definition.start_x + lane.s * cos - lane.offset * sin,
            definition.start_y + lane.s * sin + lane.offset * cos,
            definition.heading,
        ))
    }

    fn to_lane(&self, pose: &Pose) -> Option<LanePose> {
        self.lanes
            .values()
            .filter_map(|definition| {
                let (sin, cos) = definition.heading.sin_cos();
                let dx = pose.x - definition.start_x;
                let dy = pose.y - definition.start_y;
                let s = dx * cos + dy * sin;
                let offset = dy * cos - dx * sin;
                ((0.0..=definition.length).contains(&s) && offset.abs() <= HALF_LANE_WIDTH).then_some(
                    LanePose {
                        lane_id: definition.id,
                        s,
                        offset,
                    },
                )
            })
            .min_by(|a, b| a.offset.abs().total_cmp(&b.offset.abs()))
    }

    fn longitudinal_distance(&self, from: &LanePose, to: &LanePose) -> Option<f64> {
        if from.lane_id == to.lane_id && to.s >= from.s {
            return Some(to.s - from.s);
        }

        let mut lane = self.lanes.get(&from.lane_id)?;
        let mut distance = lane.length - from.s;
        // successor chains may loop; each lane is entered at most once
        for _ in 0..self.lanes.len() {
            lane = self.lanes.get(&lane.successor?)?;
            if lane.id == to.lane_id {
                return Some(distance + to.s);
            }
            distance += lane.length;
        }
        None
    }
}

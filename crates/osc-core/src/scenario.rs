//! Scenario files
//!
//! A scenario file is a scenario document plus the road network the
//! built-in map is made of.

use crate::error::InterpreterError;
use osc_kernel::test_harness::{LaneDefinition, StraightLaneMap};
use osc_kernel::{LoadedScenario, ScenarioLoader};
use osc_syntax::ScenarioDefinition;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Lanes of the straight-lane map
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoadNetwork {
    /// Lane segments
    #[serde(default)]
    pub lanes: Vec<LaneDefinition>,
}

/// Parsed scenario file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioFile {
    /// Scenario document
    #[serde(flatten)]
    pub scenario: ScenarioDefinition,
    /// Road network
    #[serde(default)]
    pub road_network: RoadNetwork,
    /// Where the file was read from; empty for in-memory documents
    #[serde(skip)]
    pub path: PathBuf,
}

impl ScenarioFile {
    /// Parse a YAML document
    ///
    /// # Errors
    /// [`InterpreterError::Yaml`] if the document does not parse.
    pub fn from_yaml_str(text: &str) -> Result<Self, InterpreterError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read and parse a YAML file
    ///
    /// # Errors
    /// Unreadable file or malformed document.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InterpreterError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| InterpreterError::io(path, e))?;
        let mut file = Self::from_yaml_str(&text)?;
        file.path = path.to_path_buf();
        Ok(file)
    }

    /// Map built from the road network
    #[must_use]
    pub fn map(&self) -> StraightLaneMap {
        StraightLaneMap::new(self.road_network.lanes.iter().cloned())
    }

    /// Resolve names and build the storyboard
    ///
    /// # Errors
    /// Any load-time scenario error.
    pub fn load(&self) -> Result<LoadedScenario, InterpreterError> {
        Ok(ScenarioLoader::new()
            .with_pathname(&self.path)
            .load(&self.scenario)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osc_test_utils::CUT_IN_SCENARIO;

    #[test]
    fn parses_scenario_and_road_network() {
        let file = ScenarioFile::from_yaml_str(CUT_IN_SCENARIO).unwrap();

        assert_eq!(file.scenario.entities.len(), 2);
        assert_eq!(file.scenario.storyboard.init.len(), 4);
        assert_eq!(file.road_network.lanes.len(), 2);
        assert_eq!(file.map().len(), 2);
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut_in.yaml");
        std::fs::write(&path, CUT_IN_SCENARIO).unwrap();

        let file = ScenarioFile::from_path(&path).unwrap();
        assert_eq!(file.path, path);

        let loaded = file.load().unwrap();
        assert!(loaded.storyboard.is_initializing());
    }

    #[test]
    fn malformed_yaml_is_reported() {
        let err = ScenarioFile::from_yaml_str("entities: [").unwrap_err();
        assert!(matches!(err, InterpreterError::Yaml(_)));
    }
}

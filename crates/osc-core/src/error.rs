//! Error types for the run driver
//!
//! Scenario errors from the kernel pass through unchanged; everything else
//! concerns the files the driver reads and writes.

use osc_kernel::ScenarioError;
use std::path::{Path, PathBuf};

/// Main driver error type
#[derive(Debug, thiserror::Error)]
pub enum InterpreterError {
    /// Loading or executing the scenario failed
    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    /// Invalid configuration value
    #[error("configuration error: {0}")]
    Config(String),

    /// File could not be read or written
    #[error("{}: {source}", path.display())]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Scenario document did not parse
    #[error("malformed scenario: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration document did not parse
    #[error("malformed configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Report could not be serialized
    #[error("report serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl InterpreterError {
    /// I/O error on `path`
    #[inline]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Check if the error came from the scenario rather than the driver
    #[inline]
    #[must_use]
    pub fn is_scenario_error(&self) -> bool {
        matches!(self, Self::Scenario(_))
    }
}

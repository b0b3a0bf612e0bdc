//! Interpreter configuration
//!
//! Read from TOML. Every field has a default, so an empty file is a valid
//! configuration. Command-line flags are applied on top with the `with_*`
//! builders.

use crate::error::InterpreterError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Simulated seconds per tick
    pub step_time: f64,
    /// Give up with FAILURE after this many ticks
    pub max_ticks: Option<u64>,
    /// Give up with FAILURE once simulation time exceeds this many seconds
    pub time_limit: Option<f64>,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Directory reports are written to
    pub output_directory: Option<PathBuf>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            step_time: 0.05,
            max_ticks: None,
            time_limit: None,
            log_filter: "info".to_string(),
            output_directory: None,
        }
    }
}

impl InterpreterConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// Malformed TOML or an invalid value.
    pub fn from_toml_str(text: &str) -> Result<Self, InterpreterError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// Unreadable file, malformed TOML or an invalid value.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InterpreterError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| InterpreterError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// With step time
    #[inline]
    #[must_use]
    pub fn with_step_time(mut self, step_time: f64) -> Self {
        self.step_time = step_time;
        self
    }

    /// With tick limit
    #[inline]
    #[must_use]
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    /// With simulation time limit
    #[inline]
    #[must_use]
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    /// With log filter
    #[inline]
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// With report directory
    #[inline]
    #[must_use]
    pub fn with_output_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.output_directory = Some(directory.into());
        self
    }

    /// Check value ranges
    ///
    /// # Errors
    /// [`InterpreterError::Config`] naming the offending field.
    pub fn validate(&self) -> Result<(), InterpreterError> {
        if !(self.step_time.is_finite() && self.step_time > 0.0) {
            return Err(InterpreterError::Config(format!(
                "step_time must be positive, got {}",
                self.step_time
            )));
        }
        if let Some(limit) = self.time_limit {
            if !(limit.is_finite() && limit >= 0.0) {
                return Err(InterpreterError::Config(format!(
                    "time_limit must not be negative, got {limit}"
                )));
            }
        }
        Ok(())
    }
}

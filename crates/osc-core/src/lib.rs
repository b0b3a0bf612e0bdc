//! OSC Core - scenario run driver
//!
//! Loads scenario files, drives the storyboard tick by tick against an
//! entity surface and a map, and turns the outcome into a verdict report.
//!
//! # Example
//!
//! ```rust,no_run
//! use osc_core::{InterpreterConfig, ScenarioFile, ScenarioRunner};
//!
//! # fn example() -> Result<(), osc_core::InterpreterError> {
//! let file = ScenarioFile::from_path("cut_in.yaml")?;
//! let config = InterpreterConfig::new().with_time_limit(60.0);
//! let mut runner = ScenarioRunner::from_file(&file, config)?;
//!
//! let report = runner.run();
//! println!("{}", report.generate_text());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod report;
pub mod runner;
pub mod scenario;

pub use config::InterpreterConfig;
pub use error::InterpreterError;
pub use report::RunReport;
pub use runner::ScenarioRunner;
pub use scenario::{RoadNetwork, ScenarioFile};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving scenarios
    pub use crate::{
        InterpreterConfig, InterpreterError, RunReport, ScenarioFile, ScenarioRunner,
    };
    pub use osc_kernel::Verdict;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

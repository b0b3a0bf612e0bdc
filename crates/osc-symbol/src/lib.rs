//! OSC Symbol
//!
//! Lexically scoped, catalog-aware name resolution.
//!
//! # Overview
//!
//! - **Name / PrefixedName**: `name`, `catalog::name`, `::absolute::name`
//! - **FrameArena**: tree of environment frames with breadth-first lookup
//! - **Scope**: shallow handle pairing a frame with the run's global environment
//!
//! # Example
//!
//! ```rust
//! use osc_symbol::{GlobalEnvironment, Scope};
//! use osc_syntax::ParameterValue;
//!
//! let root = Scope::new(GlobalEnvironment::new("scenario.yaml"));
//! root.define("speed", ParameterValue::Double(10.0));
//!
//! let act = root.child("story").child("act");
//! assert_eq!(act.parameter("$speed").unwrap(), ParameterValue::Double(10.0));
//! ```

#![warn(missing_docs)]

pub mod frame;
pub mod name;
pub mod scope;

// Re-exports
pub use frame::{FrameArena, FrameId, ResolutionError};
pub use name::{Name, NameError, PrefixedName};
pub use scope::{GlobalEnvironment, Scope, ScopeError};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for name resolution
    pub use crate::{GlobalEnvironment, Name, PrefixedName, ResolutionError, Scope, ScopeError};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

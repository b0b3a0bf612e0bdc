//! OSC Syntax
//!
//! Typed scenario elements and the closed value union they travel in.
//!
//! # Core Concepts
//!
//! - [`Value`]: handle to exactly one concrete element
//! - [`Element`]: capability query and checked downcast (`is::<T>()`, `downcast_ref::<T>()`)
//! - [`ParameterDeclaration`] / [`ParameterValue`]: typed parameters
//! - [`ScenarioDefinition`]: a whole scenario document, deserializable from YAML
//!
//! # Example
//!
//! ```rust
//! use osc_syntax::{EntityRef, ParameterValue, Value};
//!
//! let value = Value::from(ParameterValue::Double(3.0));
//! assert!(value.is::<ParameterValue>());
//! assert!(!value.is::<EntityRef>());
//! assert!(value.downcast_ref::<EntityRef>().is_err());
//! ```

#![warn(unreachable_pub)]

mod action;
mod condition;
mod entity;
mod parameter;
mod position;
mod rule;
mod scenario;
mod storyboard;
mod value;

pub use action::{
    ActionDefinition, DynamicsDimension, DynamicsShape, RelativeSpeedType, SpeedProfileEntry,
    SpeedTarget, TransitionDynamics,
};
pub use condition::{
    ByEntityCondition, ByValueCondition, ConditionDefinition, ConditionEdge,
    ConditionGroupDefinition, ConditionKind, EntityCondition, TriggerDefinition,
    TriggeringEntities, TriggeringEntitiesRule,
};
pub use entity::{
    Dimensions, EntityDeclaration, EntityRef, EntitySource, ObjectCategory, ObjectDefinition,
    ScenarioObject,
};
pub use parameter::{ParameterDeclaration, ParameterType, ParameterValue, SyntaxError};
pub use position::{LanePosition, Position, RelativeWorldPosition, WorldPosition};
pub use rule::Rule;
pub use scenario::{CatalogDefinition, CatalogElement, CatalogEntry, CatalogLocation, ScenarioDefinition};
pub use storyboard::{
    ActDefinition, ActionBody, ActionElementDefinition, ActorsDefinition, Completion, ElementId,
    EventDefinition, InitActionDefinition, ManeuverDefinition, ManeuverGroupDefinition, Priority,
    StoryDefinition, StoryboardDefinition, StoryboardElementHandle, StoryboardElementState,
    StoryboardElementType,
};
pub use value::{Element, TypeMismatch, Value};

/// Sealed trait support.
/// **Note:** This is only for internal/testing use and may change.
#[doc(hidden)]
pub mod __private {
    pub use super::value::private::Sealed;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

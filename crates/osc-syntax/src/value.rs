//! Closed value union and capability query
//!
//! Every concrete scenario element is carried around as a [`Value`]. The
//! [`Element`] trait answers "is this a `T`?" and performs the checked
//! downcast. The trait is sealed: the set of element types is fixed by this
//! crate.

use crate::action::ActionDefinition;
use crate::condition::ConditionDefinition;
use crate::entity::{EntityRef, ScenarioObject};
use crate::parameter::ParameterValue;
use crate::position::Position;
use crate::storyboard::StoryboardElementHandle;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

/// Sealed trait - prevents external implementations
#[doc(hidden)]
pub mod private {
    /// Sealed trait marker
    pub trait Sealed {}
}

/// Handle to exactly one concrete scenario element
///
/// Cloning is an `Arc` bump; the element itself is immutable. Equality is
/// structural per concrete type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Typed parameter value
    Parameter(Arc<ParameterValue>),
    /// Declared scenario object (vehicle, pedestrian, ...)
    Entity(Arc<ScenarioObject>),
    /// Reference to an entity by name
    EntityRef(Arc<EntityRef>),
    /// Position in one of the supported coordinate systems
    Position(Arc<Position>),
    /// Action definition (inline or catalog entry)
    Action(Arc<ActionDefinition>),
    /// Condition definition (catalog entry)
    Condition(Arc<ConditionDefinition>),
    /// Runtime storyboard element bound by name
    StoryboardElement(Arc<StoryboardElementHandle>),
}

impl Value {
    /// Name of the concrete element type carried by this value
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Parameter(_) => ParameterValue::TYPE_NAME,
            Self::Entity(_) => ScenarioObject::TYPE_NAME,
            Self::EntityRef(_) => EntityRef::TYPE_NAME,
            Self::Position(_) => Position::TYPE_NAME,
            Self::Action(_) => ActionDefinition::TYPE_NAME,
            Self::Condition(_) => ConditionDefinition::TYPE_NAME,
            Self::StoryboardElement(_) => StoryboardElementHandle::TYPE_NAME,
        }
    }

    /// Capability query: does this value carry a `T`?
    ///
    /// Always true when `T` is [`Value`] itself.
    #[inline]
    #[must_use]
    pub fn is<T: Element>(&self) -> bool {
        T::is(self)
    }

    /// Checked downcast to `T`
    ///
    /// # Errors
    /// Returns [`TypeMismatch`] if `self.is::<T>()` is false.
    #[inline]
    pub fn downcast_ref<T: Element>(&self) -> Result<&T, TypeMismatch> {
        T::project(self).ok_or(TypeMismatch {
            expected: T::TYPE_NAME,
            actual: self.type_name(),
        })
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parameter(value) => write!(f, "{value}"),
            Self::EntityRef(entity_ref) => write!(f, "{entity_ref}"),
            Self::Entity(object) => write!(f, "{}", object.name),
            Self::StoryboardElement(handle) => write!(f, "{handle}"),
            other => write!(f, "<{}>", other.type_name()),
        }
    }
}

/// A concrete element type that can be viewed through a [`Value`]
pub trait Element: Debug + 'static + private::Sealed {
    /// Type name used in diagnostics
    const TYPE_NAME: &'static str;

    /// View `value` as `Self`, if it carries one
    fn project(value: &Value) -> Option<&Self>;

    /// Capability query
    #[inline]
    fn is(value: &Value) -> bool {
        Self::project(value).is_some()
    }
}

impl private::Sealed for Value {}

impl Element for Value {
    const TYPE_NAME: &'static str = "Object";

    #[inline]
    fn project(value: &Value) -> Option<&Self> {
        Some(value)
    }

    #[inline]
    fn is(_: &Value) -> bool {
        true
    }
}

macro_rules! element {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl private::Sealed for $ty {}

        impl Element for $ty {
            const TYPE_NAME: &'static str = $name;

            #[inline]
            fn project(value: &Value) -> Option<&Self> {
                match value {
                    Value::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Value {
            fn from(inner: $ty) -> Self {
                Value::$variant(Arc::new(inner))
            }
        }
    };
}

element!(ParameterValue, Parameter, "Parameter");
element!(ScenarioObject, Entity, "ScenarioObject");
element!(EntityRef, EntityRef, "EntityRef");
element!(Position, Position, "Position");
element!(ActionDefinition, Action, "Action");
element!(ConditionDefinition, Condition, "Condition");
element!(StoryboardElementHandle, StoryboardElement, "StoryboardElement");

/// A downcast targeted the wrong concrete type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("type mismatch: expected {expected}, got {actual}")]
pub struct TypeMismatch {
    /// Requested type
    pub expected: &'static str,
    /// Type actually carried by the value
    pub actual: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::WorldPosition;

    #[test]
    fn is_matches_exact_type_only() {
        let value = Value::from(ParameterValue::Double(1.5));

        assert!(value.is::<ParameterValue>());
        assert!(!value.is::<Position>());
        assert!(!value.is::<EntityRef>());
    }

    #[test]
    fn top_type_accepts_everything() {
        let values = [
            Value::from(ParameterValue::Boolean(true)),
            Value::from(EntityRef::new("ego")),
            Value::from(Position::World(WorldPosition::new(1.0, 2.0))),
        ];

        for value in &values {
            assert!(value.is::<Value>());
            assert_eq!(value.downcast_ref::<Value>().unwrap(), value);
        }
    }

    #[test]
    fn downcast_to_wrong_type_fails() {
        let value = Value::from(EntityRef::new("ego"));
        let err = value.downcast_ref::<ParameterValue>().unwrap_err();

        assert_eq!(err.expected, "Parameter");
        assert_eq!(err.actual, "EntityRef");
        assert!(err.to_string().contains("type mismatch"));
    }

    #[test]
    fn downcast_views_inner_element() {
        let value = Value::from(EntityRef::new("npc"));
        assert_eq!(value.downcast_ref::<EntityRef>().unwrap().name(), "npc");
    }

    #[test]
    fn clone_shares_element() {
        let value = Value::from(ParameterValue::String("x".into()));
        let copy = value.clone();

        match (&value, &copy) {
            (Value::Parameter(a), Value::Parameter(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => unreachable!(),
        }
    }
}

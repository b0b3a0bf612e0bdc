//! Scenario error taxonomy

use osc_symbol::{ResolutionError, ScopeError};
use osc_syntax::{StoryboardElementState, StoryboardElementType, SyntaxError, TypeMismatch};

/// Anything that can go wrong while building or ticking a scenario
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// Name or type error through a scope
    #[error(transparent)]
    Scope(#[from] ScopeError),

    /// Name resolution failed
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Downcast to the wrong element type
    #[error(transparent)]
    Type(#[from] TypeMismatch),

    /// Malformed literal
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// An action could not do its job
    #[error("action \"{element}\" failed: {message}")]
    Action {
        /// Failing action element
        element: String,
        /// What went wrong
        message: String,
    },

    /// An entity command could not be applied
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// Illegal life-cycle transition
    #[error(transparent)]
    StateMachine(#[from] StateMachineError),

    /// Element placed under a parent of the wrong kind
    #[error("{child} cannot be placed under {parent}")]
    InvalidHierarchy {
        /// Parent kind
        parent: StoryboardElementType,
        /// Child kind
        child: StoryboardElementType,
    },

    /// Catalog could not be loaded
    #[error("catalog error: {0}")]
    Catalog(String),
}

impl ScenarioError {
    /// Recoverable errors fail the scenario but let the storyboard keep ticking
    ///
    /// Resolution, type, syntax and structural errors abort evaluation.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Action { .. } | Self::Entity(_) => true,
            Self::Scope(_)
            | Self::Resolution(_)
            | Self::Type(_)
            | Self::Syntax(_)
            | Self::StateMachine(_)
            | Self::InvalidHierarchy { .. }
            | Self::Catalog(_) => false,
        }
    }

    /// Convenience constructor for action failures
    #[must_use]
    pub fn action(element: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Action {
            element: element.into(),
            message: message.into(),
        }
    }
}

/// Entity commands that cannot be carried out
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityError {
    /// Declared but not currently present
    #[error("entity \"{0}\" is not in the simulation")]
    NotInSimulation(String),

    /// The map cannot express the position
    #[error("position is not representable on this map: {0}")]
    NotRepresentable(String),

    /// No lane route between the entity and its goal
    #[error("no route for entity \"{0}\"")]
    NoRoute(String),
}

/// Life-cycle violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateMachineError {
    /// Transition not in the allowed table
    #[error("illegal transition {from} -> {to}")]
    IllegalTransition {
        /// Current state
        from: StoryboardElementState,
        /// Requested state
        to: StoryboardElementState,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_failures_are_recoverable() {
        assert!(ScenarioError::action("brake", "boom").is_recoverable());
        assert!(ScenarioError::from(EntityError::NotInSimulation("ego".into())).is_recoverable());
    }

    #[test]
    fn resolution_failures_are_fatal() {
        let err = ScenarioError::from(ResolutionError::NoSuchVariableNamed("x".into()));
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "no such variable named \"x\"");

        let err = ScenarioError::from(TypeMismatch {
            expected: "Position",
            actual: "Parameter",
        });
        assert!(!err.is_recoverable());
    }
}

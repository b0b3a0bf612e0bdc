//! Storyboard element definitions, states and handles

use crate::action::ActionDefinition;
use crate::condition::TriggerDefinition;
use crate::entity::EntityRef;
use crate::parameter::ParameterDeclaration;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Life-cycle state of a storyboard element
///
/// Transitions are one-directional; `StartTransition` and `StopTransition`
/// are instantaneous and never persist across a tick boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StoryboardElementState {
    /// Waiting for the parent to run and the start trigger to fire
    #[default]
    StandbyState,
    /// Starting
    StartTransition,
    /// Executing
    RunningState,
    /// Stopping (normally or by cancellation)
    StopTransition,
    /// Terminal
    CompleteState,
}

impl StoryboardElementState {
    /// True for `CompleteState`
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::CompleteState
    }

    /// True for the two instantaneous transition states
    #[inline]
    #[must_use]
    pub fn is_transition(self) -> bool {
        matches!(self, Self::StartTransition | Self::StopTransition)
    }
}

impl Display for StoryboardElementState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StandbyState => "standbyState",
            Self::StartTransition => "startTransition",
            Self::RunningState => "runningState",
            Self::StopTransition => "stopTransition",
            Self::CompleteState => "completeState",
        };
        f.write_str(name)
    }
}

/// Kind of storyboard element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StoryboardElementType {
    /// Root
    Storyboard,
    /// Story
    Story,
    /// Act
    Act,
    /// Maneuver group
    ManeuverGroup,
    /// Maneuver
    Maneuver,
    /// Event
    Event,
    /// Action (leaf)
    Action,
}

impl StoryboardElementType {
    /// Kinds allowed directly below this one
    #[must_use]
    pub fn child_kind(self) -> Option<Self> {
        match self {
            Self::Storyboard => Some(Self::Story),
            Self::Story => Some(Self::Act),
            Self::Act => Some(Self::ManeuverGroup),
            Self::ManeuverGroup => Some(Self::Maneuver),
            Self::Maneuver => Some(Self::Event),
            Self::Event => Some(Self::Action),
            Self::Action => None,
        }
    }
}

impl StoryboardElementType {
    /// Kind name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Storyboard => "Storyboard",
            Self::Story => "Story",
            Self::Act => "Act",
            Self::ManeuverGroup => "ManeuverGroup",
            Self::Maneuver => "Maneuver",
            Self::Event => "Event",
            Self::Action => "Action",
        }
    }
}

impl Display for StoryboardElementType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index of a storyboard element in its arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

impl Display for ElementId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Name binding for a runtime storyboard element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoryboardElementHandle {
    /// Arena index
    pub id: ElementId,
    /// Element kind
    pub kind: StoryboardElementType,
    /// Declared name
    pub name: String,
}

impl Display for StoryboardElementHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.kind, self.name)
    }
}

/// How a container decides it is accomplished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Completion {
    /// Every child reached `completeState`
    #[default]
    AllOf,
    /// At least one child reached `completeState`
    AnyOf,
}

/// Event start policy relative to sibling events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
    /// Stop running siblings, then start
    Overwrite,
    /// Do not start while a sibling runs
    Skip,
    /// Start regardless of siblings
    #[default]
    Parallel,
}

/// Storyboard root
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryboardDefinition {
    /// Actions applied on the first tick
    #[serde(default)]
    pub init: Vec<InitActionDefinition>,
    /// Stories
    #[serde(default)]
    pub stories: Vec<StoryDefinition>,
    /// Ends the whole scenario
    #[serde(default)]
    pub stop_trigger: Option<TriggerDefinition>,
}

/// Action run during initialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitActionDefinition {
    /// Actor the action applies to; absent for global actions
    #[serde(default)]
    pub entity_ref: Option<EntityRef>,
    /// Action
    pub action: ActionDefinition,
}

/// Story
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDefinition {
    /// Name
    pub name: String,
    /// Story-local parameters
    #[serde(default)]
    pub parameter_declarations: Vec<ParameterDeclaration>,
    /// Completion rule
    #[serde(default)]
    pub completion: Completion,
    /// Acts
    pub acts: Vec<ActDefinition>,
}

/// Act
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActDefinition {
    /// Name
    pub name: String,
    /// Completion rule
    #[serde(default)]
    pub completion: Completion,
    /// Maneuver groups
    pub maneuver_groups: Vec<ManeuverGroupDefinition>,
    /// Start gate; absent means start with the parent
    #[serde(default)]
    pub start_trigger: Option<TriggerDefinition>,
    /// Cancellation
    #[serde(default)]
    pub stop_trigger: Option<TriggerDefinition>,
}

/// Maneuver group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManeuverGroupDefinition {
    /// Name
    pub name: String,
    /// How many times the group may run
    #[serde(default = "one")]
    pub maximum_execution_count: u32,
    /// Actors
    #[serde(default)]
    pub actors: ActorsDefinition,
    /// Completion rule
    #[serde(default)]
    pub completion: Completion,
    /// Maneuvers
    pub maneuvers: Vec<ManeuverDefinition>,
}

/// Actors of a maneuver group
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorsDefinition {
    /// Add entities that satisfied the act's start trigger
    #[serde(default)]
    pub select_triggering_entities: bool,
    /// Explicit actors
    #[serde(default)]
    pub entity_refs: Vec<EntityRef>,
}

/// Maneuver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManeuverDefinition {
    /// Name
    pub name: String,
    /// Maneuver-local parameters
    #[serde(default)]
    pub parameter_declarations: Vec<ParameterDeclaration>,
    /// Completion rule
    #[serde(default)]
    pub completion: Completion,
    /// Events
    pub events: Vec<EventDefinition>,
}

/// Event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDefinition {
    /// Name
    pub name: String,
    /// Start policy
    #[serde(default)]
    pub priority: Priority,
    /// How many times the event may run
    #[serde(default = "one")]
    pub maximum_execution_count: u32,
    /// Start gate; absent means start with the parent
    #[serde(default)]
    pub start_trigger: Option<TriggerDefinition>,
    /// Completion rule
    #[serde(default)]
    pub completion: Completion,
    /// Actions
    pub actions: Vec<ActionElementDefinition>,
}

/// Action element of an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionElementDefinition {
    /// Name
    pub name: String,
    /// Inline action or catalog reference
    #[serde(flatten)]
    pub body: ActionBody,
}

/// Inline action or reference to a catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionBody {
    /// Inline
    Action(ActionDefinition),
    /// Catalog entry name, optionally `catalog::entry`
    CatalogReference(String),
}

fn one() -> u32 {
    1
}

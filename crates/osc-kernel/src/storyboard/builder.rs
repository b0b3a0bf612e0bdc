//! Storyboard construction
//!
//! Elements are added top-down. Each element binds its handle in the parent
//! element's frame and opens a frame of its own, so storyboard element
//! names resolve with the same lexical rules as parameters.

use super::{Body, ElementNode, InitAction, Storyboard};
use crate::action::Action;
use crate::error::ScenarioError;
use crate::state_machine::StateRecord;
use crate::trigger::Trigger;
use osc_symbol::Scope;
use osc_syntax::{
    Completion, ElementId, EntityRef, Priority, StoryboardElementHandle, StoryboardElementType,
};
use tracing::trace;

/// Everything needed to add one container element
#[derive(Debug, Clone)]
pub struct ElementSpec {
    /// Element kind
    pub kind: StoryboardElementType,
    /// Element name
    pub name: String,
    /// Completion rule over children
    pub completion: Completion,
    /// Start policy against sibling events
    pub priority: Priority,
    /// Times the element may run
    pub maximum_execution_count: u32,
    /// Start gate; `None` starts with the parent
    pub start_trigger: Option<Trigger>,
    /// Cancellation
    pub stop_trigger: Option<Trigger>,
    /// Explicit actors (maneuver groups)
    pub actors: Vec<EntityRef>,
    /// Add entities from the enclosing act's start trigger (maneuver groups)
    pub select_triggering_entities: bool,
}

impl ElementSpec {
    /// Spec with default completion, priority and a single execution
    #[must_use]
    pub fn new(kind: StoryboardElementType, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            completion: Completion::default(),
            priority: Priority::default(),
            maximum_execution_count: 1,
            start_trigger: None,
            stop_trigger: None,
            actors: Vec::new(),
            select_triggering_entities: false,
        }
    }

    /// Set the completion rule
    #[must_use]
    pub fn with_completion(mut self, completion: Completion) -> Self {
        self.completion = completion;
        self
    }

    /// Set the event priority
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the maximum execution count
    #[must_use]
    pub fn with_maximum_execution_count(mut self, count: u32) -> Self {
        self.maximum_execution_count = count;
        self
    }

    /// Set the start trigger
    #[must_use]
    pub fn with_start_trigger(mut self, trigger: Trigger) -> Self {
        self.start_trigger = Some(trigger);
        self
    }

    /// Set the stop trigger
    #[must_use]
    pub fn with_stop_trigger(mut self, trigger: Trigger) -> Self {
        self.stop_trigger = Some(trigger);
        self
    }

    /// Set the actors
    #[must_use]
    pub fn with_actors(mut self, actors: Vec<EntityRef>, select_triggering_entities: bool) -> Self {
        self.actors = actors;
        self.select_triggering_entities = select_triggering_entities;
        self
    }
}

/// Builds a [`Storyboard`] element by element
#[derive(Debug)]
pub struct StoryboardBuilder {
    nodes: Vec<ElementNode>,
    init: Vec<InitAction>,
}

impl StoryboardBuilder {
    /// Builder whose root element lives in `scope`
    #[must_use]
    pub fn new(scope: &Scope) -> Self {
        let root = ElementNode {
            handle: StoryboardElementHandle {
                id: ElementId(0),
                kind: StoryboardElementType::Storyboard,
                name: "storyboard".into(),
            },
            parent: None,
            children: Vec::new(),
            scope: scope.clone(),
            record: StateRecord::new(),
            start_trigger: None,
            stop_trigger: None,
            completion: Completion::AllOf,
            priority: Priority::Parallel,
            maximum_execution_count: 1,
            execution_count: 0,
            select_triggering_entities: false,
            selected: Vec::new(),
            body: Body::Container,
        };
        Self {
            nodes: vec![root],
            init: Vec::new(),
        }
    }

    /// Root element
    #[must_use]
    pub fn root(&self) -> ElementId {
        ElementId(0)
    }

    /// Scope of an element, for binding its local parameters
    ///
    /// # Panics
    /// If `id` was not returned by this builder.
    #[must_use]
    pub fn scope(&self, id: ElementId) -> &Scope {
        &self.nodes[id.0].scope
    }

    /// Set the storyboard's stop trigger
    pub fn set_stop_trigger(&mut self, trigger: Trigger) {
        self.nodes[0].stop_trigger = Some(trigger);
    }

    /// Add a container element under `parent`
    ///
    /// # Errors
    /// [`ScenarioError::InvalidHierarchy`] if `spec.kind` cannot appear under
    /// the parent's kind.
    pub fn add_element(
        &mut self,
        parent: ElementId,
        spec: ElementSpec,
    ) -> Result<ElementId, ScenarioError> {
        if spec.kind == StoryboardElementType::Action {
            return Err(self.hierarchy_error(parent, spec.kind));
        }
        let mut node = self.new_node(parent, spec.kind, &spec.name)?;
        node.completion = spec.completion;
        node.priority = spec.priority;
        node.maximum_execution_count = spec.maximum_execution_count.max(1);
        node.start_trigger = spec.start_trigger;
        node.stop_trigger = spec.stop_trigger;
        node.select_triggering_entities = spec.select_triggering_entities;
        if spec.kind == StoryboardElementType::ManeuverGroup {
            node.scope.set_actors(spec.actors);
        }
        Ok(self.push(node))
    }

    /// Add an action under the event `parent`
    ///
    /// # Errors
    /// [`ScenarioError::InvalidHierarchy`] unless `parent` is an event.
    pub fn add_action(
        &mut self,
        parent: ElementId,
        name: &str,
        action: Box<dyn Action>,
    ) -> Result<ElementId, ScenarioError> {
        let mut node = self.new_node(parent, StoryboardElementType::Action, name)?;
        node.body = Body::Action(action);
        Ok(self.push(node))
    }

    /// Add an initialization action applied to `actors`
    pub fn add_init_action(
        &mut self,
        name: impl Into<String>,
        actors: Vec<EntityRef>,
        action: Box<dyn Action>,
    ) {
        self.init.push(InitAction {
            name: name.into(),
            actors,
            action,
            started: false,
            done: false,
        });
    }

    /// Finish construction
    #[must_use]
    pub fn build(self) -> Storyboard {
        let scope = self.nodes[0].scope.clone();
        Storyboard {
            nodes: self.nodes,
            init: self.init,
            scope,
        }
    }

    fn new_node(
        &self,
        parent: ElementId,
        kind: StoryboardElementType,
        name: &str,
    ) -> Result<ElementNode, ScenarioError> {
        let parent_node = self
            .nodes
            .get(parent.0)
            .ok_or_else(|| ScenarioError::action(name, format!("no parent element {parent}")))?;
        if parent_node.handle.kind.child_kind() != Some(kind) {
            return Err(self.hierarchy_error(parent, kind));
        }

        let handle = StoryboardElementHandle {
            id: ElementId(self.nodes.len()),
            kind,
            name: name.to_owned(),
        };
        parent_node.scope.define(name, handle.clone());
        let scope = parent_node.scope.child(name);
        trace!(element = name, %kind, id = %handle.id, "element added");

        Ok(ElementNode {
            handle,
            parent: Some(parent),
            children: Vec::new(),
            scope,
            record: StateRecord::new(),
            start_trigger: None,
            stop_trigger: None,
            completion: Completion::AllOf,
            priority: Priority::Parallel,
            maximum_execution_count: 1,
            execution_count: 0,
            select_triggering_entities: false,
            selected: Vec::new(),
            body: Body::Container,
        })
    }

    fn push(&mut self, node: ElementNode) -> ElementId {
        let id = node.handle.id;
        if let Some(parent) = node.parent {
            self.nodes[parent.0].children.push(id);
        }
        self.nodes.push(node);
        id
    }

    fn hierarchy_error(&self, parent: ElementId, child: StoryboardElementType) -> ScenarioError {
        let parent = self
            .nodes
            .get(parent.0)
            .map_or(StoryboardElementType::Storyboard, |node| node.handle.kind);
        ScenarioError::InvalidHierarchy { parent, child }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osc_symbol::GlobalEnvironment;

    #[test]
    fn handles_are_bound_in_parent_frame() {
        let scope = Scope::new(GlobalEnvironment::default());
        let mut builder = StoryboardBuilder::new(&scope);
        let story = builder
            .add_element(builder.root(), ElementSpec::new(StoryboardElementType::Story, "main"))
            .unwrap();
        let act = builder
            .add_element(story, ElementSpec::new(StoryboardElementType::Act, "approach"))
            .unwrap();

        let handle = scope.resolve::<StoryboardElementHandle>("main::approach").unwrap();
        assert_eq!(handle.id, act);
        assert_eq!(handle.kind, StoryboardElementType::Act);

        let from_act = builder.scope(act);
        assert_eq!(from_act.resolve::<StoryboardElementHandle>("approach").unwrap().id, act);
    }

    #[test]
    fn rejects_wrong_nesting() {
        let scope = Scope::new(GlobalEnvironment::default());
        let mut builder = StoryboardBuilder::new(&scope);

        let err = builder
            .add_element(builder.root(), ElementSpec::new(StoryboardElementType::Act, "act"))
            .unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::InvalidHierarchy {
                parent: StoryboardElementType::Storyboard,
                child: StoryboardElementType::Act,
            }
        ));
    }

    #[test]
    fn group_scope_carries_actors() {
        let scope = Scope::new(GlobalEnvironment::default());
        let mut builder = StoryboardBuilder::new(&scope);
        let story = builder
            .add_element(builder.root(), ElementSpec::new(StoryboardElementType::Story, "s"))
            .unwrap();
        let act = builder
            .add_element(story, ElementSpec::new(StoryboardElementType::Act, "a"))
            .unwrap();
        let group = builder
            .add_element(
                act,
                ElementSpec::new(StoryboardElementType::ManeuverGroup, "g")
                    .with_actors(vec![EntityRef::new("ego")], false),
            )
            .unwrap();
        let maneuver = builder
            .add_element(group, ElementSpec::new(StoryboardElementType::Maneuver, "m"))
            .unwrap();

        assert_eq!(builder.scope(maneuver).actors(), &[EntityRef::new("ego")]);
    }
}

//! Scopes and the global environment
//!
//! A [`Scope`] is a cheap handle: a frame in the shared arena, the shared
//! [`GlobalEnvironment`], and the actors in effect at that nesting level.
//! Cloning a scope never creates a new lexical level; [`Scope::child`] does.

use crate::frame::{FrameArena, FrameId, ResolutionError};
use crate::name::{Name, NameError, PrefixedName};
use indexmap::{IndexMap, IndexSet};
use osc_syntax::{
    CatalogLocation, Element, EntityRef, ParameterValue, ScenarioObject, TypeMismatch, Value,
};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Placeholder expanded to the scenario file's directory
pub const DIRNAME: &str = "$(dirname)";

/// Per-run state shared by every scope
#[derive(Debug, Default)]
pub struct GlobalEnvironment {
    pathname: PathBuf,
    entities: IndexMap<EntityRef, Arc<ScenarioObject>>,
    added: IndexSet<EntityRef>,
    catalog_locations: Vec<CatalogLocation>,
}

impl GlobalEnvironment {
    /// Environment for the scenario at `pathname`
    #[must_use]
    pub fn new(pathname: impl Into<PathBuf>) -> Self {
        Self {
            pathname: pathname.into(),
            ..Self::default()
        }
    }

    /// Set catalog locations
    #[must_use]
    pub fn with_catalog_locations(mut self, locations: Vec<CatalogLocation>) -> Self {
        self.catalog_locations = locations;
        self
    }

    /// Scenario file path
    #[inline]
    #[must_use]
    pub fn pathname(&self) -> &Path {
        &self.pathname
    }

    /// Directory of the scenario file
    #[must_use]
    pub fn dirname(&self) -> &Path {
        self.pathname.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Expand `$(dirname)` in `text`
    #[must_use]
    pub fn substitute(&self, text: &str) -> String {
        text.replace(DIRNAME, &self.dirname().to_string_lossy())
    }

    /// Catalog directories
    #[inline]
    #[must_use]
    pub fn catalog_locations(&self) -> &[CatalogLocation] {
        &self.catalog_locations
    }

    /// Declare an entity
    ///
    /// # Errors
    /// Returns [`ScopeError::DuplicateEntity`] if the name is already declared.
    pub fn declare_entity(&mut self, object: ScenarioObject) -> Result<(), ScopeError> {
        let entity_ref = object.entity_ref();
        if self.entities.contains_key(&entity_ref) {
            return Err(ScopeError::DuplicateEntity(entity_ref.to_string()));
        }
        debug!(entity = %entity_ref, "declared entity");
        self.entities.insert(entity_ref, Arc::new(object));
        Ok(())
    }

    /// Declared entity by reference
    #[must_use]
    pub fn entity(&self, entity_ref: &EntityRef) -> Option<&Arc<ScenarioObject>> {
        self.entities.get(entity_ref)
    }

    /// Declared entities in declaration order
    pub fn entities(&self) -> impl Iterator<Item = &Arc<ScenarioObject>> {
        self.entities.values()
    }

    /// Mark a declared entity as present in the simulation
    ///
    /// Returns false if it was already added.
    ///
    /// # Errors
    /// Returns [`ResolutionError::NoSuchVariableNamed`] for undeclared entities.
    pub fn add_entity(&mut self, entity_ref: &EntityRef) -> Result<bool, ScopeError> {
        if !self.entities.contains_key(entity_ref) {
            return Err(ResolutionError::NoSuchVariableNamed(entity_ref.to_string()).into());
        }
        Ok(self.added.insert(entity_ref.clone()))
    }

    /// Remove an entity from the simulation; returns whether it was present
    pub fn remove_entity(&mut self, entity_ref: &EntityRef) -> bool {
        self.added.shift_remove(entity_ref)
    }

    /// True while the entity is present in the simulation
    #[must_use]
    pub fn is_added_entity(&self, entity_ref: &EntityRef) -> bool {
        self.added.contains(entity_ref)
    }

    /// Entities present in the simulation, in insertion order
    pub fn added_entities(&self) -> impl Iterator<Item = &EntityRef> {
        self.added.iter()
    }
}

/// Lexical scope handle
///
/// Clones share the frame, the arena and the global environment.
#[derive(Debug, Clone)]
pub struct Scope {
    frames: Arc<RwLock<FrameArena>>,
    frame: FrameId,
    global: Arc<RwLock<GlobalEnvironment>>,
    name: Name,
    actors: Vec<EntityRef>,
}

impl Scope {
    /// Outermost scope of a run
    #[must_use]
    pub fn new(global: GlobalEnvironment) -> Self {
        let arena = FrameArena::new();
        let frame = arena.root();
        Self {
            frames: Arc::new(RwLock::new(arena)),
            frame,
            global: Arc::new(RwLock::new(global)),
            name: Name::new(""),
            actors: Vec::new(),
        }
    }

    /// New lexical level below this one
    ///
    /// A non-empty name makes the child reachable as a prefix; an empty one
    /// makes its bindings visible without a prefix. Actors are inherited.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        let frame = self.frames.write().push_frame(self.frame, name);
        trace!(scope = name, %frame, "opened scope");
        Self {
            frames: Arc::clone(&self.frames),
            frame,
            global: Arc::clone(&self.global),
            name: Name::new(name),
            actors: self.actors.clone(),
        }
    }

    /// Scope name (empty for the outermost and unnamed scopes)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// This scope's frame
    #[inline]
    #[must_use]
    pub fn frame(&self) -> FrameId {
        self.frame
    }

    /// Actors at this nesting level
    #[inline]
    #[must_use]
    pub fn actors(&self) -> &[EntityRef] {
        &self.actors
    }

    /// Replace the actors
    pub fn set_actors(&mut self, actors: Vec<EntityRef>) {
        self.actors = actors;
    }

    /// True if both handles denote the same frame of the same run
    #[must_use]
    pub fn same_frame(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.frames, &other.frames) && self.frame == other.frame
    }

    /// Bind `value` in this scope's frame
    pub fn define(&self, name: impl Into<Name>, value: impl Into<Value>) {
        self.frames.write().define(self.frame, name, value.into());
    }

    /// Resolve a reference to a `T` binding
    ///
    /// # Errors
    /// Malformed names, resolution failures.
    pub fn resolve_value<T: Element>(&self, reference: &str) -> Result<Value, ScopeError> {
        let prefixed: PrefixedName = reference.parse()?;
        let value = self.frames.read().resolve::<T>(self.frame, &prefixed)?;
        trace!(reference, found = value.type_name(), "resolved");
        Ok(value)
    }

    /// Resolve and downcast
    ///
    /// # Errors
    /// Malformed names, resolution failures.
    pub fn resolve<T: Element + Clone>(&self, reference: &str) -> Result<T, ScopeError> {
        let value = self.resolve_value::<T>(reference)?;
        Ok(value.downcast_ref::<T>()?.clone())
    }

    /// Rebind the `T` visible under `reference`
    ///
    /// # Errors
    /// Malformed names, resolution failures.
    pub fn assign<T: Element>(&self, reference: &str, value: Value) -> Result<(), ScopeError> {
        let prefixed: PrefixedName = reference.parse()?;
        self.frames.write().assign::<T>(self.frame, &prefixed, value)?;
        Ok(())
    }

    /// Resolve a parameter; a leading `$` is accepted
    ///
    /// # Errors
    /// Malformed names, resolution failures.
    pub fn parameter(&self, reference: &str) -> Result<ParameterValue, ScopeError> {
        self.resolve::<ParameterValue>(strip_sigil(reference))
    }

    /// Parse `text` as the type of parameter `reference` and assign it
    ///
    /// # Errors
    /// Resolution failures, or [`ScopeError::Syntax`] if `text` does not parse.
    pub fn set_parameter(&self, reference: &str, text: &str) -> Result<ParameterValue, ScopeError> {
        let reference = strip_sigil(reference);
        let updated = self.parameter(reference)?.reparse(text)?;
        self.assign::<ParameterValue>(reference, Value::from(updated.clone()))?;
        debug!(parameter = reference, value = %updated, "parameter set");
        Ok(updated)
    }

    /// Declared entity by reference
    ///
    /// # Errors
    /// Returns [`ResolutionError::NoSuchVariableNamed`] for undeclared entities.
    pub fn entity(&self, entity_ref: &EntityRef) -> Result<Arc<ScenarioObject>, ScopeError> {
        self.global
            .read()
            .entity(entity_ref)
            .cloned()
            .ok_or_else(|| ResolutionError::NoSuchVariableNamed(entity_ref.to_string()).into())
    }

    /// Shared global environment
    #[must_use]
    pub fn global(&self) -> RwLockReadGuard<'_, GlobalEnvironment> {
        self.global.read()
    }

    /// Shared global environment, for entity add/remove
    #[must_use]
    pub fn global_mut(&self) -> RwLockWriteGuard<'_, GlobalEnvironment> {
        self.global.write()
    }
}

fn strip_sigil(reference: &str) -> &str {
    reference.strip_prefix('$').unwrap_or(reference)
}

/// Failures looking things up through a scope
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    /// Malformed reference
    #[error(transparent)]
    Name(#[from] NameError),

    /// Lookup failed
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Downcast failed
    #[error(transparent)]
    Type(#[from] TypeMismatch),

    /// Literal did not parse
    #[error(transparent)]
    Syntax(#[from] osc_syntax::SyntaxError),

    /// Entity declared twice
    #[error("entity \"{0}\" is already declared")]
    DuplicateEntity(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use osc_syntax::{ObjectDefinition, Position, WorldPosition};
    use pretty_assertions::assert_eq;

    fn scope() -> Scope {
        Scope::new(GlobalEnvironment::new("/scenarios/cut_in.yaml"))
    }

    #[test]
    fn clone_is_shallow() {
        let outer = scope();
        let copy = outer.clone();
        copy.define("x", ParameterValue::Integer(1));

        assert!(outer.same_frame(&copy));
        assert_eq!(outer.parameter("x").unwrap(), ParameterValue::Integer(1));
    }

    #[test]
    fn child_is_a_new_level() {
        let outer = scope();
        let inner = outer.child("story");
        inner.define("x", ParameterValue::Integer(2));

        assert!(!outer.same_frame(&inner));
        assert!(outer.parameter("x").is_err());
        assert_eq!(outer.parameter("story::x").unwrap(), ParameterValue::Integer(2));
    }

    #[test]
    fn parameter_accepts_sigil() {
        let scope = scope();
        scope.define("speed", ParameterValue::Double(3.0));

        assert_eq!(scope.parameter("$speed").unwrap(), ParameterValue::Double(3.0));
    }

    #[test]
    fn resolve_downcasts() {
        let scope = scope();
        let position = Position::World(WorldPosition::new(1.0, 1.0));
        scope.define("start", position.clone());

        assert_eq!(scope.resolve::<Position>("start").unwrap(), position);
        assert!(matches!(
            scope.resolve::<ParameterValue>("start"),
            Err(ScopeError::Resolution(ResolutionError::NoSuchVariableNamed(_)))
        ));
    }

    #[test]
    fn malformed_reference_is_reported() {
        assert!(matches!(scope().parameter("a::"), Err(ScopeError::Name(_))));
    }

    #[test]
    fn set_parameter_keeps_type() {
        let outer = scope();
        outer.define("count", ParameterValue::UnsignedInt(1));
        let inner = outer.child("act");

        let updated = inner.set_parameter("$count", "4").unwrap();

        assert_eq!(updated, ParameterValue::UnsignedInt(4));
        assert_eq!(outer.parameter("count").unwrap(), ParameterValue::UnsignedInt(4));
        assert!(matches!(
            inner.set_parameter("count", "four"),
            Err(ScopeError::Syntax(_))
        ));
    }

    #[test]
    fn actors_are_inherited() {
        let mut outer = scope();
        outer.set_actors(vec![EntityRef::new("ego")]);

        assert_eq!(outer.child("group").actors(), &[EntityRef::new("ego")]);
    }

    #[test]
    fn entity_table() {
        let scope = scope();
        let ego = EntityRef::new("ego");
        scope
            .global_mut()
            .declare_entity(ScenarioObject::new("ego", ObjectDefinition::default()))
            .unwrap();

        assert!(!scope.global().is_added_entity(&ego));
        assert!(scope.global_mut().add_entity(&ego).unwrap());
        assert!(!scope.global_mut().add_entity(&ego).unwrap());
        assert!(scope.global().is_added_entity(&ego));
        assert_eq!(scope.entity(&ego).unwrap().name, "ego");

        assert!(scope.global_mut().remove_entity(&ego));
        assert!(!scope.global().is_added_entity(&ego));
        assert!(scope.entity(&EntityRef::new("ghost")).is_err());
    }

    #[test]
    fn duplicate_entity_is_rejected() {
        let mut global = GlobalEnvironment::default();
        let object = ScenarioObject::new("ego", ObjectDefinition::default());
        global.declare_entity(object.clone()).unwrap();

        assert_eq!(
            global.declare_entity(object),
            Err(ScopeError::DuplicateEntity("ego".into()))
        );
    }

    #[test]
    fn substitutes_dirname() {
        let global = GlobalEnvironment::new("/scenarios/cut_in.yaml");
        assert_eq!(global.substitute("$(dirname)/catalogs"), "/scenarios/catalogs");
    }
}

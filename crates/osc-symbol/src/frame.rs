//! Environment frames
//!
//! Frames live in a [`FrameArena`] and refer to each other by [`FrameId`].
//! The outer link is the only upward edge; child links are recorded only in
//! the frame that created the child, so the structure is always a tree.
//!
//! # Resolution
//!
//! [`FrameArena::find`] searches breadth-first: the frame itself, then its
//! unnamed child frames, then theirs, and so on. The first level holding any
//! binding of the requested type decides: one binding wins, several are
//! ambiguous. If no level matches, the search restarts at the outer frame.

use crate::name::{Name, PrefixedName};
use osc_syntax::{Element, Value};
use smallvec::{smallvec, SmallVec};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// Index of a frame in its arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(usize);

impl FrameId {
    /// Position in the arena
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for FrameId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

#[derive(Debug, Default)]
struct FrameData {
    name: Option<Name>,
    variables: BTreeMap<Name, Vec<Value>>,
    outer: Option<FrameId>,
    inner_frames: BTreeMap<Name, Vec<FrameId>>,
    unnamed_inner_frames: Vec<FrameId>,
}

/// Location of a single binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Binding {
    frame: FrameId,
    index: usize,
}

type Frontier = SmallVec<[FrameId; 4]>;

/// Tree of environment frames
#[derive(Debug)]
pub struct FrameArena {
    frames: Vec<FrameData>,
}

impl Default for FrameArena {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameArena {
    /// Arena holding only the root frame
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: vec![FrameData::default()],
        }
    }

    /// The root frame
    #[inline]
    #[must_use]
    pub fn root(&self) -> FrameId {
        FrameId(0)
    }

    /// Create a child of `outer`
    ///
    /// An empty name creates an unnamed child, searched without a prefix.
    pub fn push_frame(&mut self, outer: FrameId, name: &str) -> FrameId {
        let id = FrameId(self.frames.len());
        let name = (!name.is_empty()).then(|| Name::new(name));

        match &name {
            Some(name) => self.frames[outer.0]
                .inner_frames
                .entry(name.clone())
                .or_default()
                .push(id),
            None => self.frames[outer.0].unnamed_inner_frames.push(id),
        }
        self.frames.push(FrameData {
            name,
            outer: Some(outer),
            ..FrameData::default()
        });
        id
    }

    /// Frame name, `None` for the root and unnamed frames
    #[must_use]
    pub fn name_of(&self, frame: FrameId) -> Option<&Name> {
        self.frames[frame.0].name.as_ref()
    }

    /// Enclosing frame, `None` for the root
    #[must_use]
    pub fn outer(&self, frame: FrameId) -> Option<FrameId> {
        self.frames[frame.0].outer
    }

    /// True for the root
    #[must_use]
    pub fn is_outermost(&self, frame: FrameId) -> bool {
        self.frames[frame.0].outer.is_none()
    }

    /// Root of the tree containing `frame`
    #[must_use]
    pub fn outermost(&self, frame: FrameId) -> FrameId {
        let mut current = frame;
        while let Some(outer) = self.frames[current.0].outer {
            current = outer;
        }
        current
    }

    /// Bind `value` under `name`; same-name bindings are kept side by side
    pub fn define(&mut self, frame: FrameId, name: impl Into<Name>, value: Value) {
        self.frames[frame.0]
            .variables
            .entry(name.into())
            .or_default()
            .push(value);
    }

    /// Unqualified lexical lookup of a `T`
    ///
    /// # Errors
    /// - [`ResolutionError::AmbiguousReferenceTo`] if the nearest matching level holds several
    /// - [`ResolutionError::NoSuchVariableNamed`] if nothing matches up to the root
    pub fn find<T: Element>(&self, frame: FrameId, name: &Name) -> Result<Value, ResolutionError> {
        let binding = self.locate::<T>(frame, name)?;
        Ok(self.value_at(binding, name).clone())
    }

    /// Lookup with qualifier segments resolved against named children of `frame`
    ///
    /// # Errors
    /// See [`FrameArena::find`]; qualifier segments fail the same way.
    pub fn find_prefixed<T: Element>(
        &self,
        frame: FrameId,
        prefixed: &PrefixedName,
    ) -> Result<Value, ResolutionError> {
        let binding = self.locate_prefixed::<T>(frame, prefixed)?;
        Ok(self.value_at(binding, prefixed.name()).clone())
    }

    /// Top-level lookup from `frame`
    ///
    /// Absolute names restart at the outermost frame. Qualified relative names
    /// find the frame named by the first segment lexically, then continue
    /// inside it.
    ///
    /// # Errors
    /// See [`FrameArena::find`].
    pub fn resolve<T: Element>(
        &self,
        frame: FrameId,
        prefixed: &PrefixedName,
    ) -> Result<Value, ResolutionError> {
        let binding = self.locate_reference::<T>(frame, prefixed)?;
        Ok(self.value_at(binding, prefixed.name()).clone())
    }

    /// Replace the `T` binding that [`FrameArena::resolve`] would return
    ///
    /// # Errors
    /// See [`FrameArena::find`].
    pub fn assign<T: Element>(
        &mut self,
        frame: FrameId,
        prefixed: &PrefixedName,
        value: Value,
    ) -> Result<(), ResolutionError> {
        let binding = self.locate_reference::<T>(frame, prefixed)?;
        let slot = self.frames[binding.frame.0]
            .variables
            .get_mut(prefixed.name())
            .and_then(|values| values.get_mut(binding.index))
            .ok_or_else(|| ResolutionError::NoSuchVariableNamed(prefixed.to_string()))?;
        *slot = value;
        Ok(())
    }

    /// Child frame of `frame` named by the first qualifier of `prefixed`
    ///
    /// # Errors
    /// Fails like [`FrameArena::find`] when zero or several named children match.
    pub fn resolve_front_prefix(
        &self,
        frame: FrameId,
        prefixed: &PrefixedName,
    ) -> Result<FrameId, ResolutionError> {
        let Some(front) = prefixed.front() else {
            return Ok(frame);
        };
        match self.frames[frame.0].inner_frames.get(front).map(Vec::as_slice) {
            None | Some([]) => Err(ResolutionError::NoSuchVariableNamed(prefixed.to_string())),
            Some([only]) => Ok(*only),
            Some(_) => Err(ResolutionError::AmbiguousReferenceTo(prefixed.to_string())),
        }
    }

    /// Lexical lookup of the frame named by the first qualifier of `prefixed`
    ///
    /// # Errors
    /// Fails like [`FrameArena::find`], searching named child frames instead of bindings.
    pub fn lookup_frame(
        &self,
        frame: FrameId,
        prefixed: &PrefixedName,
    ) -> Result<FrameId, ResolutionError> {
        let Some(front) = prefixed.front() else {
            return Ok(frame);
        };
        self.search(frame, &prefixed.to_string(), |data, _, found: &mut SmallVec<[FrameId; 2]>| {
            if let Some(children) = data.inner_frames.get(front) {
                found.extend(children.iter().copied());
            }
        })
    }

    fn locate_reference<T: Element>(
        &self,
        frame: FrameId,
        prefixed: &PrefixedName,
    ) -> Result<Binding, ResolutionError> {
        if prefixed.is_absolute() {
            self.locate_prefixed::<T>(self.outermost(frame), prefixed)
        } else if !prefixed.is_prefixed() {
            self.locate::<T>(frame, prefixed.name())
        } else {
            let scope = self.lookup_frame(frame, prefixed)?;
            self.locate_prefixed::<T>(scope, &prefixed.strip(1))
        }
    }

    fn locate_prefixed<T: Element>(
        &self,
        frame: FrameId,
        prefixed: &PrefixedName,
    ) -> Result<Binding, ResolutionError> {
        if prefixed.is_prefixed() {
            let child = self.resolve_front_prefix(frame, prefixed)?;
            self.locate_prefixed::<T>(child, &prefixed.strip(1))
        } else {
            self.locate::<T>(frame, prefixed.name())
        }
    }

    fn locate<T: Element>(&self, frame: FrameId, name: &Name) -> Result<Binding, ResolutionError> {
        self.search(frame, name.as_str(), |data, id, found: &mut SmallVec<[Binding; 2]>| {
            if let Some(values) = data.variables.get(name) {
                found.extend(
                    values
                        .iter()
                        .enumerate()
                        .filter(|(_, value)| value.is::<T>())
                        .map(|(index, _)| Binding { frame: id, index }),
                );
            }
        })
    }

    /// Breadth-first search through unnamed children, then outward
    fn search<R, F>(&self, start: FrameId, label: &str, mut collect: F) -> Result<R, ResolutionError>
    where
        R: Copy,
        F: FnMut(&FrameData, FrameId, &mut SmallVec<[R; 2]>),
    {
        let mut origin = Some(start);

        while let Some(frame) = origin {
            let mut frontier: Frontier = smallvec![frame];

            while !frontier.is_empty() {
                let mut found = SmallVec::new();
                for &id in &frontier {
                    collect(&self.frames[id.0], id, &mut found);
                }

                match found.as_slice() {
                    [] => {
                        frontier = frontier
                            .iter()
                            .flat_map(|id| self.frames[id.0].unnamed_inner_frames.iter().copied())
                            .collect();
                    }
                    [only] => return Ok(*only),
                    _ => return Err(ResolutionError::AmbiguousReferenceTo(label.to_string())),
                }
            }

            origin = self.frames[frame.0].outer;
        }

        Err(ResolutionError::NoSuchVariableNamed(label.to_string()))
    }

    fn value_at(&self, binding: Binding, name: &Name) -> &Value {
        // bindings are only produced by `locate`, which saw this slot
        &self.frames[binding.frame.0].variables[name][binding.index]
    }
}

/// Name resolution failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// Nothing bound under the name anywhere in the lexical chain
    #[error("no such variable named \"{0}\"")]
    NoSuchVariableNamed(String),

    /// Several equally near candidates
    #[error("ambiguous reference to \"{0}\"")]
    AmbiguousReferenceTo(String),
}

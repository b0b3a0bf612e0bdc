//! Names and prefixed names
//!
//! A [`PrefixedName`] is written as `::`-separated segments. The last segment
//! is the bound name; the others select named child frames. A leading `::`
//! makes the name absolute, i.e. rooted at the outermost frame.

use smallvec::SmallVec;
use std::borrow::Borrow;
use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

/// Segment separator
pub const SEPARATOR: &str = "::";

/// Shared, cheaply clonable binding name
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(Arc<str>);

impl Name {
    /// Create a name
    #[inline]
    #[must_use]
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(Arc::from(text.as_ref()))
    }

    /// Name text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty name
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Debug for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Name {
    fn from(text: String) -> Self {
        Self(Arc::from(text))
    }
}

/// Possibly qualified, possibly absolute name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrefixedName {
    absolute: bool,
    prefixes: SmallVec<[Name; 2]>,
    name: Name,
}

impl PrefixedName {
    /// Unqualified, relative name
    #[inline]
    #[must_use]
    pub fn simple(name: impl Into<Name>) -> Self {
        Self {
            absolute: false,
            prefixes: SmallVec::new(),
            name: name.into(),
        }
    }

    /// Build from parts
    #[must_use]
    pub fn new(absolute: bool, prefixes: impl IntoIterator<Item = Name>, name: Name) -> Self {
        Self {
            absolute,
            prefixes: prefixes.into_iter().collect(),
            name,
        }
    }

    /// Rooted at the outermost frame
    #[inline]
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Has at least one qualifier segment
    #[inline]
    #[must_use]
    pub fn is_prefixed(&self) -> bool {
        !self.prefixes.is_empty()
    }

    /// Qualifier segments, outermost first
    #[inline]
    #[must_use]
    pub fn prefixes(&self) -> &[Name] {
        &self.prefixes
    }

    /// First qualifier segment
    #[inline]
    #[must_use]
    pub fn front(&self) -> Option<&Name> {
        self.prefixes.first()
    }

    /// Bound name (last segment)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Drop the first `n` qualifier segments; the result is relative
    #[must_use]
    pub fn strip(&self, n: usize) -> Self {
        Self {
            absolute: false,
            prefixes: self.prefixes.iter().skip(n).cloned().collect(),
            name: self.name.clone(),
        }
    }

    /// Same segments, relative
    #[must_use]
    pub fn relative(&self) -> Self {
        self.strip(0)
    }
}

impl Display for PrefixedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str(SEPARATOR)?;
        }
        for prefix in &self.prefixes {
            write!(f, "{prefix}{SEPARATOR}")?;
        }
        write!(f, "{}", self.name)
    }
}

impl FromStr for PrefixedName {
    type Err = NameError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (absolute, body) = match text.strip_prefix(SEPARATOR) {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        if body.is_empty() {
            return Err(NameError::Empty);
        }

        let mut segments: SmallVec<[Name; 3]> = SmallVec::new();
        for segment in body.split(SEPARATOR) {
            if segment.is_empty() {
                return Err(NameError::InvalidFormat(text.to_string()));
            }
            segments.push(Name::new(segment));
        }

        // non-empty body yields at least one segment
        let name = segments.pop().ok_or(NameError::Empty)?;
        Ok(Self {
            absolute,
            prefixes: segments.into_iter().collect(),
            name,
        })
    }
}

impl From<Name> for PrefixedName {
    fn from(name: Name) -> Self {
        Self::simple(name)
    }
}

/// Errors parsing prefixed names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    /// No segments at all
    #[error("name cannot be empty")]
    Empty,

    /// Empty segment between separators
    #[error("invalid name format: \"{0}\"")]
    InvalidFormat(String),
}

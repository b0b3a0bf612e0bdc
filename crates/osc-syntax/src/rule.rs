//! Comparison rules shared by value and entity conditions

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Relational operator applied by conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rule {
    /// `lhs == rhs`
    EqualTo,
    /// `lhs != rhs`
    NotEqualTo,
    /// `lhs > rhs`
    GreaterThan,
    /// `lhs >= rhs`
    GreaterOrEqual,
    /// `lhs < rhs`
    LessThan,
    /// `lhs <= rhs`
    LessOrEqual,
}

impl Rule {
    /// Apply the rule to two ordered operands
    ///
    /// Incomparable operands (NaN) satisfy only [`Rule::NotEqualTo`].
    #[must_use]
    pub fn apply<T: PartialOrd + ?Sized>(self, lhs: &T, rhs: &T) -> bool {
        match self {
            Self::EqualTo => lhs == rhs,
            Self::NotEqualTo => lhs != rhs,
            Self::GreaterThan => lhs > rhs,
            Self::GreaterOrEqual => lhs >= rhs,
            Self::LessThan => lhs < rhs,
            Self::LessOrEqual => lhs <= rhs,
        }
    }

    /// True for the two rules that only need equality
    #[inline]
    #[must_use]
    pub fn is_equality(self) -> bool {
        matches!(self, Self::EqualTo | Self::NotEqualTo)
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EqualTo => "equalTo",
            Self::NotEqualTo => "notEqualTo",
            Self::GreaterThan => "greaterThan",
            Self::GreaterOrEqual => "greaterOrEqual",
            Self::LessThan => "lessThan",
            Self::LessOrEqual => "lessOrEqual",
        };
        f.write_str(name)
    }
}

//! Typed parameters
//!
//! A [`ParameterDeclaration`] carries its value as text; evaluating it parses
//! the text according to the declared [`ParameterType`].

use crate::rule::Rule;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Declared type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterType {
    /// Signed integer
    Integer,
    /// Floating point
    Double,
    /// Free text
    String,
    /// 32-bit unsigned integer
    UnsignedInt,
    /// 16-bit unsigned integer
    UnsignedShort,
    /// `true` / `false`
    Boolean,
    /// ISO 8601 timestamp, kept verbatim
    DateTime,
}

impl ParameterType {
    /// Name used in diagnostics
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Integer => "Integer",
            Self::Double => "Double",
            Self::String => "String",
            Self::UnsignedInt => "UnsignedInt",
            Self::UnsignedShort => "UnsignedShort",
            Self::Boolean => "Boolean",
            Self::DateTime => "DateTime",
        }
    }
}

/// Parameter declaration as it appears in a scenario or catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDeclaration {
    /// Parameter name (without the `$` sigil)
    pub name: String,
    /// Declared type
    pub parameter_type: ParameterType,
    /// Initial value as text
    pub value: String,
}

impl ParameterDeclaration {
    /// Create a declaration
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        parameter_type: ParameterType,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            parameter_type,
            value: value.into(),
        }
    }

    /// Parse the declared value
    ///
    /// # Errors
    /// Returns [`SyntaxError::InvalidLiteral`] if the text does not parse as the declared type.
    pub fn evaluate(&self) -> Result<ParameterValue, SyntaxError> {
        ParameterValue::parse(self.parameter_type, &self.value)
    }
}

/// Typed parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    /// Signed integer
    Integer(i64),
    /// Floating point
    Double(f64),
    /// Free text
    String(String),
    /// 32-bit unsigned integer
    UnsignedInt(u32),
    /// 16-bit unsigned integer
    UnsignedShort(u16),
    /// Boolean
    Boolean(bool),
    /// Timestamp text
    DateTime(String),
}

impl ParameterValue {
    /// Parse `text` as a value of type `ty`
    ///
    /// # Errors
    /// Returns [`SyntaxError::InvalidLiteral`] on malformed input.
    pub fn parse(ty: ParameterType, text: &str) -> Result<Self, SyntaxError> {
        let invalid = || SyntaxError::InvalidLiteral {
            value: text.to_string(),
            type_name: ty.name(),
        };
        let trimmed = text.trim();

        Ok(match ty {
            ParameterType::Integer => Self::Integer(trimmed.parse().map_err(|_| invalid())?),
            ParameterType::Double => Self::Double(trimmed.parse().map_err(|_| invalid())?),
            ParameterType::UnsignedInt => {
                Self::UnsignedInt(trimmed.parse().map_err(|_| invalid())?)
            }
            ParameterType::UnsignedShort => {
                Self::UnsignedShort(trimmed.parse().map_err(|_| invalid())?)
            }
            ParameterType::Boolean => match trimmed {
                "true" => Self::Boolean(true),
                "false" => Self::Boolean(false),
                _ => return Err(invalid()),
            },
            ParameterType::String => Self::String(text.to_string()),
            ParameterType::DateTime => Self::DateTime(text.to_string()),
        })
    }

    /// Declared type of this value
    #[must_use]
    pub fn parameter_type(&self) -> ParameterType {
        match self {
            Self::Integer(_) => ParameterType::Integer,
            Self::Double(_) => ParameterType::Double,
            Self::String(_) => ParameterType::String,
            Self::UnsignedInt(_) => ParameterType::UnsignedInt,
            Self::UnsignedShort(_) => ParameterType::UnsignedShort,
            Self::Boolean(_) => ParameterType::Boolean,
            Self::DateTime(_) => ParameterType::DateTime,
        }
    }

    /// Numeric view, for the numeric types only
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Integer(v) => Some(v as f64),
            Self::Double(v) => Some(v),
            Self::UnsignedInt(v) => Some(f64::from(v)),
            Self::UnsignedShort(v) => Some(f64::from(v)),
            _ => None,
        }
    }

    /// Parse `text` as a new value of the same type
    ///
    /// # Errors
    /// Returns [`SyntaxError::InvalidLiteral`] on malformed input.
    pub fn reparse(&self, text: &str) -> Result<Self, SyntaxError> {
        Self::parse(self.parameter_type(), text)
    }

    /// Compare this value against a literal under `rule`
    ///
    /// The literal is parsed as this value's type. Ordering rules are only
    /// defined for numeric types.
    ///
    /// # Errors
    /// - [`SyntaxError::InvalidLiteral`] if `literal` does not parse
    /// - [`SyntaxError::InapplicableRule`] for ordering rules on non-numeric values
    pub fn compare(&self, rule: Rule, literal: &str) -> Result<bool, SyntaxError> {
        let other = self.reparse(literal)?;

        if let (Some(lhs), Some(rhs)) = (self.as_f64(), other.as_f64()) {
            return Ok(rule.apply(&lhs, &rhs));
        }
        if !rule.is_equality() {
            return Err(SyntaxError::InapplicableRule {
                rule,
                type_name: self.parameter_type().name(),
            });
        }
        Ok(rule.apply(&Equatable(self), &Equatable(&other)))
    }
}

/// Equality-only wrapper so non-numeric values can go through [`Rule::apply`]
#[derive(PartialEq)]
struct Equatable<'a>(&'a ParameterValue);

impl PartialOrd for Equatable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        (self == other).then_some(std::cmp::Ordering::Equal)
    }
}

impl Display for ParameterValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::UnsignedInt(v) => write!(f, "{v}"),
            Self::UnsignedShort(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::String(v) | Self::DateTime(v) => f.write_str(v),
        }
    }
}

/// Errors interpreting scenario text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    /// Text does not parse as the requested type
    #[error("can't treat value \"{value}\" as type {type_name}")]
    InvalidLiteral {
        /// Offending text
        value: String,
        /// Requested type
        type_name: &'static str,
    },

    /// Ordering rule applied to a non-numeric value
    #[error("rule {rule} is not applicable to values of type {type_name}")]
    InapplicableRule {
        /// Rule used
        rule: Rule,
        /// Type of the compared value
        type_name: &'static str,
    },

    /// Element declared in a way that cannot be interpreted
    #[error("invalid {element} \"{name}\": {reason}")]
    InvalidElement {
        /// Kind of element
        element: &'static str,
        /// Element name
        name: String,
        /// Explanation
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_each_type() {
        let cases = [
            (ParameterType::Integer, "-3", ParameterValue::Integer(-3)),
            (ParameterType::Double, "2.5", ParameterValue::Double(2.5)),
            (ParameterType::UnsignedInt, "7", ParameterValue::UnsignedInt(7)),
            (ParameterType::UnsignedShort, "65535", ParameterValue::UnsignedShort(65535)),
            (ParameterType::Boolean, "true", ParameterValue::Boolean(true)),
            (ParameterType::String, "hello", ParameterValue::String("hello".into())),
            (
                ParameterType::DateTime,
                "2020-01-01T00:00:00",
                ParameterValue::DateTime("2020-01-01T00:00:00".into()),
            ),
        ];

        for (ty, text, expected) in cases {
            let declaration = ParameterDeclaration::new("p", ty, text);
            assert_eq!(declaration.evaluate().unwrap(), expected);
        }
    }

    #[test]
    fn boolean_rejects_other_text() {
        let err = ParameterValue::parse(ParameterType::Boolean, "yes").unwrap_err();
        assert_eq!(err.to_string(), "can't treat value \"yes\" as type Boolean");
    }

    #[test]
    fn unsigned_short_overflow_is_rejected() {
        assert!(ParameterValue::parse(ParameterType::UnsignedShort, "70000").is_err());
        assert!(ParameterValue::parse(ParameterType::UnsignedInt, "-1").is_err());
    }

    #[test]
    fn numeric_compare() {
        let speed = ParameterValue::Double(10.0);
        assert!(speed.compare(Rule::GreaterThan, "5").unwrap());
        assert!(!speed.compare(Rule::LessThan, "5").unwrap());
        assert!(speed.compare(Rule::EqualTo, "10.0").unwrap());
    }

    #[test]
    fn string_compare_supports_equality_only() {
        let mode = ParameterValue::String("follow".into());
        assert!(mode.compare(Rule::EqualTo, "follow").unwrap());
        assert!(mode.compare(Rule::NotEqualTo, "lead").unwrap());
        assert!(matches!(
            mode.compare(Rule::GreaterThan, "a"),
            Err(SyntaxError::InapplicableRule { .. })
        ));
    }

    #[test]
    fn declaration_from_yaml() {
        let yaml = "name: speed\nparameterType: double\nvalue: \"12.5\"\n";
        let declaration: ParameterDeclaration = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(declaration.parameter_type, ParameterType::Double);
        assert_eq!(declaration.evaluate().unwrap(), ParameterValue::Double(12.5));
    }

    proptest::proptest! {
        /// Tenet: integer comparisons agree with native ordering
        #[test]
        fn integer_rules_match_ordering(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
            let value = ParameterValue::Integer(a);
            let literal = b.to_string();
            proptest::prop_assert_eq!(value.compare(Rule::LessThan, &literal).unwrap(), a < b);
            proptest::prop_assert_eq!(value.compare(Rule::EqualTo, &literal).unwrap(), a == b);
            proptest::prop_assert_eq!(value.compare(Rule::GreaterOrEqual, &literal).unwrap(), a >= b);
        }
    }
}

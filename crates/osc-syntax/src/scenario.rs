//! Scenario documents and catalogs

use crate::action::ActionDefinition;
use crate::condition::ConditionDefinition;
use crate::entity::{EntityDeclaration, ObjectDefinition, ScenarioObject};
use crate::parameter::{ParameterDeclaration, ParameterType, ParameterValue, SyntaxError};
use crate::position::Position;
use crate::storyboard::StoryboardDefinition;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete scenario document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDefinition {
    /// Global parameters
    #[serde(default)]
    pub parameter_declarations: Vec<ParameterDeclaration>,
    /// Directories holding catalog files
    #[serde(default)]
    pub catalog_locations: Vec<CatalogLocation>,
    /// Inline catalogs
    #[serde(default)]
    pub catalogs: Vec<CatalogDefinition>,
    /// Entities
    #[serde(default)]
    pub entities: Vec<EntityDeclaration>,
    /// Behaviour
    #[serde(default)]
    pub storyboard: StoryboardDefinition,
}

/// Directory holding catalog files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogLocation {
    /// Catalog name the files are expected to declare
    pub name: String,
    /// Directory, may contain `$(dirname)`
    pub directory: PathBuf,
}

/// Named collection of reusable definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDefinition {
    /// Catalog name
    pub name: String,
    /// Entries are visible without the catalog prefix
    #[serde(default)]
    pub transparent: bool,
    /// Entries
    #[serde(default)]
    pub entries: Vec<CatalogEntry>,
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Entry name
    pub name: String,
    /// Definition
    #[serde(flatten)]
    pub element: CatalogElement,
}

/// Definition held by a catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CatalogElement {
    /// Scenario object
    Object(ObjectDefinition),
    /// Position
    Position(Position),
    /// Action
    Action(ActionDefinition),
    /// Condition
    Condition(ConditionDefinition),
    /// Parameter
    Parameter {
        /// Type
        parameter_type: ParameterType,
        /// Value as text
        value: String,
    },
}

impl CatalogEntry {
    /// Convert the entry into the value bound under its name
    ///
    /// # Errors
    /// Returns [`SyntaxError`] if a parameter literal does not parse.
    pub fn to_value(&self) -> Result<Value, SyntaxError> {
        Ok(match &self.element {
            CatalogElement::Object(definition) => {
                Value::from(ScenarioObject::new(self.name.clone(), definition.clone()))
            }
            CatalogElement::Position(position) => Value::from(position.clone()),
            CatalogElement::Action(action) => Value::from(action.clone()),
            CatalogElement::Condition(condition) => Value::from(condition.clone()),
            CatalogElement::Parameter {
                parameter_type,
                value,
            } => Value::from(ParameterValue::parse(*parameter_type, value)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntitySource;
    use pretty_assertions::assert_eq;

    const SCENARIO: &str = r"
parameterDeclarations:
  - { name: initial_speed, parameterType: double, value: '10' }
catalogs:
  - name: vehicles
    entries:
      - name: sedan
        object: { category: vehicle }
entities:
  - name: ego
    catalogReference: vehicles::sedan
storyboard:
  init:
    - entityRef: ego
      action:
        teleport:
          position: { world: { x: 0, y: 0 } }
  stories: []
";

    #[test]
    fn parses_minimal_scenario() {
        let scenario: ScenarioDefinition = serde_yaml::from_str(SCENARIO).unwrap();

        assert_eq!(scenario.parameter_declarations.len(), 1);
        assert_eq!(scenario.catalogs[0].name, "vehicles");
        assert!(!scenario.catalogs[0].transparent);
        assert_eq!(
            scenario.entities[0].source,
            EntitySource::CatalogReference("vehicles::sedan".into())
        );
        assert_eq!(scenario.storyboard.init.len(), 1);
    }

    #[test]
    fn catalog_entry_values() {
        let entry = CatalogEntry {
            name: "limit".into(),
            element: CatalogElement::Parameter {
                parameter_type: ParameterType::Integer,
                value: "50".into(),
            },
        };
        let value = entry.to_value().unwrap();
        assert_eq!(
            value.downcast_ref::<ParameterValue>().unwrap(),
            &ParameterValue::Integer(50)
        );

        let entry = CatalogEntry {
            name: "sedan".into(),
            element: CatalogElement::Object(ObjectDefinition::default()),
        };
        let value = entry.to_value().unwrap();
        assert_eq!(value.downcast_ref::<ScenarioObject>().unwrap().name, "sedan");
    }

    #[test]
    fn bad_parameter_entry_is_a_syntax_error() {
        let entry = CatalogEntry {
            name: "flag".into(),
            element: CatalogElement::Parameter {
                parameter_type: ParameterType::Boolean,
                value: "maybe".into(),
            },
        };
        assert!(matches!(
            entry.to_value(),
            Err(SyntaxError::InvalidLiteral { .. })
        ));
    }
}

//! Scenario objects and entity references

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Reference to an entity by its declared name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityRef(String);

impl EntityRef {
    /// Create a reference
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Referenced entity name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Broad category of a scenario object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectCategory {
    /// Car, truck, bus, ...
    #[default]
    Vehicle,
    /// Person on foot
    Pedestrian,
    /// Static or passive object
    MiscObject,
}

/// Bounding box extents in metres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Extent across the heading
    pub width: f64,
    /// Extent along the heading
    pub length: f64,
    /// Vertical extent
    pub height: f64,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            width: 1.8,
            length: 4.5,
            height: 1.5,
        }
    }
}

/// Object definition without a name, as written inline or in a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDefinition {
    /// Category
    #[serde(default)]
    pub category: ObjectCategory,
    /// Bounding box
    #[serde(default)]
    pub dimensions: Dimensions,
    /// Speed limit in m/s
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
}

impl Default for ObjectDefinition {
    fn default() -> Self {
        Self {
            category: ObjectCategory::default(),
            dimensions: Dimensions::default(),
            max_speed: default_max_speed(),
        }
    }
}

fn default_max_speed() -> f64 {
    70.0
}

/// A named scenario object
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioObject {
    /// Entity name
    pub name: String,
    /// Definition
    pub definition: ObjectDefinition,
}

impl ScenarioObject {
    /// Name a definition
    #[must_use]
    pub fn new(name: impl Into<String>, definition: ObjectDefinition) -> Self {
        Self {
            name: name.into(),
            definition,
        }
    }

    /// Reference to this object
    #[must_use]
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.name.clone())
    }
}

/// Entity declaration in a scenario file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDeclaration {
    /// Entity name
    pub name: String,
    /// Where the definition comes from
    #[serde(flatten)]
    pub source: EntitySource,
}

/// Inline definition or reference to a catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntitySource {
    /// Inline definition
    Object(ObjectDefinition),
    /// Name of a catalog entry, optionally qualified as `catalog::entry`
    CatalogReference(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_declaration_from_yaml() {
        let yaml = "name: ego\nobject:\n  category: vehicle\n  maxSpeed: 30\n";
        let declaration: EntityDeclaration = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(declaration.name, "ego");
        match declaration.source {
            EntitySource::Object(definition) => {
                assert_eq!(definition.category, ObjectCategory::Vehicle);
                assert!((definition.max_speed - 30.0).abs() < f64::EPSILON);
                assert_eq!(definition.dimensions, Dimensions::default());
            }
            EntitySource::CatalogReference(_) => panic!("expected inline object"),
        }
    }

    #[test]
    fn catalog_declaration_from_yaml() {
        let yaml = "name: npc\ncatalogReference: vehicles::sedan\n";
        let declaration: EntityDeclaration = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(
            declaration.source,
            EntitySource::CatalogReference("vehicles::sedan".into())
        );
    }

    #[test]
    fn entity_ref_is_a_plain_string() {
        let entity_ref: EntityRef = serde_yaml::from_str("ego").unwrap();
        assert_eq!(entity_ref, EntityRef::from("ego"));
        assert_eq!(entity_ref.to_string(), "ego");
    }
}

//! Scenario loading
//!
//! Turns a [`ScenarioDefinition`] into a populated [`Scope`] and a runtime
//! [`Storyboard`]. Every name a scenario references is resolved here,
//! including those inside triggers; nothing is defaulted.

use crate::action::instantiate;
use crate::error::ScenarioError;
use crate::storyboard::{ElementSpec, Storyboard, StoryboardBuilder};
use crate::trigger::Trigger;
use osc_symbol::{GlobalEnvironment, Scope};
use osc_syntax::{
    ActDefinition, ActionBody, ActionDefinition, CatalogDefinition, CatalogLocation, ElementId,
    EntitySource, EventDefinition, ManeuverGroupDefinition, ParameterDeclaration,
    ScenarioDefinition, ScenarioObject, StoryboardElementType,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// Supplies catalogs found in a catalog location
pub trait CatalogSource {
    /// Catalogs stored in `directory` for `location`
    ///
    /// # Errors
    /// [`ScenarioError::Catalog`] if the directory or a file cannot be read.
    fn load(
        &self,
        location: &CatalogLocation,
        directory: &Path,
    ) -> Result<Vec<CatalogDefinition>, ScenarioError>;
}

/// Reads every `.yaml`/`.yml` file in a directory as one catalog
///
/// Files declaring a catalog other than the location's name are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCatalogSource;

impl CatalogSource for YamlCatalogSource {
    fn load(
        &self,
        location: &CatalogLocation,
        directory: &Path,
    ) -> Result<Vec<CatalogDefinition>, ScenarioError> {
        let catalog_error =
            |path: &Path, error: &dyn std::fmt::Display| ScenarioError::Catalog(format!("{}: {error}", path.display()));

        let mut paths = fs::read_dir(directory)
            .map_err(|e| catalog_error(directory, &e))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext == "yaml" || ext == "yml")
            })
            .collect::<Vec<_>>();
        paths.sort();

        let mut catalogs = Vec::new();
        for path in paths {
            let text = fs::read_to_string(&path).map_err(|e| catalog_error(&path, &e))?;
            let catalog: CatalogDefinition =
                serde_yaml::from_str(&text).map_err(|e| catalog_error(&path, &e))?;
            if catalog.name == location.name {
                trace!(catalog = %catalog.name, path = %path.display(), "catalog file read");
                catalogs.push(catalog);
            } else {
                debug!(
                    expected = %location.name,
                    found = %catalog.name,
                    path = %path.display(),
                    "ignoring catalog file"
                );
            }
        }
        Ok(catalogs)
    }
}

/// Scope and storyboard of a loaded scenario
#[derive(Debug)]
pub struct LoadedScenario {
    /// Outermost scope
    pub scope: Scope,
    /// Runtime storyboard
    pub storyboard: Storyboard,
}

/// Builds runtime scenarios from definitions
pub struct ScenarioLoader {
    pathname: PathBuf,
    catalogs: Box<dyn CatalogSource>,
}

impl Default for ScenarioLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScenarioLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioLoader")
            .field("pathname", &self.pathname)
            .finish_non_exhaustive()
    }
}

impl ScenarioLoader {
    /// Loader reading catalog locations as YAML directories
    #[must_use]
    pub fn new() -> Self {
        Self {
            pathname: PathBuf::new(),
            catalogs: Box::new(YamlCatalogSource),
        }
    }

    /// Path of the scenario file; `$(dirname)` expands relative to it
    #[must_use]
    pub fn with_pathname(mut self, pathname: impl Into<PathBuf>) -> Self {
        self.pathname = pathname.into();
        self
    }

    /// Replace the catalog source
    #[must_use]
    pub fn with_catalog_source(mut self, source: impl CatalogSource + 'static) -> Self {
        self.catalogs = Box::new(source);
        self
    }

    /// Build the frame tree, declare entities and construct the storyboard
    ///
    /// # Errors
    /// Resolution, type, syntax, hierarchy and catalog errors.
    pub fn load(&self, definition: &ScenarioDefinition) -> Result<LoadedScenario, ScenarioError> {
        let global = GlobalEnvironment::new(&self.pathname)
            .with_catalog_locations(definition.catalog_locations.clone());
        let scope = Scope::new(global);

        declare_parameters(&scope, &definition.parameter_declarations)?;
        self.load_catalogs(&scope, definition)?;
        declare_entities(&scope, definition)?;
        let storyboard = build_storyboard(&scope, definition)?;

        info!(
            path = %self.pathname.display(),
            entities = definition.entities.len(),
            stories = definition.storyboard.stories.len(),
            "scenario loaded"
        );
        Ok(LoadedScenario { scope, storyboard })
    }

    fn load_catalogs(
        &self,
        scope: &Scope,
        definition: &ScenarioDefinition,
    ) -> Result<(), ScenarioError> {
        let mut frames = HashMap::new();
        for catalog in &definition.catalogs {
            bind_catalog(scope, &mut frames, catalog)?;
        }
        for location in &definition.catalog_locations {
            let directory = PathBuf::from(
                scope
                    .global()
                    .substitute(&location.directory.to_string_lossy()),
            );
            for catalog in self.catalogs.load(location, &directory)? {
                bind_catalog(scope, &mut frames, &catalog)?;
            }
        }
        Ok(())
    }
}

fn declare_parameters(
    scope: &Scope,
    declarations: &[ParameterDeclaration],
) -> Result<(), ScenarioError> {
    for declaration in declarations {
        let value = declaration.evaluate()?;
        trace!(parameter = %declaration.name, %value, "parameter declared");
        scope.define(declaration.name.as_str(), value);
    }
    Ok(())
}

/// Catalogs sharing a name share one frame; transparent catalogs each open an unnamed one
fn bind_catalog(
    scope: &Scope,
    frames: &mut HashMap<String, Scope>,
    catalog: &CatalogDefinition,
) -> Result<(), ScenarioError> {
    let catalog_scope = if catalog.transparent {
        scope.child("")
    } else {
        frames
            .entry(catalog.name.clone())
            .or_insert_with(|| scope.child(&catalog.name))
            .clone()
    };
    for entry in &catalog.entries {
        catalog_scope.define(entry.name.as_str(), entry.to_value()?);
    }
    debug!(
        catalog = %catalog.name,
        transparent = catalog.transparent,
        entries = catalog.entries.len(),
        "catalog bound"
    );
    Ok(())
}

fn declare_entities(scope: &Scope, definition: &ScenarioDefinition) -> Result<(), ScenarioError> {
    for declaration in &definition.entities {
        let object = match &declaration.source {
            EntitySource::Object(object) => {
                ScenarioObject::new(declaration.name.clone(), object.clone())
            }
            EntitySource::CatalogReference(reference) => {
                let entry = scope.resolve::<ScenarioObject>(reference)?;
                ScenarioObject::new(declaration.name.clone(), entry.definition)
            }
        };
        scope.global_mut().declare_entity(object)?;
    }
    Ok(())
}

fn build_storyboard(
    scope: &Scope,
    definition: &ScenarioDefinition,
) -> Result<Storyboard, ScenarioError> {
    let storyboard = &definition.storyboard;
    let mut builder = StoryboardBuilder::new(scope);

    for (index, init) in storyboard.init.iter().enumerate() {
        let actors = match &init.entity_ref {
            Some(entity) => {
                scope.entity(entity)?;
                vec![entity.clone()]
            }
            None => Vec::new(),
        };
        let name = format!("init[{index}].{}", init.action.kind());
        builder.add_init_action(name, actors, instantiate(&init.action));
    }
    if let Some(stop) = &storyboard.stop_trigger {
        builder.set_stop_trigger(Trigger::from_definition(stop));
    }

    for story in &storyboard.stories {
        let id = builder.add_element(
            builder.root(),
            ElementSpec::new(StoryboardElementType::Story, &story.name)
                .with_completion(story.completion),
        )?;
        declare_parameters(builder.scope(id), &story.parameter_declarations)?;
        for act in &story.acts {
            add_act(&mut builder, id, act)?;
        }
    }
    let storyboard = builder.build();
    storyboard.check_references()?;
    Ok(storyboard)
}

fn add_act(
    builder: &mut StoryboardBuilder,
    story: ElementId,
    act: &ActDefinition,
) -> Result<(), ScenarioError> {
    let mut spec =
        ElementSpec::new(StoryboardElementType::Act, &act.name).with_completion(act.completion);
    if let Some(start) = &act.start_trigger {
        spec = spec.with_start_trigger(Trigger::from_definition(start));
    }
    if let Some(stop) = &act.stop_trigger {
        spec = spec.with_stop_trigger(Trigger::from_definition(stop));
    }
    let id = builder.add_element(story, spec)?;
    for group in &act.maneuver_groups {
        add_group(builder, id, group)?;
    }
    Ok(())
}

fn add_group(
    builder: &mut StoryboardBuilder,
    act: ElementId,
    group: &ManeuverGroupDefinition,
) -> Result<(), ScenarioError> {
    for entity in &group.actors.entity_refs {
        builder.scope(act).entity(entity)?;
    }
    let id = builder.add_element(
        act,
        ElementSpec::new(StoryboardElementType::ManeuverGroup, &group.name)
            .with_completion(group.completion)
            .with_maximum_execution_count(group.maximum_execution_count)
            .with_actors(
                group.actors.entity_refs.clone(),
                group.actors.select_triggering_entities,
            ),
    )?;

    for maneuver in &group.maneuvers {
        let maneuver_id = builder.add_element(
            id,
            ElementSpec::new(StoryboardElementType::Maneuver, &maneuver.name)
                .with_completion(maneuver.completion),
        )?;
        declare_parameters(builder.scope(maneuver_id), &maneuver.parameter_declarations)?;
        for event in &maneuver.events {
            add_event(builder, maneuver_id, event)?;
        }
    }
    Ok(())
}

fn add_event(
    builder: &mut StoryboardBuilder,
    maneuver: ElementId,
    event: &EventDefinition,
) -> Result<(), ScenarioError> {
    let mut spec = ElementSpec::new(StoryboardElementType::Event, &event.name)
        .with_completion(event.completion)
        .with_priority(event.priority)
        .with_maximum_execution_count(event.maximum_execution_count);
    if let Some(start) = &event.start_trigger {
        spec = spec.with_start_trigger(Trigger::from_definition(start));
    }
    let id = builder.add_element(maneuver, spec)?;

    for element in &event.actions {
        let definition = match &element.body {
            ActionBody::Action(definition) => definition.clone(),
            ActionBody::CatalogReference(reference) => {
                builder.scope(id).resolve::<ActionDefinition>(reference)?
            }
        };
        builder.add_action(id, &element.name, instantiate(&definition))?;
    }
    Ok(())
}

//! Search settings loaded from files and environment.
//!
//! Settings declare, per resource, the model it lists, its own search
//! columns and its relation maps. Every relation entry names exactly one
//! shape:
//!
//! ```toml
//! [resources.posts]
//! model = "Post"
//! search = ["title", "body"]
//! term_delimiter = ","
//!
//! [[resources.posts.relations]]
//! relation = "author"
//! columns = ["name", "email"]
//!
//! [[resources.posts.relations]]
//! relation = "comments"
//! relations = [{ relation = "commentable", morph = { columns = ["title"] } }]
//! ```
//!
//! Values can be overridden with `RELATION_SEARCH__*` environment variables,
//! e.g. `RELATION_SEARCH__RESOURCES__POSTS__SEARCH_RELATIONS_GLOBALLY=false`.

use crate::descriptor::{relation_path, CustomSearches, SearchConfig, SearchDescriptor};
use crate::resource::{ResourceRegistry, ResourceSearch};
use crate::schema::Schema;
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

const ENV_PREFIX: &str = "RELATION_SEARCH";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchSettings {
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceSettings {
    pub model: String,
    #[serde(default)]
    pub search: Vec<String>,
    #[serde(default)]
    pub relations: Option<Vec<RelationSettings>>,
    /// `None` when not configured; an empty list opts out of relation search
    /// in global mode.
    #[serde(default)]
    pub global_relations: Option<Vec<RelationSettings>>,
    #[serde(default = "default_true")]
    pub search_relations_globally: bool,
    #[serde(default)]
    pub term_delimiter: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelationSettings {
    pub relation: String,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub relations: Option<Vec<RelationSettings>>,
    #[serde(default)]
    pub morph: Option<MorphSettings>,
    #[serde(default)]
    pub custom: Option<String>,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MorphSettings {
    pub columns: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl SearchSettings {
    /// Load settings from `path` (format from the extension) with
    /// environment overrides applied on top.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading search settings");
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build and validate every declared resource.
    pub fn compile(&self, schema: &Schema, customs: &CustomSearches) -> Result<ResourceRegistry> {
        let mut registry = ResourceRegistry::new();
        for (name, settings) in &self.resources {
            registry.insert(settings.compile(name, schema, customs)?);
        }
        tracing::info!(resources = registry.len(), "compiled search settings");
        Ok(registry)
    }
}

impl ResourceSettings {
    pub fn compile(
        &self,
        name: &str,
        schema: &Schema,
        customs: &CustomSearches,
    ) -> Result<ResourceSearch> {
        let mut resource = ResourceSearch::new(name, self.model.clone())
            .with_search_columns(self.search.iter().cloned())
            .with_search_relations_globally(self.search_relations_globally);
        if let Some(relations) = &self.relations {
            resource = resource.with_relations(compile_relations(relations, name, "", customs)?);
        }
        if let Some(global) = &self.global_relations {
            resource =
                resource.with_global_relations(compile_relations(global, name, "", customs)?);
        }
        if let Some(delimiter) = &self.term_delimiter {
            resource = resource.with_term_delimiter(delimiter.clone());
        }
        resource.validate(schema)?;
        Ok(resource)
    }
}

fn compile_relations(
    entries: &[RelationSettings],
    resource: &str,
    prefix: &str,
    customs: &CustomSearches,
) -> Result<SearchConfig> {
    let mut config = SearchConfig::new();
    for entry in entries {
        let path = relation_path(prefix, &entry.relation);
        if config.get(&entry.relation).is_some() {
            return Err(Error::invalid_descriptor(
                resource,
                &path,
                "relation declared more than once",
            ));
        }
        let descriptor = entry.descriptor(resource, &path, customs)?;
        config.insert(entry.relation.clone(), descriptor);
    }
    Ok(config)
}

impl RelationSettings {
    fn descriptor(
        &self,
        resource: &str,
        path: &str,
        customs: &CustomSearches,
    ) -> Result<SearchDescriptor> {
        if let Some(key) = self.unknown.keys().next() {
            return Err(Error::invalid_descriptor(
                resource,
                path,
                format!("unknown key '{}'", key),
            ));
        }

        match (&self.columns, &self.relations, &self.morph, &self.custom) {
            (Some(columns), None, None, None) => Ok(SearchDescriptor::columns(columns.clone())),
            (columns, Some(nested), None, None) => Ok(SearchDescriptor::Nested {
                columns: columns.clone().unwrap_or_default(),
                relations: compile_relations(nested, resource, path, customs)?,
            }),
            (None, None, Some(morph), None) => {
                Ok(SearchDescriptor::polymorphic(morph.columns.clone()))
            }
            (None, None, None, Some(name)) => customs
                .get(name)
                .map(SearchDescriptor::Custom)
                .ok_or_else(|| Error::UnknownCustomSearch {
                    resource: resource.to_string(),
                    relation: path.to_string(),
                    name: name.clone(),
                }),
            (None, None, None, None) => Err(Error::invalid_descriptor(
                resource,
                path,
                "entry declares no columns, relations, morph or custom search",
            )),
            _ => Err(Error::invalid_descriptor(
                resource,
                path,
                "entry declares more than one search shape",
            )),
        }
    }
}

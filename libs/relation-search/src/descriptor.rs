//! Relation search descriptors.
//!
//! A [`SearchConfig`] maps relation names to a [`SearchDescriptor`] that says
//! how the related records are searched. Descriptors are explicitly tagged;
//! nothing is inferred from the shape of the configured values.

use crate::query_builder::clauses::SearchScope;
use crate::query_builder::Predicate;
use crate::schema::{ModelDef, RelationDef, Schema};
use crate::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Custom per-relation search.
///
/// The implementation receives the scope of the owning model, the relation
/// name and the search term, and returns the predicate to OR into the search
/// group. Its result is used as-is.
pub trait RelationSearch: Send + Sync {
    fn apply(&self, scope: &SearchScope<'_>, relation: &str, term: &str) -> Result<Predicate>;
}

impl<F> RelationSearch for F
where
    F: Fn(&SearchScope<'_>, &str, &str) -> Result<Predicate> + Send + Sync,
{
    fn apply(&self, scope: &SearchScope<'_>, relation: &str, term: &str) -> Result<Predicate> {
        self(scope, relation, term)
    }
}

/// Pin a closure to the [`RelationSearch`] signature so its argument
/// lifetimes are inferred correctly.
pub fn search_fn<F>(f: F) -> F
where
    F: Fn(&SearchScope<'_>, &str, &str) -> Result<Predicate> + Send + Sync,
{
    f
}

#[derive(Clone)]
pub enum SearchDescriptor {
    /// Match the term against these columns of the related records.
    Columns(Vec<String>),
    /// Search relations of the related records, optionally together with
    /// their own columns.
    Nested {
        columns: Vec<String>,
        relations: SearchConfig,
    },
    /// Polymorphic relation: target types are discovered from the data and
    /// `columns` are searched on each of them.
    Polymorphic { columns: Vec<String> },
    Custom(Arc<dyn RelationSearch>),
}

impl fmt::Debug for SearchDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Columns(columns) => f.debug_tuple("Columns").field(columns).finish(),
            Self::Nested { columns, relations } => f
                .debug_struct("Nested")
                .field("columns", columns)
                .field("relations", relations)
                .finish(),
            Self::Polymorphic { columns } => f
                .debug_struct("Polymorphic")
                .field("columns", columns)
                .finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl SearchDescriptor {
    pub fn columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Columns(columns.into_iter().map(Into::into).collect())
    }

    pub fn nested(relations: SearchConfig) -> Self {
        Self::Nested {
            columns: Vec::new(),
            relations,
        }
    }

    pub fn polymorphic<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Polymorphic {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn custom(search: impl RelationSearch + 'static) -> Self {
        Self::Custom(Arc::new(search))
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Self::Columns(_) => "column list",
            Self::Nested { .. } => "nested relations",
            Self::Polymorphic { .. } => "polymorphic",
            Self::Custom(_) => "custom search",
        }
    }
}

/// Ordered relation name -> descriptor mapping.
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    entries: Vec<(String, SearchDescriptor)>,
}

static EMPTY_CONFIG: SearchConfig = SearchConfig {
    entries: Vec::new(),
};

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared empty map.
    pub fn empty() -> &'static SearchConfig {
        &EMPTY_CONFIG
    }

    /// Add (or replace) the descriptor for `relation`, keeping its position.
    pub fn with(mut self, relation: impl Into<String>, descriptor: SearchDescriptor) -> Self {
        self.insert(relation, descriptor);
        self
    }

    pub fn insert(&mut self, relation: impl Into<String>, descriptor: SearchDescriptor) {
        let relation = relation.into();
        match self.entries.iter_mut().find(|(name, _)| *name == relation) {
            Some(entry) => entry.1 = descriptor,
            None => self.entries.push((relation, descriptor)),
        }
    }

    pub fn get(&self, relation: &str) -> Option<&SearchDescriptor> {
        self.entries
            .iter()
            .find(|(name, _)| name == relation)
            .map(|(_, descriptor)| descriptor)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SearchDescriptor)> {
        self.entries.iter().map(|(name, d)| (name.as_str(), d))
    }

    pub fn relation_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check every entry against the schema, recursing into nested configs.
    ///
    /// Self-referential nesting is not detected here; it is bounded only by
    /// what was declared.
    pub fn validate(&self, schema: &Schema, owner: &ModelDef, resource: &str) -> Result<()> {
        validate_config(schema, owner, self, resource, "")
    }
}

fn validate_config(
    schema: &Schema,
    owner: &ModelDef,
    config: &SearchConfig,
    resource: &str,
    prefix: &str,
) -> Result<()> {
    for (relation, descriptor) in config.iter() {
        let path = relation_path(prefix, relation);
        let def = check_relation(owner, relation, descriptor, resource, &path)?;
        if let SearchDescriptor::Nested { relations, .. } = descriptor {
            let related = schema.related_model(def)?;
            validate_config(schema, related, relations, resource, &path)?;
        }
    }
    Ok(())
}

pub(crate) fn relation_path(prefix: &str, relation: &str) -> String {
    if prefix.is_empty() {
        relation.to_string()
    } else {
        format!("{}.{}", prefix, relation)
    }
}

/// Resolve `relation` on `owner` and check that `descriptor` fits it.
pub(crate) fn check_relation<'a>(
    owner: &'a ModelDef,
    relation: &str,
    descriptor: &SearchDescriptor,
    resource: &str,
    path: &str,
) -> Result<&'a RelationDef> {
    if relation.trim().is_empty() {
        return Err(Error::invalid_descriptor(
            resource,
            path,
            "relation name must not be empty",
        ));
    }

    let def = owner
        .relation(relation)
        .ok_or_else(|| Error::UnknownRelation {
            resource: resource.to_string(),
            relation: path.to_string(),
        })?;

    match descriptor {
        SearchDescriptor::Columns(columns) => {
            if columns.is_empty() {
                return Err(Error::invalid_descriptor(
                    resource,
                    path,
                    "column list must not be empty",
                ));
            }
            check_columns(columns, resource, path)?;
        }
        SearchDescriptor::Nested { columns, relations } => {
            if columns.is_empty() && relations.is_empty() {
                return Err(Error::invalid_descriptor(
                    resource,
                    path,
                    "nested search declares neither columns nor relations",
                ));
            }
            check_columns(columns, resource, path)?;
        }
        SearchDescriptor::Polymorphic { columns } => {
            if columns.is_empty() {
                return Err(Error::invalid_descriptor(
                    resource,
                    path,
                    "polymorphic search needs at least one column",
                ));
            }
            check_columns(columns, resource, path)?;
        }
        SearchDescriptor::Custom(_) => {}
    }

    let polymorphic_descriptor = matches!(descriptor, SearchDescriptor::Polymorphic { .. });
    let custom = matches!(descriptor, SearchDescriptor::Custom(_));
    if !custom && def.is_polymorphic() != polymorphic_descriptor {
        let reason = if def.is_polymorphic() {
            format!(
                "relation is polymorphic, a {} descriptor cannot be used",
                descriptor.kind_name()
            )
        } else {
            "polymorphic descriptor used on a relation with a fixed related model".to_string()
        };
        return Err(Error::invalid_descriptor(resource, path, reason));
    }

    Ok(def)
}

fn check_columns(columns: &[String], resource: &str, path: &str) -> Result<()> {
    for column in columns {
        if column.trim().is_empty() {
            return Err(Error::invalid_descriptor(
                resource,
                path,
                "column names must not be empty",
            ));
        }
        if column.contains('.') {
            return Err(Error::invalid_descriptor(
                resource,
                path,
                format!("column '{}' must not be table-qualified", column),
            ));
        }
    }
    Ok(())
}

/// Named custom searches, referenced from settings files by name.
#[derive(Clone, Default)]
pub struct CustomSearches {
    searches: HashMap<String, Arc<dyn RelationSearch>>,
}

impl CustomSearches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, name: impl Into<String>, search: impl RelationSearch + 'static) -> Self {
        self.searches.insert(name.into(), Arc::new(search));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn RelationSearch>> {
        self.searches.get(name).cloned()
    }
}

impl fmt::Debug for CustomSearches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.searches.keys().collect();
        names.sort();
        f.debug_struct("CustomSearches").field("names", &names).finish()
    }
}

//! Per-resource search declarations.

use crate::context::SearchContext;
use crate::descriptor::SearchConfig;
use crate::escape::split_unescaped;
use crate::resolver::SearchConfigResolver;
use crate::schema::Schema;
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Search declaration of one admin resource: its own searchable columns,
/// the relation maps and term splitting.
#[derive(Debug, Clone)]
pub struct ResourceSearch {
    name: String,
    model: String,
    search_columns: Vec<String>,
    resolver: SearchConfigResolver,
    term_delimiter: Option<String>,
}

impl ResourceSearch {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            search_columns: Vec::new(),
            resolver: SearchConfigResolver::default(),
            term_delimiter: None,
        }
    }

    pub fn with_search_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_relations(mut self, relations: SearchConfig) -> Self {
        self.resolver.set_relations(relations);
        self
    }

    /// Relation map used instead of the primary one in global search.
    pub fn with_global_relations(mut self, relations: SearchConfig) -> Self {
        self.resolver.set_global_relations(Some(relations));
        self
    }

    pub fn with_search_relations_globally(mut self, enabled: bool) -> Self {
        self.resolver.set_search_relations_globally(enabled);
        self
    }

    /// Split terms on `delimiter`; each piece is searched independently and
    /// the results OR-ed. An empty delimiter disables splitting.
    pub fn with_term_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        let delimiter = delimiter.into();
        self.term_delimiter = (!delimiter.is_empty()).then_some(delimiter);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn search_columns(&self) -> &[String] {
        &self.search_columns
    }

    pub fn term_delimiter(&self) -> Option<&str> {
        self.term_delimiter.as_deref()
    }

    pub fn resolver(&self) -> &SearchConfigResolver {
        &self.resolver
    }

    /// The primary relation map.
    pub fn searchable_relations(&self) -> &SearchConfig {
        self.resolver.relations()
    }

    /// A resource is searchable when it has own search columns or relations
    /// to search.
    pub fn is_searchable(&self) -> bool {
        !self.search_columns.is_empty() || !self.searchable_relations().is_empty()
    }

    pub fn relations_for(&self, context: SearchContext) -> &SearchConfig {
        self.resolver.resolve(context)
    }

    /// Sub-terms to search for. Empty when the term is blank.
    pub fn split_term(&self, term: &str) -> Vec<String> {
        if term.trim().is_empty() {
            return Vec::new();
        }
        match self.term_delimiter.as_deref() {
            Some(delimiter) if term.contains(delimiter) => split_unescaped(term, delimiter),
            _ => vec![term.trim().to_string()],
        }
    }

    /// Check the declaration against the schema: the model exists, own
    /// columns are bare column names, and every relation map is valid.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        let model = schema.model(&self.model)?;
        for column in &self.search_columns {
            let reason = if column.trim().is_empty() {
                "column names must not be empty"
            } else if column.contains('.') {
                "column must not be table-qualified"
            } else {
                continue;
            };
            return Err(Error::InvalidSearchColumn {
                resource: self.name.clone(),
                column: column.clone(),
                reason: reason.to_string(),
            });
        }
        self.resolver.relations().validate(schema, model, &self.name)?;
        if let Some(global) = self.resolver.global_relations() {
            global.validate(schema, model, &self.name)?;
        }
        Ok(())
    }
}

/// Resources by name.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    resources: BTreeMap<String, ResourceSearch>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource: ResourceSearch) {
        self.resources.insert(resource.name.clone(), resource);
    }

    pub fn get(&self, name: &str) -> Option<&ResourceSearch> {
        self.resources.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceSearch> {
        self.resources.values()
    }

    /// Resources that take part in global search.
    pub fn globally_searchable(&self) -> impl Iterator<Item = &ResourceSearch> {
        self.resources.values().filter(|r| {
            !r.search_columns.is_empty() || !r.relations_for(SearchContext::Global).is_empty()
        })
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

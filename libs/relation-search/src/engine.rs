//! Relation search engine - resolution, discovery and predicate building
//!
//! The RelationSearchEngine is responsible for:
//! - Resolving which relations apply to the invocation context
//! - Discovering the morph types of polymorphic relations
//! - Building one search group per (sub-)term and OR-ing them
//! - Appending the result to the caller's query as a single condition

use crate::backend::SearchBackend;
use crate::context::SearchContext;
use crate::descriptor::{check_relation, relation_path, SearchConfig, SearchDescriptor};
use crate::merge::{merge, merge_terms};
use crate::query_builder::clauses::{
    build_columns_clause, build_relation_clause, BuildContext, MorphTypes,
};
use crate::query_builder::{Dialect, Predicate, SelectQuery};
use crate::resource::ResourceSearch;
use crate::schema::{ModelDef, RelationKind, Schema};
use crate::Result;
use futures::future::try_join_all;
use std::sync::Arc;

/// Polymorphic relation whose target types must be read from the data.
#[derive(Debug)]
struct MorphTarget {
    owner: String,
    owner_morph_class: String,
    relation: String,
    table: String,
    type_column: String,
    path: String,
}

/// Relation search engine applies resource searches to listing queries
pub struct RelationSearchEngine {
    schema: Arc<Schema>,
    backend: Arc<dyn SearchBackend>,
}

impl RelationSearchEngine {
    pub fn new(schema: Arc<Schema>, backend: Arc<dyn SearchBackend>) -> Self {
        Self { schema, backend }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn dialect(&self) -> Dialect {
        self.backend.dialect()
    }

    /// Apply the search for `term` to `query`.
    ///
    /// Adds exactly one condition to the query (nothing for a blank term or
    /// a resource with nothing to search). Fails as a whole if any relation
    /// cannot be built.
    pub async fn apply_search(
        &self,
        resource: &ResourceSearch,
        query: &mut SelectQuery,
        term: &str,
        context: SearchContext,
    ) -> Result<()> {
        let alias = query.alias().to_string();
        if let Some(predicate) = self.search_predicate(resource, &alias, term, context).await? {
            query.and_where(predicate);
        }
        Ok(())
    }

    /// Build the search group for `term` against a query aliasing the
    /// resource table as `alias`.
    #[tracing::instrument(
        name = "relation_search",
        skip_all,
        fields(resource = %resource.name(), global = context.is_global())
    )]
    pub async fn search_predicate(
        &self,
        resource: &ResourceSearch,
        alias: &str,
        term: &str,
        context: SearchContext,
    ) -> Result<Option<Predicate>> {
        let terms = resource.split_term(term);
        if terms.is_empty() {
            if term.trim().is_empty() {
                tracing::debug!("blank search term, no search condition applied");
            } else {
                tracing::warn!(term, "search term has no usable sub-terms");
            }
            return Ok(None);
        }

        let model = self.schema.model(resource.model())?;
        let relations = resource.relations_for(context);
        if resource.search_columns().is_empty() && relations.is_empty() {
            tracing::debug!("resource has nothing to search in this context");
            return Ok(None);
        }

        let morph_types = self
            .discover_morph_types(resource.name(), model, relations)
            .await?;

        tracing::debug!(
            relations = relations.len(),
            terms = terms.len(),
            dialect = %self.backend.dialect(),
            "building relation search"
        );

        let ctx = BuildContext::new(
            &self.schema,
            self.backend.dialect(),
            &morph_types,
            resource.name(),
        );
        let scope = ctx.root_scope(model, alias);

        let mut groups = Vec::with_capacity(terms.len());
        for term in &terms {
            let base = (!resource.search_columns().is_empty())
                .then(|| build_columns_clause(&scope, resource.search_columns(), term));
            let relation_predicates = relations
                .iter()
                .map(|(relation, descriptor)| {
                    build_relation_clause(&scope, relation, descriptor, term)
                })
                .collect::<Result<Vec<_>>>()?;
            groups.push(merge(base, relation_predicates));
        }

        Ok(Some(merge_terms(groups)))
    }

    async fn discover_morph_types(
        &self,
        resource: &str,
        model: &ModelDef,
        relations: &SearchConfig,
    ) -> Result<MorphTypes> {
        let mut targets = Vec::new();
        collect_morph_targets(&self.schema, resource, model, relations, "", &mut targets)?;
        if targets.is_empty() {
            return Ok(MorphTypes::new());
        }

        let lookups = targets
            .iter()
            .map(|t| self.backend.distinct_morph_types(&t.table, &t.type_column));
        let found = try_join_all(lookups).await?;

        let mut morph_types = MorphTypes::new();
        for (target, mut types) in targets.into_iter().zip(found) {
            // A row pointing at its own model type is never a related match.
            types.retain(|t| *t != target.owner_morph_class);
            types.sort();
            types.dedup();
            tracing::debug!(relation = %target.path, types = ?types, "discovered morph types");
            morph_types.insert((target.owner, target.relation), types);
        }
        Ok(morph_types)
    }
}

/// Walk the relation map, validating every entry and collecting the
/// polymorphic relations that need morph type discovery.
fn collect_morph_targets(
    schema: &Schema,
    resource: &str,
    owner: &ModelDef,
    relations: &SearchConfig,
    prefix: &str,
    out: &mut Vec<MorphTarget>,
) -> Result<()> {
    for (relation, descriptor) in relations.iter() {
        let path = relation_path(prefix, relation);
        let def = check_relation(owner, relation, descriptor, resource, &path)?;
        match descriptor {
            SearchDescriptor::Polymorphic { .. } => {
                if let RelationKind::MorphTo { type_column, .. } = &def.kind {
                    let seen = out
                        .iter()
                        .any(|t| t.owner == owner.name && t.relation == def.name);
                    if !seen {
                        out.push(MorphTarget {
                            owner: owner.name.clone(),
                            owner_morph_class: owner.morph_class.clone(),
                            relation: def.name.clone(),
                            table: owner.table.clone(),
                            type_column: type_column.clone(),
                            path,
                        });
                    }
                }
            }
            SearchDescriptor::Nested { relations, .. } => {
                let related = schema.related_model(def)?;
                collect_morph_targets(schema, resource, related, relations, &path, out)?;
            }
            SearchDescriptor::Columns(_) | SearchDescriptor::Custom(_) => {}
        }
    }
    Ok(())
}

//! Search clause builders organized by descriptor kind.
//!
//! Each module contains clause building logic for one way of reaching the
//! searched columns: the model's own columns, a related model through an
//! `EXISTS` scope, or every target type of a polymorphic relation.

mod column;
mod morph;
mod relation;

use super::{ColumnRef, Dialect, LikeOperator, Predicate};
use crate::descriptor::{check_relation, relation_path, SearchConfig, SearchDescriptor};
use crate::merge::merge;
use crate::schema::{ModelDef, Schema};
use crate::{Error, Result};
use std::cell::Cell;
use std::collections::HashMap;

pub(crate) use column::build_columns_clause;

/// Discovered morph classes keyed by (owning model, relation).
pub(crate) type MorphTypes = HashMap<(String, String), Vec<String>>;

/// State shared by every clause built during one search invocation.
pub struct BuildContext<'a> {
    schema: &'a Schema,
    dialect: Dialect,
    operator: LikeOperator,
    morph_types: &'a MorphTypes,
    resource: &'a str,
    next_alias: Cell<usize>,
}

impl<'a> BuildContext<'a> {
    pub(crate) fn new(
        schema: &'a Schema,
        dialect: Dialect,
        morph_types: &'a MorphTypes,
        resource: &'a str,
    ) -> Self {
        Self {
            schema,
            dialect,
            operator: dialect.like_operator(),
            morph_types,
            resource,
            next_alias: Cell::new(0),
        }
    }

    pub(crate) fn root_scope(&'a self, owner: &'a ModelDef, alias: &str) -> SearchScope<'a> {
        SearchScope {
            ctx: self,
            owner,
            alias: alias.to_string(),
            path: String::new(),
        }
    }
}

/// The model a predicate is being built for, and the alias its table has in
/// the enclosing query or subquery.
pub struct SearchScope<'a> {
    ctx: &'a BuildContext<'a>,
    owner: &'a ModelDef,
    alias: String,
    path: String,
}

impl<'a> SearchScope<'a> {
    pub fn dialect(&self) -> Dialect {
        self.ctx.dialect
    }

    pub fn like_operator(&self) -> LikeOperator {
        self.ctx.operator
    }

    pub fn schema(&self) -> &'a Schema {
        self.ctx.schema
    }

    pub fn owner(&self) -> &'a ModelDef {
        self.owner
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Resource the search was issued for.
    pub fn resource(&self) -> &str {
        self.ctx.resource
    }

    /// Dotted relation path from the resource to this scope (empty at the root).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// `column` qualified with this scope's table alias.
    pub fn column(&self, column: &str) -> ColumnRef {
        ColumnRef::new(self.alias.clone(), column)
    }

    /// Case-insensitive containment test of `term` against `column`.
    pub fn contains(&self, column: &str, term: &str) -> Predicate {
        column::contains(self, column, term)
    }

    /// Fresh table alias, unique within this invocation.
    pub fn next_alias(&self, table: &str) -> String {
        let n = self.ctx.next_alias.get() + 1;
        self.ctx.next_alias.set(n);
        format!("{}_{}", table, n)
    }

    /// `EXISTS` over the related records of a non-polymorphic `relation`,
    /// with `inner` building the condition on the related scope.
    pub fn relation_exists<F>(&self, relation: &str, inner: F) -> Result<Predicate>
    where
        F: FnOnce(&SearchScope<'a>) -> Result<Predicate>,
    {
        let path = relation_path(&self.path, relation);
        let def = self
            .schema()
            .relation(self.owner, relation)
            .map_err(|_| Error::UnknownRelation {
                resource: self.resource().to_string(),
                relation: path.clone(),
            })?;
        relation::build_exists_clause(self, def, &path, inner)
    }

    pub(crate) fn child(&self, owner: &'a ModelDef, alias: String, path: String) -> Self {
        Self {
            ctx: self.ctx,
            owner,
            alias,
            path,
        }
    }

    fn morph_types(&self, relation: &str) -> &'a [String] {
        self.ctx
            .morph_types
            .get(&(self.owner.name.clone(), relation.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Predicate for one configured relation of the scope's model.
pub(crate) fn build_relation_clause(
    scope: &SearchScope<'_>,
    relation: &str,
    descriptor: &SearchDescriptor,
    term: &str,
) -> Result<Predicate> {
    let path = relation_path(&scope.path, relation);
    let def = check_relation(scope.owner, relation, descriptor, scope.resource(), &path)?;

    let predicate = match descriptor {
        SearchDescriptor::Custom(search) => search.apply(scope, relation, term)?,
        SearchDescriptor::Polymorphic { columns } => {
            morph::build_morph_clause(scope, def, &path, scope.morph_types(relation), columns, term)?
        }
        SearchDescriptor::Columns(columns) => {
            relation::build_exists_clause(scope, def, &path, |related| {
                Ok(build_columns_clause(related, columns, term))
            })?
        }
        SearchDescriptor::Nested { columns, relations } => {
            relation::build_exists_clause(scope, def, &path, |related| {
                build_search_group(related, columns, relations, term)
            })?
        }
    };

    tracing::trace!(relation = %path, "built relation search clause");
    Ok(predicate)
}

/// OR group of the scope's own columns and every configured relation.
pub(crate) fn build_search_group(
    scope: &SearchScope<'_>,
    columns: &[String],
    relations: &SearchConfig,
    term: &str,
) -> Result<Predicate> {
    let base = (!columns.is_empty()).then(|| build_columns_clause(scope, columns, term));
    let relation_predicates = relations
        .iter()
        .map(|(relation, descriptor)| build_relation_clause(scope, relation, descriptor, term))
        .collect::<Result<Vec<_>>>()?;
    Ok(merge(base, relation_predicates))
}

//! Polymorphic (`morph_to`) relation clauses.
//!
//! The related table is not known up front: the owning row names it in its
//! morph type column. One `EXISTS` is built per morph class discovered in the
//! data, and the results are OR-ed.

use super::super::{ColumnRef, Predicate, Subquery};
use super::{build_columns_clause, SearchScope};
use crate::schema::{RelationDef, RelationKind};
use crate::{Error, Result};

pub(super) fn build_morph_clause(
    scope: &SearchScope<'_>,
    relation: &RelationDef,
    path: &str,
    morph_types: &[String],
    columns: &[String],
    term: &str,
) -> Result<Predicate> {
    let RelationKind::MorphTo {
        type_column,
        id_column,
        owner_key,
    } = &relation.kind
    else {
        return Err(Error::invalid_descriptor(
            scope.resource(),
            path,
            "polymorphic descriptor used on a relation with a fixed related model",
        ));
    };

    let mut parts = Vec::with_capacity(morph_types.len());
    for morph_type in morph_types {
        let target = scope
            .schema()
            .model_by_morph_class(morph_type)?
            .ok_or_else(|| Error::UnknownMorphType {
                resource: scope.resource().to_string(),
                relation: path.to_string(),
                morph_type: morph_type.clone(),
            })?;

        let alias = scope.next_alias(&target.table);
        let target_key = owner_key.as_deref().unwrap_or(&target.key);
        let target_scope = scope.child(target, alias.clone(), path.to_string());

        let subquery = Subquery::new(target.table.clone(), alias.clone())
            .and_where(Predicate::Equals {
                column: scope.column(type_column),
                value: morph_type.clone().into(),
            })
            .and_where(Predicate::ColumnEquals(
                ColumnRef::new(alias, target_key),
                scope.column(id_column),
            ))
            .and_where(build_columns_clause(&target_scope, columns, term));
        parts.push(Predicate::Exists(Box::new(subquery)));
    }

    if parts.is_empty() {
        tracing::debug!(relation = %path, "no morph types present, relation cannot match");
    }

    Ok(Predicate::any(parts))
}

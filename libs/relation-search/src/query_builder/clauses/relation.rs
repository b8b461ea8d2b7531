//! Correlated `EXISTS` scopes for relations with a fixed related model.

use super::super::{ColumnRef, Predicate, Subquery};
use super::SearchScope;
use crate::schema::{RelationDef, RelationKind};
use crate::{Error, Result};

/// `EXISTS` over the records reached through `relation`, correlated with the
/// scope's row, with `inner` built against the related scope.
pub(super) fn build_exists_clause<'a, F>(
    scope: &SearchScope<'a>,
    relation: &RelationDef,
    path: &str,
    inner: F,
) -> Result<Predicate>
where
    F: FnOnce(&SearchScope<'a>) -> Result<Predicate>,
{
    if relation.is_polymorphic() {
        return Err(polymorphic_relation_error(scope, path));
    }
    let parent = scope.owner();
    let related = scope.schema().related_model(relation)?;

    let alias = scope.next_alias(&related.table);
    let child = |column: &str| ColumnRef::new(alias.clone(), column);
    let parent_key = |key: &Option<String>| scope.column(key.as_deref().unwrap_or(&parent.key));
    let mut subquery = Subquery::new(related.table.clone(), alias.clone());

    match &relation.kind {
        RelationKind::HasOne {
            foreign_key,
            local_key,
            ..
        }
        | RelationKind::HasMany {
            foreign_key,
            local_key,
            ..
        } => {
            subquery = subquery.and_where(Predicate::ColumnEquals(
                child(foreign_key),
                parent_key(local_key),
            ));
        }
        RelationKind::BelongsTo {
            foreign_key,
            owner_key,
            ..
        } => {
            subquery = subquery.and_where(Predicate::ColumnEquals(
                child(owner_key.as_deref().unwrap_or(&related.key)),
                scope.column(foreign_key),
            ));
        }
        RelationKind::BelongsToMany {
            pivot_table,
            foreign_pivot_key,
            related_pivot_key,
            parent_key: pivot_parent_key,
            related_key,
            ..
        } => {
            let pivot_alias = scope.next_alias(pivot_table);
            subquery = subquery
                .inner_join(
                    pivot_table.clone(),
                    pivot_alias.clone(),
                    ColumnRef::new(pivot_alias.clone(), related_pivot_key.clone()),
                    child(related_key.as_deref().unwrap_or(&related.key)),
                )
                .and_where(Predicate::ColumnEquals(
                    ColumnRef::new(pivot_alias, foreign_pivot_key.clone()),
                    parent_key(pivot_parent_key),
                ));
        }
        RelationKind::MorphOne {
            type_column,
            id_column,
            local_key,
            ..
        }
        | RelationKind::MorphMany {
            type_column,
            id_column,
            local_key,
            ..
        } => {
            subquery = subquery
                .and_where(Predicate::ColumnEquals(
                    child(id_column),
                    parent_key(local_key),
                ))
                .and_where(Predicate::Equals {
                    column: child(type_column),
                    value: parent.morph_class.clone().into(),
                });
        }
        RelationKind::MorphTo { .. } => return Err(polymorphic_relation_error(scope, path)),
    }

    let related_scope = scope.child(related, alias, path.to_string());
    let condition = inner(&related_scope)?;
    Ok(Predicate::Exists(Box::new(subquery.and_where(condition))))
}

fn polymorphic_relation_error(scope: &SearchScope<'_>, path: &str) -> Error {
    Error::invalid_descriptor(
        scope.resource(),
        path,
        "polymorphic relations need a polymorphic descriptor",
    )
}

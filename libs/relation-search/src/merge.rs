//! Combining search predicates into the single group appended to a query.
//!
//! Everything a search contributes is OR-ed inside one group, and that group
//! is AND-ed with the caller's conditions. Rendering parenthesises every
//! compound predicate, so OR branches never escape the group.

use crate::query_builder::Predicate;

/// OR-combine the base column predicate with every relation predicate.
pub fn merge(base: Option<Predicate>, relation_predicates: Vec<Predicate>) -> Predicate {
    Predicate::any(base.into_iter().chain(relation_predicates))
}

/// OR-combine the complete per-sub-term groups of a split search term.
pub fn merge_terms(groups: Vec<Predicate>) -> Predicate {
    Predicate::any(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::{BindValue, ColumnRef, Dialect, LikeOperator, SelectQuery};

    fn like(column: &str, term: &str) -> Predicate {
        Predicate::Like {
            column: ColumnRef::new("users", column),
            operator: LikeOperator::Like,
            pattern: format!("%{}%", term),
        }
    }

    #[test]
    fn merged_group_does_not_leak_into_outer_conditions() {
        let mut query = SelectQuery::new("users");
        query.and_where(Predicate::Equals {
            column: query.column("active"),
            value: BindValue::Integer(1),
        });
        query.and_where(merge(
            Some(like("name", "ann")),
            vec![like("email", "ann"), like("nickname", "ann")],
        ));
        let (sql, _) = query.build_sql(Dialect::Sqlite);
        assert_eq!(
            sql,
            "SELECT \"users\".* FROM \"users\" WHERE \"users\".\"active\" = ? AND \
             (\"users\".\"name\" LIKE ? ESCAPE '!' OR \"users\".\"email\" LIKE ? ESCAPE '!' \
             OR \"users\".\"nickname\" LIKE ? ESCAPE '!')"
        );
    }

    #[test]
    fn merge_without_base_keeps_relations() {
        match merge(None, vec![like("email", "ann")]) {
            Predicate::Or(parts) => assert_eq!(parts.len(), 1),
            other => panic!("expected Or, got {:?}", other),
        }
        assert!(merge(None, vec![]).is_never());
    }

    #[test]
    fn sub_term_groups_are_or_ed() {
        let alice = merge(Some(like("name", "alice")), vec![like("email", "alice")]);
        let bob = merge(Some(like("name", "bob")), vec![like("email", "bob")]);
        let merged = merge_terms(vec![alice, bob]);
        let mut binds = Vec::new();
        let sql = merged.build_sql(Dialect::Sqlite, &mut binds);
        assert_eq!(sql.matches(" OR ").count(), 3);
        assert!(!sql.contains(" AND "));
        assert_eq!(
            binds,
            vec![
                BindValue::from("%alice%"),
                BindValue::from("%alice%"),
                BindValue::from("%bob%"),
                BindValue::from("%bob%"),
            ]
        );
    }
}

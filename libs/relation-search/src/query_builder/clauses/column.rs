use super::super::Predicate;
use super::SearchScope;
use crate::escape::contains_pattern;

/// OR of containment tests over `columns`, qualified with the scope alias.
pub(crate) fn build_columns_clause(
    scope: &SearchScope<'_>,
    columns: &[String],
    term: &str,
) -> Predicate {
    Predicate::any(columns.iter().map(|column| contains(scope, column, term)))
}

pub(super) fn contains(scope: &SearchScope<'_>, column: &str, term: &str) -> Predicate {
    Predicate::Like {
        column: scope.column(column),
        operator: scope.like_operator(),
        pattern: contains_pattern(term, scope.dialect()),
    }
}

//! SQL query builder for relation-aware searches.
//!
//! A deliberately small builder: it knows how to express
//! - AND/OR groups over column predicates
//! - dialect-aware `LIKE`/`ILIKE` containment tests
//! - correlated `EXISTS` subqueries over related tables
//!
//! Predicates carry their values inline; placeholders and bind values are
//! assigned only when the tree is rendered for a concrete [`Dialect`].

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

mod bind;
pub(crate) mod clauses;

use bind::{push_text, push_value};

/// Escape character used in every rendered `LIKE` pattern.
pub const LIKE_ESCAPE: char = '!';

/// Bind values for `sqlx` queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Text(String),
    Integer(i64),
}

impl From<&str> for BindValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for BindValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for BindValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// SQL dialect of the active connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
    SqlServer,
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pgsql" | "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" => Ok(Self::Sqlite),
            "sqlsrv" | "mssql" => Ok(Self::SqlServer),
            _ => Err(Error::UnsupportedDriver(s.to_string())),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.driver_name())
    }
}

impl Dialect {
    /// Resolve a dialect from a connection driver name (`pgsql`, `mysql`, ...).
    pub fn from_driver_name(name: &str) -> Result<Self> {
        name.parse()
    }

    pub fn driver_name(&self) -> &'static str {
        match self {
            Self::Postgres => "pgsql",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
            Self::SqlServer => "sqlsrv",
        }
    }

    /// Case-insensitive containment operator for this dialect.
    ///
    /// Postgres `LIKE` is case-sensitive, so it gets the native `ILIKE`.
    /// The other dialects compare case-insensitively with plain `LIKE` under
    /// their default collations.
    pub fn like_operator(&self) -> LikeOperator {
        match self {
            Self::Postgres => LikeOperator::ILike,
            Self::MySql | Self::Sqlite | Self::SqlServer => LikeOperator::Like,
        }
    }

    pub fn quote_identifier(&self, ident: &str) -> String {
        match self {
            Self::Postgres | Self::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
            Self::MySql => format!("`{}`", ident.replace('`', "``")),
            Self::SqlServer => format!("[{}]", ident.replace(']', "]]")),
        }
    }

    /// Placeholder for the 1-based bind parameter `idx`.
    pub fn placeholder(&self, idx: usize) -> String {
        match self {
            Self::Postgres => format!("${}", idx),
            Self::MySql | Self::Sqlite => "?".to_string(),
            Self::SqlServer => format!("@p{}", idx),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeOperator {
    Like,
    ILike,
}

impl LikeOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "LIKE",
            Self::ILike => "ILIKE",
        }
    }
}

/// A column qualified by the table (or table alias) that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub qualifier: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(qualifier: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            qualifier: qualifier.into(),
            column: column.into(),
        }
    }

    fn build_sql(&self, dialect: Dialect) -> String {
        format!(
            "{}.{}",
            dialect.quote_identifier(&self.qualifier),
            dialect.quote_identifier(&self.column)
        )
    }
}

/// Boolean predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column LIKE pattern ESCAPE '!'`; the pattern is bound as-is.
    Like {
        column: ColumnRef,
        operator: LikeOperator,
        pattern: String,
    },
    Equals {
        column: ColumnRef,
        value: BindValue,
    },
    ColumnEquals(ColumnRef, ColumnRef),
    IsNotNull(ColumnRef),
    Exists(Box<Subquery>),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    /// Raw SQL fragment using `?` for each bind value, in order.
    ///
    /// A `?` inside a quoted string or quoted identifier is kept as-is. Any
    /// other `?` is a placeholder, so operators spelled with `?` (such as
    /// Postgres `jsonb ? key`) must use their function form (`jsonb_exists`).
    Raw {
        sql: String,
        binds: Vec<BindValue>,
    },
}

impl Predicate {
    pub fn raw(sql: impl Into<String>, binds: Vec<BindValue>) -> Self {
        Self::Raw {
            sql: sql.into(),
            binds,
        }
    }

    /// OR-combine predicates, flattening nested OR groups.
    pub fn any(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        let mut parts = Vec::new();
        for predicate in predicates {
            match predicate {
                Self::Or(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        Self::Or(parts)
    }

    /// AND-combine predicates, flattening nested AND groups.
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        let mut parts = Vec::new();
        for predicate in predicates {
            match predicate {
                Self::And(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        Self::And(parts)
    }

    /// True for an empty OR group, which can never match.
    pub fn is_never(&self) -> bool {
        matches!(self, Self::Or(parts) if parts.is_empty())
    }

    /// Render this predicate, appending its bind values.
    ///
    /// Compound predicates are always parenthesised, so the returned fragment
    /// can be AND-ed or OR-ed with anything without changing its meaning.
    pub fn build_sql(&self, dialect: Dialect, bind_params: &mut Vec<BindValue>) -> String {
        match self {
            Self::Like {
                column,
                operator,
                pattern,
            } => {
                let idx = push_text(bind_params, pattern.clone());
                format!(
                    "{} {} {} ESCAPE '{}'",
                    column.build_sql(dialect),
                    operator.as_str(),
                    dialect.placeholder(idx),
                    LIKE_ESCAPE
                )
            }
            Self::Equals { column, value } => {
                let idx = push_value(bind_params, value.clone());
                format!("{} = {}", column.build_sql(dialect), dialect.placeholder(idx))
            }
            Self::ColumnEquals(left, right) => {
                format!("{} = {}", left.build_sql(dialect), right.build_sql(dialect))
            }
            Self::IsNotNull(column) => format!("{} IS NOT NULL", column.build_sql(dialect)),
            Self::Exists(subquery) => subquery.build_sql(dialect, bind_params),
            Self::And(parts) => build_group(parts, "AND", "1 = 1", dialect, bind_params),
            Self::Or(parts) => build_group(parts, "OR", "1 = 0", dialect, bind_params),
            Self::Raw { sql, binds } => build_raw(sql, binds, dialect, bind_params),
        }
    }
}

fn build_group(
    parts: &[Predicate],
    joiner: &str,
    empty: &str,
    dialect: Dialect,
    bind_params: &mut Vec<BindValue>,
) -> String {
    match parts {
        [] => empty.to_string(),
        [single] => single.build_sql(dialect, bind_params),
        _ => {
            let rendered: Vec<String> = parts
                .iter()
                .map(|p| p.build_sql(dialect, bind_params))
                .collect();
            format!("({})", rendered.join(&format!(" {} ", joiner)))
        }
    }
}

fn build_raw(
    sql: &str,
    binds: &[BindValue],
    dialect: Dialect,
    bind_params: &mut Vec<BindValue>,
) -> String {
    let mut out = String::with_capacity(sql.len() + 2);
    let mut values = binds.iter();
    let mut quote: Option<char> = None;
    for c in sql.chars() {
        match quote {
            Some(open) if c == open => quote = None,
            None if matches!(c, '\'' | '"' | '`') => quote = Some(c),
            _ => {}
        }
        if c != '?' || quote.is_some() {
            out.push(c);
            continue;
        }
        match values.next() {
            Some(value) => {
                let idx = push_value(bind_params, value.clone());
                out.push_str(&dialect.placeholder(idx));
            }
            None => out.push(c),
        }
    }
    format!("({})", out)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: String,
    pub alias: String,
    pub left: ColumnRef,
    pub right: ColumnRef,
}

/// Correlated `EXISTS (SELECT 1 ...)` subquery.
#[derive(Debug, Clone, PartialEq)]
pub struct Subquery {
    pub table: String,
    pub alias: String,
    pub joins: Vec<Join>,
    pub conditions: Vec<Predicate>,
}

impl Subquery {
    pub fn new(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: alias.into(),
            joins: Vec::new(),
            conditions: Vec::new(),
        }
    }

    pub fn inner_join(
        mut self,
        table: impl Into<String>,
        alias: impl Into<String>,
        left: ColumnRef,
        right: ColumnRef,
    ) -> Self {
        self.joins.push(Join {
            table: table.into(),
            alias: alias.into(),
            left,
            right,
        });
        self
    }

    pub fn and_where(mut self, predicate: Predicate) -> Self {
        self.conditions.push(predicate);
        self
    }

    pub fn column(&self, column: impl Into<String>) -> ColumnRef {
        ColumnRef::new(self.alias.clone(), column)
    }

    fn build_sql(&self, dialect: Dialect, bind_params: &mut Vec<BindValue>) -> String {
        let mut sql = format!(
            "EXISTS (SELECT 1 FROM {}",
            table_with_alias(dialect, &self.table, &self.alias)
        );
        for join in &self.joins {
            sql.push_str(&format!(
                " INNER JOIN {} ON {} = {}",
                table_with_alias(dialect, &join.table, &join.alias),
                join.left.build_sql(dialect),
                join.right.build_sql(dialect)
            ));
        }
        if !self.conditions.is_empty() {
            let rendered: Vec<String> = self
                .conditions
                .iter()
                .map(|c| c.build_sql(dialect, bind_params))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&rendered.join(" AND "));
        }
        sql.push(')');
        sql
    }
}

fn table_with_alias(dialect: Dialect, table: &str, alias: &str) -> String {
    if table == alias {
        dialect.quote_identifier(table)
    } else {
        format!(
            "{} AS {}",
            dialect.quote_identifier(table),
            dialect.quote_identifier(alias)
        )
    }
}

/// The caller's listing query.
///
/// Conditions are AND-ed together; relation search appends exactly one
/// condition per invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    table: String,
    alias: String,
    conditions: Vec<Predicate>,
}

impl SelectQuery {
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            alias: table.clone(),
            table,
            conditions: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn conditions(&self) -> &[Predicate] {
        &self.conditions
    }

    pub fn column(&self, column: impl Into<String>) -> ColumnRef {
        ColumnRef::new(self.alias.clone(), column)
    }

    pub fn and_where(&mut self, predicate: Predicate) -> &mut Self {
        self.conditions.push(predicate);
        self
    }

    pub fn build_sql(&self, dialect: Dialect) -> (String, Vec<BindValue>) {
        let mut sql = format!(
            "SELECT {}.* FROM {}",
            dialect.quote_identifier(&self.alias),
            table_with_alias(dialect, &self.table, &self.alias)
        );
        let mut bind_params = Vec::new();
        let mut first = true;
        for condition in &self.conditions {
            sql.push_str(if first { " WHERE " } else { " AND " });
            sql.push_str(&condition.build_sql(dialect, &mut bind_params));
            first = false;
        }
        (sql, bind_params)
    }
}

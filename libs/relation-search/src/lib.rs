//! Relation-aware search for admin resource listings
//!
//! Extends the free-text search of a resource listing from the resource's
//! own columns to the columns of related records.
//!
//! # Module Organization
//!
//! - `schema`: Models, tables and the relations between them
//! - `descriptor`: How each relation is searched (columns, nested, polymorphic, custom)
//! - `resolver`: Which relation map applies to a scoped or global search
//! - `resource`: Per-resource search declarations and term splitting
//! - `config`: Declarations loaded from TOML/JSON settings with env overrides
//! - `query_builder`: Predicates, `EXISTS` subqueries and per-dialect SQL rendering
//! - `merge`: OR-grouping of column and relation predicates
//! - `backend`: Dialect and morph type discovery over a database pool
//! - `engine`: Applies a search term to a listing query
//!
//! # Behavior
//!
//! - All matches for one term are OR-ed inside a single group; the group is
//!   AND-ed with whatever conditions the listing query already carries
//! - Related records are matched with correlated `EXISTS` subqueries, nested
//!   to any declared depth
//! - Polymorphic relations are searched once per target type found in the
//!   data, excluding the owning model's own type
//! - Matching is case-insensitive containment (`ILIKE` on PostgreSQL, `LIKE`
//!   elsewhere) with the term passed as a bound parameter

pub mod backend;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod engine;
pub mod error;
mod escape;
pub mod merge;
pub mod query_builder;
pub mod resolver;
pub mod resource;
pub mod schema;

pub use backend::{SearchBackend, StaticBackend};
pub use config::{MorphSettings, RelationSettings, ResourceSettings, SearchSettings};
pub use context::SearchContext;
pub use descriptor::{search_fn, CustomSearches, RelationSearch, SearchConfig, SearchDescriptor};
pub use engine::RelationSearchEngine;
pub use error::{Error, Result};
pub use merge::{merge, merge_terms};
pub use query_builder::clauses::SearchScope;
pub use query_builder::{
    BindValue, ColumnRef, Dialect, Join, LikeOperator, Predicate, SelectQuery, Subquery,
};
pub use resolver::SearchConfigResolver;
pub use resource::{ResourceRegistry, ResourceSearch};
pub use schema::{ModelDef, RelationDef, RelationKind, Schema};

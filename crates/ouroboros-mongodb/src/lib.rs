//! MongoDB document builders for ouroboros
//!
//! This crate builds MongoDB query documents without talking to a server.
//!
//! # Features
//! - Field-by-field query filters with range merging and `$or` / `$and` / `$nor` nesting
//! - Aggregation pipelines that keep stages in insertion order
//! - Atlas Search `$search` / `$searchMeta` stages with compound clauses and facets
//! - Declarative search models that reject invalid field usage before a query is built
//!
//! All builders are plain owned values. Build calls never mutate, so building
//! twice gives the same document.

pub mod aggregate;
pub mod filter;
pub mod search;
pub mod types;
pub mod validation;

pub use aggregate::{AggregateBuilder, Stage};
pub use filter::{FieldCondition, LogicalOperator, Operator, QueryFilter};
pub use ouroboros_common::{DataBridgeError, Result};
pub use search::{
    AtlasSearchBuilder, CompoundBuilder, Facet, FacetOptions, IndexField, SearchModel,
    SearchOperation, SearchQuery,
};
pub use types::{CountType, FieldType, SortDirection};
pub use validation::validate_field_path;

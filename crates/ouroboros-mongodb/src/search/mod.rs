//! Atlas Search query building.
//!
//! This module provides:
//! - [`AtlasSearchBuilder`] for `$search` / `$searchMeta` stages
//! - [`CompoundBuilder`] for boolean must / should / filter / mustNot clauses
//! - [`SearchModel`] and [`SearchQuery`] for schema-checked queries

mod builder;
pub mod clause;
mod compound;
mod facet;
mod model;


/// Search index used when none is given
pub const DEFAULT_INDEX: &str = "default";

/// Bucket count for string facets added through [`SearchQuery::facet`]
pub const DEFAULT_NUM_BUCKETS: u32 = 10;

pub use builder::AtlasSearchBuilder;
pub use clause::{
    AutocompleteClause, ClauseKind, EqualsClause, ExistsClause, PhraseClause, RangeClause,
    SearchOperator, SearchPath, TextClause, TokenOrder,
};
pub use compound::{ClauseBuilder, CompoundBuilder, CompoundGroup};
pub use facet::{Facet, FacetOperator, FacetOptions};
pub use model::{IndexField, SearchModel, SearchModelBuilder, SearchOperation, SearchQuery};

//! AtlasSearchBuilder struct and build projections.

use bson::{doc, Document as BsonDocument};
use ouroboros_common::{DataBridgeError, Result};

use super::clause::{AutocompleteClause, PhraseClause, SearchOperator, SearchPath, TextClause};
use super::compound::CompoundBuilder;
use super::facet::{Facet, FacetOperator};
use super::DEFAULT_INDEX;
use crate::types::CountType;

/// Builder for Atlas Search queries.
///
/// Holds a single top-level operator (a leaf clause or a compound clause) plus
/// facets, count and highlight options. Setting the operator more than once is
/// reported as an error by the build methods instead of silently overwriting.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasSearchBuilder {
    index: String,
    /// `{ <operator>: body }`
    operator: Option<BsonDocument>,
    /// Every operator name set, in order; more than one is a conflict
    operator_history: Vec<String>,
    /// Named facet definitions, insertion ordered
    facets: BsonDocument,
    count: Option<BsonDocument>,
    highlight: Option<BsonDocument>,
    facet_mode: bool,
}

impl Default for AtlasSearchBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX)
    }
}

impl AtlasSearchBuilder {
    /// Create a builder for the given search index
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            operator: None,
            operator_history: Vec::new(),
            facets: BsonDocument::new(),
            count: None,
            highlight: None,
            facet_mode: false,
        }
    }

    /// Full-text search on `path`
    pub fn text(self, query: impl Into<String>, path: impl Into<SearchPath>) -> Self {
        self.operator(&TextClause::new(query, path))
    }

    /// Phrase search on `path`
    pub fn phrase(self, query: impl Into<String>, path: impl Into<SearchPath>) -> Self {
        self.operator(&PhraseClause::new(query, path))
    }

    /// Autocomplete search on `path`
    pub fn autocomplete(self, query: impl Into<String>, path: impl Into<SearchPath>) -> Self {
        self.operator(&AutocompleteClause::new(query, path))
    }

    /// Use a configured leaf clause as the top-level operator
    pub fn operator(self, clause: &impl SearchOperator) -> Self {
        self.set_operator(clause.to_document())
    }

    /// Use a compound clause as the top-level operator. A compound without
    /// clauses sets no operator.
    pub fn compound(self, compound: CompoundBuilder) -> Self {
        self.apply_operator(FacetOperator::Compound(compound), false)
    }

    /// Add a named facet. Re-using a name replaces that facet.
    pub fn facet(mut self, name: impl Into<String>, facet: Facet) -> Self {
        let name = name.into();
        tracing::trace!(facet = %name, path = facet.path(), facet_type = %facet.facet_type(), "Adding facet");
        self.facets.insert(name, facet.to_document());
        self
    }

    /// Wrap the current operator and facets under a `facet` collector
    pub fn use_facet_operator(mut self) -> Self {
        self.facet_mode = true;
        self
    }

    /// Set the operator and switch to facet-operator mode
    pub fn facet_operator(self, operator: impl Into<FacetOperator>) -> Self {
        self.apply_operator(operator.into(), true)
    }

    /// Configure result counting. `threshold` only applies to lower-bound counts.
    pub fn count(mut self, count_type: CountType, threshold: Option<u32>) -> Self {
        let mut count = doc! { "type": count_type.as_str() };
        if let Some(threshold) = threshold {
            count.insert("threshold", i64::from(threshold));
        }
        self.count = Some(count);
        self
    }

    /// Highlight matched terms in `path`
    pub fn highlight(mut self, path: impl Into<SearchPath>, max_chars_to_examine: Option<u32>) -> Self {
        let path = path.into();
        let mut highlight = doc! { "path": path.to_bson() };
        if let Some(max_chars) = max_chars_to_examine {
            highlight.insert("maxCharsToExamine", i64::from(max_chars));
        }
        self.highlight = Some(highlight);
        self
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Name of the current top-level operator, if any
    pub fn operator_name(&self) -> Option<&str> {
        self.operator
            .as_ref()
            .and_then(|op| op.keys().next())
            .map(String::as_str)
    }

    pub fn facet_count(&self) -> usize {
        self.facets.len()
    }

    pub fn is_facet_mode(&self) -> bool {
        self.facet_mode
    }

    /// Build the search options document.
    ///
    /// # Errors
    ///
    /// Returns `DataBridgeError::Query` if more than one top-level operator was set.
    pub fn build(&self) -> Result<BsonDocument> {
        if self.operator_history.len() > 1 {
            return Err(DataBridgeError::Query(format!(
                "Only one top-level search operator is allowed, got: {}",
                self.operator_history.join(", ")
            )));
        }

        let mut search = doc! { "index": self.index.clone() };
        if self.facet_mode {
            let mut facet = BsonDocument::new();
            if let Some(operator) = &self.operator {
                facet.insert("operator", operator.clone());
            }
            if !self.facets.is_empty() {
                facet.insert("facets", self.facets.clone());
            }
            search.insert("facet", facet);
        } else {
            if let Some(operator) = &self.operator {
                for (key, value) in operator {
                    search.insert(key.clone(), value.clone());
                }
            }
            if !self.facets.is_empty() {
                search.insert("facets", self.facets.clone());
            }
        }
        if let Some(count) = &self.count {
            search.insert("count", count.clone());
        }
        if let Some(highlight) = &self.highlight {
            search.insert("highlight", highlight.clone());
        }

        tracing::debug!(
            index = %self.index,
            operator = self.operator_name().unwrap_or("none"),
            facets = self.facets.len(),
            facet_mode = self.facet_mode,
            "Built search query"
        );
        Ok(search)
    }

    /// Build as a `$search` pipeline stage
    pub fn build_stage(&self) -> Result<BsonDocument> {
        let search = self.build()?;
        Ok(doc! { "$search": search })
    }

    /// Build as a `$searchMeta` pipeline stage (metadata only, no documents)
    pub fn build_meta_stage(&self) -> Result<BsonDocument> {
        let search = self.build()?;
        Ok(doc! { "$searchMeta": search })
    }

    fn apply_operator(self, operator: FacetOperator, facet_mode: bool) -> Self {
        let builder = match operator.to_document() {
            Some(operator) => self.set_operator(operator),
            None => {
                tracing::trace!(index = %self.index, "Skipping empty compound operator");
                self
            }
        };
        if facet_mode {
            builder.use_facet_operator()
        } else {
            builder
        }
    }

    fn set_operator(mut self, operator: BsonDocument) -> Self {
        let name = operator
            .keys()
            .next()
            .cloned()
            .unwrap_or_else(|| "raw".to_string());
        if let Some(previous) = self.operator_name() {
            tracing::warn!(previous, replacement = %name, "Top-level search operator set more than once");
        }
        self.operator_history.push(name);
        self.operator = Some(operator);
        self
    }
}

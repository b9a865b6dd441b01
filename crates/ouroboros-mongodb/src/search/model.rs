//! Declarative search models
//!
//! A [`SearchModel`] declares which fields of an Atlas Search index can be
//! searched and faceted, and [`SearchQuery`] uses that declaration to reject
//! invalid field usage before a query is built.
//!
//! ```ignore
//! use ouroboros_mongodb::search::{IndexField, SearchModel};
//!
//! let messages = SearchModel::builder("MessageSearch")
//!     .index("messages")
//!     .field("status", IndexField::new().with_string_index())
//!     .fields([
//!         ("type", IndexField::new().with_string_index().with_string_facet()),
//!         ("rawData.from", IndexField::new().with_string_index().with_string_facet()),
//!     ])
//!     .build()?;
//!
//! let stage = messages
//!     .search()
//!     .text("email", "type")?
//!     .facet("rawData.from")?
//!     .build_stage()?;
//! ```

use indexmap::IndexMap;
use ouroboros_common::{DataBridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

use bson::Document as BsonDocument;

use super::builder::AtlasSearchBuilder;
use super::clause::{
    AutocompleteClause, ClauseKind, PhraseClause, SearchOperator, SearchPath, TextClause,
};
use super::compound::CompoundBuilder;
use super::facet::{Facet, FacetOperator, FacetOptions};
use super::{DEFAULT_INDEX, DEFAULT_NUM_BUCKETS};
use crate::types::{CountType, FieldType};
use crate::validation::validate_field_path;

/// Index and facet capabilities of one Atlas Search field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexField {
    #[serde(alias = "string_index")]
    pub string_index: bool,
    #[serde(alias = "string_facet")]
    pub string_facet: bool,
    #[serde(alias = "number_index")]
    pub number_index: bool,
    #[serde(alias = "number_facet")]
    pub number_facet: bool,
    #[serde(alias = "date_index")]
    pub date_index: bool,
    #[serde(alias = "date_facet")]
    pub date_facet: bool,
}

impl IndexField {
    /// Field with no capabilities
    pub const fn new() -> Self {
        Self {
            string_index: false,
            string_facet: false,
            number_index: false,
            number_facet: false,
            date_index: false,
            date_facet: false,
        }
    }

    pub const fn with_string_index(mut self) -> Self {
        self.string_index = true;
        self
    }

    pub const fn with_string_facet(mut self) -> Self {
        self.string_facet = true;
        self
    }

    pub const fn with_number_index(mut self) -> Self {
        self.number_index = true;
        self
    }

    pub const fn with_number_facet(mut self) -> Self {
        self.number_facet = true;
        self
    }

    pub const fn with_date_index(mut self) -> Self {
        self.date_index = true;
        self
    }

    pub const fn with_date_facet(mut self) -> Self {
        self.date_facet = true;
        self
    }

    pub fn is_searchable(&self) -> bool {
        self.string_index || self.number_index || self.date_index
    }

    pub fn is_facetable(&self) -> bool {
        self.string_facet || self.number_facet || self.date_facet
    }

    /// Search type, resolved string > number > date
    pub fn search_type(&self) -> Option<FieldType> {
        FieldType::PRIORITY.into_iter().find(|t| self.has_index(*t))
    }

    /// Facet type, resolved string > number > date
    pub fn facet_type(&self) -> Option<FieldType> {
        FieldType::PRIORITY.into_iter().find(|t| self.has_facet(*t))
    }

    pub fn has_index(&self, field_type: FieldType) -> bool {
        match field_type {
            FieldType::String => self.string_index,
            FieldType::Number => self.number_index,
            FieldType::Date => self.date_index,
        }
    }

    pub fn has_facet(&self, field_type: FieldType) -> bool {
        match field_type {
            FieldType::String => self.string_facet,
            FieldType::Number => self.number_facet,
            FieldType::Date => self.date_facet,
        }
    }
}

impl fmt::Display for IndexField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = [
            ("string_index", self.string_index),
            ("string_facet", self.string_facet),
            ("number_index", self.number_index),
            ("number_facet", self.number_facet),
            ("date_index", self.date_index),
            ("date_facet", self.date_facet),
        ];
        let enabled: Vec<String> = flags
            .iter()
            .filter(|(_, on)| *on)
            .map(|(name, _)| format!("{}=true", name))
            .collect();
        write!(f, "IndexField({})", enabled.join(", "))
    }
}

/// Operation a field is validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchOperation {
    Search,
    Facet,
}

impl fmt::Display for SearchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchOperation::Search => f.write_str("search"),
            SearchOperation::Facet => f.write_str("facet"),
        }
    }
}

fn default_model_name() -> String {
    "SearchModel".to_string()
}

fn default_index() -> String {
    DEFAULT_INDEX.to_string()
}

/// Static capability declaration for one Atlas Search index.
///
/// Field paths are opaque keys: `"rawData.from"` is a single entry, not a
/// nested structure. A model is immutable once built and can be shared by
/// any number of query sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchModel {
    #[serde(default = "default_model_name")]
    name: String,
    #[serde(default = "default_index")]
    index: String,
    #[serde(default)]
    fields: IndexMap<String, IndexField>,
}

impl SearchModel {
    /// Start defining a model. `name` is used in error messages.
    pub fn builder(name: impl Into<String>) -> SearchModelBuilder {
        SearchModelBuilder {
            name: name.into(),
            index: DEFAULT_INDEX.to_string(),
            fields: IndexMap::new(),
        }
    }

    /// Load a model from JSON:
    /// `{"name": "...", "index": "...", "fields": {"rawData.from": {"stringIndex": true}}}`
    pub fn from_json(json: &str) -> Result<Self> {
        let model: SearchModel = serde_json::from_str(json)?;
        check_paths(model.fields.keys())?;
        Ok(model)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load a model stored as a BSON document, e.g. in a settings collection.
    /// Uses the same keys as [`SearchModel::from_json`].
    pub fn from_document(document: BsonDocument) -> Result<Self> {
        let model: SearchModel = bson::from_document(document)?;
        check_paths(model.fields.keys())?;
        Ok(model)
    }

    pub fn to_document(&self) -> Result<BsonDocument> {
        Ok(bson::to_document(self)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Start a validated query session
    pub fn search(&self) -> SearchQuery<'_> {
        SearchQuery::new(self)
    }

    /// Unvalidated builder bound to this model's index
    pub fn search_builder(&self) -> AtlasSearchBuilder {
        AtlasSearchBuilder::new(self.index.clone())
    }

    pub fn get_field(&self, field: &str) -> Option<&IndexField> {
        self.fields.get(field)
    }

    pub fn get_searchable_fields(&self) -> IndexMap<String, IndexField> {
        self.select(IndexField::is_searchable)
    }

    pub fn get_facetable_fields(&self) -> IndexMap<String, IndexField> {
        self.select(IndexField::is_facetable)
    }

    pub fn get_all_fields(&self) -> &IndexMap<String, IndexField> {
        &self.fields
    }

    /// Check that `field` exists and supports `operation`.
    ///
    /// # Errors
    ///
    /// - `UndefinedField` if the path is not declared
    /// - `UnsupportedOperation` if it lacks the search or facet capability
    pub fn validate_field(&self, field: &str, operation: SearchOperation) -> Result<&IndexField> {
        let config = self
            .get_field(field)
            .ok_or_else(|| DataBridgeError::UndefinedField {
                field: field.to_string(),
                model: self.name.clone(),
            })?;

        let supported = match operation {
            SearchOperation::Search => config.is_searchable(),
            SearchOperation::Facet => config.is_facetable(),
        };
        if !supported {
            return Err(DataBridgeError::UnsupportedOperation {
                field: field.to_string(),
                operation: operation.to_string(),
            });
        }
        Ok(config)
    }

    fn select(&self, predicate: impl Fn(&IndexField) -> bool) -> IndexMap<String, IndexField> {
        self.fields
            .iter()
            .filter(|(_, config)| predicate(config))
            .map(|(path, config)| (path.clone(), *config))
            .collect()
    }
}

/// Collects field declarations for a [`SearchModel`].
///
/// Named fields and path mappings go into the same ordered map; declaring a
/// path again replaces its capabilities but keeps its original position.
#[derive(Debug, Clone)]
#[must_use]
pub struct SearchModelBuilder {
    name: String,
    index: String,
    fields: IndexMap<String, IndexField>,
}

impl SearchModelBuilder {
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    /// Declare one field
    pub fn field(mut self, path: impl Into<String>, config: IndexField) -> Self {
        self.fields.insert(path.into(), config);
        self
    }

    /// Declare many fields from a path mapping
    pub fn fields<K: Into<String>>(mut self, fields: impl IntoIterator<Item = (K, IndexField)>) -> Self {
        for (path, config) in fields {
            self.fields.insert(path.into(), config);
        }
        self
    }

    /// # Errors
    ///
    /// Returns `DataBridgeError::Validation` if a field path is empty or
    /// starts with `$`.
    pub fn build(self) -> Result<SearchModel> {
        check_paths(self.fields.keys())?;
        Ok(SearchModel {
            name: self.name,
            index: self.index,
            fields: self.fields,
        })
    }
}

fn check_paths<'a>(paths: impl IntoIterator<Item = &'a String>) -> Result<()> {
    paths
        .into_iter()
        .try_for_each(|path| validate_field_path(path))
}

/// Query session that validates every field against a [`SearchModel`]
/// before delegating to an [`AtlasSearchBuilder`].
///
/// A rejected call leaves the session unchanged.
#[derive(Debug, Clone)]
pub struct SearchQuery<'m> {
    model: &'m SearchModel,
    builder: AtlasSearchBuilder,
}

impl<'m> SearchQuery<'m> {
    pub fn new(model: &'m SearchModel) -> Self {
        Self {
            model,
            builder: model.search_builder(),
        }
    }

    pub fn model(&self) -> &'m SearchModel {
        self.model
    }

    /// Text search. The field needs `string_index`.
    pub fn text(&mut self, query: impl Into<String>, field: &str) -> Result<&mut Self> {
        self.operator(&TextClause::new(query, field))
    }

    /// Configured text clause (fuzzy, score, synonyms); every path needs `string_index`
    pub fn text_clause(&mut self, clause: TextClause) -> Result<&mut Self> {
        self.operator(&clause)
    }

    pub fn phrase(&mut self, query: impl Into<String>, field: &str) -> Result<&mut Self> {
        self.operator(&PhraseClause::new(query, field))
    }

    pub fn autocomplete(&mut self, query: impl Into<String>, field: &str) -> Result<&mut Self> {
        self.operator(&AutocompleteClause::new(query, field))
    }

    /// Use a configured clause; every path it references is validated.
    pub fn operator(&mut self, clause: &impl SearchOperator) -> Result<&mut Self> {
        for field in clause.path().fields() {
            if clause.kind() == ClauseKind::Text {
                self.require_text_field(field)?;
            } else {
                self.check(field, SearchOperation::Search)?;
            }
        }
        self.apply(|builder| builder.operator(clause));
        Ok(self)
    }

    /// Compound clauses are passed through without field validation
    pub fn compound(&mut self, compound: CompoundBuilder) -> &mut Self {
        self.apply(|builder| builder.compound(compound));
        self
    }

    /// Facet on `field` with the default bucket count
    pub fn facet(&mut self, field: &str) -> Result<&mut Self> {
        self.facet_with(field, FacetOptions::new().num_buckets(DEFAULT_NUM_BUCKETS))
    }

    /// Facet on `field`; the facet type comes from the field's declaration
    pub fn facet_with(&mut self, field: &str, options: FacetOptions) -> Result<&mut Self> {
        let config = *self.check(field, SearchOperation::Facet)?;
        let facet = derive_facet(field, &config, options)?;
        self.apply(|builder| builder.facet(field, facet));
        Ok(self)
    }

    /// Facet every facetable field, applying `options` to each
    pub fn facet_all(&mut self, options: FacetOptions) -> Result<&mut Self> {
        let mut facets = Vec::new();
        for (path, config) in self.model.get_all_fields() {
            if config.is_facetable() {
                facets.push((path.clone(), derive_facet(path, config, options.clone())?));
            }
        }

        tracing::trace!(model = %self.model.name(), facets = facets.len(), "Faceting all facetable fields");
        self.apply(|builder| {
            facets
                .into_iter()
                .fold(builder, |builder, (path, facet)| builder.facet(path, facet))
        });
        Ok(self)
    }

    pub fn use_facet_operator(&mut self) -> &mut Self {
        self.apply(AtlasSearchBuilder::use_facet_operator);
        self
    }

    pub fn facet_operator(&mut self, operator: impl Into<FacetOperator>) -> &mut Self {
        self.apply(|builder| builder.facet_operator(operator));
        self
    }

    pub fn count(&mut self, count_type: CountType, threshold: Option<u32>) -> &mut Self {
        self.apply(|builder| builder.count(count_type, threshold));
        self
    }

    /// Highlight a searchable field
    pub fn highlight(&mut self, field: &str, max_chars_to_examine: Option<u32>) -> Result<&mut Self> {
        self.check(field, SearchOperation::Search)?;
        self.apply(|builder| builder.highlight(SearchPath::from(field), max_chars_to_examine));
        Ok(self)
    }

    /// Underlying builder, for inspection
    pub fn raw_builder(&self) -> &AtlasSearchBuilder {
        &self.builder
    }

    /// Give up validation and continue with the raw builder
    pub fn into_builder(self) -> AtlasSearchBuilder {
        self.builder
    }

    pub fn build(&self) -> Result<BsonDocument> {
        self.builder.build()
    }

    pub fn build_stage(&self) -> Result<BsonDocument> {
        self.builder.build_stage()
    }

    pub fn build_meta_stage(&self) -> Result<BsonDocument> {
        self.builder.build_meta_stage()
    }

    fn check(&self, field: &str, operation: SearchOperation) -> Result<&'m IndexField> {
        self.model.validate_field(field, operation).inspect_err(|err| {
            tracing::debug!(model = %self.model.name(), field, %operation, error = %err, "Rejected search field");
        })
    }

    fn require_text_field(&self, field: &str) -> Result<()> {
        let config = self.check(field, SearchOperation::Search)?;
        if !config.string_index {
            tracing::debug!(model = %self.model.name(), field, "Rejected text search on non-string field");
            return Err(DataBridgeError::InvalidTextSearchField {
                field: field.to_string(),
            });
        }
        Ok(())
    }

    fn apply(&mut self, f: impl FnOnce(AtlasSearchBuilder) -> AtlasSearchBuilder) {
        let builder = std::mem::take(&mut self.builder);
        self.builder = f(builder);
    }
}

fn derive_facet(field: &str, config: &IndexField, options: FacetOptions) -> Result<Facet> {
    let facet_type = config.facet_type().ok_or_else(|| {
        DataBridgeError::Internal(format!("Facetable field '{}' has no facet type", field))
    })?;
    Ok(Facet::new(facet_type, field).with_options(options))
}

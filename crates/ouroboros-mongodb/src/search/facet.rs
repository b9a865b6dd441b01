//! Facet definitions for `$searchMeta` / facet-collector queries.

use bson::{doc, Bson, Document as BsonDocument};

use super::clause::SearchOperator;
use super::compound::CompoundBuilder;
use crate::types::FieldType;

/// Per-call facet options, applied uniformly by `facet_all`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetOptions {
    /// Maximum number of buckets (string facets)
    pub num_buckets: Option<u32>,
    /// Bucket boundaries (number and date facets)
    pub boundaries: Option<Vec<Bson>>,
    /// Name of the bucket collecting values outside the boundaries
    pub default_bucket: Option<String>,
}

impl FacetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_buckets(mut self, num_buckets: u32) -> Self {
        self.num_buckets = Some(num_buckets);
        self
    }

    pub fn boundaries<V: Into<Bson>>(mut self, boundaries: impl IntoIterator<Item = V>) -> Self {
        self.boundaries = Some(boundaries.into_iter().map(Into::into).collect());
        self
    }

    pub fn default_bucket(mut self, name: impl Into<String>) -> Self {
        self.default_bucket = Some(name.into());
        self
    }
}

/// A single named facet definition.
///
/// String facets render `numBuckets`; number and date facets render
/// `boundaries` and `default`.
#[derive(Debug, Clone, PartialEq)]
pub struct Facet {
    facet_type: FieldType,
    path: String,
    options: FacetOptions,
}

impl Facet {
    pub fn new(facet_type: FieldType, path: impl Into<String>) -> Self {
        Self {
            facet_type,
            path: path.into(),
            options: FacetOptions::default(),
        }
    }

    pub fn string(path: impl Into<String>) -> Self {
        Self::new(FieldType::String, path)
    }

    pub fn number<V: Into<Bson>>(path: impl Into<String>, boundaries: impl IntoIterator<Item = V>) -> Self {
        Self::new(FieldType::Number, path).boundaries(boundaries)
    }

    pub fn date<V: Into<Bson>>(path: impl Into<String>, boundaries: impl IntoIterator<Item = V>) -> Self {
        Self::new(FieldType::Date, path).boundaries(boundaries)
    }

    /// Replace all options at once
    pub fn with_options(mut self, options: FacetOptions) -> Self {
        self.options = options;
        self
    }

    pub fn num_buckets(mut self, num_buckets: u32) -> Self {
        self.options.num_buckets = Some(num_buckets);
        self
    }

    pub fn boundaries<V: Into<Bson>>(mut self, boundaries: impl IntoIterator<Item = V>) -> Self {
        self.options.boundaries = Some(boundaries.into_iter().map(Into::into).collect());
        self
    }

    pub fn default_bucket(mut self, name: impl Into<String>) -> Self {
        self.options.default_bucket = Some(name.into());
        self
    }

    pub fn facet_type(&self) -> FieldType {
        self.facet_type
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn to_document(&self) -> BsonDocument {
        let mut facet = doc! { "type": self.facet_type.as_str(), "path": self.path.clone() };
        match self.facet_type {
            FieldType::String => {
                if let Some(num_buckets) = self.options.num_buckets {
                    facet.insert("numBuckets", i64::from(num_buckets));
                }
            }
            FieldType::Number | FieldType::Date => {
                if let Some(boundaries) = &self.options.boundaries {
                    facet.insert("boundaries", boundaries.clone());
                }
                if let Some(default_bucket) = &self.options.default_bucket {
                    facet.insert("default", default_bucket.clone());
                }
            }
        }
        facet
    }
}

/// Operator wrapped by facet-operator mode.
#[derive(Debug, Clone, PartialEq)]
pub enum FacetOperator {
    Compound(CompoundBuilder),
    Document(BsonDocument),
}

impl FacetOperator {
    /// Use a leaf clause as the facet operator
    pub fn clause(clause: &impl SearchOperator) -> Self {
        FacetOperator::Document(clause.to_document())
    }

    /// Operator document, or `None` for a compound without clauses
    pub fn to_document(&self) -> Option<BsonDocument> {
        match self {
            FacetOperator::Compound(compound) if compound.is_empty() => None,
            FacetOperator::Compound(compound) => Some(doc! { "compound": compound.build() }),
            FacetOperator::Document(document) => Some(document.clone()),
        }
    }
}

impl From<CompoundBuilder> for FacetOperator {
    fn from(compound: CompoundBuilder) -> Self {
        FacetOperator::Compound(compound)
    }
}

impl From<BsonDocument> for FacetOperator {
    fn from(document: BsonDocument) -> Self {
        FacetOperator::Document(document)
    }
}

//! Aggregation pipeline builder
//!
//! Stages are kept exactly in the order they are appended; the builder never
//! reorders, merges or deduplicates them.

use bson::{doc, Bson, Document as BsonDocument};
use ouroboros_common::Result;

use crate::filter::QueryFilter;
use crate::search::AtlasSearchBuilder;
use crate::types::SortDirection;

/// One pipeline step, rendered as `{ "$<name>": payload }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    name: String,
    payload: Bson,
}

impl Stage {
    /// Create a stage. A leading `$` is added to `name` when missing.
    pub fn new(name: impl Into<String>, payload: impl Into<Bson>) -> Self {
        let name = name.into();
        let name = if name.starts_with('$') { name } else { format!("${}", name) };
        Self {
            name,
            payload: payload.into(),
        }
    }

    /// Stage operator, including the `$` prefix
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &Bson {
        &self.payload
    }

    pub fn to_document(&self) -> BsonDocument {
        let mut stage = BsonDocument::new();
        stage.insert(self.name.clone(), self.payload.clone());
        stage
    }
}

/// Builder for MongoDB aggregation pipelines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateBuilder {
    stages: Vec<Stage>,
}

impl AggregateBuilder {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw stage
    pub fn stage(mut self, name: impl Into<String>, payload: impl Into<Bson>) -> Self {
        self.stages.push(Stage::new(name, payload));
        self
    }

    /// Append a `$match` stage with a pre-built filter document
    pub fn match_document(self, filter: BsonDocument) -> Self {
        self.stage("$match", filter)
    }

    /// Append a `$match` stage built from a [`QueryFilter`]
    pub fn match_filter(self, filter: &QueryFilter) -> Result<Self> {
        Ok(self.match_document(filter.build()?))
    }

    /// Append a `$group` stage.
    ///
    /// Accumulator expressions are passed through untouched.
    pub fn group<K, V>(self, by: impl Into<Bson>, accumulators: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Bson>,
    {
        let mut group = doc! { "_id": by.into() };
        for (name, expr) in accumulators {
            group.insert(name, expr);
        }
        self.stage("$group", group)
    }

    /// Append a single-key `$sort` stage
    pub fn sort(self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_by([(field, direction)])
    }

    /// Append one `$sort` stage over several keys, in the given order
    pub fn sort_by<K: Into<String>>(self, fields: impl IntoIterator<Item = (K, SortDirection)>) -> Self {
        let mut sort = BsonDocument::new();
        for (field, direction) in fields {
            sort.insert(field, direction);
        }
        self.stage("$sort", sort)
    }

    /// Append a `$lookup` join stage
    pub fn lookup(
        self,
        from: impl Into<String>,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
        as_field: impl Into<String>,
    ) -> Self {
        self.stage(
            "$lookup",
            doc! {
                "from": from.into(),
                "localField": local_field.into(),
                "foreignField": foreign_field.into(),
                "as": as_field.into(),
            },
        )
    }

    /// Append an `$unwind` stage for an array field
    pub fn unwind(self, path: impl AsRef<str>) -> Self {
        let path = field_reference(path.as_ref());
        self.stage("$unwind", path)
    }

    /// Append an `$unwind` stage that keeps documents with missing or empty arrays
    pub fn unwind_preserving(self, path: impl AsRef<str>) -> Self {
        let path = field_reference(path.as_ref());
        self.stage(
            "$unwind",
            doc! { "path": path, "preserveNullAndEmptyArrays": true },
        )
    }

    pub fn limit(self, limit: i64) -> Self {
        self.stage("$limit", limit)
    }

    pub fn skip(self, skip: i64) -> Self {
        self.stage("$skip", skip)
    }

    pub fn project(self, projection: BsonDocument) -> Self {
        self.stage("$project", projection)
    }

    pub fn add_fields(self, fields: BsonDocument) -> Self {
        self.stage("$addFields", fields)
    }

    /// Append a `$count` stage writing the count to `field`
    pub fn count(self, field: impl Into<String>) -> Self {
        self.stage("$count", field.into())
    }

    pub fn sample(self, size: i64) -> Self {
        self.stage("$sample", doc! { "size": size })
    }

    /// Append the search builder's `$search` stage
    pub fn search(mut self, search: &AtlasSearchBuilder) -> Result<Self> {
        self.stages.push(Stage::new("$search", search.build()?));
        Ok(self)
    }

    /// Append the search builder's `$searchMeta` stage
    pub fn search_meta(mut self, search: &AtlasSearchBuilder) -> Result<Self> {
        self.stages.push(Stage::new("$searchMeta", search.build()?));
        Ok(self)
    }

    /// Stages appended so far
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Build the pipeline as an ordered list of stage documents
    pub fn build(&self) -> Vec<BsonDocument> {
        let pipeline: Vec<BsonDocument> = self.stages.iter().map(Stage::to_document).collect();
        tracing::debug!(stages = pipeline.len(), "Built aggregation pipeline");
        pipeline
    }
}

/// Prefix a field path with `$` for use as an expression.
fn field_reference(path: &str) -> String {
    if path.starts_with('$') {
        path.to_string()
    } else {
        format!("${}", path)
    }
}

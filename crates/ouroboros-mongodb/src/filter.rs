//! Query filter builder for MongoDB find/match predicates
//!
//! Filters are built field by field: [`QueryFilter::field`] returns a
//! [`FieldCondition`] whose predicate methods hand the filter back, so each
//! predicate is always bound to an explicit field.
//!
//! ```ignore
//! use ouroboros_mongodb::QueryFilter;
//!
//! let filter = QueryFilter::new()
//!     .field("age").between(18, 65)
//!     .field("status").equals("active")
//!     .build()?;
//! // { "age": { "$gte": 18, "$lte": 65 }, "status": "active" }
//! ```

use bson::{Bson, Document as BsonDocument};
use ouroboros_common::{DataBridgeError, Result};

use crate::validation::validate_field_path;

/// Field comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Equal ($eq)
    Eq,
    /// Not equal ($ne)
    Ne,
    /// Greater than ($gt)
    Gt,
    /// Greater than or equal ($gte)
    Gte,
    /// Less than ($lt)
    Lt,
    /// Less than or equal ($lte)
    Lte,
    /// Value in list ($in)
    In,
    /// Value not in list ($nin)
    NotIn,
    /// Field presence ($exists)
    Exists,
}

impl Operator {
    /// Returns the MongoDB operator key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::In => "$in",
            Operator::NotIn => "$nin",
            Operator::Exists => "$exists",
        }
    }

    fn is_list(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

/// Logical combinators that nest whole filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
    Nor,
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "$and",
            LogicalOperator::Or => "$or",
            LogicalOperator::Nor => "$nor",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Compare(Operator, Bson),
    /// Inclusive range, checked for orderable bounds at build time
    Between(Bson, Bson),
    Regex { pattern: String, options: Option<String> },
}

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    Field { name: String, predicates: Vec<Predicate> },
    Logical { operator: LogicalOperator, filters: Vec<QueryFilter> },
}

/// Fluent builder for MongoDB filter documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilter {
    /// Top-level clauses in first-seen order
    clauses: Vec<Clause>,
}

impl QueryFilter {
    /// Create an empty filter (matches every document)
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a field for the next predicate
    pub fn field(self, name: impl Into<String>) -> FieldCondition {
        FieldCondition {
            filter: self,
            field: name.into(),
        }
    }

    /// Nest filters under `$or`
    pub fn or(self, filters: impl IntoIterator<Item = QueryFilter>) -> Self {
        self.logical(LogicalOperator::Or, filters)
    }

    /// Nest filters under `$and`
    pub fn and(self, filters: impl IntoIterator<Item = QueryFilter>) -> Self {
        self.logical(LogicalOperator::And, filters)
    }

    /// Nest filters under `$nor`
    pub fn nor(self, filters: impl IntoIterator<Item = QueryFilter>) -> Self {
        self.logical(LogicalOperator::Nor, filters)
    }

    /// Returns true if no predicate or combinator has been added
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Build the filter document.
    ///
    /// # Errors
    ///
    /// - `DataBridgeError::Query` if a `between` bound is not a number or date
    /// - `DataBridgeError::Validation` if a field name is empty or starts with `$`
    pub fn build(&self) -> Result<BsonDocument> {
        let mut filter = BsonDocument::new();
        for clause in &self.clauses {
            match clause {
                Clause::Field { name, predicates } => {
                    validate_field_path(name)?;
                    filter.insert(name.clone(), lower_predicates(name, predicates)?);
                }
                Clause::Logical { operator, filters } => {
                    let nested = filters
                        .iter()
                        .map(|f| f.build().map(Bson::Document))
                        .collect::<Result<Vec<_>>>()?;
                    filter.insert(operator.as_str(), nested);
                }
            }
        }
        Ok(filter)
    }

    fn logical(mut self, operator: LogicalOperator, filters: impl IntoIterator<Item = QueryFilter>) -> Self {
        let filters: Vec<QueryFilter> = filters.into_iter().collect();
        // $and / $or / $nor must be non-empty arrays
        if filters.is_empty() {
            tracing::trace!(operator = operator.as_str(), "Skipping combinator without filters");
            return self;
        }
        let existing = self.clauses.iter_mut().find_map(|clause| match clause {
            Clause::Logical { operator: op, filters } if *op == operator => Some(filters),
            _ => None,
        });
        match existing {
            Some(nested) => nested.extend(filters),
            None => self.clauses.push(Clause::Logical { operator, filters }),
        }
        self
    }

    fn push_predicate(&mut self, field: String, predicate: Predicate) {
        let existing = self.clauses.iter_mut().find_map(|clause| match clause {
            Clause::Field { name, predicates } if *name == field => Some(predicates),
            _ => None,
        });
        match existing {
            Some(predicates) => predicates.push(predicate),
            None => self.clauses.push(Clause::Field {
                name: field,
                predicates: vec![predicate],
            }),
        }
    }
}

/// A field selected on a [`QueryFilter`], waiting for its predicate.
#[derive(Debug, Clone)]
#[must_use = "a field condition does nothing until a predicate is applied"]
pub struct FieldCondition {
    filter: QueryFilter,
    field: String,
}

impl FieldCondition {
    /// Field equals value
    pub fn equals(self, value: impl Into<Bson>) -> QueryFilter {
        self.compare(Operator::Eq, value.into())
    }

    /// Field does not equal value
    pub fn not_equals(self, value: impl Into<Bson>) -> QueryFilter {
        self.compare(Operator::Ne, value.into())
    }

    pub fn greater_than(self, value: impl Into<Bson>) -> QueryFilter {
        self.compare(Operator::Gt, value.into())
    }

    pub fn greater_than_or_equal(self, value: impl Into<Bson>) -> QueryFilter {
        self.compare(Operator::Gte, value.into())
    }

    pub fn less_than(self, value: impl Into<Bson>) -> QueryFilter {
        self.compare(Operator::Lt, value.into())
    }

    pub fn less_than_or_equal(self, value: impl Into<Bson>) -> QueryFilter {
        self.compare(Operator::Lte, value.into())
    }

    /// Inclusive range `low <= field <= high`.
    ///
    /// Both bounds must be numbers or dates; this is checked by `build()`.
    pub fn between(self, low: impl Into<Bson>, high: impl Into<Bson>) -> QueryFilter {
        self.push(Predicate::Between(low.into(), high.into()))
    }

    /// Field presence check
    pub fn exists(self, exists: bool) -> QueryFilter {
        self.compare(Operator::Exists, Bson::Boolean(exists))
    }

    /// Field value is one of `values`
    pub fn in_values<V: Into<Bson>>(self, values: impl IntoIterator<Item = V>) -> QueryFilter {
        self.compare(Operator::In, collect_array(values))
    }

    /// Field value is none of `values`
    pub fn not_in<V: Into<Bson>>(self, values: impl IntoIterator<Item = V>) -> QueryFilter {
        self.compare(Operator::NotIn, collect_array(values))
    }

    /// Regular expression match with optional flags (e.g. `"i"`)
    pub fn regex(self, pattern: impl Into<String>, options: Option<&str>) -> QueryFilter {
        self.push(Predicate::Regex {
            pattern: pattern.into(),
            options: options.map(str::to_string),
        })
    }

    fn compare(self, operator: Operator, value: Bson) -> QueryFilter {
        self.push(Predicate::Compare(operator, value))
    }

    fn push(self, predicate: Predicate) -> QueryFilter {
        let FieldCondition { mut filter, field } = self;
        filter.push_predicate(field, predicate);
        filter
    }
}

fn collect_array<V: Into<Bson>>(values: impl IntoIterator<Item = V>) -> Bson {
    Bson::Array(values.into_iter().map(Into::into).collect())
}

/// Numbers, dates and timestamps have a defined ordering for range queries.
fn is_orderable(value: &Bson) -> bool {
    matches!(
        value,
        Bson::Int32(_)
            | Bson::Int64(_)
            | Bson::Double(_)
            | Bson::Decimal128(_)
            | Bson::DateTime(_)
            | Bson::Timestamp(_)
    )
}

/// Merge all predicates on one field into its comparison value.
fn lower_predicates(field: &str, predicates: &[Predicate]) -> Result<Bson> {
    let mut ops = BsonDocument::new();
    for predicate in predicates {
        match predicate {
            Predicate::Compare(op, value) if op.is_list() => {
                let items = match value {
                    Bson::Array(items) => items.clone(),
                    other => vec![other.clone()],
                };
                if let Some(Bson::Array(existing)) = ops.get_mut(op.as_str()) {
                    existing.extend(items);
                } else {
                    ops.insert(op.as_str(), Bson::Array(items));
                }
            }
            Predicate::Compare(op, value) => {
                ops.insert(op.as_str(), value.clone());
            }
            Predicate::Between(low, high) => {
                for bound in [low, high] {
                    if !is_orderable(bound) {
                        return Err(DataBridgeError::Query(format!(
                            "between() on field '{}' requires number or date bounds, got {:?}",
                            field,
                            bound.element_type()
                        )));
                    }
                }
                ops.insert("$gte", low.clone());
                ops.insert("$lte", high.clone());
            }
            Predicate::Regex { pattern, options } => {
                ops.insert("$regex", pattern.clone());
                if let Some(options) = options {
                    ops.insert("$options", options.clone());
                }
            }
        }
    }

    // A lone equality is written as the bare value
    if ops.len() == 1 {
        if let Some(value) = ops.get("$eq") {
            return Ok(value.clone());
        }
    }
    Ok(Bson::Document(ops))
}

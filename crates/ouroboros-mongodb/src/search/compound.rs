//! Compound (boolean) Atlas Search clauses.
//!
//! A [`CompoundBuilder`] holds four independent groups. Selecting a group with
//! [`CompoundBuilder::must`] and friends returns a [`ClauseBuilder`] bound to
//! that group only:
//!
//! ```ignore
//! let mut compound = CompoundBuilder::new();
//! compound.must().text("python", "skills");
//! compound.should().text("senior", "level").exists("certifications");
//! compound.must_not().equals("archived", true);
//! ```

use bson::{doc, Bson, Document as BsonDocument};

use super::clause::{
    AutocompleteClause, EqualsClause, ExistsClause, PhraseClause, RangeClause, SearchOperator,
    SearchPath, TextClause,
};

/// The four boolean groups of a compound clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompoundGroup {
    /// Required, contributes to score
    Must,
    /// Optional, contributes to score
    Should,
    /// Required, does not score
    Filter,
    /// Excluded
    MustNot,
}

impl CompoundGroup {
    /// Output order of groups in the built document
    pub const ALL: [CompoundGroup; 4] = [
        CompoundGroup::Must,
        CompoundGroup::Should,
        CompoundGroup::Filter,
        CompoundGroup::MustNot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompoundGroup::Must => "must",
            CompoundGroup::Should => "should",
            CompoundGroup::Filter => "filter",
            CompoundGroup::MustNot => "mustNot",
        }
    }
}

/// Builder for `compound` search operators
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompoundBuilder {
    must: Vec<BsonDocument>,
    should: Vec<BsonDocument>,
    filter: Vec<BsonDocument>,
    must_not: Vec<BsonDocument>,
    minimum_should_match: Option<u32>,
}

impl CompoundBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clauses that must match
    pub fn must(&mut self) -> ClauseBuilder<'_> {
        self.group(CompoundGroup::Must)
    }

    /// Clauses that should match
    pub fn should(&mut self) -> ClauseBuilder<'_> {
        self.group(CompoundGroup::Should)
    }

    /// Clauses that must match but do not affect the score
    pub fn filter(&mut self) -> ClauseBuilder<'_> {
        self.group(CompoundGroup::Filter)
    }

    /// Clauses that must not match
    pub fn must_not(&mut self) -> ClauseBuilder<'_> {
        self.group(CompoundGroup::MustNot)
    }

    /// Scoped builder for any group
    pub fn group(&mut self, group: CompoundGroup) -> ClauseBuilder<'_> {
        ClauseBuilder {
            group,
            clauses: self.clauses_mut(group),
        }
    }

    /// Minimum number of `should` clauses that have to match
    pub fn minimum_should_match(&mut self, count: u32) -> &mut Self {
        self.minimum_should_match = Some(count);
        self
    }

    /// Clauses currently in `group`
    pub fn clauses(&self, group: CompoundGroup) -> &[BsonDocument] {
        match group {
            CompoundGroup::Must => &self.must,
            CompoundGroup::Should => &self.should,
            CompoundGroup::Filter => &self.filter,
            CompoundGroup::MustNot => &self.must_not,
        }
    }

    /// Total clauses across all groups
    pub fn clause_count(&self) -> usize {
        CompoundGroup::ALL.iter().map(|g| self.clauses(*g).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.clause_count() == 0
    }

    /// Build the compound body. Empty groups are never emitted.
    pub fn build(&self) -> BsonDocument {
        let mut compound = BsonDocument::new();
        for group in CompoundGroup::ALL {
            let clauses = self.clauses(group);
            if !clauses.is_empty() {
                compound.insert(group.as_str(), clauses.to_vec());
            }
        }
        if let Some(count) = self.minimum_should_match {
            if !self.should.is_empty() {
                compound.insert("minimumShouldMatch", i64::from(count));
            }
        }
        compound
    }

    fn clauses_mut(&mut self, group: CompoundGroup) -> &mut Vec<BsonDocument> {
        match group {
            CompoundGroup::Must => &mut self.must,
            CompoundGroup::Should => &mut self.should,
            CompoundGroup::Filter => &mut self.filter,
            CompoundGroup::MustNot => &mut self.must_not,
        }
    }
}

/// Appends clauses to one compound group.
pub struct ClauseBuilder<'a> {
    group: CompoundGroup,
    clauses: &'a mut Vec<BsonDocument>,
}

impl<'a> ClauseBuilder<'a> {
    /// Group this builder appends to
    pub fn group(&self) -> CompoundGroup {
        self.group
    }

    pub fn text(self, query: impl Into<String>, path: impl Into<SearchPath>) -> Self {
        self.clause(&TextClause::new(query, path))
    }

    pub fn phrase(self, query: impl Into<String>, path: impl Into<SearchPath>) -> Self {
        self.clause(&PhraseClause::new(query, path))
    }

    pub fn autocomplete(self, query: impl Into<String>, path: impl Into<SearchPath>) -> Self {
        self.clause(&AutocompleteClause::new(query, path))
    }

    pub fn equals(self, path: impl Into<SearchPath>, value: impl Into<Bson>) -> Self {
        self.clause(&EqualsClause::new(path, value))
    }

    pub fn range(self, range: RangeClause) -> Self {
        self.clause(&range)
    }

    pub fn exists(self, path: impl Into<SearchPath>) -> Self {
        self.clause(&ExistsClause::new(path))
    }

    /// Append any configured leaf clause
    pub fn clause(self, clause: &impl SearchOperator) -> Self {
        self.raw(clause.to_document())
    }

    /// Nest another compound clause. A nested compound without clauses is skipped.
    pub fn compound(self, nested: CompoundBuilder) -> Self {
        if nested.is_empty() {
            tracing::trace!(group = self.group.as_str(), "Skipping empty nested compound");
            return self;
        }
        self.raw(doc! { "compound": nested.build() })
    }

    /// Append a pre-built clause document
    pub fn raw(self, clause: BsonDocument) -> Self {
        self.clauses.push(clause);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_compound_builds_empty_document() {
        let compound = CompoundBuilder::new();
        assert!(compound.is_empty());
        assert_eq!(compound.build(), doc! {});
    }

    #[test]
    fn test_only_should_group_is_emitted() {
        let mut compound = CompoundBuilder::new();
        compound.should().text("senior", "level");
        assert_eq!(
            compound.build(),
            doc! { "should": [ { "text": { "query": "senior", "path": "level" } } ] }
        );
    }

    #[test]
    fn test_groups_do_not_cross_contaminate() {
        let mut compound = CompoundBuilder::new();
        compound.must().text("python", "skills").exists("email");
        compound.filter().equals("active", true);
        compound.must_not().phrase("intern", "title");

        assert_eq!(compound.clauses(CompoundGroup::Must).len(), 2);
        assert_eq!(compound.clauses(CompoundGroup::Filter).len(), 1);
        assert_eq!(compound.clauses(CompoundGroup::MustNot).len(), 1);
        assert!(compound.clauses(CompoundGroup::Should).is_empty());
        assert_eq!(compound.clause_count(), 4);

        let built = compound.build();
        let keys: Vec<&str> = built.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["must", "filter", "mustNot"]);
    }

    #[test]
    fn test_nested_compound() {
        let mut inner = CompoundBuilder::new();
        inner.should().text("a", "x").text("b", "x");

        let mut outer = CompoundBuilder::new();
        outer.must().compound(inner).range(RangeClause::new("age").gte(18));

        assert_eq!(
            outer.build(),
            doc! {
                "must": [
                    {
                        "compound": {
                            "should": [
                                { "text": { "query": "a", "path": "x" } },
                                { "text": { "query": "b", "path": "x" } },
                            ]
                        }
                    },
                    { "range": { "path": "age", "gte": 18 } },
                ]
            }
        );
    }

    #[test]
    fn test_empty_nested_compound_is_skipped() {
        let mut outer = CompoundBuilder::new();
        outer.filter().compound(CompoundBuilder::new());
        assert!(outer.is_empty());
        assert_eq!(outer.build(), doc! {});
    }

    #[test]
    fn test_minimum_should_match_only_with_should_clauses() {
        let mut compound = CompoundBuilder::new();
        compound.minimum_should_match(1);
        compound.must().exists("name");
        assert!(!compound.build().contains_key("minimumShouldMatch"));

        compound.should().text("x", "y");
        assert_eq!(compound.build().get_i64("minimumShouldMatch").unwrap(), 1);
    }

    #[test]
    fn test_build_is_idempotent() {
        let mut compound = CompoundBuilder::new();
        compound.must().text("python", "skills");
        assert_eq!(compound.build(), compound.build());
    }
}

//! Leaf Atlas Search clauses.
//!
//! Each clause renders as `{ "<operator>": { ...options } }`. The simple forms are
//! available directly on [`AtlasSearchBuilder`](super::AtlasSearchBuilder) and
//! [`ClauseBuilder`](super::ClauseBuilder); use these types when a clause needs
//! fuzzy matching, score boosts, slop and similar options.

use bson::{doc, Bson, Document as BsonDocument};

/// One field path or several, as accepted by the Atlas `path` option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPath {
    Single(String),
    Multi(Vec<String>),
}

impl SearchPath {
    /// All field paths referenced by this path option
    pub fn fields(&self) -> Vec<&str> {
        match self {
            SearchPath::Single(path) => vec![path.as_str()],
            SearchPath::Multi(paths) => paths.iter().map(String::as_str).collect(),
        }
    }

    pub fn to_bson(&self) -> Bson {
        match self {
            SearchPath::Single(path) => Bson::String(path.clone()),
            SearchPath::Multi(paths) => Bson::Array(paths.iter().cloned().map(Bson::String).collect()),
        }
    }
}

impl From<&str> for SearchPath {
    fn from(path: &str) -> Self {
        SearchPath::Single(path.to_string())
    }
}

impl From<String> for SearchPath {
    fn from(path: String) -> Self {
        SearchPath::Single(path)
    }
}

impl From<&String> for SearchPath {
    fn from(path: &String) -> Self {
        SearchPath::Single(path.clone())
    }
}

impl From<Vec<String>> for SearchPath {
    fn from(paths: Vec<String>) -> Self {
        SearchPath::Multi(paths)
    }
}

impl From<Vec<&str>> for SearchPath {
    fn from(paths: Vec<&str>) -> Self {
        SearchPath::Multi(paths.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for SearchPath {
    fn from(paths: [&str; N]) -> Self {
        SearchPath::Multi(paths.iter().map(|p| p.to_string()).collect())
    }
}

/// Atlas Search operator kinds that can appear as a leaf clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseKind {
    Text,
    Phrase,
    Autocomplete,
    Equals,
    Range,
    Exists,
}

impl ClauseKind {
    /// Operator key used in the search document
    pub fn as_str(&self) -> &'static str {
        match self {
            ClauseKind::Text => "text",
            ClauseKind::Phrase => "phrase",
            ClauseKind::Autocomplete => "autocomplete",
            ClauseKind::Equals => "equals",
            ClauseKind::Range => "range",
            ClauseKind::Exists => "exists",
        }
    }
}

/// A leaf clause that can be used as the top-level search operator or inside a
/// compound group.
pub trait SearchOperator {
    fn kind(&self) -> ClauseKind;

    /// Field path(s) the clause targets
    fn path(&self) -> &SearchPath;

    /// Operator options, without the operator key
    fn body(&self) -> BsonDocument;

    /// Full clause document: `{ kind: body }`
    fn to_document(&self) -> BsonDocument {
        let mut clause = BsonDocument::new();
        clause.insert(self.kind().as_str(), self.body());
        clause
    }
}

fn boost(value: f64) -> BsonDocument {
    doc! { "boost": { "value": value } }
}

fn insert_score(body: &mut BsonDocument, score: Option<f64>) {
    if let Some(score) = score {
        body.insert("score", boost(score));
    }
}

/// Full-text `text` clause
#[derive(Debug, Clone, PartialEq)]
pub struct TextClause {
    query: String,
    path: SearchPath,
    fuzzy: Option<BsonDocument>,
    score: Option<f64>,
    synonyms: Option<String>,
}

impl TextClause {
    pub fn new(query: impl Into<String>, path: impl Into<SearchPath>) -> Self {
        Self {
            query: query.into(),
            path: path.into(),
            fuzzy: None,
            score: None,
            synonyms: None,
        }
    }

    /// Fuzzy matching options, e.g. `doc! { "maxEdits": 2 }`
    pub fn fuzzy(mut self, fuzzy: BsonDocument) -> Self {
        self.fuzzy = Some(fuzzy);
        self
    }

    /// Boost the relevance score by `value`
    pub fn score(mut self, value: f64) -> Self {
        self.score = Some(value);
        self
    }

    /// Name of a synonym mapping defined on the index
    pub fn synonyms(mut self, mapping: impl Into<String>) -> Self {
        self.synonyms = Some(mapping.into());
        self
    }
}

impl SearchOperator for TextClause {
    fn kind(&self) -> ClauseKind {
        ClauseKind::Text
    }

    fn path(&self) -> &SearchPath {
        &self.path
    }

    fn body(&self) -> BsonDocument {
        let mut body = doc! { "query": self.query.clone(), "path": self.path.to_bson() };
        if let Some(fuzzy) = &self.fuzzy {
            body.insert("fuzzy", fuzzy.clone());
        }
        if let Some(synonyms) = &self.synonyms {
            body.insert("synonyms", synonyms.clone());
        }
        insert_score(&mut body, self.score);
        body
    }
}

/// Ordered-terms `phrase` clause
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseClause {
    query: String,
    path: SearchPath,
    slop: Option<u32>,
    score: Option<f64>,
}

impl PhraseClause {
    pub fn new(query: impl Into<String>, path: impl Into<SearchPath>) -> Self {
        Self {
            query: query.into(),
            path: path.into(),
            slop: None,
            score: None,
        }
    }

    /// Allowed distance between the phrase terms
    pub fn slop(mut self, slop: u32) -> Self {
        self.slop = Some(slop);
        self
    }

    pub fn score(mut self, value: f64) -> Self {
        self.score = Some(value);
        self
    }
}

impl SearchOperator for PhraseClause {
    fn kind(&self) -> ClauseKind {
        ClauseKind::Phrase
    }

    fn path(&self) -> &SearchPath {
        &self.path
    }

    fn body(&self) -> BsonDocument {
        let mut body = doc! { "query": self.query.clone(), "path": self.path.to_bson() };
        if let Some(slop) = self.slop {
            body.insert("slop", i64::from(slop));
        }
        insert_score(&mut body, self.score);
        body
    }
}

/// Token ordering for autocomplete queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrder {
    Any,
    Sequential,
}

impl TokenOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenOrder::Any => "any",
            TokenOrder::Sequential => "sequential",
        }
    }
}

/// Search-as-you-type `autocomplete` clause
#[derive(Debug, Clone, PartialEq)]
pub struct AutocompleteClause {
    query: String,
    path: SearchPath,
    fuzzy: Option<BsonDocument>,
    token_order: Option<TokenOrder>,
    score: Option<f64>,
}

impl AutocompleteClause {
    pub fn new(query: impl Into<String>, path: impl Into<SearchPath>) -> Self {
        Self {
            query: query.into(),
            path: path.into(),
            fuzzy: None,
            token_order: None,
            score: None,
        }
    }

    pub fn fuzzy(mut self, fuzzy: BsonDocument) -> Self {
        self.fuzzy = Some(fuzzy);
        self
    }

    pub fn token_order(mut self, order: TokenOrder) -> Self {
        self.token_order = Some(order);
        self
    }

    pub fn score(mut self, value: f64) -> Self {
        self.score = Some(value);
        self
    }
}

impl SearchOperator for AutocompleteClause {
    fn kind(&self) -> ClauseKind {
        ClauseKind::Autocomplete
    }

    fn path(&self) -> &SearchPath {
        &self.path
    }

    fn body(&self) -> BsonDocument {
        let mut body = doc! { "query": self.query.clone(), "path": self.path.to_bson() };
        if let Some(fuzzy) = &self.fuzzy {
            body.insert("fuzzy", fuzzy.clone());
        }
        if let Some(order) = self.token_order {
            body.insert("tokenOrder", order.as_str());
        }
        insert_score(&mut body, self.score);
        body
    }
}

/// Exact-value `equals` clause (booleans, ObjectIds, numbers, dates, strings)
#[derive(Debug, Clone, PartialEq)]
pub struct EqualsClause {
    path: SearchPath,
    value: Bson,
    score: Option<f64>,
}

impl EqualsClause {
    pub fn new(path: impl Into<SearchPath>, value: impl Into<Bson>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
            score: None,
        }
    }

    pub fn score(mut self, value: f64) -> Self {
        self.score = Some(value);
        self
    }
}

impl SearchOperator for EqualsClause {
    fn kind(&self) -> ClauseKind {
        ClauseKind::Equals
    }

    fn path(&self) -> &SearchPath {
        &self.path
    }

    fn body(&self) -> BsonDocument {
        let mut body = doc! { "path": self.path.to_bson(), "value": self.value.clone() };
        insert_score(&mut body, self.score);
        body
    }
}

/// Numeric or date `range` clause. Unset bounds are omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeClause {
    path: SearchPath,
    gt: Option<Bson>,
    gte: Option<Bson>,
    lt: Option<Bson>,
    lte: Option<Bson>,
    score: Option<f64>,
}

impl RangeClause {
    pub fn new(path: impl Into<SearchPath>) -> Self {
        Self {
            path: path.into(),
            gt: None,
            gte: None,
            lt: None,
            lte: None,
            score: None,
        }
    }

    pub fn gt(mut self, value: impl Into<Bson>) -> Self {
        self.gt = Some(value.into());
        self
    }

    pub fn gte(mut self, value: impl Into<Bson>) -> Self {
        self.gte = Some(value.into());
        self
    }

    pub fn lt(mut self, value: impl Into<Bson>) -> Self {
        self.lt = Some(value.into());
        self
    }

    pub fn lte(mut self, value: impl Into<Bson>) -> Self {
        self.lte = Some(value.into());
        self
    }

    pub fn score(mut self, value: f64) -> Self {
        self.score = Some(value);
        self
    }
}

impl SearchOperator for RangeClause {
    fn kind(&self) -> ClauseKind {
        ClauseKind::Range
    }

    fn path(&self) -> &SearchPath {
        &self.path
    }

    fn body(&self) -> BsonDocument {
        let mut body = doc! { "path": self.path.to_bson() };
        for (key, bound) in [("gt", &self.gt), ("gte", &self.gte), ("lt", &self.lt), ("lte", &self.lte)] {
            if let Some(bound) = bound {
                body.insert(key, bound.clone());
            }
        }
        insert_score(&mut body, self.score);
        body
    }
}

/// Field-presence `exists` clause
#[derive(Debug, Clone, PartialEq)]
pub struct ExistsClause {
    path: SearchPath,
    score: Option<f64>,
}

impl ExistsClause {
    pub fn new(path: impl Into<SearchPath>) -> Self {
        Self {
            path: path.into(),
            score: None,
        }
    }

    pub fn score(mut self, value: f64) -> Self {
        self.score = Some(value);
        self
    }
}

impl SearchOperator for ExistsClause {
    fn kind(&self) -> ClauseKind {
        ClauseKind::Exists
    }

    fn path(&self) -> &SearchPath {
        &self.path
    }

    fn body(&self) -> BsonDocument {
        let mut body = doc! { "path": self.path.to_bson() };
        insert_score(&mut body, self.score);
        body
    }
}

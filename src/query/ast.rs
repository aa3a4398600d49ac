use std::ops::Bound;
use serde::{Serialize, Deserialize};

/// Main query enum representing all query types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Query {
    Term(TermQuery),         // Single term search
    Phrase(PhraseQuery),     // Positional phrase match, optionally sloppy
    Bool(BoolQuery),         // Boolean combinations
    Range(RangeQuery),       // Numeric range
    Prefix(PrefixQuery),
    Wildcard(WildcardQuery), // Pattern matching (* and ?)
    Fuzzy(FuzzyQuery),       // Typo tolerance
    MatchAll(MatchAllQuery), // Match all documents
}

/// Single term query, matched verbatim against indexed terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermQuery {
    pub field: String,
    pub value: String,
    pub boost: Option<f32>,
}

/// Phrase query over analyzed terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseQuery {
    pub field: String,
    pub phrase: Vec<String>,
    pub slop: u32,  // Max position moves allowed to line the terms up
    pub boost: Option<f32>,
}

/// How a clause takes part in a boolean query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Occur {
    Must,
    Should,
    MustNot,
    Filter,
}

/// Boolean query with must/should/must_not clauses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoolQuery {
    pub must: Vec<Query>,      // All must match (AND)
    pub should: Vec<Query>,    // At least one must match when alone (OR)
    pub must_not: Vec<Query>,  // None must match (NOT)
    pub filter: Vec<Query>,    // Must match but don't affect score
    pub minimum_should_match: Option<u32>,
    pub boost: Option<f32>,
}

/// Range query for numeric fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeQuery {
    pub field: String,
    pub gt: Option<i64>,   // Greater than
    pub gte: Option<i64>,  // Greater than or equal
    pub lt: Option<i64>,   // Less than
    pub lte: Option<i64>,  // Less than or equal
    pub boost: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixQuery {
    pub field: String,
    pub prefix: String,
    pub boost: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WildcardQuery {
    pub field: String,
    pub pattern: String, // Pattern with wildcards (* and ?)
    pub boost: Option<f32>,
}

/// Fuzzy query implementation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyQuery {
    pub field: String,
    pub term: String,
    pub max_edits: Option<u8>,      // Default: index config (2)
    pub prefix_length: Option<u8>,  // Default: 0 (no prefix lock)
    pub transpositions: bool,       // Count a swap of adjacent chars as one edit
    pub boost: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchAllQuery {
    pub boost: Option<f32>,
}

impl Query {
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Term(TermQuery { field: field.into(), value: value.into(), boost: None })
    }

    pub fn phrase<S: Into<String>>(field: impl Into<String>, phrase: Vec<S>, slop: u32) -> Self {
        Query::Phrase(PhraseQuery {
            field: field.into(),
            phrase: phrase.into_iter().map(Into::into).collect(),
            slop,
            boost: None,
        })
    }

    pub fn prefix(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Query::Prefix(PrefixQuery { field: field.into(), prefix: prefix.into(), boost: None })
    }

    pub fn wildcard(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Query::Wildcard(WildcardQuery { field: field.into(), pattern: pattern.into(), boost: None })
    }

    pub fn fuzzy(field: impl Into<String>, term: impl Into<String>, max_edits: u8) -> Self {
        Query::Fuzzy(FuzzyQuery {
            field: field.into(),
            term: term.into(),
            max_edits: Some(max_edits),
            prefix_length: None,
            transpositions: false,
            boost: None,
        })
    }

    /// Inclusive range `[low, high]`
    pub fn range(field: impl Into<String>, low: i64, high: i64) -> Self {
        Query::Range(RangeQuery::new(field).gte(low).lte(high))
    }

    pub fn match_all() -> Self {
        Query::MatchAll(MatchAllQuery::default())
    }

    /// The same term looked up in several fields, any of which may match
    pub fn multi_field_term<F, S>(fields: F, value: &str) -> Self
    where
        F: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let bool_query = fields.into_iter()
            .fold(BoolQuery::new(), |q, field| q.with_should(Query::term(field, value)));
        Query::Bool(bool_query)
    }

    pub fn boost(&self) -> Option<f32> {
        match self {
            Query::Term(q) => q.boost,
            Query::Phrase(q) => q.boost,
            Query::Bool(q) => q.boost,
            Query::Range(q) => q.boost,
            Query::Prefix(q) => q.boost,
            Query::Wildcard(q) => q.boost,
            Query::Fuzzy(q) => q.boost,
            Query::MatchAll(q) => q.boost,
        }
    }

    pub fn boosted(mut self, boost: f32) -> Self {
        let slot = match &mut self {
            Query::Term(q) => &mut q.boost,
            Query::Phrase(q) => &mut q.boost,
            Query::Bool(q) => &mut q.boost,
            Query::Range(q) => &mut q.boost,
            Query::Prefix(q) => &mut q.boost,
            Query::Wildcard(q) => &mut q.boost,
            Query::Fuzzy(q) => &mut q.boost,
            Query::MatchAll(q) => &mut q.boost,
        };
        *slot = Some(boost);
        self
    }
}

impl From<BoolQuery> for Query {
    fn from(query: BoolQuery) -> Self {
        Query::Bool(query)
    }
}

impl BoolQuery {
    pub fn new() -> Self {
        BoolQuery {
            must: Vec::new(),
            should: Vec::new(),
            must_not: Vec::new(),
            filter: Vec::new(),
            minimum_should_match: None,
            boost: None,
        }
    }

    pub fn add(mut self, occur: Occur, query: Query) -> Self {
        match occur {
            Occur::Must => self.must.push(query),
            Occur::Should => self.should.push(query),
            Occur::MustNot => self.must_not.push(query),
            Occur::Filter => self.filter.push(query),
        }
        self
    }

    pub fn with_must(self, query: Query) -> Self {
        self.add(Occur::Must, query)
    }

    pub fn with_should(self, query: Query) -> Self {
        self.add(Occur::Should, query)
    }

    pub fn with_must_not(self, query: Query) -> Self {
        self.add(Occur::MustNot, query)
    }

    pub fn with_filter(self, query: Query) -> Self {
        self.add(Occur::Filter, query)
    }

    pub fn with_minimum_should_match(mut self, minimum: u32) -> Self {
        self.minimum_should_match = Some(minimum);
        self
    }

    pub fn clause_count(&self) -> usize {
        self.must.len() + self.should.len() + self.must_not.len() + self.filter.len()
    }
}

impl Default for BoolQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeQuery {
    pub fn new(field: impl Into<String>) -> Self {
        RangeQuery { field: field.into(), gt: None, gte: None, lt: None, lte: None, boost: None }
    }

    pub fn gt(mut self, value: i64) -> Self {
        self.gt = Some(value);
        self
    }

    pub fn gte(mut self, value: i64) -> Self {
        self.gte = Some(value);
        self
    }

    pub fn lt(mut self, value: i64) -> Self {
        self.lt = Some(value);
        self
    }

    pub fn lte(mut self, value: i64) -> Self {
        self.lte = Some(value);
        self
    }

    /// Bounds for the numeric index. Callers validate first: at most one of gt/gte and of lt/lte.
    pub fn bounds(&self) -> (Bound<i64>, Bound<i64>) {
        let low = match (self.gt, self.gte) {
            (Some(v), _) => Bound::Excluded(v),
            (None, Some(v)) => Bound::Included(v),
            (None, None) => Bound::Unbounded,
        };
        let high = match (self.lt, self.lte) {
            (Some(v), _) => Bound::Excluded(v),
            (None, Some(v)) => Bound::Included(v),
            (None, None) => Bound::Unbounded,
        };
        (low, high)
    }
}

impl Default for FuzzyQuery {
    fn default() -> Self {
        FuzzyQuery {
            field: String::new(),
            term: String::new(),
            max_edits: None,
            prefix_length: None,
            transpositions: false,
            boost: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_field_term_is_should_only() {
        match Query::multi_field_term(["title", "content"], "solr") {
            Query::Bool(q) => {
                assert_eq!(q.should, vec![Query::term("title", "solr"), Query::term("content", "solr")]);
                assert!(q.must.is_empty() && q.filter.is_empty() && q.must_not.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_boosted_sets_leaf_boost() {
        assert_eq!(Query::prefix("title", "sea").boosted(2.5).boost(), Some(2.5));
        assert_eq!(Query::match_all().boost(), None);
    }

    #[test]
    fn test_range_bounds() {
        let (low, high) = RangeQuery::new("id").gt(1).lte(3).bounds();
        assert_eq!(low, Bound::Excluded(1));
        assert_eq!(high, Bound::Included(3));
        assert_eq!(RangeQuery::new("id").bounds(), (Bound::Unbounded, Bound::Unbounded));
    }
}

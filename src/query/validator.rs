use crate::core::config::{IndexConfig, MAX_FUZZY_EDITS};
use crate::core::error::{Error, Result};
use crate::query::ast::{BoolQuery, Query};
use crate::schema::schema::{FieldType, Schema};

/// Rejects malformed queries before any segment is touched
pub struct QueryValidator<'a> {
    schema: &'a Schema,
    config: &'a IndexConfig,
}

impl<'a> QueryValidator<'a> {
    pub fn new(schema: &'a Schema, config: &'a IndexConfig) -> Self {
        QueryValidator { schema, config }
    }

    pub fn validate(&self, query: &Query) -> Result<()> {
        self.validate_at(query, 1)
    }

    fn validate_at(&self, query: &Query, depth: usize) -> Result<()> {
        if depth > self.config.max_query_depth {
            return Err(Error::invalid_argument(format!(
                "query nesting exceeds {} levels", self.config.max_query_depth
            )));
        }
        check_boost(query.boost())?;

        match query {
            Query::MatchAll(_) => Ok(()),

            Query::Term(q) => self.schema.require(&q.field).map(|_| ()),

            Query::Prefix(q) => self.schema.require(&q.field).map(|_| ()),

            Query::Wildcard(q) => {
                self.schema.require(&q.field)?;
                if q.pattern.is_empty() {
                    return Err(Error::invalid_argument("wildcard pattern is empty"));
                }
                Ok(())
            }

            Query::Fuzzy(q) => {
                self.schema.require(&q.field)?;
                let edits = q.max_edits.unwrap_or(self.config.fuzzy_max_edits);
                if edits > MAX_FUZZY_EDITS {
                    return Err(Error::invalid_argument(format!(
                        "fuzzy distance must be between 0 and {}, got {}", MAX_FUZZY_EDITS, edits
                    )));
                }
                if q.term.is_empty() {
                    return Err(Error::invalid_argument("fuzzy term is empty"));
                }
                Ok(())
            }

            Query::Range(q) => {
                if self.schema.require(&q.field)? != FieldType::Long {
                    return Err(Error::invalid_argument(format!(
                        "range query on non-numeric field '{}'", q.field
                    )));
                }
                if q.gt.is_some() && q.gte.is_some() {
                    return Err(Error::invalid_argument("range sets both gt and gte"));
                }
                if q.lt.is_some() && q.lte.is_some() {
                    return Err(Error::invalid_argument("range sets both lt and lte"));
                }
                Ok(())
            }

            Query::Phrase(q) => {
                if !self.schema.require(&q.field)?.has_positions() {
                    return Err(Error::invalid_argument(format!(
                        "phrase query on numeric field '{}'", q.field
                    )));
                }
                if q.phrase.is_empty() {
                    return Err(Error::invalid_argument("phrase has no terms"));
                }
                Ok(())
            }

            Query::Bool(q) => self.validate_bool(q, depth),
        }
    }

    fn validate_bool(&self, query: &BoolQuery, depth: usize) -> Result<()> {
        if query.clause_count() > self.config.max_bool_clauses {
            return Err(Error::invalid_argument(format!(
                "boolean query has {} clauses, limit is {}",
                query.clause_count(), self.config.max_bool_clauses
            )));
        }

        query.must.iter()
            .chain(&query.should)
            .chain(&query.must_not)
            .chain(&query.filter)
            .try_for_each(|clause| self.validate_at(clause, depth + 1))
    }
}

fn check_boost(boost: Option<f32>) -> Result<()> {
    match boost {
        Some(b) if !b.is_finite() || b < 0.0 => {
            Err(Error::invalid_argument(format!("boost must be a finite non-negative number, got {}", b)))
        }
        _ => Ok(()),
    }
}

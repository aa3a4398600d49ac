use std::collections::BTreeMap;
use rayon::prelude::*;
use roaring::RoaringBitmap;
use tracing::debug;
use crate::core::config::IndexConfig;
use crate::core::error::{Error, Result};
use crate::index::inverted::FieldIndex;
use crate::index::posting::PostingList;
use crate::mvcc::controller::{LiveSegment, Snapshot};
use crate::query::ast::{BoolQuery, FuzzyQuery, PhraseQuery, Query};
use crate::query::matcher::{phrase_freq, WildcardPattern};
use crate::query::validator::QueryValidator;
use crate::schema::schema::{FieldType, Schema};
use crate::scoring::scorer::{DocStats, Scorer};
use crate::scoring::stats::CollectionStats;
use crate::search::fuzzy::FuzzyAutomaton;
use crate::search::results::{Candidate, Sort, TopDocs, TopKCollector};
use crate::storage::segment::Segment;

/// Per-segment evaluation result: ordinal -> score
pub type DocScores = BTreeMap<u32, f32>;

/// Evaluates queries against the segments of one snapshot.
/// Statistics are taken over all segments, so scores from different
/// segments are comparable.
pub struct SearchContext<'a> {
    segments: &'a [LiveSegment],
    schema: &'a Schema,
    config: &'a IndexConfig,
    scorer: Box<dyn Scorer>,
    stats: CollectionStats,
}

impl<'a> SearchContext<'a> {
    pub fn new(snapshot: &'a Snapshot, config: &'a IndexConfig) -> Self {
        Self::over(&snapshot.segments, &snapshot.schema, config)
    }

    pub fn over(segments: &'a [LiveSegment], schema: &'a Schema, config: &'a IndexConfig) -> Self {
        SearchContext {
            segments,
            schema,
            config,
            scorer: config.scoring.scorer(),
            stats: CollectionStats::from_segments(segments),
        }
    }

    pub fn validate(&self, query: &Query) -> Result<()> {
        QueryValidator::new(self.schema, self.config).validate(query)
    }

    pub fn validate_sort(&self, sort: &Sort) -> Result<()> {
        for name in sort.field_names() {
            if self.schema.require(name)? != FieldType::Long {
                return Err(Error::invalid_argument(format!(
                    "cannot sort on non-numeric field '{}'", name
                )));
            }
        }
        Ok(())
    }

    /// Ranked top `limit` live documents plus the total match count
    pub fn top_docs(&self, query: &Query, limit: usize, sort: Option<&Sort>, with_scores: bool) -> Result<TopDocs> {
        self.validate(query)?;
        if let Some(sort) = sort {
            self.validate_sort(sort)?;
        }

        let collectors = self.segments
            .par_iter()
            .map(|live| self.collect_segment(live, query, limit, sort))
            .collect::<Result<Vec<_>>>()?;

        let mut merged = TopKCollector::new(limit);
        for collector in collectors {
            merged.merge(collector);
        }

        let total_hits = merged.total_collected;
        let hits = merged.into_sorted()
            .into_iter()
            .map(|c| c.into_hit(with_scores))
            .collect::<Vec<_>>();

        debug!(total_hits, returned = hits.len(), segments = self.segments.len(), "query evaluated");
        Ok(TopDocs { total_hits, hits })
    }

    fn collect_segment(&self, live: &LiveSegment, query: &Query, limit: usize, sort: Option<&Sort>) -> Result<TopKCollector> {
        let segment = &live.segment;
        let mut collector = TopKCollector::new(limit);

        for (ordinal, score) in self.evaluate(segment, query)? {
            if !live.is_live(ordinal) {
                continue;
            }
            let doc_id = segment.doc_id(ordinal);
            collector.collect(Candidate::new(doc_id, score, sort, |field| segment.docs.numeric(field, ordinal)));
        }
        Ok(collector)
    }

    /// Every ordinal of `segment` the query matches, tombstoned or not
    pub fn matching_ordinals(&self, segment: &Segment, query: &Query) -> Result<RoaringBitmap> {
        Ok(self.evaluate(segment, query)?.into_keys().collect())
    }

    /// Documents containing the term across the snapshot, deleted ones included
    pub fn doc_freq(&self, field: &str, text: &str) -> u64 {
        self.segments.iter()
            .filter_map(|live| live.segment.index.field(field)?.lookup(text))
            .map(|list| list.doc_freq() as u64)
            .sum()
    }

    fn idf(&self, field: &str, text: &str) -> f32 {
        // A term only present in an uncommitted segment still needs a weight
        let doc_freq = self.doc_freq(field, text).max(1);
        self.scorer.idf(doc_freq, self.stats.max_doc.max(doc_freq))
    }

    fn evaluate(&self, segment: &Segment, query: &Query) -> Result<DocScores> {
        let boost = query.boost().unwrap_or(1.0);

        match query {
            Query::MatchAll(_) => Ok((0..segment.doc_count()).map(|ord| (ord, boost)).collect()),

            Query::Term(q) => Ok(self.term_scores(segment, &q.field, &q.value, boost)),

            Query::Prefix(q) => {
                let terms = self.expand(segment, &q.field, &q.prefix, |_| true);
                Ok(constant_scores(terms.into_iter().map(|(_, list)| list), boost))
            }

            Query::Wildcard(q) => {
                let pattern = WildcardPattern::compile(&q.pattern)?;
                let terms = self.expand(segment, &q.field, pattern.literal_prefix(), |t| pattern.matches(t));
                Ok(constant_scores(terms.into_iter().map(|(_, list)| list), boost))
            }

            Query::Fuzzy(q) => self.fuzzy_scores(segment, q, boost),

            Query::Range(q) => {
                let (low, high) = q.bounds();
                Ok(segment.docs.range(&q.field, low, high).iter().map(|ord| (ord, boost)).collect())
            }

            Query::Phrase(q) => Ok(self.phrase_scores(segment, q, boost)),

            Query::Bool(q) => self.bool_scores(segment, q, boost),
        }
    }

    fn doc_stats(&self, field: &FieldIndex, name: &str, ordinal: u32) -> DocStats {
        DocStats {
            field_length: field.field_length(ordinal),
            avg_field_length: self.stats.field(name).avg_length(),
        }
    }

    fn term_scores(&self, segment: &Segment, field: &str, text: &str, weight: f32) -> DocScores {
        let Some(field_index) = segment.index.field(field) else {
            return DocScores::new();
        };
        let Some(list) = field_index.lookup(text) else {
            return DocScores::new();
        };

        let idf = self.idf(field, text);
        list.iter()
            .map(|p| {
                let stats = self.doc_stats(field_index, field, p.ordinal);
                (p.ordinal, self.scorer.score(p.term_freq as f32, idf, &stats) * weight)
            })
            .collect()
    }

    /// Every dictionary term under `prefix` accepted by `accept`.
    /// Constant-score rewrites keep all of them; only fuzzy expansion is capped.
    fn expand<'s>(
        &self,
        segment: &'s Segment,
        field: &str,
        prefix: &str,
        accept: impl Fn(&str) -> bool,
    ) -> Vec<(String, &'s PostingList)> {
        let Some(field_index) = segment.index.field(field) else {
            return Vec::new();
        };
        field_index.terms_with_prefix(prefix)
            .into_iter()
            .filter(|(term, _)| accept(term))
            .collect()
    }

    fn fuzzy_scores(&self, segment: &Segment, query: &FuzzyQuery, boost: f32) -> Result<DocScores> {
        let edits = query.max_edits.unwrap_or(self.config.fuzzy_max_edits);
        let automaton = FuzzyAutomaton::new(&query.term, edits, query.transpositions)?;
        let prefix: String = query.term.chars().take(query.prefix_length.unwrap_or(0) as usize).collect();

        let Some(field_index) = segment.index.field(&query.field) else {
            return Ok(DocScores::new());
        };
        let mut matched: Vec<(u8, String)> = field_index.terms_with_prefix(&prefix)
            .into_iter()
            .filter_map(|(term, _)| automaton.distance(&term).map(|d| (d, term)))
            .collect();
        // Closest terms first, then dictionary order
        matched.sort();
        matched.truncate(self.config.max_expansions);

        let mut scores = DocScores::new();
        for (distance, term) in matched {
            let weight = boost * automaton.similarity(distance);
            for (ord, score) in self.term_scores(segment, &query.field, &term, weight) {
                let entry = scores.entry(ord).or_insert(score);
                *entry = entry.max(score);
            }
        }
        Ok(scores)
    }

    fn phrase_scores(&self, segment: &Segment, query: &PhraseQuery, boost: f32) -> DocScores {
        let mut scores = DocScores::new();
        let Some(field_index) = segment.index.field(&query.field) else {
            return scores;
        };

        let mut lists = Vec::with_capacity(query.phrase.len());
        for term in &query.phrase {
            match field_index.lookup(term) {
                Some(list) => lists.push(list),
                None => return scores,
            }
        }
        let idf: f32 = query.phrase.iter().map(|t| self.idf(&query.field, t)).sum();

        // Walk the rarest term's documents
        let Some(rarest) = lists.iter().min_by_key(|l| l.len()) else {
            return scores;
        };
        for posting in rarest.iter() {
            let ord = posting.ordinal;
            let positions: Option<Vec<&[u32]>> = lists.iter()
                .map(|l| l.get(ord).map(|p| p.positions.as_slice()))
                .collect();
            let Some(positions) = positions else {
                continue;
            };

            let freq = phrase_freq(&positions, query.slop);
            if freq > 0.0 {
                let stats = self.doc_stats(field_index, &query.field, ord);
                scores.insert(ord, self.scorer.score(freq, idf, &stats) * boost);
            }
        }
        scores
    }

    fn bool_scores(&self, segment: &Segment, query: &BoolQuery, boost: f32) -> Result<DocScores> {
        let mut required: Option<DocScores> = None;

        for clause in &query.must {
            let scores = self.evaluate(segment, clause)?;
            required = Some(match required {
                None => scores,
                Some(acc) => acc.into_iter()
                    .filter_map(|(ord, s)| scores.get(&ord).map(|other| (ord, s + other)))
                    .collect(),
            });
        }

        for clause in &query.filter {
            let scores = self.evaluate(segment, clause)?;
            required = Some(match required {
                None => scores.into_keys().map(|ord| (ord, 0.0)).collect(),
                Some(acc) => acc.into_iter().filter(|(ord, _)| scores.contains_key(ord)).collect(),
            });
        }

        let should = query.should.iter()
            .map(|clause| self.evaluate(segment, clause))
            .collect::<Result<Vec<_>>>()?;
        let minimum = query.minimum_should_match.map(|m| m as usize);

        let mut result: DocScores = match required {
            // SHOULD only adds score unless a minimum is set
            Some(base) => base.into_iter()
                .filter_map(|(ord, score)| {
                    let (hits, extra) = should_matches(&should, ord);
                    (hits >= minimum.unwrap_or(0)).then_some((ord, score + extra))
                })
                .collect(),
            None if should.is_empty() => DocScores::new(),
            None => {
                let minimum = minimum.unwrap_or(1).max(1);
                let mut counts: BTreeMap<u32, (usize, f32)> = BTreeMap::new();
                for scores in &should {
                    for (ord, score) in scores {
                        let entry = counts.entry(*ord).or_insert((0, 0.0));
                        entry.0 += 1;
                        entry.1 += score;
                    }
                }
                counts.into_iter()
                    .filter(|(_, (hits, _))| *hits >= minimum)
                    .map(|(ord, (_, score))| (ord, score))
                    .collect()
            }
        };

        for clause in &query.must_not {
            if result.is_empty() {
                break;
            }
            let excluded = self.evaluate(segment, clause)?;
            result.retain(|ord, _| !excluded.contains_key(ord));
        }

        if boost != 1.0 {
            result.values_mut().for_each(|s| *s *= boost);
        }
        Ok(result)
    }
}

fn should_matches(should: &[DocScores], ord: u32) -> (usize, f32) {
    should.iter()
        .filter_map(|scores| scores.get(&ord))
        .fold((0, 0.0), |(hits, sum), s| (hits + 1, sum + s))
}

fn constant_scores<'l>(lists: impl Iterator<Item = &'l PostingList>, boost: f32) -> DocScores {
    let mut ordinals = RoaringBitmap::new();
    for list in lists {
        ordinals.extend(list.iter().map(|p| p.ordinal));
    }
    ordinals.iter().map(|ord| (ord, boost)).collect()
}

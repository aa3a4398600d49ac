use std::collections::BinaryHeap;
use std::cmp::Ordering;
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;

/// Document with relevance score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredHit {
    pub doc_id: DocId,
    pub score: Option<f32>,           // Present for relevance order or when requested
    pub sort_values: Vec<Option<i64>>, // One per field sort key, None when the doc has no value
}

/// Search results container
#[derive(Debug, Clone, PartialEq)]
pub struct TopDocs {
    pub total_hits: u64,
    pub hits: Vec<ScoredHit>,
}

/// One page of a ranked result list
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub page_num: usize,
    pub page_size: usize,
    pub total_hits: u64,
    pub hits: Vec<ScoredHit>,
}

/// 1-based page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_size: usize,
    pub page_num: usize,
}

impl PageRequest {
    pub fn new(page_size: usize, page_num: usize) -> Self {
        PageRequest { page_size, page_num }
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || self.page_num == 0 {
            return Err(Error::invalid_argument(format!(
                "page size and number start at 1, got size {} page {}", self.page_size, self.page_num
            )));
        }
        Ok(())
    }

    pub fn start(&self) -> usize {
        (self.page_num - 1).saturating_mul(self.page_size)
    }

    pub fn end(&self) -> usize {
        self.start().saturating_add(self.page_size)
    }

    /// Cut this page out of the top `end()` hits
    pub fn slice(&self, top: TopDocs) -> Result<Page> {
        let start = self.start();
        if start as u64 >= top.total_hits && self.page_num > 1 {
            return Err(Error::new(ErrorKind::OutOfRange, format!(
                "page {} of size {} starts past the last of {} hits",
                self.page_num, self.page_size, top.total_hits
            )));
        }

        let hits = top.hits.into_iter().skip(start).take(self.page_size).collect();
        Ok(Page {
            page_num: self.page_num,
            page_size: self.page_size,
            total_hits: top.total_hits,
            hits,
        })
    }
}

/// One key of an explicit sort
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    Score,                                  // Highest first
    DocId,                                  // Lowest first
    Field { name: String, reverse: bool },  // Numeric doc value, ascending unless reversed
}

/// Key sequence applied lexicographically; doc id ascending breaks remaining ties
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sort {
    pub fields: Vec<SortField>,
}

impl Sort {
    pub fn by_score() -> Self {
        Sort { fields: vec![SortField::Score] }
    }

    pub fn by_field(name: impl Into<String>, reverse: bool) -> Self {
        Sort { fields: vec![SortField::Field { name: name.into(), reverse }] }
    }

    pub fn then(mut self, field: SortField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn needs_scores(&self) -> bool {
        self.fields.contains(&SortField::Score)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter_map(|f| match f {
            SortField::Field { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub enum SortKey {
    ScoreDesc(f32),
    DocIdAsc(u64),
    Long { value: Option<i64>, reverse: bool },
}

impl SortKey {
    /// Less means ranked earlier
    fn rank_cmp(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::ScoreDesc(a), SortKey::ScoreDesc(b)) => b.total_cmp(a),
            (SortKey::DocIdAsc(a), SortKey::DocIdAsc(b)) => a.cmp(b),
            (SortKey::Long { value: a, reverse }, SortKey::Long { value: b, .. }) => match (a, b) {
                (Some(a), Some(b)) if *reverse => b.cmp(a),
                (Some(a), Some(b)) => a.cmp(b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            _ => Ordering::Equal,
        }
    }
}

/// A matched document with everything needed to rank it
#[derive(Debug, Clone)]
pub struct Candidate {
    pub doc_id: DocId,
    pub score: f32,
    pub keys: Vec<SortKey>,
}

impl Candidate {
    /// Keys for `sort`; `numeric` resolves a field's doc value
    pub fn new(doc_id: DocId, score: f32, sort: Option<&Sort>, numeric: impl Fn(&str) -> Option<i64>) -> Self {
        let keys = match sort {
            None => vec![SortKey::ScoreDesc(score)],
            Some(sort) => sort.fields.iter().map(|field| match field {
                SortField::Score => SortKey::ScoreDesc(score),
                SortField::DocId => SortKey::DocIdAsc(doc_id.0),
                SortField::Field { name, reverse } => SortKey::Long { value: numeric(name), reverse: *reverse },
            }).collect(),
        };
        Candidate { doc_id, score, keys }
    }

    pub fn into_hit(self, with_score: bool) -> ScoredHit {
        let sort_values = self.keys.iter().filter_map(|k| match k {
            SortKey::Long { value, .. } => Some(*value),
            _ => None,
        }).collect();

        ScoredHit {
            doc_id: self.doc_id,
            score: with_score.then_some(self.score),
            sort_values,
        }
    }
}

// Ordering for the heap: greater = ranked later
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.keys.iter()
            .zip(&other.keys)
            .map(|(a, b)| a.rank_cmp(b))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.doc_id.cmp(&other.doc_id))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Top-K collector for efficient result collection.
/// The heap top is the worst kept candidate.
pub struct TopKCollector {
    pub heap: BinaryHeap<Candidate>,
    pub k: usize,
    pub total_collected: u64,  // Track total documents matched
}

impl TopKCollector {
    pub fn new(k: usize) -> Self {
        TopKCollector {
            heap: BinaryHeap::with_capacity(k.saturating_add(1).min(1 << 16)),
            k,
            total_collected: 0,
        }
    }

    pub fn collect(&mut self, candidate: Candidate) {
        self.total_collected += 1;
        self.offer(candidate);
    }

    /// Merge another collector's survivors and counts
    pub fn merge(&mut self, other: TopKCollector) {
        self.total_collected += other.total_collected;
        for candidate in other.heap {
            self.offer(candidate);
        }
    }

    fn offer(&mut self, candidate: Candidate) {
        if self.k == 0 {
            return;
        }
        if self.heap.len() < self.k {
            self.heap.push(candidate);
        } else if self.heap.peek().is_some_and(|worst| candidate < *worst) {
            self.heap.pop();
            self.heap.push(candidate);
        }
    }

    /// Best first
    pub fn into_sorted(self) -> Vec<Candidate> {
        self.heap.into_sorted_vec()
    }
}

use serde::{Deserialize, Serialize};
use crate::core::error::{Error, Result};

/// Scorer trait
pub trait Scorer: Send + Sync {
    /// Weight of a term present in `doc_freq` of `doc_count` documents
    fn idf(&self, doc_freq: u64, doc_count: u64) -> f32;

    /// Score of one field match; `freq` is the term (or sloppy phrase) frequency
    fn score(&self, freq: f32, idf: f32, doc_stats: &DocStats) -> f32;

    fn name(&self) -> &str;
}

/// Document statistics for scoring
#[derive(Debug, Clone, Copy)]
pub struct DocStats {
    pub field_length: u32,       // Tokens in the matched field of this document
    pub avg_field_length: f32,   // Average length of the field across the snapshot
}

/// TF-IDF Scorer: sqrt(tf) * idf^2 * 1/sqrt(field length)
pub struct TfIdfScorer;

impl Scorer for TfIdfScorer {
    fn idf(&self, doc_freq: u64, doc_count: u64) -> f32 {
        1.0 + ((doc_count as f32 + 1.0) / (doc_freq as f32 + 1.0)).ln()
    }

    fn score(&self, freq: f32, idf: f32, doc_stats: &DocStats) -> f32 {
        let norm = 1.0 / (doc_stats.field_length.max(1) as f32).sqrt();
        freq.sqrt() * idf * idf * norm
    }

    fn name(&self) -> &str {
        "tfidf"
    }
}

/// BM25 Scorer
pub struct BM25Scorer {
    pub k1: f32,  // Term frequency saturation (default: 1.2)
    pub b: f32,   // Length normalization strength (default: 0.75)
}

impl Default for BM25Scorer {
    fn default() -> Self {
        BM25Scorer {
            k1: 1.2,
            b: 0.75,
        }
    }
}

impl Scorer for BM25Scorer {
    fn idf(&self, doc_freq: u64, doc_count: u64) -> f32 {
        let n = doc_count as f32;
        let df = doc_freq as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    fn score(&self, freq: f32, idf: f32, doc_stats: &DocStats) -> f32 {
        let doc_len = doc_stats.field_length as f32;
        let avg_doc_len = doc_stats.avg_field_length.max(1.0);

        // BM25 formula
        let numerator = idf * freq * (self.k1 + 1.0);
        let denominator = freq + self.k1 * (1.0 - self.b + self.b * (doc_len / avg_doc_len));

        numerator / denominator
    }

    fn name(&self) -> &str {
        "bm25"
    }
}

/// Relevance model selected in the index configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScoringModel {
    TfIdf,
    Bm25 { k1: f32, b: f32 },
}

impl Default for ScoringModel {
    fn default() -> Self {
        ScoringModel::TfIdf
    }
}

impl ScoringModel {
    pub fn scorer(&self) -> Box<dyn Scorer> {
        match *self {
            ScoringModel::TfIdf => Box::new(TfIdfScorer),
            ScoringModel::Bm25 { k1, b } => Box::new(BM25Scorer { k1, b }),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            ScoringModel::TfIdf => Ok(()),
            ScoringModel::Bm25 { k1, b } => {
                if !k1.is_finite() || k1 < 0.0 {
                    return Err(Error::invalid_argument(format!("bm25 k1 must be >= 0, got {}", k1)));
                }
                if !(0.0..=1.0).contains(&b) {
                    return Err(Error::invalid_argument(format!("bm25 b must be within [0, 1], got {}", b)));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(field_length: u32) -> DocStats {
        DocStats { field_length, avg_field_length: 5.0 }
    }

    #[test]
    fn test_shorter_fields_score_higher() {
        for scorer in [ScoringModel::TfIdf.scorer(), ScoringModel::Bm25 { k1: 1.2, b: 0.75 }.scorer()] {
            let idf = scorer.idf(3, 4);
            assert!(scorer.score(1.0, idf, &stats(3)) > scorer.score(1.0, idf, &stats(6)), "{}", scorer.name());
            assert!(scorer.score(2.0, idf, &stats(6)) > scorer.score(1.0, idf, &stats(6)), "{}", scorer.name());
        }
    }

    #[test]
    fn test_rare_terms_weigh_more() {
        let scorer = TfIdfScorer;
        assert!(scorer.idf(1, 100) > scorer.idf(50, 100));
        assert!(scorer.idf(100, 100) >= 1.0);
    }

    #[test]
    fn test_bm25_parameters_are_checked() {
        assert!(ScoringModel::Bm25 { k1: 1.2, b: 1.5 }.validate().is_err());
        assert!(ScoringModel::Bm25 { k1: -1.0, b: 0.5 }.validate().is_err());
        assert!(ScoringModel::TfIdf.validate().is_ok());
    }
}

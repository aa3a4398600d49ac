use std::collections::BTreeMap;
use roaring::RoaringBitmap;
use crate::analysis::analyzer::Analyzer;
use crate::analysis::token::Token;
use crate::compression::compress::CompressionType;
use crate::core::error::Result;
use crate::core::types::{Document, FieldValue};
use crate::index::doc_store::DocStoreBuilder;
use crate::index::inverted::{InvertedIndexBuilder, Term};
use crate::index::posting::PostingList;
use crate::storage::segment::{Segment, SegmentMeta};

/// Positions skipped between two values of a multi-valued field,
/// so phrases never match across values
pub const POSITION_GAP: u32 = 100;

/// The segment being written: postings and stored fields of uncommitted documents
#[derive(Default)]
pub struct SegmentBuilder {
    index: InvertedIndexBuilder,
    docs: DocStoreBuilder,
}

impl SegmentBuilder {
    pub fn new() -> Self {
        SegmentBuilder::default()
    }

    pub fn doc_count(&self) -> u32 {
        self.docs.doc_count()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_count() == 0
    }

    /// Analyze and append one document; returns its ordinal
    pub fn add(&mut self, doc: &Document, analyzer: &Analyzer) -> Result<u32> {
        let ordinal = self.docs.doc_count();

        let mut stored = Document::new();
        let mut numeric: Vec<(&str, i64)> = Vec::new();
        let mut field_tokens: BTreeMap<&str, Vec<Token>> = BTreeMap::new();

        for field in &doc.fields {
            if field.stored {
                stored.add_field(field.clone());
            }
            if !field.indexed {
                continue;
            }

            let tokens = field_tokens.entry(field.name.as_str()).or_default();
            let base = tokens.last().map_or(0, |t| t.position + POSITION_GAP);

            match &field.value {
                FieldValue::Text(text) => {
                    tokens.extend(analyzer.analyze(text).into_iter().map(|t| t.shifted(base)));
                }
                FieldValue::Keyword(text) => tokens.push(Token::verbatim(text.as_str(), base)),
                FieldValue::Long(value) => {
                    tokens.push(Token::verbatim(value.to_string(), base));
                    numeric.push((field.name.as_str(), *value));
                }
            }
        }

        for (field, tokens) in &field_tokens {
            self.index.add_field(field, ordinal, tokens)?;
        }
        Ok(self.docs.put(stored, &numeric))
    }

    pub fn lookup(&self, term: &Term) -> Option<&PostingList> {
        self.index.lookup(term)
    }

    /// Append the documents of `segment` not in `deleted`, in ordinal order
    pub fn append_segment(&mut self, segment: &Segment, deleted: &RoaringBitmap) -> Result<()> {
        let mut next = self.docs.doc_count();
        let remap: Vec<Option<u32>> = (0..segment.doc_count())
            .map(|ordinal| {
                if deleted.contains(ordinal) {
                    return None;
                }
                next += 1;
                Some(next - 1)
            })
            .collect();

        self.index.append_segment(&segment.index, &remap)?;
        self.docs.append_segment(&segment.docs, &remap)
    }

    /// Freeze into a segment whose ordinal 0 is `base_doc_id`
    pub fn build(&self, base_doc_id: u64, compression: CompressionType) -> Result<Segment> {
        let doc_count = self.doc_count();
        Ok(Segment {
            meta: SegmentMeta::new(base_doc_id, doc_count),
            index: self.index.build(doc_count)?,
            docs: self.docs.build(compression)?,
        })
    }
}

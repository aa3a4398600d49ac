use std::collections::HashMap;
use crate::mvcc::controller::LiveSegment;

/// Length totals of one field across a snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldStats {
    pub doc_count: u64,
    pub sum_length: u64,
}

impl FieldStats {
    pub fn avg_length(&self) -> f32 {
        if self.doc_count == 0 {
            1.0
        } else {
            self.sum_length as f32 / self.doc_count as f32
        }
    }
}

/// Collection-wide statistics, computed once per snapshot and shared by every
/// segment so scores are comparable across segments
#[derive(Debug, Clone, Default)]
pub struct CollectionStats {
    pub max_doc: u64,
    pub fields: HashMap<String, FieldStats>,
}

impl CollectionStats {
    pub fn from_segments(segments: &[LiveSegment]) -> Self {
        let mut stats = CollectionStats::default();
        for live in segments {
            stats.max_doc += live.segment.doc_count() as u64;
            for (name, field) in &live.segment.index.fields {
                let entry = stats.fields.entry(name.clone()).or_default();
                entry.doc_count += field.doc_count as u64;
                entry.sum_length += field.sum_length;
            }
        }
        stats
    }

    pub fn field(&self, name: &str) -> FieldStats {
        self.fields.get(name).copied().unwrap_or_default()
    }
}

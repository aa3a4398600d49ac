use parking_lot::RwLock;
use roaring::RoaringBitmap;
use std::collections::HashMap;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use tracing::debug;
use crate::core::error::Result;
use crate::core::types::DocId;
use crate::schema::schema::Schema;
use crate::storage::checkpoint::{Checkpoint, SegmentEntry};
use crate::storage::deletes::DeleteFile;
use crate::storage::layout::StorageLayout;
use crate::storage::segment::{Segment, SegmentId};
use crate::storage::segment_reader::SegmentReader;

/// A committed segment together with the tombstones of one generation
#[derive(Clone)]
pub struct LiveSegment {
    pub segment: Arc<Segment>,
    pub deleted: Arc<RoaringBitmap>,
    pub del_gen: u64,
    pub size_bytes: u64,
}

impl LiveSegment {
    pub fn is_live(&self, ordinal: u32) -> bool {
        ordinal < self.segment.doc_count() && !self.deleted.contains(ordinal)
    }

    pub fn live_count(&self) -> u32 {
        self.segment.doc_count() - self.deleted.len() as u32
    }

    fn entry(&self) -> SegmentEntry {
        SegmentEntry {
            meta: self.segment.meta.clone(),
            del_gen: self.del_gen,
            size_bytes: self.size_bytes,
        }
    }
}

/// Snapshot of index at a point in time: one commit generation
pub struct Snapshot {
    pub generation: u64,
    pub segments: Vec<LiveSegment>,
    pub schema: Arc<Schema>,
    pub timestamp: DateTime<Utc>,
    pub next_doc_id: u64,
}

impl Snapshot {
    pub fn empty() -> Self {
        Snapshot {
            generation: 0,
            segments: Vec::new(),
            schema: Arc::new(Schema::new()),
            timestamp: Utc::now(),
            next_doc_id: 0,
        }
    }

    /// Open the newest commit; an index without commits is an empty snapshot
    pub fn load(storage: &StorageLayout) -> Result<Self> {
        Self::load_reusing(storage, None)
    }

    /// Like `load`, sharing already opened segments of `previous` instead of re-reading them
    pub fn load_reusing(storage: &StorageLayout, previous: Option<&Snapshot>) -> Result<Self> {
        loop {
            let Some(generation) = storage.latest_generation()? else {
                return Ok(Snapshot::empty());
            };

            match Self::open_generation(storage, generation, previous) {
                Ok(snapshot) => return Ok(snapshot),
                // A newer commit removed files of this one while it was being read
                Err(err) if storage.latest_generation()? > Some(generation) => {
                    debug!(generation, error = %err, "generation superseded during load, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn open_generation(storage: &StorageLayout, generation: u64, previous: Option<&Snapshot>) -> Result<Self> {
        let checkpoint = Checkpoint::load(storage, generation)?;

        let known: HashMap<SegmentId, &LiveSegment> = previous
            .map(|s| s.segments.iter().map(|ls| (ls.segment.id(), ls)).collect())
            .unwrap_or_default();

        let mut segments = Vec::with_capacity(checkpoint.segments.len());
        for entry in &checkpoint.segments {
            let id = entry.meta.id;
            let segment = match known.get(&id) {
                Some(ls) => ls.segment.clone(),
                None => Arc::new(SegmentReader::open(storage, id)?),
            };

            let deleted = match known.get(&id) {
                Some(ls) if ls.del_gen == entry.del_gen => ls.deleted.clone(),
                _ if entry.del_gen == 0 => Arc::new(RoaringBitmap::new()),
                _ => Arc::new(DeleteFile::read(storage, &id, entry.del_gen)?),
            };

            segments.push(LiveSegment {
                segment,
                deleted,
                del_gen: entry.del_gen,
                size_bytes: entry.size_bytes,
            });
        }

        debug!(generation = checkpoint.generation, segments = segments.len(), "snapshot loaded");
        Ok(Snapshot {
            generation: checkpoint.generation,
            segments,
            schema: Arc::new(checkpoint.schema),
            timestamp: checkpoint.timestamp,
            next_doc_id: checkpoint.next_doc_id,
        })
    }

    pub fn to_checkpoint(&self) -> Checkpoint {
        Checkpoint {
            generation: self.generation,
            next_doc_id: self.next_doc_id,
            segments: self.segments.iter().map(LiveSegment::entry).collect(),
            schema: (*self.schema).clone(),
            timestamp: self.timestamp,
        }
    }

    /// Live (not deleted) documents
    pub fn num_docs(&self) -> u64 {
        self.segments.iter().map(|s| s.live_count() as u64).sum()
    }

    /// Documents including deleted ones not yet merged away
    pub fn max_doc(&self) -> u64 {
        self.segments.iter().map(|s| s.segment.doc_count() as u64).sum()
    }

    /// Segment and ordinal of a live document
    pub fn locate(&self, doc_id: DocId) -> Option<(&LiveSegment, u32)> {
        self.segments.iter().find_map(|ls| {
            let ordinal = ls.segment.ordinal_of(doc_id)?;
            ls.is_live(ordinal).then_some((ls, ordinal))
        })
    }
}

/// Publishes snapshots: readers take an Arc, the writer swaps in the next one
pub struct MVCCController {
    current: RwLock<Arc<Snapshot>>,
}

impl MVCCController {
    pub fn new(snapshot: Snapshot) -> Self {
        MVCCController {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }

    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write() = snapshot.clone();
        snapshot
    }
}

use chrono::{DateTime, Utc};
use uuid::Uuid;
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, Result};
use crate::core::types::DocId;
use crate::index::doc_store::{DocStore, DocStoreData};
use crate::index::inverted::{FieldIndexData, InvertedIndex};

/// Unique segment identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentId(pub Uuid);

impl SegmentId {
    pub fn new() -> Self {
        SegmentId(Uuid::new_v4())
    }
}

impl Default for SegmentId {
    fn default() -> Self {
        SegmentId::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentMeta {
    pub id: SegmentId,
    pub base_doc_id: u64,   // DocId of ordinal 0
    pub doc_count: u32,
    pub created_at: DateTime<Utc>,
}

impl SegmentMeta {
    pub fn new(base_doc_id: u64, doc_count: u32) -> Self {
        SegmentMeta {
            id: SegmentId::new(),
            base_doc_id,
            doc_count,
            created_at: Utc::now(),
        }
    }
}

/// Immutable index segment: postings plus document store
pub struct Segment {
    pub meta: SegmentMeta,
    pub index: InvertedIndex,
    pub docs: DocStore,
}

impl Segment {
    pub fn id(&self) -> SegmentId {
        self.meta.id
    }

    pub fn doc_count(&self) -> u32 {
        self.meta.doc_count
    }

    pub fn doc_id(&self, ordinal: u32) -> DocId {
        DocId(self.meta.base_doc_id + ordinal as u64)
    }

    /// Ordinal of a global doc id, when this segment holds it
    pub fn ordinal_of(&self, doc_id: DocId) -> Option<u32> {
        let offset = doc_id.0.checked_sub(self.meta.base_doc_id)?;
        (offset < self.meta.doc_count as u64).then_some(offset as u32)
    }

    pub(crate) fn to_data(&self) -> Result<SegmentData> {
        Ok(SegmentData {
            meta: self.meta.clone(),
            fields: self.index.to_data()?,
            store: self.docs.to_data(),
        })
    }

    pub(crate) fn from_data(data: SegmentData) -> Result<Self> {
        let docs = DocStore::from_data(data.store)?;
        if docs.doc_count() != data.meta.doc_count {
            return Err(Error::corrupt(format!(
                "segment {} stores {} documents, header says {}",
                data.meta.id.0, docs.doc_count(), data.meta.doc_count
            )));
        }

        Ok(Segment {
            meta: data.meta,
            index: InvertedIndex::from_data(data.fields)?,
            docs,
        })
    }
}

/// Body of a segment file
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SegmentData {
    pub meta: SegmentMeta,
    pub fields: Vec<FieldIndexData>,
    pub store: DocStoreData,
}

/// Segment file header
/// [ magic | version | doc_count | checksum | body_len ] little endian, then the bincode body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    pub version: u32,     // Format version
    pub doc_count: u32,   // Number of documents
    pub checksum: u32,    // CRC32 of the body
    pub body_len: u64,
}

impl SegmentHeader {
    pub const MAGIC: u32 = 0x4C58_5347; // "LXSG"
    pub const VERSION: u32 = 1;
    pub const SIZE: usize = 24; // Fixed header size

    pub fn new(doc_count: u32, body: &[u8]) -> Self {
        SegmentHeader {
            version: Self::VERSION,
            doc_count,
            checksum: crc32fast::hash(body),
            body_len: body.len() as u64,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&Self::MAGIC.to_le_bytes());
        buf[4..8].copy_from_slice(&self.version.to_le_bytes());
        buf[8..12].copy_from_slice(&self.doc_count.to_le_bytes());
        buf[12..16].copy_from_slice(&self.checksum.to_le_bytes());
        buf[16..24].copy_from_slice(&self.body_len.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(Error::corrupt("segment file shorter than its header"));
        }
        let u32_at = |at: usize| u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);

        if u32_at(0) != Self::MAGIC {
            return Err(Error::corrupt("bad segment magic"));
        }
        let version = u32_at(4);
        if version != Self::VERSION {
            return Err(Error::corrupt(format!("unsupported segment version {}", version)));
        }

        let mut len = [0u8; 8];
        len.copy_from_slice(&buf[16..24]);

        Ok(SegmentHeader {
            version,
            doc_count: u32_at(8),
            checksum: u32_at(12),
            body_len: u64::from_le_bytes(len),
        })
    }
}

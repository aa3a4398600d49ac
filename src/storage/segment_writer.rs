use std::fs::{self, File};
use std::io::Write;
use tracing::debug;
use crate::core::error::Result;
use crate::storage::layout::StorageLayout;
use crate::storage::segment::{Segment, SegmentHeader};

/// Writes a frozen segment as one file:
/// [ HEADER (magic, version, doc_count, checksum, body_len) ] <- byte 0
/// [ BODY (bincode: meta, field indexes, document store) ]
pub struct SegmentWriter;

impl SegmentWriter {
    /// Written to a temp file and renamed into place; returns the file size in bytes
    pub fn write(storage: &StorageLayout, segment: &Segment) -> Result<u64> {
        let body = bincode::serialize(&segment.to_data()?)?;
        let header = SegmentHeader::new(segment.doc_count(), &body);

        let path = storage.segment_path(&segment.id());
        let tmp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&header.to_bytes())?;
            file.write_all(&body)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;
        File::open(&storage.segments_dir)?.sync_all()?;

        let size = (SegmentHeader::SIZE + body.len()) as u64;
        debug!(segment = %segment.id().0, docs = segment.doc_count(), bytes = size, "segment written");
        Ok(size)
    }
}

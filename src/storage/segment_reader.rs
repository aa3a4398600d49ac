use std::fs::File;
use memmap2::Mmap;
use crate::core::error::{Error, Result};
use crate::storage::layout::StorageLayout;
use crate::storage::segment::{Segment, SegmentData, SegmentHeader, SegmentId};

/// Loads a segment file through a read-only memory map, verifying the checksum
pub struct SegmentReader;

impl SegmentReader {
    pub fn open(storage: &StorageLayout, segment_id: SegmentId) -> Result<Segment> {
        let path = storage.segment_path(&segment_id);
        let file = File::open(&path)?;
        // Segment files are write-once, nothing truncates them while mapped
        let mmap = unsafe { Mmap::map(&file)? };

        let header = SegmentHeader::from_bytes(&mmap)?;
        let body = &mmap[SegmentHeader::SIZE..];
        if body.len() as u64 != header.body_len {
            return Err(Error::corrupt(format!(
                "segment {} body is {} bytes, expected {}",
                segment_id.0, body.len(), header.body_len
            )));
        }
        if crc32fast::hash(body) != header.checksum {
            return Err(Error::corrupt(format!("checksum mismatch in segment {}", segment_id.0)));
        }

        let data: SegmentData = bincode::deserialize(body)?;
        if data.meta.id != segment_id || data.meta.doc_count != header.doc_count {
            return Err(Error::corrupt(format!("segment {} header does not match its body", segment_id.0)));
        }

        Segment::from_data(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use crate::analysis::token::Token;
    use crate::compression::compress::CompressionType;
    use crate::core::error::ErrorKind;
    use crate::core::types::{Document, Field};
    use crate::index::doc_store::DocStoreBuilder;
    use crate::index::inverted::{InvertedIndexBuilder, Term};
    use crate::storage::segment::SegmentMeta;
    use crate::storage::segment_writer::SegmentWriter;

    fn segment() -> Segment {
        let mut index = InvertedIndexBuilder::new();
        let mut docs = DocStoreBuilder::new();
        for (i, word) in ["lucene", "solr"].iter().enumerate() {
            index.add_field("title", i as u32, &[Token::new(word.to_string(), 0, 0)]).unwrap();
            docs.put(Document::new().with_field(Field::text("title", *word)), &[]);
        }

        Segment {
            meta: SegmentMeta::new(0, 2),
            index: index.build(2).unwrap(),
            docs: docs.build(CompressionType::Zstd).unwrap(),
        }
    }

    #[test]
    fn test_written_segment_reopens() {
        let dir = TempDir::new().unwrap();
        let layout = StorageLayout::create(dir.path()).unwrap();
        let segment = segment();
        SegmentWriter::write(&layout, &segment).unwrap();

        let names: Vec<_> = fs::read_dir(&layout.segments_dir).unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec![format!("{}.seg", segment.id().0)]);

        let reopened = SegmentReader::open(&layout, segment.id()).unwrap();
        assert_eq!(reopened.meta, segment.meta);
        assert!(reopened.index.lookup(&Term::new("title", "solr")).is_some());
        assert_eq!(
            reopened.docs.get(1).unwrap().get_field("title").and_then(|v| v.as_str()),
            Some("solr")
        );
    }

    #[test]
    fn test_flipped_byte_is_detected() {
        let dir = TempDir::new().unwrap();
        let layout = StorageLayout::create(dir.path()).unwrap();
        let segment = segment();
        SegmentWriter::write(&layout, &segment).unwrap();

        let path = layout.segment_path(&segment.id());
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x5A;
        fs::write(&path, bytes).unwrap();

        let err = SegmentReader::open(&layout, segment.id()).err().unwrap();
        assert_eq!(err.kind, ErrorKind::Io);
    }
}

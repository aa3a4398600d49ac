use std::fs::{self, File};
use std::io::Write;
use roaring::RoaringBitmap;
use crate::core::error::{Error, Result};
use crate::storage::layout::StorageLayout;
use crate::storage::segment::SegmentId;

/// Tombstone file of one segment at one delete generation:
/// [ crc32 of bitmap bytes (u32 le) ][ serialized roaring bitmap ]
pub struct DeleteFile;

impl DeleteFile {
    pub fn write(storage: &StorageLayout, id: &SegmentId, del_gen: u64, deleted: &RoaringBitmap) -> Result<()> {
        let mut bitmap = Vec::with_capacity(deleted.serialized_size());
        deleted.serialize_into(&mut bitmap)?;

        let mut file = File::create(storage.deletes_path(id, del_gen))?;
        file.write_all(&crc32fast::hash(&bitmap).to_le_bytes())?;
        file.write_all(&bitmap)?;
        file.sync_all()?;
        Ok(())
    }

    pub fn read(storage: &StorageLayout, id: &SegmentId, del_gen: u64) -> Result<RoaringBitmap> {
        let bytes = fs::read(storage.deletes_path(id, del_gen))?;
        if bytes.len() < 4 {
            return Err(Error::corrupt(format!("tombstone file of segment {} is truncated", id.0)));
        }

        let (crc, bitmap) = bytes.split_at(4);
        if crc32fast::hash(bitmap).to_le_bytes() != crc {
            return Err(Error::corrupt(format!("checksum mismatch in tombstones of segment {}", id.0)));
        }

        RoaringBitmap::deserialize_from(bitmap)
            .map_err(|e| Error::corrupt(format!("tombstones of segment {}: {}", id.0, e)))
    }
}

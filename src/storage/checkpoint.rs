use std::collections::HashSet;
use std::fs::{self, File};
use std::path::PathBuf;
use std::io::Write;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::core::error::{Error, Result};
use crate::schema::schema::Schema;
use crate::storage::layout::StorageLayout;
use crate::storage::segment::SegmentMeta;

/// A segment as referenced by one commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentEntry {
    pub meta: SegmentMeta,
    pub del_gen: u64,       // 0 = no tombstone file
    pub size_bytes: u64,
}

/// Commit manifest `segments_N`: everything a reader needs to open generation N
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub generation: u64,
    pub next_doc_id: u64,
    pub segments: Vec<SegmentEntry>,
    pub schema: Schema,
    pub timestamp: DateTime<Utc>,
}

impl Checkpoint {
    /// Manifest of an index nobody has committed to yet
    pub fn empty() -> Self {
        Checkpoint {
            generation: 0,
            next_doc_id: 0,
            segments: Vec::new(),
            schema: Schema::new(),
            timestamp: Utc::now(),
        }
    }

    /// Load the newest manifest, None when the index has no commit yet
    pub fn load_latest(storage: &StorageLayout) -> Result<Option<Self>> {
        match storage.latest_generation()? {
            Some(generation) => Self::load(storage, generation).map(Some),
            None => Ok(None),
        }
    }

    pub fn load(storage: &StorageLayout, generation: u64) -> Result<Self> {
        let data = fs::read(storage.checkpoint_path(generation))?;
        if data.len() < 4 {
            return Err(Error::corrupt(format!("manifest segments_{} is truncated", generation)));
        }

        let (crc, body) = data.split_at(4);
        if crc32fast::hash(body).to_le_bytes() != crc {
            return Err(Error::corrupt(format!("checksum mismatch in manifest segments_{}", generation)));
        }

        let checkpoint: Checkpoint = bincode::deserialize(body)?;
        if checkpoint.generation != generation {
            return Err(Error::corrupt(format!(
                "manifest segments_{} claims generation {}", generation, checkpoint.generation
            )));
        }
        Ok(checkpoint)
    }

    /// Save checkpoint to disk: temp file, fsync, rename over the final name
    pub fn save(&self, storage: &StorageLayout) -> Result<()> {
        let body = bincode::serialize(self)?;
        let final_path = storage.checkpoint_path(self.generation);
        let tmp_path = final_path.with_extension("tmp");

        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&crc32fast::hash(&body).to_le_bytes())?;
            file.write_all(&body)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &final_path)?;
        File::open(&storage.meta_dir)?.sync_all()?;

        debug!(generation = self.generation, segments = self.segments.len(), "manifest saved");
        Ok(())
    }

    /// Segment and tombstone files this generation reads
    pub fn referenced_files(&self, storage: &StorageLayout) -> HashSet<PathBuf> {
        let mut files = HashSet::with_capacity(self.segments.len() * 2);
        for entry in &self.segments {
            files.insert(storage.segment_path(&entry.meta.id));
            if entry.del_gen > 0 {
                files.insert(storage.deletes_path(&entry.meta.id, entry.del_gen));
            }
        }
        files
    }

    /// Delete files no longer reachable from this generation: older manifests,
    /// superseded segments and tombstones, and leftovers of failed writes.
    /// Returns how many files were removed.
    pub fn remove_unreferenced(&self, storage: &StorageLayout) -> Result<usize> {
        let keep = self.referenced_files(storage);
        let mut removed = 0;

        for entry in fs::read_dir(&storage.segments_dir)? {
            let path = entry?.path();
            if path.is_file() && !keep.contains(&path) {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }

        for entry in fs::read_dir(&storage.meta_dir)? {
            let path = entry?.path();
            let stale = path.file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix("segments_"))
                .is_some_and(|suffix| match suffix.parse::<u64>() {
                    Ok(generation) => generation < self.generation,
                    Err(_) => suffix.ends_with(".tmp"),
                });
            if stale {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(generation = self.generation, removed, "unreferenced files removed");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::schema::schema::FieldType;
    use tempfile::TempDir;

    #[test]
    fn test_latest_generation_wins() {
        let dir = TempDir::new().unwrap();
        let layout = StorageLayout::create(dir.path()).unwrap();
        assert!(Checkpoint::load_latest(&layout).unwrap().is_none());

        let mut checkpoint = Checkpoint::empty();
        checkpoint.schema.register("id", FieldType::Long).unwrap();
        for generation in [1, 2] {
            checkpoint.generation = generation;
            checkpoint.next_doc_id = generation * 10;
            checkpoint.save(&layout).unwrap();
        }

        let latest = Checkpoint::load_latest(&layout).unwrap().unwrap();
        assert_eq!(latest.generation, 2);
        assert_eq!(latest.next_doc_id, 20);
        assert_eq!(latest.schema.get("id"), Some(FieldType::Long));
    }

    #[test]
    fn test_damaged_manifest_is_io_error() {
        let dir = TempDir::new().unwrap();
        let layout = StorageLayout::create(dir.path()).unwrap();
        let mut checkpoint = Checkpoint::empty();
        checkpoint.generation = 1;
        checkpoint.save(&layout).unwrap();

        let path = layout.checkpoint_path(1);
        let mut bytes = fs::read(&path).unwrap();
        bytes[6] ^= 0x01;
        fs::write(&path, bytes).unwrap();

        assert_eq!(Checkpoint::load_latest(&layout).unwrap_err().kind, ErrorKind::Io);
    }

    #[test]
    fn test_only_referenced_files_survive() {
        let dir = TempDir::new().unwrap();
        let layout = StorageLayout::create(dir.path()).unwrap();
        let kept = SegmentMeta::new(0, 3);
        let dropped = SegmentMeta::new(3, 2);

        for path in [
            layout.segment_path(&kept.id),
            layout.deletes_path(&kept.id, 1),
            layout.deletes_path(&kept.id, 2),
            layout.segment_path(&dropped.id),
            layout.segments_dir.join("orphan.tmp"),
            layout.meta_dir.join("segments_3.tmp"),
        ] {
            fs::write(path, b"x").unwrap();
        }

        let mut checkpoint = Checkpoint::empty();
        checkpoint.generation = 1;
        checkpoint.save(&layout).unwrap();
        checkpoint.generation = 2;
        checkpoint.segments.push(SegmentEntry { meta: kept.clone(), del_gen: 2, size_bytes: 1 });
        checkpoint.save(&layout).unwrap();

        assert_eq!(checkpoint.remove_unreferenced(&layout).unwrap(), 5);
        assert!(layout.segment_path(&kept.id).exists());
        assert!(layout.deletes_path(&kept.id, 2).exists());
        assert!(!layout.deletes_path(&kept.id, 1).exists());
        assert!(!layout.segment_path(&dropped.id).exists());
        assert_eq!(layout.list_generations().unwrap(), vec![2]);
        assert_eq!(checkpoint.remove_unreferenced(&layout).unwrap(), 0);
    }
}

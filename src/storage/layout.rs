use std::path::{Path, PathBuf};
use std::fs;
use crate::core::error::Result;
use crate::storage::segment::SegmentId;

/// Directory structure for index files
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub base_dir: PathBuf,      // Root directory, holds write.lock
    pub segments_dir: PathBuf,  // Segment files (.seg) and tombstones (.del)
    pub meta_dir: PathBuf,      // Commit manifests (segments_N)
}

impl StorageLayout {
    /// Layout rooted at `base_dir`, creating the directories when missing
    pub fn create(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let layout = Self::at(base_dir);
        fs::create_dir_all(&layout.segments_dir)?;
        fs::create_dir_all(&layout.meta_dir)?;
        Ok(layout)
    }

    /// Layout rooted at `base_dir` without touching the filesystem
    pub fn at(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        StorageLayout {
            segments_dir: base_dir.join("segments"),
            meta_dir: base_dir.join("meta"),
            base_dir,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn segment_path(&self, id: &SegmentId) -> PathBuf {
        self.segments_dir.join(format!("{}.seg", id.0))
    }

    pub fn deletes_path(&self, id: &SegmentId, del_gen: u64) -> PathBuf {
        self.segments_dir.join(format!("{}_{}.del", id.0, del_gen))
    }

    pub fn checkpoint_path(&self, generation: u64) -> PathBuf {
        self.meta_dir.join(format!("segments_{}", generation))
    }

    pub fn lock_path(&self) -> PathBuf {
        self.base_dir.join("write.lock")
    }

    /// Generations of every manifest present, unordered
    pub fn list_generations(&self) -> Result<Vec<u64>> {
        if !self.meta_dir.exists() {
            return Ok(Vec::new());
        }

        let mut generations = Vec::new();
        for entry in fs::read_dir(&self.meta_dir)? {
            let name = entry?.file_name();
            if let Some(generation) = name.to_str()
                .and_then(|n| n.strip_prefix("segments_"))
                .and_then(|g| g.parse::<u64>().ok())
            {
                generations.push(generation);
            }
        }
        Ok(generations)
    }

    /// Newest manifest generation, None before the first commit
    pub fn latest_generation(&self) -> Result<Option<u64>> {
        Ok(self.list_generations()?.into_iter().max())
    }
}

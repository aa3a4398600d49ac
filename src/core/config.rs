use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::compression::compress::CompressionType;
use crate::core::error::{Error, Result};
use crate::scoring::scorer::ScoringModel;

/// Largest edit distance a fuzzy query may ask for
pub const MAX_FUZZY_EDITS: u8 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub storage_path: PathBuf,

    // Query evaluation
    pub fuzzy_max_edits: u8,        // Used when a fuzzy query leaves max_edits unset
    pub max_expansions: usize,      // Terms kept per fuzzy rewrite
    pub max_bool_clauses: usize,
    pub max_query_depth: usize,
    pub scoring: ScoringModel,

    // Segment files
    pub compression: CompressionType,  // Codec for stored fields
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            storage_path: PathBuf::from("./data"),
            fuzzy_max_edits: MAX_FUZZY_EDITS,
            max_expansions: 1024,
            max_bool_clauses: 1024,
            max_query_depth: 32,
            scoring: ScoringModel::TfIdf,
            compression: CompressionType::LZ4,
        }
    }
}

impl IndexConfig {
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        IndexConfig {
            storage_path: storage_path.into(),
            ..IndexConfig::default()
        }
    }

    pub fn with_fuzzy_max_edits(mut self, edits: u8) -> Self {
        self.fuzzy_max_edits = edits;
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringModel) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_compression(mut self, compression: CompressionType) -> Self {
        self.compression = compression;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: IndexConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fuzzy_max_edits > MAX_FUZZY_EDITS {
            return Err(Error::invalid_argument(format!(
                "fuzzy_max_edits must be between 0 and {}, got {}",
                MAX_FUZZY_EDITS, self.fuzzy_max_edits
            )));
        }
        if self.max_expansions == 0 {
            return Err(Error::invalid_argument("max_expansions must be positive"));
        }
        if self.max_bool_clauses == 0 || self.max_query_depth == 0 {
            return Err(Error::invalid_argument("boolean query limits must be positive"));
        }
        self.scoring.validate()
    }
}

use crate::core::error::{Error, Result};
use serde::{Serialize, Deserialize};

const ZSTD_LEVEL: i32 = 3;

/// Codec for stored-field blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompressionType {
    None,
    #[default]
    LZ4,      // Fastest to decode, used for fetch-heavy indexes
    Zstd,     // Best ratio
    Snappy,
}

impl CompressionType {
    fn encode(self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(match self {
            CompressionType::None => data.to_vec(),
            CompressionType::LZ4 => lz4::block::compress(data, None, false)?,
            CompressionType::Zstd => zstd::encode_all(data, ZSTD_LEVEL)?,
            CompressionType::Snappy => snap::raw::Encoder::new()
                .compress_vec(data)
                .map_err(|e| Error::corrupt(format!("snappy encode: {}", e)))?,
        })
    }

    fn decode(self, data: &[u8], raw_len: usize) -> Result<Vec<u8>> {
        let raw = match self {
            CompressionType::None => data.to_vec(),
            CompressionType::LZ4 => lz4::block::decompress(data, Some(raw_len as i32))?,
            CompressionType::Zstd => zstd::decode_all(data)?,
            CompressionType::Snappy => snap::raw::Decoder::new()
                .decompress_vec(data)
                .map_err(|e| Error::corrupt(format!("snappy decode: {}", e)))?,
        };
        Ok(raw)
    }
}

/// One compressed run of serialized documents.
/// The checksum covers the uncompressed bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressedBlock {
    pub compression: CompressionType,
    pub raw_len: u32,
    pub checksum: u32,
    pub data: Vec<u8>,
}

impl CompressedBlock {
    pub fn compress(raw: &[u8], compression: CompressionType) -> Result<Self> {
        Ok(CompressedBlock {
            compression,
            raw_len: raw.len() as u32,
            checksum: crc32fast::hash(raw),
            data: compression.encode(raw)?,
        })
    }

    pub fn decompress(&self) -> Result<Vec<u8>> {
        let raw = self.compression
            .decode(&self.data, self.raw_len as usize)
            .map_err(|e| Error::corrupt(format!("{:?} block: {}", self.compression, e.context)))?;

        if raw.len() != self.raw_len as usize || crc32fast::hash(&raw) != self.checksum {
            return Err(Error::corrupt(format!(
                "stored block damaged: {} bytes after {:?} decode, expected {}",
                raw.len(), self.compression, self.raw_len
            )));
        }
        Ok(raw)
    }

    /// Compressed size relative to the input
    pub fn ratio(&self) -> f32 {
        self.data.len() as f32 / self.raw_len.max(1) as f32
    }
}

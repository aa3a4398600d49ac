use crate::compression::vbyte::{VByteEncoder, VByteReader};
use crate::core::error::{Error, Result};

/// Delta encoding for ascending integers (ordinals, positions).
/// Layout: vbyte(count), vbyte(first), vbyte(gap)...
pub struct DeltaEncoder;

impl DeltaEncoder {
    pub fn encode_sorted(output: &mut Vec<u8>, nums: &[u32]) -> Result<()> {
        VByteEncoder::encode_u32(output, nums.len() as u32);

        let mut prev = 0u32;
        for (i, &num) in nums.iter().enumerate() {
            if i > 0 && num < prev {
                return Err(Error::invalid_argument(format!(
                    "delta encoding requires ascending input ({} after {})", num, prev
                )));
            }
            VByteEncoder::encode_u32(output, num - if i == 0 { 0 } else { prev });
            prev = num;
        }

        Ok(())
    }

    pub fn decode_sorted(reader: &mut VByteReader<'_>) -> Result<Vec<u32>> {
        let count = reader.next_u32()? as usize;
        let mut nums = Vec::with_capacity(count.min(1 << 16));
        let mut prev = 0u32;

        for i in 0..count {
            let gap = reader.next_u32()?;
            let value = if i == 0 {
                gap
            } else {
                prev.checked_add(gap).ok_or_else(|| Error::corrupt("delta overflow"))?
            };
            nums.push(value);
            prev = value;
        }

        Ok(nums)
    }

    pub fn encode_u32_list(nums: &[u32]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        Self::encode_sorted(&mut output, nums)?;
        Ok(output)
    }

    pub fn decode_u32_list(data: &[u8]) -> Result<Vec<u32>> {
        let mut reader = VByteReader::new(data);
        Self::decode_sorted(&mut reader)
    }
}

use crate::core::error::{Error, Result};

/// Variable byte encoding for integers (best for small integers)
pub struct VByteEncoder;

impl VByteEncoder {
    /// Encode single u32 value
    /// Values < 128 use 1 byte, < 16384 use 2 bytes, etc.
    pub fn encode_u32(output: &mut Vec<u8>, mut value: u32) {
        while value >= 128 {
            output.push((value & 127) as u8 | 128);  // Set continuation bit
            value >>= 7;
        }
        output.push(value as u8);  // Last byte without continuation bit
    }

    /// Encode array of u32 values
    pub fn encode_u32_list(nums: &[u32]) -> Vec<u8> {
        let mut output = Vec::new();
        for &num in nums {
            Self::encode_u32(&mut output, num);
        }
        output
    }

    /// Decode single u32 value, returns (value, bytes_consumed)
    pub fn decode_u32(input: &[u8]) -> Result<(u32, usize)> {
        let mut value = 0u32;
        let mut shift = 0;
        let mut consumed = 0;

        for &byte in input {
            consumed += 1;
            value |= ((byte & 127) as u32) << shift;

            if byte & 128 == 0 {  // No continuation bit
                return Ok((value, consumed));
            }

            shift += 7;
            if shift > 28 {  // Max 5 bytes for u32
                return Err(Error::corrupt("vbyte overflow"));
            }
        }

        Err(Error::corrupt("incomplete vbyte"))
    }

    /// Decode array of u32 values
    pub fn decode_u32_list(data: &[u8]) -> Result<Vec<u32>> {
        let mut reader = VByteReader::new(data);
        let mut nums = Vec::new();

        while !reader.is_exhausted() {
            nums.push(reader.next_u32()?);
        }

        Ok(nums)
    }
}

/// Cursor over a vbyte stream holding several encoded sequences
pub struct VByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> VByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        VByteReader { data, pos: 0 }
    }

    pub fn next_u32(&mut self) -> Result<u32> {
        let (value, consumed) = VByteEncoder::decode_u32(&self.data[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }
}

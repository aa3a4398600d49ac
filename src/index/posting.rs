use crate::compression::delta::DeltaEncoder;
use crate::compression::vbyte::{VByteEncoder, VByteReader};
use crate::core::error::{Error, Result};

/// One term's occurrences in one document of a segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub ordinal: u32,         // Document ordinal within the segment
    pub term_freq: u32,       // Term frequency in document
    pub positions: Vec<u32>,  // Token positions for phrase queries
}

/// Posting list for a term
/// Note: Sorted by ordinal, strictly increasing, for merging without re-sorting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostingList {
    pub postings: Vec<Posting>,
}

impl PostingList {
    pub fn new() -> Self {
        PostingList {
            postings: Vec::new(),
        }
    }

    /// Appends a posting. The writer hands out ordinals in increasing order,
    /// so this is a push; an out-of-order ordinal is rejected.
    pub fn push(&mut self, posting: Posting) -> Result<()> {
        if let Some(last) = self.postings.last() {
            if last.ordinal >= posting.ordinal {
                return Err(Error::invalid_argument(format!(
                    "posting for ordinal {} appended after ordinal {}",
                    posting.ordinal, last.ordinal
                )));
            }
        }
        self.postings.push(posting);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn doc_freq(&self) -> u32 {
        self.postings.len() as u32
    }

    pub fn total_freq(&self) -> u64 {
        self.postings.iter().map(|p| p.term_freq as u64).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Posting> {
        self.postings.iter()
    }

    pub fn get(&self, ordinal: u32) -> Option<&Posting> {
        self.postings
            .binary_search_by_key(&ordinal, |p| p.ordinal)
            .ok()
            .map(|idx| &self.postings[idx])
    }

    /// Layout: delta(ordinals), then per posting delta(positions).
    /// The term frequency is the position count.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let ordinals: Vec<u32> = self.postings.iter().map(|p| p.ordinal).collect();
        DeltaEncoder::encode_sorted(&mut output, &ordinals)?;

        for posting in &self.postings {
            DeltaEncoder::encode_sorted(&mut output, &posting.positions)?;
        }

        Ok(output)
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = VByteReader::new(data);
        let ordinals = DeltaEncoder::decode_sorted(&mut reader)?;

        let mut postings = Vec::with_capacity(ordinals.len());
        for ordinal in ordinals {
            let positions = DeltaEncoder::decode_sorted(&mut reader)?;
            postings.push(Posting {
                ordinal,
                term_freq: positions.len() as u32,
                positions,
            });
        }

        if !reader.is_exhausted() {
            return Err(Error::corrupt("trailing bytes after posting list"));
        }

        Ok(PostingList { postings })
    }

    /// Intersect two posting lists (simple linear merge), returning ordinals
    pub fn intersect(&self, other: &PostingList) -> Vec<u32> {
        let mut result = Vec::new();
        let mut i = 0;
        let mut j = 0;

        while i < self.postings.len() && j < other.postings.len() {
            let ord1 = self.postings[i].ordinal;
            let ord2 = other.postings[j].ordinal;

            if ord1 == ord2 {
                result.push(ord1);
                i += 1;
                j += 1;
            } else if ord1 < ord2 {
                i += 1;
            } else {
                j += 1;
            }
        }

        result
    }
}

/// Size in bytes of an encoded u32, used by segment statistics
pub fn encoded_len(value: u32) -> usize {
    let mut buf = Vec::with_capacity(5);
    VByteEncoder::encode_u32(&mut buf, value);
    buf.len()
}

use std::collections::{BTreeMap, HashMap};
use fst::automaton::{Automaton, Str};
use fst::{IntoStreamer, Map, MapBuilder, Streamer};
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use crate::analysis::token::Token;
use crate::core::error::{Error, Result};
use crate::index::posting::{Posting, PostingList};

/// Term representation: a field name plus the exact indexed text
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Term {
    pub field: String,
    pub text: String,
}

impl Term {
    pub fn new(field: impl Into<String>, text: impl Into<String>) -> Self {
        Term {
            field: field.into(),
            text: text.into(),
        }
    }
}

/// Term dictionary using FST
/// Maps term bytes to the index of the term's posting list
pub struct TermDictionary {
    map: Map<Vec<u8>>,
}

impl TermDictionary {
    /// Terms must arrive in lexicographic byte order
    pub fn from_sorted<'a, I>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, u64)>,
    {
        let mut builder = MapBuilder::memory();
        for (term, ordinal) in terms {
            builder.insert(term, ordinal)?;
        }
        let bytes = builder.into_inner()?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Ok(TermDictionary {
            map: Map::new(bytes)?,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.map.as_fst().as_bytes()
    }

    pub fn get(&self, term: &str) -> Option<u64> {
        self.map.get(term)
    }

    /// All terms starting with `prefix`, in dictionary order.
    /// An empty prefix walks the whole dictionary.
    pub fn with_prefix(&self, prefix: &str) -> Vec<(String, u64)> {
        let matcher = Str::new(prefix).starts_with();
        let mut stream = self.map.search(matcher).into_stream();

        let mut terms = Vec::new();
        while let Some((key, value)) = stream.next() {
            terms.push((String::from_utf8_lossy(key).into_owned(), value));
        }
        terms
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Postings and length norms of one field within a segment
pub struct FieldIndex {
    pub dictionary: TermDictionary,
    pub postings: Vec<PostingList>,
    pub lengths: Vec<u32>,    // Token count per ordinal (0 when absent)
    pub present: RoaringBitmap, // Ordinals that have the field, even with no tokens
    pub doc_count: u32,       // Documents that have the field
    pub sum_length: u64,
}

impl FieldIndex {
    pub fn lookup(&self, text: &str) -> Option<&PostingList> {
        self.dictionary
            .get(text)
            .and_then(|idx| self.postings.get(idx as usize))
    }

    pub fn field_length(&self, ordinal: u32) -> u32 {
        self.lengths.get(ordinal as usize).copied().unwrap_or(0)
    }

    pub fn terms_with_prefix(&self, prefix: &str) -> Vec<(String, &PostingList)> {
        self.dictionary
            .with_prefix(prefix)
            .into_iter()
            .filter_map(|(term, idx)| self.postings.get(idx as usize).map(|p| (term, p)))
            .collect()
    }

    fn to_data(&self, name: &str) -> Result<FieldIndexData> {
        let postings = self.postings
            .iter()
            .map(|list| list.encode())
            .collect::<Result<Vec<_>>>()?;

        Ok(FieldIndexData {
            name: name.to_string(),
            dictionary: self.dictionary.as_bytes().to_vec(),
            postings,
            lengths: self.lengths.clone(),
            present: self.present.iter().collect(),
            doc_count: self.doc_count,
            sum_length: self.sum_length,
        })
    }

    fn from_data(data: FieldIndexData) -> Result<Self> {
        let dictionary = TermDictionary::from_bytes(data.dictionary)?;
        if dictionary.len() != data.postings.len() {
            return Err(Error::corrupt(format!(
                "field '{}' has {} terms but {} posting lists",
                data.name, dictionary.len(), data.postings.len()
            )));
        }

        let postings = data.postings
            .iter()
            .map(|bytes| PostingList::decode(bytes))
            .collect::<Result<Vec<_>>>()?;

        Ok(FieldIndex {
            dictionary,
            postings,
            lengths: data.lengths,
            present: data.present.into_iter().collect(),
            doc_count: data.doc_count,
            sum_length: data.sum_length,
        })
    }
}

/// On-disk form of a field index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldIndexData {
    pub name: String,
    pub dictionary: Vec<u8>,
    pub postings: Vec<Vec<u8>>,
    pub lengths: Vec<u32>,
    pub present: Vec<u32>,
    pub doc_count: u32,
    pub sum_length: u64,
}

/// Inverted index structure of one frozen segment
#[derive(Default)]
pub struct InvertedIndex {
    pub fields: HashMap<String, FieldIndex>,
}

impl InvertedIndex {
    pub fn field(&self, name: &str) -> Option<&FieldIndex> {
        self.fields.get(name)
    }

    pub fn lookup(&self, term: &Term) -> Option<&PostingList> {
        self.field(&term.field).and_then(|f| f.lookup(&term.text))
    }

    pub fn to_data(&self) -> Result<Vec<FieldIndexData>> {
        let mut names: Vec<&String> = self.fields.keys().collect();
        names.sort();

        names.into_iter()
            .map(|name| self.fields[name].to_data(name))
            .collect()
    }

    pub fn from_data(data: Vec<FieldIndexData>) -> Result<Self> {
        let mut fields = HashMap::with_capacity(data.len());
        for field in data {
            let name = field.name.clone();
            fields.insert(name, FieldIndex::from_data(field)?);
        }
        Ok(InvertedIndex { fields })
    }
}

#[derive(Default)]
struct FieldBuilder {
    terms: BTreeMap<String, PostingList>,
    lengths: Vec<u32>,
    present: RoaringBitmap,
    doc_count: u32,
    sum_length: u64,
}

/// Mutable inverted index for the segment being written.
/// Ordinals must be added in increasing order per field.
#[derive(Default)]
pub struct InvertedIndexBuilder {
    fields: HashMap<String, FieldBuilder>,
}

impl InvertedIndexBuilder {
    pub fn new() -> Self {
        InvertedIndexBuilder::default()
    }

    /// Index all tokens of one field of one document.
    /// The token count becomes the field length used for norms.
    pub fn add_field(&mut self, field: &str, ordinal: u32, tokens: &[Token]) -> Result<()> {
        let mut term_positions: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
        for token in tokens {
            term_positions.entry(token.text.as_str())
                .or_insert_with(Vec::new)
                .push(token.position);
        }

        let builder = self.fields.entry(field.to_string()).or_default();
        for (text, mut positions) in term_positions {
            positions.sort_unstable();
            builder.terms.entry(text.to_string()).or_default().push(Posting {
                ordinal,
                term_freq: positions.len() as u32,
                positions,
            })?;
        }

        builder.set_length(ordinal, tokens.len() as u32);
        Ok(())
    }

    /// Copy the live documents of a frozen segment, renumbering ordinals through `remap`
    pub fn append_segment(&mut self, index: &InvertedIndex, remap: &[Option<u32>]) -> Result<()> {
        for (name, field) in &index.fields {
            let builder = self.fields.entry(name.clone()).or_default();

            for (text, list) in field.terms_with_prefix("") {
                let postings: Vec<Posting> = list.iter()
                    .filter_map(|p| {
                        let ordinal = remap.get(p.ordinal as usize).copied().flatten()?;
                        Some(Posting { ordinal, ..p.clone() })
                    })
                    .collect();
                if postings.is_empty() {
                    continue;
                }

                let target = builder.terms.entry(text).or_default();
                for posting in postings {
                    target.push(posting)?;
                }
            }

            for old in &field.present {
                if let Some(Some(new)) = remap.get(old as usize) {
                    builder.set_length(*new, field.field_length(old));
                }
            }
        }
        Ok(())
    }

    pub fn lookup(&self, term: &Term) -> Option<&PostingList> {
        self.fields.get(&term.field).and_then(|f| f.terms.get(&term.text))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Freeze into an immutable index; the builder stays usable
    pub fn build(&self, doc_count: u32) -> Result<InvertedIndex> {
        let mut fields = HashMap::with_capacity(self.fields.len());

        for (name, builder) in &self.fields {
            let dictionary = TermDictionary::from_sorted(
                builder.terms.keys().enumerate().map(|(i, t)| (t.as_str(), i as u64))
            )?;
            let mut lengths = builder.lengths.clone();
            lengths.resize(doc_count as usize, 0);

            fields.insert(name.clone(), FieldIndex {
                dictionary,
                postings: builder.terms.values().cloned().collect(),
                lengths,
                present: builder.present.clone(),
                doc_count: builder.doc_count,
                sum_length: builder.sum_length,
            });
        }

        Ok(InvertedIndex { fields })
    }
}

impl FieldBuilder {
    fn set_length(&mut self, ordinal: u32, length: u32) {
        let idx = ordinal as usize;
        if self.lengths.len() <= idx {
            self.lengths.resize(idx + 1, 0);
        }
        self.lengths[idx] = length;
        self.present.insert(ordinal);
        self.doc_count += 1;
        self.sum_length += length as u64;
    }
}

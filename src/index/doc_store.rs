use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use crate::compression::compress::{CompressedBlock, CompressionType};
use crate::core::error::{Error, Result};
use crate::core::types::Document;

/// Stored documents are compressed in blocks of this many ordinals
pub const DOCS_PER_BLOCK: usize = 64;

/// Numeric values of one field: first value per ordinal for sorting,
/// every value in a point index for ranges
#[derive(Debug, Clone, Default)]
pub struct NumericColumn {
    pub values: Vec<Option<i64>>,
    pub points: BTreeMap<i64, RoaringBitmap>,
}

impl NumericColumn {
    pub fn value(&self, ordinal: u32) -> Option<i64> {
        self.values.get(ordinal as usize).copied().flatten()
    }

    /// Ordinals holding a value inside the bounds. Inverted or empty bounds yield nothing.
    pub fn range(&self, low: Bound<i64>, high: Bound<i64>) -> RoaringBitmap {
        let mut result = RoaringBitmap::new();
        if is_empty_range(low, high) {
            return result;
        }
        for (_, ordinals) in self.points.range((low, high)) {
            result |= ordinals;
        }
        result
    }

    fn insert(&mut self, ordinal: u32, value: i64) {
        let idx = ordinal as usize;
        if self.values.len() <= idx {
            self.values.resize(idx + 1, None);
        }
        if self.values[idx].is_none() {
            self.values[idx] = Some(value);
        }
        self.points.entry(value).or_default().insert(ordinal);
    }
}

fn is_empty_range(low: Bound<i64>, high: Bound<i64>) -> bool {
    match (low, high) {
        (Bound::Included(l), Bound::Included(h)) => l > h,
        (Bound::Included(l), Bound::Excluded(h))
        | (Bound::Excluded(l), Bound::Included(h))
        | (Bound::Excluded(l), Bound::Excluded(h)) => l >= h,
        _ => false,
    }
}

/// Frozen per-segment document store
pub struct DocStore {
    blocks: Vec<CompressedBlock>,
    doc_count: u32,
    numeric: HashMap<String, NumericColumn>,
}

impl DocStore {
    pub fn doc_count(&self) -> u32 {
        self.doc_count
    }

    /// Stored fields of one ordinal
    pub fn get(&self, ordinal: u32) -> Result<Document> {
        if ordinal >= self.doc_count {
            return Err(Error::not_found(format!("ordinal {} outside segment", ordinal)));
        }
        let block_idx = ordinal as usize / DOCS_PER_BLOCK;
        let block = self.blocks.get(block_idx)
            .ok_or_else(|| Error::corrupt(format!("missing stored block {}", block_idx)))?;

        let docs: Vec<Document> = bincode::deserialize(&block.decompress()?)?;
        docs.into_iter()
            .nth(ordinal as usize % DOCS_PER_BLOCK)
            .ok_or_else(|| Error::corrupt(format!("stored block {} is short", block_idx)))
    }

    pub fn column(&self, field: &str) -> Option<&NumericColumn> {
        self.numeric.get(field)
    }

    pub fn numeric(&self, field: &str, ordinal: u32) -> Option<i64> {
        self.numeric.get(field).and_then(|c| c.value(ordinal))
    }

    pub fn range(&self, field: &str, low: Bound<i64>, high: Bound<i64>) -> RoaringBitmap {
        self.numeric
            .get(field)
            .map(|c| c.range(low, high))
            .unwrap_or_default()
    }

    pub fn to_data(&self) -> DocStoreData {
        let mut numeric: Vec<NumericColumnData> = self.numeric.iter()
            .map(|(name, column)| NumericColumnData {
                name: name.clone(),
                values: column.values.clone(),
                points: column.points.iter()
                    .map(|(value, ordinals)| (*value, ordinals.iter().collect()))
                    .collect(),
            })
            .collect();
        numeric.sort_by(|a, b| a.name.cmp(&b.name));

        DocStoreData {
            blocks: self.blocks.clone(),
            doc_count: self.doc_count,
            numeric,
        }
    }

    pub fn from_data(data: DocStoreData) -> Result<Self> {
        let expected_blocks = (data.doc_count as usize).div_ceil(DOCS_PER_BLOCK);
        if data.blocks.len() != expected_blocks {
            return Err(Error::corrupt(format!(
                "{} stored blocks for {} documents", data.blocks.len(), data.doc_count
            )));
        }

        let numeric = data.numeric.into_iter()
            .map(|column| {
                let points = column.points.into_iter()
                    .map(|(value, ordinals)| (value, ordinals.into_iter().collect()))
                    .collect();
                (column.name, NumericColumn { values: column.values, points })
            })
            .collect();

        Ok(DocStore {
            blocks: data.blocks,
            doc_count: data.doc_count,
            numeric,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericColumnData {
    pub name: String,
    pub values: Vec<Option<i64>>,
    pub points: Vec<(i64, Vec<u32>)>,
}

/// On-disk form of a document store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocStoreData {
    pub blocks: Vec<CompressedBlock>,
    pub doc_count: u32,
    pub numeric: Vec<NumericColumnData>,
}

/// Document store of the segment being written
#[derive(Default)]
pub struct DocStoreBuilder {
    stored: Vec<Document>,
    numeric: HashMap<String, NumericColumn>,
}

impl DocStoreBuilder {
    pub fn new() -> Self {
        DocStoreBuilder::default()
    }

    pub fn doc_count(&self) -> u32 {
        self.stored.len() as u32
    }

    /// Append the next document; returns its ordinal
    pub fn put(&mut self, stored: Document, numeric: &[(&str, i64)]) -> u32 {
        let ordinal = self.stored.len() as u32;
        self.stored.push(stored);
        for (field, value) in numeric {
            self.numeric.entry(field.to_string()).or_default().insert(ordinal, *value);
        }
        ordinal
    }

    /// Copy the live documents of a frozen store, renumbering through `remap`.
    /// Live documents are appended in ordinal order so the new ordinals line up.
    pub fn append_segment(&mut self, store: &DocStore, remap: &[Option<u32>]) -> Result<()> {
        for (old, new) in remap.iter().enumerate() {
            if let Some(new) = new {
                if *new != self.stored.len() as u32 {
                    return Err(Error::invalid_argument("merge remap must be dense and ordered"));
                }
                self.stored.push(store.get(old as u32)?);
            }
        }

        for (name, column) in &store.numeric {
            let target = self.numeric.entry(name.clone()).or_default();
            // Sort values first, so the remaining points cannot displace them
            for (old, value) in column.values.iter().enumerate() {
                if let (Some(Some(new)), Some(value)) = (remap.get(old), value) {
                    target.insert(*new, *value);
                }
            }
            for (value, ordinals) in &column.points {
                for old in ordinals {
                    if let Some(Some(new)) = remap.get(old as usize) {
                        target.points.entry(*value).or_default().insert(*new);
                    }
                }
            }
        }
        Ok(())
    }

    /// Freeze into an immutable store; the builder stays usable
    pub fn build(&self, compression: CompressionType) -> Result<DocStore> {
        let blocks = self.stored
            .chunks(DOCS_PER_BLOCK)
            .map(|chunk| {
                let bytes = bincode::serialize(chunk)?;
                CompressedBlock::compress(&bytes, compression)
            })
            .collect::<Result<Vec<_>>>()?;

        let doc_count = self.stored.len() as u32;
        let numeric = self.numeric.iter()
            .map(|(name, column)| {
                let mut column = column.clone();
                column.values.resize(doc_count as usize, None);
                (name.clone(), column)
            })
            .collect();

        Ok(DocStore {
            blocks,
            doc_count,
            numeric,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Field;

    fn store_with_ids(ids: &[i64]) -> DocStore {
        let mut builder = DocStoreBuilder::new();
        for id in ids {
            let doc = Document::new().with_field(Field::long("id", *id));
            builder.put(doc, &[("id", *id)]);
        }
        builder.build(CompressionType::LZ4).unwrap()
    }

    #[test]
    fn test_range_bounds() {
        let store = store_with_ids(&[4, 2, 1, 3]);
        let ordinals = |low, high| store.range("id", low, high).iter().collect::<Vec<u32>>();

        assert_eq!(ordinals(Bound::Included(2), Bound::Included(3)), vec![1, 3]);
        assert_eq!(ordinals(Bound::Excluded(2), Bound::Unbounded), vec![0, 3]);
        assert!(ordinals(Bound::Included(3), Bound::Included(2)).is_empty());
        assert!(ordinals(Bound::Excluded(2), Bound::Excluded(2)).is_empty());
        assert!(store.range("missing", Bound::Unbounded, Bound::Unbounded).is_empty());
    }

    #[test]
    fn test_get_across_blocks() {
        let ids: Vec<i64> = (0..150).collect();
        let store = store_with_ids(&ids);

        let doc = store.get(130).unwrap();
        assert_eq!(doc.get_field("id").and_then(|v| v.as_long()), Some(130));
        assert!(store.get(150).is_err());

        let restored = DocStore::from_data(store.to_data()).unwrap();
        assert_eq!(restored.numeric("id", 77), Some(77));
        assert_eq!(restored.range("id", Bound::Included(149), Bound::Unbounded).len(), 1);
    }

    #[test]
    fn test_first_value_is_sort_value() {
        let mut builder = DocStoreBuilder::new();
        builder.put(Document::new(), &[("year", 2020), ("year", 1999)]);
        builder.put(Document::new(), &[]);
        let store = builder.build(CompressionType::None).unwrap();

        assert_eq!(store.numeric("year", 0), Some(2020));
        assert_eq!(store.numeric("year", 1), None);
        assert_eq!(store.range("year", Bound::Included(1990), Bound::Included(2000)).len(), 1);
    }

    #[test]
    fn test_append_segment_renumbers() {
        let source = store_with_ids(&[10, 20, 30]);
        let mut builder = DocStoreBuilder::new();
        builder.append_segment(&source, &[Some(0), None, Some(1)]).unwrap();
        let merged = builder.build(CompressionType::Snappy).unwrap();

        assert_eq!(merged.doc_count(), 2);
        assert_eq!(merged.numeric("id", 1), Some(30));
        assert_eq!(merged.range("id", Bound::Included(20), Bound::Included(20)).len(), 0);
    }
}

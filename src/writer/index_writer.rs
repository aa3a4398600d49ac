use std::collections::HashMap;
use std::sync::Arc;
use chrono::Utc;
use roaring::RoaringBitmap;
use tracing::{debug, info, warn};
use crate::analysis::analyzer::Analyzer;
use crate::compression::compress::CompressionType;
use crate::core::config::IndexConfig;
use crate::core::error::{Error, Result};
use crate::core::types::{DocId, Document};
use crate::index::inverted::Term;
use crate::mvcc::controller::{LiveSegment, MVCCController, Snapshot};
use crate::query::ast::Query;
use crate::reader::index_reader::IndexReader;
use crate::schema::schema::Schema;
use crate::search::executor::SearchContext;
use crate::storage::checkpoint::Checkpoint;
use crate::storage::deletes::DeleteFile;
use crate::storage::file_lock::FileLock;
use crate::storage::layout::StorageLayout;
use crate::storage::segment::{Segment, SegmentId};
use crate::storage::segment_writer::SegmentWriter;
use crate::writer::segment_builder::SegmentBuilder;

/// Single writer over one index directory.
///
/// Added documents go to an in-memory segment; deletes are recorded as
/// tombstones immediately. Nothing is visible to readers until `commit`.
pub struct IndexWriter {
    config: IndexConfig,
    storage: Arc<StorageLayout>,
    analyzer: Analyzer,
    mvcc: Arc<MVCCController>,
    schema: Schema,                                  // Committed fields plus those added since
    pending: SegmentBuilder,
    pending_deleted: RoaringBitmap,                  // Ordinals of `pending` deleted before commit
    segment_deletes: HashMap<SegmentId, RoaringBitmap>,
    dirty: bool,
    _lock: FileLock,
}

impl IndexWriter {
    /// Open (or create) the index at `config.storage_path`, taking the writer lock
    pub fn open(config: IndexConfig, analyzer: Analyzer) -> Result<Self> {
        config.validate()?;
        let storage = StorageLayout::create(&config.storage_path)?;
        let lock = FileLock::acquire(&storage)?;
        let snapshot = Snapshot::load(&storage)?;

        info!(
            path = %config.storage_path.display(),
            generation = snapshot.generation,
            segments = snapshot.segments.len(),
            analyzer = %analyzer.name,
            "index writer opened"
        );

        // Leftovers of commits that failed or were superseded before a crash
        remove_stale_files(&storage, &snapshot.to_checkpoint());

        Ok(IndexWriter {
            schema: (*snapshot.schema).clone(),
            mvcc: Arc::new(MVCCController::new(snapshot)),
            storage: Arc::new(storage),
            config,
            analyzer,
            pending: SegmentBuilder::new(),
            pending_deleted: RoaringBitmap::new(),
            segment_deletes: HashMap::new(),
            dirty: false,
            _lock: lock,
        })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Whether there is work a commit would persist
    pub fn has_pending_changes(&self) -> bool {
        self.dirty
    }

    pub fn pending_docs(&self) -> u32 {
        self.pending.doc_count() - self.pending_deleted.len() as u32
    }

    fn committed(&self) -> Arc<Snapshot> {
        self.mvcc.current_snapshot()
    }

    /// Analyze and buffer a document; its id is final, it becomes searchable on commit
    pub fn add_document(&mut self, doc: Document) -> Result<DocId> {
        let mut schema = self.schema.clone();
        for field in &doc.fields {
            schema.register(&field.name, field.value.field_type())?;
        }

        let ordinal = self.pending.add(&doc, &self.analyzer)?;
        self.schema = schema;
        self.dirty = true;
        Ok(DocId(self.committed().next_doc_id + ordinal as u64))
    }

    /// Replace every document matching `key` with `doc` in the next commit
    pub fn update_document(&mut self, key: &Term, doc: Document) -> Result<DocId> {
        self.delete_documents(key)?;
        self.add_document(doc)
    }

    /// Tombstone every document containing `term`; returns how many were newly deleted
    pub fn delete_documents(&mut self, term: &Term) -> Result<u64> {
        let snapshot = self.committed();
        let mut deleted = 0;

        for live in &snapshot.segments {
            if let Some(list) = live.segment.index.lookup(term) {
                let ordinals = list.iter().map(|p| p.ordinal).collect();
                deleted += self.tombstone(live, ordinals);
            }
        }
        if let Some(list) = self.pending.lookup(term) {
            let ordinals = list.iter().map(|p| p.ordinal).collect();
            deleted += self.tombstone_pending(ordinals);
        }

        debug!(field = %term.field, text = %term.text, deleted, "delete by term");
        Ok(deleted)
    }

    /// Tombstone every document the query matches; returns how many were newly deleted
    pub fn delete_by_query(&mut self, query: &Query) -> Result<u64> {
        let snapshot = self.committed();

        let (committed, pending) = {
            let context = SearchContext::over(&snapshot.segments, &self.schema, &self.config);
            context.validate(query)?;

            let committed = snapshot.segments.iter()
                .map(|live| Ok((live, context.matching_ordinals(&live.segment, query)?)))
                .collect::<Result<Vec<_>>>()?;

            let pending = if self.pending.is_empty() {
                RoaringBitmap::new()
            } else {
                let segment = self.pending.build(0, CompressionType::None)?;
                context.matching_ordinals(&segment, query)?
            };
            (committed, pending)
        };

        let mut deleted = 0;
        for (live, ordinals) in committed {
            deleted += self.tombstone(live, ordinals);
        }
        deleted += self.tombstone_pending(pending);

        debug!(deleted, "delete by query");
        Ok(deleted)
    }

    /// Tombstone every document, committed or pending
    pub fn delete_all(&mut self) -> Result<u64> {
        let snapshot = self.committed();
        let mut deleted = 0;

        for live in &snapshot.segments {
            let mut all = RoaringBitmap::new();
            all.insert_range(0..live.segment.doc_count());
            deleted += self.tombstone(live, all);
        }
        let mut all = RoaringBitmap::new();
        all.insert_range(0..self.pending.doc_count());
        deleted += self.tombstone_pending(all);

        info!(deleted, "all documents deleted");
        Ok(deleted)
    }

    fn tombstone(&mut self, live: &LiveSegment, ordinals: RoaringBitmap) -> u64 {
        let pending = self.segment_deletes.entry(live.segment.id()).or_default();
        let fresh = &(&ordinals - live.deleted.as_ref()) - &*pending;
        *pending |= &fresh;

        self.dirty |= !fresh.is_empty();
        fresh.len()
    }

    fn tombstone_pending(&mut self, ordinals: RoaringBitmap) -> u64 {
        let fresh = &ordinals - &self.pending_deleted;
        self.pending_deleted |= &fresh;

        self.dirty |= !fresh.is_empty();
        fresh.len()
    }

    /// Persist pending work as a new generation and publish it; returns the generation.
    /// On failure the previous generation stays current and pending work is kept.
    pub fn commit(&mut self) -> Result<u64> {
        let current = self.committed();
        if !self.dirty {
            debug!(generation = current.generation, "nothing to commit");
            return Ok(current.generation);
        }

        let generation = current.generation + 1;
        let mut segments = Vec::with_capacity(current.segments.len() + 1);

        for live in &current.segments {
            let mut live = live.clone();
            if let Some(fresh) = self.segment_deletes.get(&live.segment.id()).filter(|b| !b.is_empty()) {
                let deleted = live.deleted.as_ref() | fresh;
                // Segments without live documents leave the index
                if deleted.len() >= live.segment.doc_count() as u64 {
                    continue;
                }
                DeleteFile::write(&self.storage, &live.segment.id(), generation, &deleted)?;
                live.deleted = Arc::new(deleted);
                live.del_gen = generation;
            }
            segments.push(live);
        }

        let mut next_doc_id = current.next_doc_id;
        if !self.pending.is_empty() {
            let segment = self.pending.build(next_doc_id, self.config.compression)?;
            next_doc_id += segment.doc_count() as u64;

            if self.pending_deleted.len() < segment.doc_count() as u64 {
                let mut live = self.write_segment(segment)?;
                if !self.pending_deleted.is_empty() {
                    DeleteFile::write(&self.storage, &live.segment.id(), generation, &self.pending_deleted)?;
                    live.deleted = Arc::new(self.pending_deleted.clone());
                    live.del_gen = generation;
                }
                segments.push(live);
            }
        }

        let snapshot = Snapshot {
            generation,
            segments,
            schema: Arc::new(self.schema.clone()),
            timestamp: Utc::now(),
            next_doc_id,
        };
        let checkpoint = snapshot.to_checkpoint();
        checkpoint.save(&self.storage)?;
        let snapshot = self.mvcc.publish(snapshot);
        self.reset_pending();
        remove_stale_files(&self.storage, &checkpoint);

        info!(
            generation,
            segments = snapshot.segments.len(),
            num_docs = snapshot.num_docs(),
            "commit complete"
        );
        Ok(generation)
    }

    fn write_segment(&self, segment: Segment) -> Result<LiveSegment> {
        let size_bytes = SegmentWriter::write(&self.storage, &segment)?;
        Ok(LiveSegment {
            segment: Arc::new(segment),
            deleted: Arc::new(RoaringBitmap::new()),
            del_gen: 0,
            size_bytes,
        })
    }

    /// Discard all uncommitted adds and deletes; the writer stays open
    pub fn rollback(&mut self) {
        if self.dirty {
            info!(discarded_docs = self.pending.doc_count(), "rolled back uncommitted changes");
        }
        self.schema = (*self.committed().schema).clone();
        self.reset_pending();
    }

    fn reset_pending(&mut self) {
        self.pending = SegmentBuilder::new();
        self.pending_deleted = RoaringBitmap::new();
        self.segment_deletes.clear();
        self.dirty = false;
    }

    /// Rewrite the live documents of all committed segments into one segment
    /// and commit it. Merged documents receive new ids.
    pub fn force_merge(&mut self) -> Result<u64> {
        if self.dirty {
            return Err(Error::invalid_argument("commit or roll back pending changes before merging"));
        }

        let current = self.committed();
        let fragmented = current.segments.len() > 1 || current.segments.iter().any(|s| !s.deleted.is_empty());
        if !fragmented {
            debug!(generation = current.generation, "index already merged");
            return Ok(current.generation);
        }

        let mut builder = SegmentBuilder::new();
        for live in &current.segments {
            builder.append_segment(&live.segment, &live.deleted)?;
        }

        let generation = current.generation + 1;
        let mut next_doc_id = current.next_doc_id;
        let mut segments = Vec::with_capacity(1);
        if !builder.is_empty() {
            let segment = builder.build(next_doc_id, self.config.compression)?;
            next_doc_id += segment.doc_count() as u64;
            segments.push(self.write_segment(segment)?);
        }

        let snapshot = Snapshot {
            generation,
            segments,
            schema: current.schema.clone(),
            timestamp: Utc::now(),
            next_doc_id,
        };
        let checkpoint = snapshot.to_checkpoint();
        checkpoint.save(&self.storage)?;
        self.mvcc.publish(snapshot);
        remove_stale_files(&self.storage, &checkpoint);

        info!(
            generation,
            merged_segments = current.segments.len(),
            docs = builder.doc_count(),
            "force merge complete"
        );
        Ok(generation)
    }

    /// Reader over the last committed generation
    pub fn reader(&self) -> IndexReader {
        IndexReader::from_snapshot(self.committed(), self.config.clone(), self.storage.clone())
    }

    /// Release the writer lock; uncommitted work is discarded
    pub fn close(self) {
        if self.dirty {
            info!(discarded_docs = self.pending.doc_count(), "writer closed with uncommitted changes");
        }
        debug!(path = %self.config.storage_path.display(), "index writer closed");
    }
}

/// Runs after a generation is durable, so a failure here only leaves extra files behind
fn remove_stale_files(storage: &StorageLayout, checkpoint: &Checkpoint) {
    if let Err(err) = checkpoint.remove_unreferenced(storage) {
        warn!(generation = checkpoint.generation, error = %err, "could not remove unreferenced index files");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::core::types::Field;
    use tempfile::TempDir;

    fn writer(dir: &TempDir) -> IndexWriter {
        IndexWriter::open(IndexConfig::new(dir.path()), Analyzer::standard()).unwrap()
    }

    fn doc(title: &str, id: i64) -> Document {
        Document::new()
            .with_field(Field::text("title", title))
            .with_field(Field::long("id", id))
    }

    #[test]
    fn test_doc_ids_are_sequential_across_commits() {
        let dir = TempDir::new().unwrap();
        let mut writer = writer(&dir);

        assert_eq!(writer.add_document(doc("lucene", 1)).unwrap(), DocId(0));
        assert_eq!(writer.add_document(doc("solr", 2)).unwrap(), DocId(1));
        assert_eq!(writer.commit().unwrap(), 1);
        assert_eq!(writer.add_document(doc("elasticsearch", 3)).unwrap(), DocId(2));
    }

    #[test]
    fn test_commit_without_changes_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut writer = writer(&dir);
        assert_eq!(writer.commit().unwrap(), 0);

        writer.add_document(doc("lucene", 1)).unwrap();
        assert_eq!(writer.commit().unwrap(), 1);
        assert_eq!(writer.commit().unwrap(), 1);
        assert_eq!(writer.delete_documents(&Term::new("title", "missing")).unwrap(), 0);
        assert!(!writer.has_pending_changes());
    }

    #[test]
    fn test_delete_counts_only_new_tombstones() {
        let dir = TempDir::new().unwrap();
        let mut writer = writer(&dir);
        writer.add_document(doc("search engine", 1)).unwrap();
        writer.add_document(doc("search toolkit", 2)).unwrap();
        writer.commit().unwrap();
        writer.add_document(doc("search again", 3)).unwrap();

        let search = Term::new("title", "search");
        assert_eq!(writer.delete_documents(&search).unwrap(), 3);
        assert_eq!(writer.delete_documents(&search).unwrap(), 0);
        assert_eq!(writer.pending_docs(), 0);
    }

    #[test]
    fn test_delete_ignores_documents_added_later() {
        let dir = TempDir::new().unwrap();
        let mut writer = writer(&dir);
        writer.add_document(doc("solr", 1)).unwrap();
        writer.delete_documents(&Term::new("title", "solr")).unwrap();
        writer.add_document(doc("solr", 2)).unwrap();
        writer.commit().unwrap();

        let snapshot = writer.committed();
        assert_eq!(snapshot.num_docs(), 1);
        assert_eq!(snapshot.next_doc_id, 2);
    }

    #[test]
    fn test_fully_deleted_segments_are_dropped() {
        let dir = TempDir::new().unwrap();
        let mut writer = writer(&dir);
        writer.add_document(doc("lucene", 1)).unwrap();
        writer.commit().unwrap();
        writer.add_document(doc("solr", 2)).unwrap();

        assert_eq!(writer.delete_all().unwrap(), 2);
        writer.commit().unwrap();
        let snapshot = writer.committed();
        assert!(snapshot.segments.is_empty());
        assert_eq!(snapshot.next_doc_id, 2);
    }

    #[test]
    fn test_conflicting_field_type_rejects_document() {
        let dir = TempDir::new().unwrap();
        let mut writer = writer(&dir);
        writer.add_document(doc("lucene", 1)).unwrap();

        let bad = Document::new()
            .with_field(Field::text("other", "x"))
            .with_field(Field::text("id", "one"));
        let err = writer.add_document(bad).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
        assert!(writer.schema().get("other").is_none());
        assert_eq!(writer.pending_docs(), 1);
    }

    #[test]
    fn test_force_merge_requires_clean_writer() {
        let dir = TempDir::new().unwrap();
        let mut writer = writer(&dir);
        writer.add_document(doc("lucene", 1)).unwrap();
        let err = writer.force_merge().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_force_merge_drops_tombstones() {
        let dir = TempDir::new().unwrap();
        let mut writer = writer(&dir);
        for (i, title) in ["lucene", "solr", "elasticsearch"].iter().enumerate() {
            writer.add_document(doc(title, i as i64 + 1)).unwrap();
            writer.commit().unwrap();
        }
        writer.delete_documents(&Term::new("id", "2")).unwrap();
        writer.commit().unwrap();

        let generation = writer.force_merge().unwrap();
        let snapshot = writer.committed();
        assert_eq!(snapshot.generation, generation);
        assert_eq!(snapshot.segments.len(), 1);
        assert_eq!(snapshot.max_doc(), 2);
        assert_eq!(snapshot.num_docs(), 2);
        assert!(snapshot.segments[0].deleted.is_empty());
    }
}

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use crate::core::config::IndexConfig;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DocId, Document};
use crate::mvcc::controller::Snapshot;
use crate::query::ast::Query;
use crate::search::executor::SearchContext;
use crate::search::results::{Page, PageRequest, Sort, TopDocs};
use crate::storage::layout::StorageLayout;

/// Everything a ranked search needs besides the snapshot
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: Query,
    pub limit: usize,
    pub sort: Option<Sort>,     // None ranks by relevance
    pub include_scores: bool,   // Attach scores even when sorting by fields
}

impl SearchRequest {
    pub fn new(query: Query, limit: usize) -> Self {
        SearchRequest {
            query,
            limit,
            sort: None,
            include_scores: false,
        }
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_scores(mut self) -> Self {
        self.include_scores = true;
        self
    }
}

/// Read-only view of one committed generation.
/// Later commits stay invisible until `refresh`.
#[derive(Clone)]
pub struct IndexReader {
    snapshot: Arc<Snapshot>,
    config: IndexConfig,
    storage: Arc<StorageLayout>,
}

impl IndexReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(IndexConfig::new(path.as_ref()))
    }

    pub fn open_with_config(config: IndexConfig) -> Result<Self> {
        config.validate()?;
        if !config.storage_path.is_dir() {
            return Err(Error::new(
                ErrorKind::Io,
                format!("index directory {} does not exist", config.storage_path.display()),
            ));
        }

        let storage = StorageLayout::at(&config.storage_path);
        let snapshot = Snapshot::load(&storage)?;
        info!(
            path = %config.storage_path.display(),
            generation = snapshot.generation,
            num_docs = snapshot.num_docs(),
            "index reader opened"
        );

        Ok(Self::from_snapshot(Arc::new(snapshot), config, Arc::new(storage)))
    }

    pub(crate) fn from_snapshot(snapshot: Arc<Snapshot>, config: IndexConfig, storage: Arc<StorageLayout>) -> Self {
        IndexReader { snapshot, config, storage }
    }

    pub fn snapshot(&self) -> &Arc<Snapshot> {
        &self.snapshot
    }

    pub fn generation(&self) -> u64 {
        self.snapshot.generation
    }

    /// Live documents
    pub fn num_docs(&self) -> u64 {
        self.snapshot.num_docs()
    }

    /// Documents including deleted ones still held by segments
    pub fn max_doc(&self) -> u64 {
        self.snapshot.max_doc()
    }

    /// Top `limit` hits by relevance
    pub fn search(&self, query: &Query, limit: usize) -> Result<TopDocs> {
        self.top_docs(query, limit, None, false)
    }

    pub fn search_with(&self, request: &SearchRequest) -> Result<TopDocs> {
        self.top_docs(&request.query, request.limit, request.sort.as_ref(), request.include_scores)
    }

    /// One page of the ranked results; a page past the last hit is `OutOfRange`
    pub fn search_page(&self, query: &Query, page: PageRequest, sort: Option<&Sort>) -> Result<Page> {
        page.validate()?;
        let top = self.top_docs(query, page.end(), sort, false)?;
        page.slice(top)
    }

    fn top_docs(&self, query: &Query, limit: usize, sort: Option<&Sort>, include_scores: bool) -> Result<TopDocs> {
        let with_scores = include_scores || sort.is_none_or(Sort::needs_scores);
        SearchContext::new(&self.snapshot, &self.config).top_docs(query, limit, sort, with_scores)
    }

    /// Stored fields of a live document
    pub fn fetch(&self, doc_id: DocId) -> Result<Document> {
        let (live, ordinal) = self.snapshot.locate(doc_id).ok_or_else(|| {
            Error::not_found(format!("document {} is not live in generation {}", doc_id.0, self.generation()))
        })?;
        live.segment.docs.get(ordinal)
    }

    /// A reader on the newest commit, or None when this one is current.
    /// Segments shared with this generation are not re-read.
    pub fn refresh(&self) -> Result<Option<IndexReader>> {
        let latest = self.storage.latest_generation()?.unwrap_or(0);
        if latest <= self.generation() {
            return Ok(None);
        }

        let snapshot = Snapshot::load_reusing(&self.storage, Some(&self.snapshot))?;
        debug!(from = self.generation(), to = snapshot.generation, "reader refreshed");
        Ok(Some(Self::from_snapshot(Arc::new(snapshot), self.config.clone(), self.storage.clone())))
    }

    pub fn close(self) {
        debug!(generation = self.generation(), "index reader closed");
    }
}

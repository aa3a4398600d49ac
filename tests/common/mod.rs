#![allow(dead_code)]

use std::sync::Once;
use lexidx::analysis::analyzer::Analyzer;
use lexidx::core::config::IndexConfig;
use lexidx::core::types::{Document, Field};
use lexidx::search::results::TopDocs;
use lexidx::writer::index_writer::IndexWriter;
use tempfile::TempDir;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn article(id: i64, title: &str, content: &str) -> Document {
    Document::new()
        .with_field(Field::long("id", id))
        .with_field(Field::text("title", title))
        .with_field(Field::text("content", content))
}

/// The four articles every search test runs against, ids 1..=4
pub fn corpus() -> Vec<Document> {
    vec![
        article(1, "lucene search toolkit", "lucene is tool"),
        article(2, "solr search engine based on lucene", "solr enterprise search engine"),
        article(3, "elasticsearch very popular search engine based on lucene", "elasticsearch is very good"),
        article(4, "elasticsearch VS solr", "search engine"),
    ]
}

pub fn open_writer(dir: &TempDir) -> IndexWriter {
    init_tracing();
    IndexWriter::open(IndexConfig::new(dir.path()), Analyzer::standard()).unwrap()
}

/// Fresh index holding the corpus in one commit
pub fn indexed_corpus() -> (TempDir, IndexWriter) {
    let dir = TempDir::new().unwrap();
    let mut writer = open_writer(&dir);
    for doc in corpus() {
        writer.add_document(doc).unwrap();
    }
    writer.commit().unwrap();
    (dir, writer)
}

/// The stored "id" field of each hit, in rank order
pub fn ids(reader: &lexidx::reader::index_reader::IndexReader, top: &TopDocs) -> Vec<i64> {
    top.hits
        .iter()
        .map(|hit| {
            let doc = reader.fetch(hit.doc_id).unwrap();
            doc.get_field("id").and_then(|v| v.as_long()).unwrap()
        })
        .collect()
}

pub fn sorted(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids
}

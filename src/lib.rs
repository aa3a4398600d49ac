pub mod core;
pub mod storage;
pub mod analysis;
pub mod schema;
pub mod index;
pub mod scoring;
pub mod search;
pub mod query;
pub mod mvcc;
pub mod writer;
pub mod reader;
pub mod compression;

/*
┌──────────────────────────────────────────────────────────────────────────────┐
│                            LEXIDX ARCHITECTURE                                │
└──────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────── WRITE PATH ─────────────────────────┐
│                                                             │
│  IndexWriter (one per directory, write.lock)                │
│   • add_document ──► Analyzer ──► SegmentBuilder            │
│   │                                 ├ InvertedIndexBuilder  │
│   │                                 └ DocStoreBuilder       │
│   • delete_documents / delete_by_query / delete_all         │
│   │     └► tombstone bitmaps (committed + in-memory)        │
│   • commit ──► SegmentWriter (<id>.seg)                     │
│   │        ──► DeleteFile     (<id>_<gen>.del)              │
│   │        ──► Checkpoint     (meta/segments_<gen>)         │
│   │        ──► MVCCController::publish(Snapshot)            │
│   • force_merge ──► one segment, tombstones dropped         │
└─────────────────────────────────────────────────────────────┘

┌───────────────────────── READ PATH ─────────────────────────┐
│                                                             │
│  IndexReader ── Arc<Snapshot> { generation, LiveSegment* }  │
│   • search / search_with / search_page                      │
│   │     └► QueryValidator ──► SearchContext (rayon per seg) │
│   │           ├ Term / Phrase ──► Scorer (TF-IDF | BM25)    │
│   │           ├ Prefix / Wildcard / Fuzzy ──► fst dict scan │
│   │           ├ Range ──► NumericColumn points              │
│   │           └ Bool / MatchAll                             │
│   │     └► TopKCollector ──► TopDocs ──► Page               │
│   • fetch ──► DocStore (compressed blocks)                  │
│   • refresh ──► newest generation, shared segments reused   │
└─────────────────────────────────────────────────────────────┘
*/

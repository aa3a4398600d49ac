mod common;

use common::{ids, indexed_corpus, sorted};
use lexidx::core::error::ErrorKind;
use lexidx::query::ast::{BoolQuery, FuzzyQuery, Query};
use lexidx::scoring::scorer::ScoringModel;
use lexidx::search::results::{PageRequest, Sort, SortField};
use lexidx::reader::index_reader::SearchRequest;

#[test]
fn test_term_query_finds_every_holder() {
    let (_dir, writer) = indexed_corpus();
    let reader = writer.reader();

    let top = reader.search(&Query::term("title", "search"), 10).unwrap();
    assert_eq!(top.total_hits, 3);
    assert_eq!(sorted(ids(&reader, &top)), vec![1, 2, 3]);

    let top = reader.search(&Query::term("content", "tool"), 10).unwrap();
    assert_eq!(ids(&reader, &top), vec![1]);
}

#[test]
fn test_shorter_fields_rank_higher() {
    let (_dir, writer) = indexed_corpus();
    let reader = writer.reader();

    let top = reader.search(&Query::term("title", "lucene"), 10).unwrap();
    assert_eq!(ids(&reader, &top), vec![1, 2, 3]);
    let scores: Vec<f32> = top.hits.iter().map(|h| h.score.unwrap()).collect();
    assert!(scores[0] > scores[1] && scores[1] > scores[2]);
}

#[test]
fn test_bm25_keeps_length_ordering() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = lexidx::core::config::IndexConfig::new(dir.path())
        .with_scoring(ScoringModel::Bm25 { k1: 1.2, b: 0.75 });
    let mut writer = lexidx::writer::index_writer::IndexWriter::open(
        config,
        lexidx::analysis::analyzer::Analyzer::standard(),
    ).unwrap();
    for doc in common::corpus() {
        writer.add_document(doc).unwrap();
    }
    writer.commit().unwrap();

    let reader = writer.reader();
    let top = reader.search(&Query::term("title", "lucene"), 10).unwrap();
    assert_eq!(ids(&reader, &top), vec![1, 2, 3]);
}

#[test]
fn test_limit_keeps_total() {
    let (_dir, writer) = indexed_corpus();
    let reader = writer.reader();

    let top = reader.search(&Query::term("title", "search"), 1).unwrap();
    assert_eq!(top.total_hits, 3);
    assert_eq!(top.hits.len(), 1);
}

#[test]
fn test_wildcard_and_prefix() {
    let (_dir, writer) = indexed_corpus();
    let reader = writer.reader();

    let top = reader.search(&Query::wildcard("title", "*solr*"), 10).unwrap();
    assert_eq!(sorted(ids(&reader, &top)), vec![2, 4]);
    assert!(top.hits.iter().all(|h| h.score == Some(1.0)));

    let top = reader.search(&Query::wildcard("title", "s?lr"), 10).unwrap();
    assert_eq!(sorted(ids(&reader, &top)), vec![2, 4]);

    let top = reader.search(&Query::prefix("title", "elastic"), 10).unwrap();
    assert_eq!(sorted(ids(&reader, &top)), vec![3, 4]);

    let top = reader.search(&Query::prefix("title", "elastic").boosted(2.5), 10).unwrap();
    assert!(top.hits.iter().all(|h| h.score == Some(2.5)));
}

#[test]
fn test_fuzzy_bound() {
    let (_dir, writer) = indexed_corpus();
    let reader = writer.reader();

    let top = reader.search(&Query::fuzzy("title", "elasicseach", 2), 10).unwrap();
    assert_eq!(sorted(ids(&reader, &top)), vec![3, 4]);

    let top = reader.search(&Query::fuzzy("title", "elasicseach", 1), 10).unwrap();
    assert_eq!(top.total_hits, 0);

    let err = reader.search(&Query::fuzzy("title", "elasicseach", 3), 10).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArgument);
}

#[test]
fn test_fuzzy_prefix_length() {
    let (_dir, writer) = indexed_corpus();
    let reader = writer.reader();

    let fuzzy = |prefix_length| Query::Fuzzy(FuzzyQuery {
        field: "title".into(),
        term: "elasicseach".into(),
        max_edits: Some(2),
        prefix_length: Some(prefix_length),
        ..FuzzyQuery::default()
    });

    assert_eq!(reader.search(&fuzzy(4), 10).unwrap().total_hits, 2);
    assert_eq!(reader.search(&fuzzy(5), 10).unwrap().total_hits, 0);
}

#[test]
fn test_exact_term_scores_above_fuzzy_neighbour() {
    let (_dir, writer) = indexed_corpus();
    let reader = writer.reader();

    let exact = reader.search(&Query::term("title", "solr"), 10).unwrap();
    let fuzzy = reader.search(&Query::fuzzy("title", "solar", 1), 10).unwrap();
    assert_eq!(sorted(ids(&reader, &fuzzy)), vec![2, 4]);
    assert!(fuzzy.hits[0].score.unwrap() < exact.hits[0].score.unwrap());
}

#[test]
fn test_numeric_range() {
    let (_dir, writer) = indexed_corpus();
    let reader = writer.reader();

    let top = reader.search(&Query::range("id", 2, 3), 10).unwrap();
    assert_eq!(sorted(ids(&reader, &top)), vec![2, 3]);

    let top = reader.search(&Query::range("id", 3, 2), 10).unwrap();
    assert_eq!(top.total_hits, 0);

    let err = reader.search(&Query::range("title", 1, 2), 10).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArgument);
}

#[test]
fn test_bool_must_not_subtracts() {
    let (_dir, writer) = indexed_corpus();
    let reader = writer.reader();

    let query: Query = BoolQuery::new()
        .with_must(Query::range("id", 1, 3))
        .with_must_not(Query::range("id", 2, 4))
        .into();
    let top = reader.search(&query, 10).unwrap();
    assert_eq!(ids(&reader, &top), vec![1]);

    let only_not: Query = BoolQuery::new().with_must_not(Query::range("id", 2, 4)).into();
    assert_eq!(reader.search(&only_not, 10).unwrap().total_hits, 0);
}

#[test]
fn test_bool_should_and_filter() {
    let (_dir, writer) = indexed_corpus();
    let reader = writer.reader();

    let either: Query = BoolQuery::new()
        .with_should(Query::term("title", "toolkit"))
        .with_should(Query::term("title", "vs"))
        .into();
    assert_eq!(sorted(ids(&reader, &reader.search(&either, 10).unwrap())), vec![1, 4]);

    let both: Query = BoolQuery::new()
        .with_should(Query::term("title", "solr"))
        .with_should(Query::term("title", "elasticsearch"))
        .with_minimum_should_match(2)
        .into();
    assert_eq!(ids(&reader, &reader.search(&both, 10).unwrap()), vec![4]);

    let filtered: Query = BoolQuery::new()
        .with_filter(Query::term("title", "engine"))
        .with_should(Query::term("title", "popular"))
        .into();
    let top = reader.search(&filtered, 10).unwrap();
    assert_eq!(ids(&reader, &top), vec![3, 2]);
    assert_eq!(top.hits[1].score, Some(0.0));
}

#[test]
fn test_phrase_slop() {
    let (_dir, writer) = indexed_corpus();
    let reader = writer.reader();

    let phrase = |slop| Query::phrase("title", vec!["elasticsearch", "lucene"], slop);
    assert_eq!(reader.search(&phrase(5), 10).unwrap().total_hits, 0);
    let top = reader.search(&phrase(6), 10).unwrap();
    assert_eq!(ids(&reader, &top), vec![3]);

    let top = reader.search(&Query::phrase("title", vec!["search", "engine"], 0), 10).unwrap();
    assert_eq!(sorted(ids(&reader, &top)), vec![2, 3]);

    let top = reader.search(&Query::phrase("title", vec!["engine", "search"], 0), 10).unwrap();
    assert_eq!(top.total_hits, 0);
}

#[test]
fn test_multi_field_term() {
    let (_dir, writer) = indexed_corpus();
    let reader = writer.reader();

    let top = reader.search(&Query::multi_field_term(["title", "content"], "good"), 10).unwrap();
    assert_eq!(ids(&reader, &top), vec![3]);

    let top = reader.search(&Query::multi_field_term(["title", "content"], "enterprise"), 10).unwrap();
    assert_eq!(ids(&reader, &top), vec![2]);
}

#[test]
fn test_match_all_pages() {
    let (_dir, writer) = indexed_corpus();
    let reader = writer.reader();
    let all = Query::match_all();

    let page = reader.search_page(&all, PageRequest::new(2, 2), None).unwrap();
    assert_eq!(page.total_hits, 4);
    let page_ids: Vec<i64> = page.hits.iter()
        .map(|h| reader.fetch(h.doc_id).unwrap().get_field("id").and_then(|v| v.as_long()).unwrap())
        .collect();
    assert_eq!(page_ids, vec![3, 4]);

    let err = reader.search_page(&all, PageRequest::new(2, 3), None).unwrap_err();
    assert_eq!(err.kind, ErrorKind::OutOfRange);

    let err = reader.search_page(&all, PageRequest::new(0, 1), None).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArgument);

    let empty = reader.search_page(&Query::term("title", "absent"), PageRequest::new(2, 1), None).unwrap();
    assert!(empty.hits.is_empty());
}

#[test]
fn test_sort_by_numeric_field() {
    let (_dir, writer) = indexed_corpus();
    let reader = writer.reader();
    let by_id_desc = Sort::by_field("id", true);

    let page = reader.search_page(&Query::match_all(), PageRequest::new(2, 2), Some(&by_id_desc)).unwrap();
    let values: Vec<Option<i64>> = page.hits.iter().map(|h| h.sort_values[0]).collect();
    assert_eq!(values, vec![Some(2), Some(1)]);
    assert!(page.hits.iter().all(|h| h.score.is_none()));

    let err = reader.search_with(
        &SearchRequest::new(Query::match_all(), 10).with_sort(Sort::by_field("title", false))
    ).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArgument);
}

#[test]
fn test_sort_by_score_then_field() {
    let (_dir, writer) = indexed_corpus();
    let reader = writer.reader();

    let sort = Sort::by_score().then(SortField::Field { name: "id".into(), reverse: true });
    let request = SearchRequest::new(Query::wildcard("title", "*solr*"), 10).with_sort(sort);
    let top = reader.search_with(&request).unwrap();

    // Equal constant scores fall through to the id key
    assert_eq!(ids(&reader, &top), vec![4, 2]);
    assert!(top.hits.iter().all(|h| h.score.is_some()));

    let request = SearchRequest::new(Query::match_all(), 10)
        .with_sort(Sort::by_field("id", false))
        .with_scores();
    let top = reader.search_with(&request).unwrap();
    assert_eq!(ids(&reader, &top), vec![1, 2, 3, 4]);
    assert!(top.hits.iter().all(|h| h.score == Some(1.0)));
}

#[test]
fn test_invalid_queries_are_rejected() {
    let (_dir, writer) = indexed_corpus();
    let reader = writer.reader();

    for query in [
        Query::term("missing", "x"),
        Query::phrase::<&str>("title", vec![], 0),
        Query::phrase("id", vec!["1"], 0),
        Query::wildcard("title", ""),
        Query::term("title", "solr").boosted(-1.0),
    ] {
        let err = reader.search(&query, 10).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument, "{:?}", query);
    }
}

#[test]
fn test_prefix_and_wildcard_match_every_expanded_term() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut writer = common::open_writer(&dir);
    for i in 0..1100 {
        writer.add_document(common::article(i, &format!("t{:05}", i), "x")).unwrap();
    }
    writer.commit().unwrap();
    assert!(writer.config().max_expansions < 1100);

    let reader = writer.reader();
    assert_eq!(reader.search(&Query::wildcard("title", "t*"), 10).unwrap().total_hits, 1100);
    assert_eq!(reader.search(&Query::prefix("title", "t"), 10).unwrap().total_hits, 1100);

    assert_eq!(writer.delete_by_query(&Query::wildcard("title", "t0*")).unwrap(), 1000);
    writer.commit().unwrap();
    assert_eq!(writer.reader().num_docs(), 100);
}

#[test]
fn test_pages_follow_score_order() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut writer = common::open_writer(&dir);
    let titles = ["lucene", "lucene in action", "lucene search toolkit index", "lucene"];
    for (i, title) in titles.iter().enumerate() {
        writer.add_document(common::article(i as i64 + 1, title, "x")).unwrap();
    }
    writer.add_document(common::article(5, "lucene lucene core", "x")).unwrap();
    writer.commit().unwrap();

    let reader = writer.reader();
    let query = Query::term("title", "lucene");
    let top = reader.search(&query, 5).unwrap();
    assert_eq!(top.total_hits, 5);
    let scores: Vec<f32> = top.hits.iter().map(|h| h.score.unwrap()).collect();
    assert!(scores[1] > scores[2] && scores[2] > scores[3] && scores[3] > scores[4], "{:?}", scores);

    let page = reader.search_page(&query, PageRequest::new(2, 2), None).unwrap();
    assert_eq!(page.total_hits, 5);
    assert_eq!(page.hits, top.hits[2..4].to_vec());

    let last = reader.search_page(&query, PageRequest::new(2, 3), None).unwrap();
    assert_eq!(last.hits, top.hits[4..].to_vec());

    let partial = reader.search_page(&query, PageRequest::new(4, 2), None).unwrap();
    assert_eq!(partial.hits.len(), 1);
    assert_eq!(partial.hits[0], top.hits[4]);

    let err = reader.search_page(&query, PageRequest::new(5, 2), None).unwrap_err();
    assert_eq!(err.kind, ErrorKind::OutOfRange);
}

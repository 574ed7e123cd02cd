//! Pipeline Tests
//!
//! Store rows are indexed into a docset, ingested by an in-memory daemon,
//! searched, and the hits resolved back to documents in the store.

use crate::common::*;
use std::sync::Arc;

// ============================================================================
// Fixtures
// ============================================================================

struct Blog {
    config: IndexerConfig,
    catalog: FieldCatalog,
    store: Arc<MemoryStore>,
}

impl Blog {
    fn new() -> Self {
        init_tracing();
        let config = blog_config();
        let catalog = FieldCatalog::new(Arc::new(config.registry()));
        let store = Arc::new(MemoryStore::default());
        store.put(post("Post-101", "Rust ownership", "Borrowing explained", "alice"));
        store.put(post("Post-102", "Async runtimes", "Futures and executors", "bob"));
        store.put(comment("Comment-7", "Great rust intro", "carol"));
        store.put(comment("Comment-8", "Thanks alice", "dave"));
        Blog {
            config,
            catalog,
            store,
        }
    }

    fn index(&self, daemon: &mut MemoryDaemon) -> DocumentSet {
        let set = DocsetBuilder::from_config(&self.catalog, &self.config)
            .unwrap()
            .build(self.store.all());
        daemon.ingest(&set);
        set
    }

    fn search(&self, daemon: Arc<MemoryDaemon>) -> FulltextSearch {
        FulltextSearch::from_config(
            daemon,
            self.store.clone(),
            self.catalog.registry_arc(),
            &self.config,
        )
        .unwrap()
    }
}

fn ids(outcome: SearchOutcome) -> Vec<String> {
    match outcome {
        SearchOutcome::Ids(ids) => ids,
        other => panic!("expected ids, got {:?}", other),
    }
}

fn rows(outcome: SearchOutcome) -> Vec<FetchedRow> {
    match outcome {
        SearchOutcome::Rows(rows) => rows,
        other => panic!("expected rows, got {:?}", other),
    }
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn indexed_documents_are_found_again() {
    let blog = Blog::new();
    let mut daemon = MemoryDaemon::new(&blog.config.type_field);
    let set = blog.index(&mut daemon);
    assert_eq!(set.len(), 4);

    let search = blog.search(Arc::new(daemon));
    let found = ids(search.search("rust", &SearchOptions::new().raw()).unwrap());
    assert_eq!(found, vec!["Comment-7", "Post-101"]);
}

#[test]
fn found_documents_are_typed() {
    let blog = Blog::new();
    let mut daemon = MemoryDaemon::new(&blog.config.type_field);
    blog.index(&mut daemon);

    let search = blog.search(Arc::new(daemon));
    let rows = rows(search.search_type("Post", "rust", &SearchOptions::new()).unwrap());
    assert_eq!(rows.len(), 1);

    let doc = rows[0].as_typed().unwrap();
    assert_eq!(doc.type_name(), "Post");
    assert_eq!(doc.store_id(), Some("Post-101"));
    assert_eq!(doc.properties()["author"], json!("alice"));
}

#[test]
fn only_fulltext_fields_are_searchable() {
    let blog = Blog::new();
    let mut daemon = MemoryDaemon::new(&blog.config.type_field);
    let set = blog.index(&mut daemon);

    // Post declares title and body as full-text keys, so its author is not indexed
    let post = set.documents().iter().find(|d| d.id() == 101).unwrap();
    assert_eq!(post.field("author"), Some(""));

    let search = blog.search(Arc::new(daemon));
    let found = ids(search.search("alice", &SearchOptions::new().raw()).unwrap());
    assert_eq!(found, vec!["Comment-8"]);
}

#[test]
fn scoped_search_sends_type_filter() {
    let blog = Blog::new();
    let mut daemon = MemoryDaemon::new(&blog.config.type_field);
    blog.index(&mut daemon);
    let daemon = Arc::new(daemon);

    let search = blog.search(daemon.clone());
    let found = ids(
        search
            .search_type("Comment", "rust", &SearchOptions::new().with_limit(5).raw())
            .unwrap(),
    );
    assert_eq!(found, vec!["Comment-7"]);

    let queries = daemon.queries.lock();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].text, "rust @couchrest-type Comment");
    assert_eq!(queries[0].limit, Some(5));
}

// ============================================================================
// Store drift
// ============================================================================

#[test]
fn reindexing_picks_up_changes() {
    let blog = Blog::new();
    let mut daemon = MemoryDaemon::new(&blog.config.type_field);
    blog.index(&mut daemon);

    blog.store
        .put(post("Post-102", "Tokio deep dive", "Futures and executors", "bob"));
    blog.index(&mut daemon);
    assert_eq!(daemon.len(), 4);

    let search = blog.search(Arc::new(daemon));
    assert!(search.search("async", &SearchOptions::new()).unwrap().is_empty());
    let found = ids(search.search("tokio", &SearchOptions::new().raw()).unwrap());
    assert_eq!(found, vec!["Post-102"]);
}

#[test]
fn hits_deleted_from_store_come_back_raw() {
    let blog = Blog::new();
    let mut daemon = MemoryDaemon::new(&blog.config.type_field);
    blog.index(&mut daemon);

    let fresh = MemoryStore::default();
    fresh.put(comment("Comment-7", "Great rust intro", "carol"));
    let search = FulltextSearch::from_config(
        Arc::new(daemon),
        Arc::new(fresh),
        blog.catalog.registry_arc(),
        &blog.config,
    )
    .unwrap();

    let rows = rows(search.search("rust", &SearchOptions::new()).unwrap());
    assert_eq!(rows.len(), 2);
    assert!(rows[0].as_typed().is_some());
    match &rows[1] {
        FetchedRow::Raw(value) => assert_eq!(value["key"], json!("Post-101")),
        other => panic!("expected raw row, got {:?}", other),
    }
}

// ============================================================================
// Batch hygiene
// ============================================================================

#[test]
fn bad_rows_do_not_spoil_the_batch() {
    let blog = Blog::new();
    let mut rows = blog.store.all();
    rows.push(json!({"couchrest-type": "Post", "title": "draft"}));
    rows.push(json!({"_id": "Ghost-1", "couchrest-type": "Ghost"}));
    rows.push(json!({"_id": "Post-abc", "couchrest-type": "Post", "title": "odd"}));
    rows.push(json!("not a document"));
    rows.push(json!({"id": "Post-103", "value": post("Post-103", "Via view", "row", "erin")}));

    let set = DocsetBuilder::from_config(&blog.catalog, &blog.config)
        .unwrap()
        .build(rows);
    let ids: Vec<u64> = set.documents().iter().map(|d| d.id()).collect();
    assert_eq!(ids, vec![7, 8, 101, 102, 103]);
}

#[test]
fn streamed_output_matches_rendered_output() {
    let blog = Blog::new();
    let set = DocsetBuilder::from_config(&blog.catalog, &blog.config)
        .unwrap()
        .build(blog.store.all());

    let mut out = Vec::new();
    set.write_to(&mut out).unwrap();
    let streamed = String::from_utf8(out).unwrap();
    assert_eq!(streamed, set.to_xml());
    assert!(streamed.starts_with(r#"<?xml version="1.0" encoding="utf-8"?>"#));
    assert!(streamed.ends_with("</sphinx:docset>\n"));
}

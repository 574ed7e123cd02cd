//! Shared test utilities for the integration suites.
//!
//! Import via `mod common;` from any test's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Once};

pub use couchsphinx::{
    DocsetBuilder, DocumentSet, DocumentStore, Error, FetchedRow, FieldCatalog, FulltextSearch,
    IndexerConfig, QueryResponse, Result, SearchClient, SearchHit, SearchOptions, SearchOutcome,
    SearchQuery, StoreId, TypeRegistry, Value,
};
pub use serde_json::json;

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route log output through the test harness.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Configuration used by most suites.
pub const BLOG_CONFIG: &str = r#"
server = "search.local"
port = 9312

[types.Post]
properties = ["title", "body", "author"]
fulltext = ["title", "body"]

[types.Comment]
properties = ["body", "author"]
"#;

pub fn blog_config() -> IndexerConfig {
    IndexerConfig::from_toml_str(BLOG_CONFIG).unwrap()
}

// ============================================================================
// In-memory search daemon
// ============================================================================

struct IndexedDoc {
    id: u64,
    type_name: String,
    text: String,
    attributes: HashMap<String, Vec<u64>>,
}

/// Substring-matching stand-in for the search daemon.
///
/// Indexes the documents of a docset the way the daemon would ingest
/// them: by numeric id, with multi-valued attributes sorted ascending.
/// Understands a single trailing `@<field> <value>` filter.
pub struct MemoryDaemon {
    type_field: String,
    docs: Vec<IndexedDoc>,
    pub queries: Mutex<Vec<SearchQuery>>,
}

impl MemoryDaemon {
    pub fn new(type_field: &str) -> Self {
        MemoryDaemon {
            type_field: type_field.to_string(),
            docs: Vec::new(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn ingest(&mut self, set: &DocumentSet) {
        let tag_attribute = set.schema().tag_attribute().to_string();
        for doc in set.documents() {
            let mut tag = doc.type_tag().values().to_vec();
            tag.sort_unstable();
            let text = doc
                .fields()
                .iter()
                .map(|(_, v)| v.to_lowercase())
                .collect::<Vec<_>>()
                .join(" ");
            // re-indexing a document replaces it
            self.docs.retain(|d| d.id != doc.id());
            self.docs.push(IndexedDoc {
                id: doc.id(),
                type_name: doc.type_name().to_string(),
                text,
                attributes: HashMap::from([(tag_attribute.clone(), tag)]),
            });
        }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }
}

impl SearchClient for MemoryDaemon {
    fn query(&self, query: &SearchQuery) -> Result<QueryResponse> {
        self.queries.lock().push(query.clone());

        let marker = format!(" @{} ", self.type_field);
        let (words, scope) = match query.text.split_once(&marker) {
            Some((words, scope)) => (words, Some(scope)),
            None => (query.text.as_str(), None),
        };
        let words = words.to_lowercase();

        let mut hits: Vec<SearchHit> = self
            .docs
            .iter()
            .filter(|d| scope.map_or(true, |s| s == d.type_name))
            .filter(|d| words.split_whitespace().all(|w| d.text.contains(w)))
            .map(|d| {
                d.attributes.iter().fold(SearchHit::new(d.id), |hit, (k, v)| {
                    hit.with_attribute(k.clone(), v.clone().into())
                })
            })
            .collect();
        if let Some(limit) = query.limit {
            hits.truncate(limit as usize);
        }
        Ok(QueryResponse::ok(hits))
    }
}

// ============================================================================
// In-memory document store
// ============================================================================

/// Document store answering batched lookups with view-style rows.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn put(&self, doc: Value) {
        let id = doc["_id"].as_str().unwrap().to_string();
        self.docs.lock().insert(id, doc);
    }

    pub fn all(&self) -> Vec<Value> {
        let mut docs: Vec<Value> = self.docs.lock().values().cloned().collect();
        docs.sort_by(|a, b| a["_id"].as_str().cmp(&b["_id"].as_str()));
        docs
    }
}

impl DocumentStore for MemoryStore {
    fn multi_get(&self, ids: &[String]) -> Result<Vec<Value>> {
        let docs = self.docs.lock();
        Ok(ids
            .iter()
            .map(|id| match docs.get(id) {
                Some(doc) => json!({"id": id, "key": id, "value": {"rev": "1-0"}, "doc": doc}),
                None => json!({"key": id, "error": "not_found"}),
            })
            .collect())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn post(id: &str, title: &str, body: &str, author: &str) -> Value {
    json!({"_id": id, "_rev": "1-0", "couchrest-type": "Post",
           "title": title, "body": body, "author": author})
}

pub fn comment(id: &str, body: &str, author: &str) -> Value {
    json!({"_id": id, "_rev": "1-0", "couchrest-type": "Comment",
           "body": body, "author": author})
}

//! Full-text search orchestration
//!
//! Runs a query against the search daemon, reconstructs store ids from
//! the hits and, unless raw ids were requested, fetches and re-types the
//! documents from the store.
//!
//! ```text
//! text + options ──► SearchQuery ──► SearchClient ──► hits
//!                                                      │
//!                              ResultReconstructor ◄───┘
//!                                      │
//!                       store ids ─────┴──► DocumentStore::multi_get ──► FetchedRow
//! ```
//!
//! FulltextSearch is stateless; it holds only shared handles.

use crate::query::{
    DocumentStore, MatchMode, SearchClient, SearchOptions, SearchQuery,
};
use crate::reconstruct::ResultReconstructor;
use couchsphinx_core::{Indexable, IndexerConfig, Result, TypeRegistry, Value, DOC_KEY};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// One row returned by the store lookup
#[derive(Debug)]
pub enum FetchedRow {
    /// Row typed through the registry
    Typed(Box<dyn Indexable>),
    /// Row without a usable type, returned as stored
    Raw(Value),
}

impl FetchedRow {
    /// The typed document, if the row could be typed
    pub fn as_typed(&self) -> Option<&dyn Indexable> {
        match self {
            FetchedRow::Typed(doc) => Some(doc.as_ref()),
            FetchedRow::Raw(_) => None,
        }
    }
}

/// Result of a search
#[derive(Debug)]
pub enum SearchOutcome {
    /// Store ids only (raw mode)
    Ids(Vec<String>),
    /// Fetched documents
    Rows(Vec<FetchedRow>),
}

impl SearchOutcome {
    /// Number of ids or rows
    pub fn len(&self) -> usize {
        match self {
            SearchOutcome::Ids(ids) => ids.len(),
            SearchOutcome::Rows(rows) => rows.len(),
        }
    }

    /// True if nothing matched
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Query orchestrator over a search client and a document store
#[derive(Clone)]
pub struct FulltextSearch {
    client: Arc<dyn SearchClient>,
    store: Arc<dyn DocumentStore>,
    registry: Arc<TypeRegistry>,
    reconstructor: ResultReconstructor,
    default_mode: MatchMode,
}

impl fmt::Debug for FulltextSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FulltextSearch")
            .field("registry", &self.registry)
            .field("reconstructor", &self.reconstructor)
            .field("default_mode", &self.default_mode)
            .finish()
    }
}

impl FulltextSearch {
    /// Create an orchestrator with default codec, tag attribute and match mode
    pub fn new(
        client: Arc<dyn SearchClient>,
        store: Arc<dyn DocumentStore>,
        registry: Arc<TypeRegistry>,
    ) -> Self {
        FulltextSearch {
            client,
            store,
            registry,
            reconstructor: ResultReconstructor::new(),
            default_mode: MatchMode::default(),
        }
    }

    /// Create an orchestrator matching the docsets built under `config`
    ///
    /// `client` is expected to talk to [`IndexerConfig::daemon_address`];
    /// the orchestrator itself never opens connections.
    pub fn from_config(
        client: Arc<dyn SearchClient>,
        store: Arc<dyn DocumentStore>,
        registry: Arc<TypeRegistry>,
        config: &IndexerConfig,
    ) -> Result<Self> {
        let default_mode = config.match_mode.parse()?;
        Ok(Self::new(client, store, registry)
            .with_reconstructor(ResultReconstructor::from_config(config)?)
            .with_default_mode(default_mode))
    }

    /// Builder: set the reconstructor
    pub fn with_reconstructor(mut self, reconstructor: ResultReconstructor) -> Self {
        self.reconstructor = reconstructor;
        self
    }

    /// Builder: set the match mode used when options leave it open
    pub fn with_default_mode(mut self, mode: MatchMode) -> Self {
        self.default_mode = mode;
        self
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Search across all types
    pub fn search(&self, text: &str, options: &SearchOptions) -> Result<SearchOutcome> {
        let query = SearchQuery::compose(text, None, options, self.default_mode);
        self.run(&query, options.raw)
    }

    /// Search documents of one type only
    pub fn search_type(
        &self,
        type_name: &str,
        text: &str,
        options: &SearchOptions,
    ) -> Result<SearchOutcome> {
        let scope = (self.registry.type_field(), type_name);
        let query = SearchQuery::compose(text, Some(scope), options, self.default_mode);
        self.run(&query, options.raw)
    }

    fn run(&self, query: &SearchQuery, raw: bool) -> Result<SearchOutcome> {
        let hits = self.client.query(query)?.into_hits();
        let ids = self.reconstructor.reconstruct(&hits);
        debug!(
            target: "couchsphinx::fulltext",
            query = %query.text,
            hits = hits.len(),
            ids = ids.len(),
            "Query complete"
        );

        if raw {
            return Ok(SearchOutcome::Ids(ids));
        }
        Ok(SearchOutcome::Rows(self.multi_get(&ids)?))
    }

    // ========================================================================
    // Store lookup
    // ========================================================================

    /// Fetch rows for `ids` and type them through the registry
    ///
    /// Rows without a type, or whose type fails to materialize, are
    /// returned raw rather than dropped.
    pub fn multi_get(&self, ids: &[String]) -> Result<Vec<FetchedRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self.store.multi_get(ids)?;
        Ok(rows.into_iter().map(|row| self.retype(row)).collect())
    }

    fn retype(&self, row: Value) -> FetchedRow {
        let type_field = self.registry.type_field();
        let row = match row {
            Value::Object(mut map) if !map.contains_key(type_field) => match map.remove(DOC_KEY) {
                Some(doc @ Value::Object(_)) => doc,
                Some(other) => {
                    map.insert(DOC_KEY.to_string(), other);
                    Value::Object(map)
                }
                None => Value::Object(map),
            },
            other => other,
        };

        let fields = match row {
            Value::Object(fields) if fields.contains_key(type_field) => fields,
            other => return FetchedRow::Raw(other),
        };
        match self.registry.materialize(&fields) {
            Ok(doc) => FetchedRow::Typed(doc),
            Err(e) => {
                debug!(target: "couchsphinx::fulltext", reason = %e, "Returning untyped row");
                FetchedRow::Raw(Value::Object(fields))
            }
        }
    }
}

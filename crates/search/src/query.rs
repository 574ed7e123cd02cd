//! Query-side types and collaborator traits
//!
//! This module provides:
//! - MatchMode / SortMode: search daemon query modes
//! - SearchOptions: per-call options as given by the caller
//! - SearchQuery: fully-resolved request handed to a SearchClient
//! - SearchHit / QueryResponse: what the daemon sends back
//! - SearchClient / DocumentStore: network collaborators, implemented outside this crate

use crate::multi_attribute::MultiAttributeValue;
use couchsphinx_core::{Error, Result, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Modes
// ============================================================================

/// How query words are matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Match all words
    All,
    /// Match any word
    Any,
    /// Match the exact phrase
    Phrase,
    /// Boolean operators
    Boolean,
    /// Full query language, including `@field` filters
    #[default]
    Extended,
}

impl MatchMode {
    /// Lowercase name as used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::All => "all",
            MatchMode::Any => "any",
            MatchMode::Phrase => "phrase",
            MatchMode::Boolean => "boolean",
            MatchMode::Extended => "extended",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(MatchMode::All),
            "any" => Ok(MatchMode::Any),
            "phrase" => Ok(MatchMode::Phrase),
            "boolean" => Ok(MatchMode::Boolean),
            "extended" => Ok(MatchMode::Extended),
            other => Err(Error::InvalidConfig(format!(
                "unknown match mode {:?}, expected all, any, phrase, boolean or extended",
                other
            ))),
        }
    }
}

/// How matches are ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// By relevance (daemon default)
    #[default]
    Relevance,
    /// By a sort clause such as `@weight DESC, created_at ASC`
    Extended,
}

// ============================================================================
// SearchOptions / SearchQuery
// ============================================================================

/// Per-call search options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Match mode; the configured default when `None`
    pub match_mode: Option<MatchMode>,
    /// Maximum number of matches to return
    pub limit: Option<u32>,
    /// Maximum number of matches the daemon keeps in memory
    pub max_matches: Option<u32>,
    /// Sort clause; switches the sort mode to extended
    pub sort_by: Option<String>,
    /// Return store ids only, skipping the store lookup
    pub raw: bool,
}

impl SearchOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set match mode
    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = Some(mode);
        self
    }

    /// Builder: set limit
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Builder: set max matches
    pub fn with_max_matches(mut self, max_matches: u32) -> Self {
        self.max_matches = Some(max_matches);
        self
    }

    /// Builder: set sort clause
    pub fn with_sort_by(mut self, sort_by: impl Into<String>) -> Self {
        self.sort_by = Some(sort_by.into());
        self
    }

    /// Builder: return ids only
    pub fn raw(mut self) -> Self {
        self.raw = true;
        self
    }
}

/// Fully-resolved request for the search daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Query text, including any type filter clause
    pub text: String,
    /// Match mode
    pub match_mode: MatchMode,
    /// Maximum number of matches to return
    pub limit: Option<u32>,
    /// Maximum number of matches the daemon keeps in memory
    pub max_matches: Option<u32>,
    /// Sort mode
    pub sort_mode: SortMode,
    /// Sort clause, set iff `sort_mode` is extended
    pub sort_by: Option<String>,
}

impl SearchQuery {
    /// Resolve caller options into a query
    ///
    /// When `scope` names a type, ` @<type_field> <type>` is appended so
    /// only documents of that type match.
    pub fn compose(
        text: &str,
        scope: Option<(&str, &str)>,
        options: &SearchOptions,
        default_mode: MatchMode,
    ) -> Self {
        let text = match scope {
            Some((type_field, type_name)) => format!("{} @{} {}", text, type_field, type_name),
            None => text.to_string(),
        };
        let sort_mode = if options.sort_by.is_some() {
            SortMode::Extended
        } else {
            SortMode::Relevance
        };

        SearchQuery {
            text,
            match_mode: options.match_mode.unwrap_or(default_mode),
            limit: options.limit,
            max_matches: options.max_matches,
            sort_mode,
            sort_by: options.sort_by.clone(),
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// One match returned by the search daemon
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Numeric document id
    pub doc: u64,
    /// Multi-valued attributes by name
    pub attributes: HashMap<String, MultiAttributeValue>,
}

impl SearchHit {
    /// Hit with no attributes
    pub fn new(doc: u64) -> Self {
        SearchHit {
            doc,
            attributes: HashMap::new(),
        }
    }

    /// Builder: add an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: MultiAttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }
}

/// Response of one query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Daemon status; 0 means success
    pub status: i32,
    /// Matches, absent on failure
    pub matches: Option<Vec<SearchHit>>,
}

impl QueryResponse {
    /// Successful response
    pub fn ok(matches: Vec<SearchHit>) -> Self {
        QueryResponse {
            status: 0,
            matches: Some(matches),
        }
    }

    /// Failed response with the given status
    pub fn failed(status: i32) -> Self {
        QueryResponse {
            status,
            matches: None,
        }
    }

    /// Matches of a successful response; empty otherwise
    pub fn into_hits(self) -> Vec<SearchHit> {
        if self.status != 0 {
            return Vec::new();
        }
        self.matches.unwrap_or_default()
    }
}

// ============================================================================
// Collaborators
// ============================================================================

/// Client of the search daemon
///
/// Implemented by the host application on top of its wire client.
/// `Err` is reserved for transport failures; a daemon-side failure is a
/// response with a non-zero status.
pub trait SearchClient: Send + Sync {
    /// Run one query
    fn query(&self, query: &SearchQuery) -> Result<QueryResponse>;
}

/// Batched lookup in the document store
pub trait DocumentStore: Send + Sync {
    /// Fetch the rows for `ids`, one per id, in order
    ///
    /// Rows are either bare documents or `{"id", "key", "value", "doc"}`
    /// rows with the document under `doc`.
    fn multi_get(&self, ids: &[String]) -> Result<Vec<Value>>;
}

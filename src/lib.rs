//! CouchSphinx - full-text indexing bridge between a document store and a Sphinx daemon
//!
//! CouchSphinx turns batches of typed documents into xmlpipe2 docsets the
//! search daemon can ingest, and turns the daemon's hits back into store
//! ids and documents.
//!
//! # Quick Start
//!
//! ```
//! use couchsphinx::{DocsetBuilder, FieldCatalog, IndexerConfig};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let config = IndexerConfig::from_toml_str(r#"
//!     [types.Post]
//!     properties = ["title", "body"]
//! "#)?;
//! let catalog = FieldCatalog::new(Arc::new(config.registry()));
//!
//! let set = DocsetBuilder::from_config(&catalog, &config)?.build(vec![
//!     json!({"_id": "Post-1", "couchrest-type": "Post", "title": "Hello", "body": "World"}),
//! ]);
//! assert_eq!(set.len(), 1);
//! # Ok::<(), couchsphinx::Error>(())
//! ```
//!
//! # Architecture
//!
//! The data model (errors, config, store ids, the type registry) lives in
//! `couchsphinx-core`; codec, docset building and the query side live in
//! `couchsphinx-search`. Both are re-exported here.

pub use couchsphinx_core::*;
pub use couchsphinx_search::*;

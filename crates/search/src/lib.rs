//! Docset synthesis and search-hit reconstruction
//!
//! This crate provides:
//! - MultiAttributeCodec: type names to and from sortable integer sequences
//! - Normalizer: raw store rows to typed documents and flat records
//! - FieldCatalog / SchemaDeriver: per-type fields and the per-batch schema
//! - DocsetBuilder / DocumentSet: the xmlpipe2 stream for the batch indexer
//! - ResultReconstructor: search hits back to store ids
//! - FulltextSearch: query, reconstruct and fetch, over pluggable collaborators
//!
//! # Usage
//!
//! ```ignore
//! use couchsphinx_search::{DocsetBuilder, FieldCatalog};
//!
//! let catalog = FieldCatalog::new(Arc::new(config.registry()));
//! let docset = DocsetBuilder::from_config(&catalog, &config)?.build(rows);
//! docset.write_to(std::io::stdout().lock())?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod docset;
pub mod fulltext;
pub mod multi_attribute;
pub mod normalizer;
pub mod query;
pub mod reconstruct;
pub mod schema;

// Re-export commonly used types
pub use docset::{DocsetBuilder, Document, DocumentSet, DOCSET_FOOTER, XML_DECLARATION};
pub use fulltext::{FetchedRow, FulltextSearch, SearchOutcome};
pub use multi_attribute::{MultiAttributeCodec, MultiAttributeValue, MAX_ATTRIBUTE_VALUE};
pub use normalizer::{Normalizer, RawRow, Record};
pub use query::{
    DocumentStore, MatchMode, QueryResponse, SearchClient, SearchHit, SearchOptions,
    SearchQuery, SortMode,
};
pub use reconstruct::ResultReconstructor;
pub use schema::{FieldCatalog, Schema, SchemaDeriver};

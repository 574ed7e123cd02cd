//! Core types for couchsphinx
//!
//! This crate defines the foundational types shared by the indexing and
//! query sides, with no knowledge of the search engine's wire format:
//! - Error: error type and `Result` alias
//! - StoreId: `<TypeName>-<digits>` store identifiers
//! - Indexable / TypedDocument: typed documents fed to the indexer
//! - TypeRegistry / TypeDef: explicit type-name to factory mapping
//! - IndexerConfig: `couchsphinx.toml` configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod document;
pub mod error;
pub mod registry;
pub mod store_id;

pub use config::{
    IndexerConfig, TypeConfig, CONFIG_FILE_NAME, DEFAULT_STRIDE, DEFAULT_TAG_ATTRIBUTE,
    DEFAULT_TYPE_FIELD,
};
pub use document::{Fields, Indexable, TypedDocument, DOC_KEY, ID_KEY, VALUE_KEY};
pub use error::{Error, Result};
pub use registry::{
    default_factory, is_element_name, is_type_name, Factory, TypeDef, TypeRegistry,
};
pub use store_id::StoreId;

// Stored property values are plain JSON values
pub use serde_json::Value;

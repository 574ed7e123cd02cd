//! Typed store documents
//!
//! This module defines:
//! - Fields: ordered property map of a stored document
//! - Indexable: what the indexer needs to know about a typed document
//! - TypedDocument: generic typed document built by the registry's default factory

use crate::store_id::StoreId;
use serde_json::Value;
use std::fmt;

/// Ordered property map of a stored document
///
/// Insertion order is preserved so docsets built from the same rows are
/// byte-identical.
pub type Fields = serde_json::Map<String, Value>;

/// Reserved key holding the store id of a raw row
pub const ID_KEY: &str = "_id";

/// Reserved key holding the nested document of a view row
pub const VALUE_KEY: &str = "value";

/// Reserved key holding the included document of a multi-get row
pub const DOC_KEY: &str = "doc";

/// A typed document that can be fed to the indexer
///
/// Implementors expose their store id, their type name and their
/// properties. Property values may be `Value::Null` for properties a
/// type declares but an instance does not set.
pub trait Indexable: fmt::Debug + Send + Sync {
    /// Full store id (`<TypeName>-<digits>`), if one was assigned
    fn store_id(&self) -> Option<&str>;

    /// Registered type name
    fn type_name(&self) -> &str;

    /// All properties of this document in declaration order
    fn properties(&self) -> Fields;

    /// Numeric part of the store id, usable as search engine document id
    ///
    /// Returns `None` unless the store id is exactly `<type_name>-<digits>`.
    fn numeric_id(&self) -> Option<u64> {
        StoreId::numeric_suffix(self.type_name(), self.store_id()?)
    }
}

/// Generic typed document
///
/// Produced by the default factory of the type registry: the type name is
/// fixed by registration, the id comes from `_id` and the properties are
/// projected from the raw row.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedDocument {
    type_name: String,
    id: Option<String>,
    properties: Fields,
}

impl TypedDocument {
    /// Create a typed document from its parts
    pub fn new(type_name: impl Into<String>, id: Option<String>, properties: Fields) -> Self {
        TypedDocument {
            type_name: type_name.into(),
            id,
            properties,
        }
    }

    /// Borrow the properties without cloning
    pub fn properties_ref(&self) -> &Fields {
        &self.properties
    }

    /// Get a single property
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

impl Indexable for TypedDocument {
    fn store_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn properties(&self) -> Fields {
        self.properties.clone()
    }
}

//! Type registry
//!
//! Maps type names found in stored rows to factories that turn the raw
//! property map into a typed document. The registry is populated once at
//! startup and read-only afterwards; an unregistered name is reported as
//! [`Error::UnknownType`] rather than silently ignored.
//!
//! ## Registration
//!
//! ```
//! use couchsphinx_core::{TypeDef, TypeRegistry};
//!
//! let mut registry = TypeRegistry::new("couchrest-type");
//! registry.register(TypeDef::new("Post").with_properties(["title", "body"]));
//! assert!(registry.contains("Post"));
//! ```

use crate::document::{Fields, Indexable, TypedDocument, ID_KEY};
use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Factory turning a raw row into a typed document
///
/// The row passed in no longer contains the type field.
pub type Factory = Arc<dyn Fn(&TypeDef, Fields) -> Result<Box<dyn Indexable>> + Send + Sync>;

/// Declaration of an indexable type
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeDef {
    /// Type name as stored in the type field of each row
    pub name: String,
    /// Declared properties, in order; empty means "whatever the row carries"
    pub properties: Vec<String>,
    /// Declared full-text keys; empty means "infer from the first instance"
    pub fulltext_keys: Vec<String>,
}

impl TypeDef {
    /// Declare a type with no properties and no full-text keys
    pub fn new(name: impl Into<String>) -> Self {
        TypeDef {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder: set declared properties
    pub fn with_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = properties.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set declared full-text keys
    pub fn with_fulltext<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fulltext_keys = keys.into_iter().map(Into::into).collect();
        self
    }
}

struct Entry {
    def: TypeDef,
    factory: Factory,
}

/// Registry of indexable types, keyed by type name
pub struct TypeRegistry {
    type_field: String,
    types: HashMap<String, Entry>,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("type_field", &self.type_field)
            .field("types", &self.names())
            .finish()
    }
}

impl TypeRegistry {
    /// Create an empty registry reading type names from `type_field`
    pub fn new(type_field: impl Into<String>) -> Self {
        TypeRegistry {
            type_field: type_field.into(),
            types: HashMap::new(),
        }
    }

    /// Name of the field carrying the type name in stored rows
    pub fn type_field(&self) -> &str {
        &self.type_field
    }

    /// Register a type using the default factory
    pub fn register(&mut self, def: TypeDef) {
        self.register_with(def, Arc::new(default_factory));
    }

    /// Register a type with a custom factory
    ///
    /// Registering a name twice replaces the earlier entry.
    pub fn register_with(&mut self, def: TypeDef, factory: Factory) {
        if !is_type_name(&def.name) {
            tracing::warn!(
                target: "couchsphinx::registry",
                type_name = ?def.name,
                "Registered type name cannot be indexed"
            );
        }
        tracing::debug!(target: "couchsphinx::registry", type_name = %def.name, "Registered type");
        self.types.insert(def.name.clone(), Entry { def, factory });
    }

    /// Is `type_name` registered?
    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Declaration of `type_name`
    pub fn get(&self, type_name: &str) -> Result<&TypeDef> {
        self.types
            .get(type_name)
            .map(|e| &e.def)
            .ok_or_else(|| Error::UnknownType(type_name.to_string()))
    }

    /// Registered type names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Type name carried by a raw row, if any
    pub fn type_of<'a>(&self, row: &'a Fields) -> Option<&'a str> {
        row.get(&self.type_field).and_then(Value::as_str)
    }

    /// Materialize a typed document from a raw row
    ///
    /// # Errors
    ///
    /// - `MissingTypeName` if the row has no string type field
    /// - `UnknownType` if the type is not registered
    /// - whatever the type's factory returns
    pub fn materialize(&self, row: &Fields) -> Result<Box<dyn Indexable>> {
        let type_name = self.type_of(row).ok_or(Error::MissingTypeName)?;
        let entry = self
            .types
            .get(type_name)
            .ok_or_else(|| Error::UnknownType(type_name.to_string()))?;

        let fields: Fields = row
            .iter()
            .filter(|(k, _)| **k != self.type_field)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        (entry.factory)(&entry.def, fields)
    }
}

/// Default factory: builds a [`TypedDocument`]
///
/// The id is taken from `_id`, which must be a string when present.
/// Declared properties are projected from the row (absent ones become
/// null); without declared properties every key not starting with `_`
/// is kept.
pub fn default_factory(def: &TypeDef, row: Fields) -> Result<Box<dyn Indexable>> {
    let id = match row.get(ID_KEY) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            return Err(Error::materialize(
                &def.name,
                format!("{} must be a string, got {}", ID_KEY, other),
            ))
        }
    };

    let properties: Fields = if def.properties.is_empty() {
        row.into_iter().filter(|(k, _)| !k.starts_with('_')).collect()
    } else {
        def.properties
            .iter()
            .map(|p| (p.clone(), row.get(p).cloned().unwrap_or(Value::Null)))
            .collect()
    };

    Ok(Box::new(TypedDocument::new(&def.name, id, properties)))
}

/// Is `name` usable as a type name?
///
/// A type name travels as an encoded tag through the search index and is
/// glued back onto the numeric id on the way out, and it appears after a
/// `@field` filter in scoped queries. Any non-empty name without
/// whitespace or control characters survives both (`Blog::Post`,
/// `Blog-Post`, `Café`). Indexing and reconstruction both use this check.
pub fn is_type_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| !c.is_whitespace() && !c.is_control() && !matches!(c, '\u{FFFE}' | '\u{FFFF}'))
}

/// Can `name` be written as an XML element name without escaping?
///
/// Accepts XML names without namespace prefixes: a letter or `_`, then
/// letters, digits, `_`, `-` or `.`.
pub fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

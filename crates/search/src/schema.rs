//! Field catalog and schema derivation
//!
//! This module provides:
//! - FieldCatalog: per-type indexable field names, declared or inferred
//! - SchemaDeriver: collects the types of a batch and unions their fields
//! - Schema: the field list shared by every document of one docset

use couchsphinx_core::{is_element_name, Fields, Indexable, TypeRegistry};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

// ============================================================================
// FieldCatalog
// ============================================================================

/// Indexable field names per type
///
/// A type's fields are its declared full-text keys. A type that declares
/// none is indexed on every property of the first instance the catalog
/// sees; that choice is cached and sticks for the catalog's lifetime.
///
/// # Thread Safety
///
/// The inference cache sits behind a `RwLock`, so one catalog can be shared
/// by concurrent batches. Racing first instances of the same type resolve
/// to whichever writer takes the lock first.
#[derive(Debug)]
pub struct FieldCatalog {
    registry: Arc<TypeRegistry>,
    fields: RwLock<HashMap<String, Arc<[String]>>>,
}

impl FieldCatalog {
    /// Create a catalog over a registry
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        FieldCatalog {
            registry,
            fields: RwLock::new(HashMap::new()),
        }
    }

    /// The registry this catalog reads declarations from
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Shared handle to the registry
    pub fn registry_arc(&self) -> Arc<TypeRegistry> {
        Arc::clone(&self.registry)
    }

    /// Fields already fixed for `type_name`, without inferring
    pub fn known_fields(&self, type_name: &str) -> Option<Arc<[String]>> {
        if let Some(fields) = self.fields.read().get(type_name) {
            return Some(Arc::clone(fields));
        }
        self.declared(type_name)
    }

    /// Indexable fields for the type of `obj`, inferring from `obj` if needed
    pub fn indexable_fields(&self, obj: &dyn Indexable) -> Arc<[String]> {
        let type_name = obj.type_name();
        if let Some(fields) = self.known_fields(type_name) {
            return fields;
        }

        let inferred: Arc<[String]> = obj.properties().keys().cloned().collect();
        let mut cache = self.fields.write();
        let fields = cache.entry(type_name.to_string()).or_insert_with(|| {
            debug!(
                target: "couchsphinx::schema",
                type_name,
                fields = inferred.len(),
                "Inferred indexable fields from first instance"
            );
            inferred
        });
        Arc::clone(fields)
    }

    /// Properties of `obj` restricted to its indexable fields
    pub fn fulltext_attributes(&self, obj: &dyn Indexable) -> Fields {
        let fields = self.indexable_fields(obj);
        obj.properties()
            .into_iter()
            .filter(|(k, _)| fields.contains(k))
            .collect()
    }

    fn declared(&self, type_name: &str) -> Option<Arc<[String]>> {
        let def = self.registry.get(type_name).ok()?;
        if def.fulltext_keys.is_empty() {
            return None;
        }
        Some(def.fulltext_keys.iter().cloned().collect())
    }
}

// ============================================================================
// Schema
// ============================================================================

/// Field layout shared by all documents of a docset
///
/// Holds the union of the indexable fields of every type in the batch,
/// followed by two fixed entries: the type-name field and the multi-valued
/// type-tag attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    field_names: Vec<String>,
    type_field: String,
    tag_attribute: String,
}

impl Schema {
    /// Union `field_sets` in order, dropping duplicates and unusable names
    ///
    /// Names that clash with the fixed fields or are not valid element
    /// names are left out.
    pub fn from_field_sets<'a, I>(field_sets: I, type_field: &str, tag_attribute: &str) -> Self
    where
        I: IntoIterator<Item = &'a [String]>,
    {
        let mut seen = HashSet::new();
        let mut field_names = Vec::new();

        for name in field_sets.into_iter().flatten() {
            if name == type_field || name == tag_attribute {
                continue;
            }
            if !is_element_name(name) {
                warn!(
                    target: "couchsphinx::schema",
                    field = %name,
                    "Dropping field whose name is not an XML element name"
                );
                continue;
            }
            if seen.insert(name.as_str()) {
                field_names.push(name.clone());
            }
        }

        Schema {
            field_names,
            type_field: type_field.to_string(),
            tag_attribute: tag_attribute.to_string(),
        }
    }

    /// Full-text fields, without the fixed entries
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Name of the fixed type-name field
    pub fn type_field(&self) -> &str {
        &self.type_field
    }

    /// Name of the fixed type-tag attribute
    pub fn tag_attribute(&self) -> &str {
        &self.tag_attribute
    }

    /// Every schema entry in declaration order, fixed entries last
    pub fn all_names(&self) -> Vec<&str> {
        self.field_names
            .iter()
            .map(String::as_str)
            .chain([self.type_field.as_str(), self.tag_attribute.as_str()])
            .collect()
    }
}

// ============================================================================
// SchemaDeriver
// ============================================================================

/// Collects the distinct types of a batch, then derives its schema
///
/// Types are kept in first-seen order. Every resolved object should be
/// observed, including those later skipped for lacking a numeric id.
#[derive(Debug)]
pub struct SchemaDeriver<'a> {
    catalog: &'a FieldCatalog,
    types: Vec<(String, Arc<[String]>)>,
}

impl<'a> SchemaDeriver<'a> {
    /// Start collecting types for one batch
    pub fn new(catalog: &'a FieldCatalog) -> Self {
        SchemaDeriver {
            catalog,
            types: Vec::new(),
        }
    }

    /// Record the type of a resolved object
    pub fn observe(&mut self, obj: &dyn Indexable) {
        if self.types.iter().any(|(name, _)| name == obj.type_name()) {
            return;
        }
        let fields = self.catalog.indexable_fields(obj);
        self.types.push((obj.type_name().to_string(), fields));
    }

    /// Distinct type names seen so far, in first-seen order
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|(name, _)| name.as_str())
    }

    /// Union the fields of every observed type
    pub fn derive(&self, type_field: &str, tag_attribute: &str) -> Schema {
        Schema::from_field_sets(
            self.types.iter().map(|(_, fields)| &fields[..]),
            type_field,
            tag_attribute,
        )
    }
}

//! Record normalization
//!
//! Turns rows of unknown shape into typed documents and then into flat
//! [`Record`]s ready for serialization. Rows come either as already-typed
//! documents or as raw JSON straight from a store view, where the document
//! may sit one level down under `value`.

use crate::schema::FieldCatalog;
use couchsphinx_core::{
    Error, Fields, Indexable, Result, TypeRegistry, TypedDocument, Value, VALUE_KEY,
};
use tracing::debug;

/// One input row of an indexing batch
#[derive(Debug)]
pub enum RawRow {
    /// Already-typed document
    Typed(Box<dyn Indexable>),
    /// Raw store row, typed through the registry
    Untyped(Value),
}

impl From<Value> for RawRow {
    fn from(value: Value) -> Self {
        RawRow::Untyped(value)
    }
}

impl From<Box<dyn Indexable>> for RawRow {
    fn from(doc: Box<dyn Indexable>) -> Self {
        RawRow::Typed(doc)
    }
}

impl From<TypedDocument> for RawRow {
    fn from(doc: TypedDocument) -> Self {
        RawRow::Typed(Box::new(doc))
    }
}

/// A normalized row: numeric id, type name and indexable fields
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Numeric id handed to the search engine
    pub id: u64,
    /// Full store id, `<type_name>-<id>`
    pub store_id: String,
    /// Type name
    pub type_name: String,
    /// Indexable fields of the document
    pub fields: Fields,
}

/// Resolves raw rows and typed documents into records
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    catalog: &'a FieldCatalog,
}

impl<'a> Normalizer<'a> {
    /// Create a normalizer over a field catalog
    pub fn new(catalog: &'a FieldCatalog) -> Self {
        Normalizer { catalog }
    }

    /// Registry used to type raw rows
    pub fn registry(&self) -> &'a TypeRegistry {
        self.catalog.registry()
    }

    /// Resolve a row to a typed document
    ///
    /// # Errors
    ///
    /// - `NotADocument` if an untyped row is not a JSON object
    /// - `MissingTypeName` if neither the row nor its `value` carries a type
    /// - `UnknownType` / `Materialize` from the registry
    pub fn resolve(&self, row: RawRow) -> Result<Box<dyn Indexable>> {
        match row {
            RawRow::Typed(doc) => Ok(doc),
            RawRow::Untyped(value) => {
                let fields = unwrap_view_row(value, self.registry().type_field())?;
                self.registry().materialize(&fields)
            }
        }
    }

    /// Flatten a typed document into a record
    ///
    /// # Errors
    ///
    /// - `MissingId` if the document has no store id
    /// - `IncompatibleId` if the store id is not `<type_name>-<digits>`
    pub fn record(&self, doc: &dyn Indexable) -> Result<Record> {
        let store_id = doc.store_id().ok_or(Error::MissingId)?;
        let id = doc.numeric_id().ok_or_else(|| Error::IncompatibleId {
            store_id: store_id.to_string(),
        })?;

        Ok(Record {
            id,
            store_id: store_id.to_string(),
            type_name: doc.type_name().to_string(),
            fields: self.catalog.fulltext_attributes(doc),
        })
    }

    /// Resolve and flatten a row, dropping it on any failure
    pub fn normalize(&self, row: RawRow) -> Option<Record> {
        let doc = match self.resolve(row) {
            Ok(doc) => doc,
            Err(e) => {
                debug!(target: "couchsphinx::normalizer", reason = %e, "Skipping unresolvable row");
                return None;
            }
        };
        match self.record(doc.as_ref()) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(
                    target: "couchsphinx::normalizer",
                    type_name = doc.type_name(),
                    reason = %e,
                    "Skipping row without numeric id"
                );
                None
            }
        }
    }
}

/// Unwrap a raw store row into the property map of the document it carries
///
/// View rows carry the document under `value`; that nesting is removed
/// when the row itself has no type field.
pub fn unwrap_view_row(value: Value, type_field: &str) -> Result<Fields> {
    let mut map = match value {
        Value::Object(map) => map,
        other => return Err(Error::NotADocument(json_kind(&other).to_string())),
    };

    if map.contains_key(type_field) {
        return Ok(map);
    }
    match map.remove(VALUE_KEY) {
        Some(Value::Object(inner)) if inner.contains_key(type_field) => Ok(inner),
        _ => Err(Error::MissingTypeName),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Docset synthesis
//!
//! Builds the xmlpipe2 stream consumed by the search engine's batch
//! indexer. A docset is one schema header, one `sphinx:document` block per
//! indexable row, and a closing footer:
//!
//! ```text
//! <?xml version="1.0" encoding="utf-8"?>
//! <sphinx:docset>
//! <sphinx:schema>
//! <sphinx:field name="name"/>
//! <sphinx:field name="couchrest-type"/>
//! <sphinx:attr name="csphinx-class" type="multi"/>
//! </sphinx:schema>
//! <sphinx:document id="234164"><csphinx-class>321,612,...</csphinx-class>...</sphinx:document>
//! </sphinx:docset>
//! ```
//!
//! Building is two-phase: every row is resolved and its type observed
//! before the schema is derived, and only then are documents serialized.

use crate::multi_attribute::{MultiAttributeCodec, MultiAttributeValue};
use crate::normalizer::{Normalizer, RawRow, Record};
use crate::schema::{FieldCatalog, Schema, SchemaDeriver};
use couchsphinx_core::{
    is_element_name, is_type_name, Error, Fields, Indexable, IndexerConfig, Result, Value,
    DEFAULT_TAG_ATTRIBUTE,
};
use std::fmt;
use std::io::Write;
use tracing::{debug, info, warn};

/// XML declaration opening every docset
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Closing marker of every docset
pub const DOCSET_FOOTER: &str = "</sphinx:docset>";

// ============================================================================
// Document
// ============================================================================

/// One serialized `sphinx:document` block
///
/// Immutable once built; carries its fields already projected onto the
/// docset schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: u64,
    type_name: String,
    type_tag: MultiAttributeValue,
    fields: Vec<(String, String)>,
    xml: String,
}

impl Document {
    /// Serialize one document against `schema`
    ///
    /// Schema fields missing from `properties` render empty; properties not
    /// in the schema are dropped.
    ///
    /// # Errors
    ///
    /// - `MissingTypeName` if `type_name` is empty
    /// - `InvalidTypeName` if `type_name` could not be reconstructed from a hit
    /// - `InvalidConfig` if the schema's fixed names are not element names
    /// - `TypeTagTooLong` if the encoded type name would not fit the attribute
    pub fn new(
        id: u64,
        type_name: &str,
        properties: &Fields,
        schema: &Schema,
        codec: &MultiAttributeCodec,
    ) -> Result<Self> {
        if type_name.is_empty() {
            return Err(Error::MissingTypeName);
        }
        if !is_type_name(type_name) {
            return Err(Error::InvalidTypeName(type_name.to_string()));
        }
        check_element_name(schema.type_field())?;
        check_element_name(schema.tag_attribute())?;
        if type_name.len() > codec.max_len() {
            return Err(Error::TypeTagTooLong {
                type_name: type_name.to_string(),
                len: type_name.len(),
                max: codec.max_len(),
            });
        }

        let type_tag = codec.encode_str(type_name);
        let fields: Vec<(String, String)> = schema
            .field_names()
            .iter()
            .map(|name| {
                let text = properties.get(name).map(render_value).unwrap_or_default();
                (name.clone(), text)
            })
            .collect();

        let mut xml = format!(r#"<sphinx:document id="{}">"#, id);
        push_element(&mut xml, schema.tag_attribute(), &type_tag.to_string());
        push_element(&mut xml, schema.type_field(), &escape_text(type_name));
        for (name, text) in &fields {
            push_element(&mut xml, name, &cdata(text));
        }
        xml.push_str("</sphinx:document>");

        Ok(Document {
            id,
            type_name: type_name.to_string(),
            type_tag,
            fields,
            xml,
        })
    }

    /// Serialize a normalized record
    pub fn from_record(
        record: &Record,
        schema: &Schema,
        codec: &MultiAttributeCodec,
    ) -> Result<Self> {
        Self::new(record.id, &record.type_name, &record.fields, schema, codec)
    }

    /// Serialize a typed document, indexing only its full-text fields
    ///
    /// # Errors
    ///
    /// `MissingId` or `IncompatibleId` if the document has no numeric id,
    /// plus the errors of [`Document::new`].
    pub fn from_object(
        doc: &dyn Indexable,
        catalog: &FieldCatalog,
        schema: &Schema,
        codec: &MultiAttributeCodec,
    ) -> Result<Self> {
        let record = Normalizer::new(catalog).record(doc)?;
        Self::from_record(&record, schema, codec)
    }

    /// Search engine document id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Type name of the document
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Encoded type name
    pub fn type_tag(&self) -> &MultiAttributeValue {
        &self.type_tag
    }

    /// Rendered field texts, in schema order
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Text of one field
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, text)| text.as_str())
    }

    /// The `sphinx:document` block
    pub fn to_xml(&self) -> &str {
        &self.xml
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.xml)
    }
}

// ============================================================================
// DocumentSet
// ============================================================================

/// A complete docset: schema header, documents, footer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSet {
    schema: Schema,
    documents: Vec<Document>,
}

impl DocumentSet {
    /// Assemble a docset from a schema and documents built against it
    pub fn new(schema: Schema, documents: Vec<Document>) -> Self {
        DocumentSet { schema, documents }
    }

    /// Shared schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Documents in input order
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True if no row survived normalization
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// XML declaration, docset opening and schema declaration
    pub fn header(&self) -> String {
        let mut xml = String::with_capacity(128 + 48 * self.schema.field_names().len());
        xml.push_str(XML_DECLARATION);
        xml.push_str("\n<sphinx:docset>\n<sphinx:schema>\n");
        for name in self.schema.field_names() {
            xml.push_str(&format!("<sphinx:field name=\"{}\"/>\n", name));
        }
        xml.push_str(&format!(
            "<sphinx:field name=\"{}\"/>\n",
            escape_text(self.schema.type_field())
        ));
        xml.push_str(&format!(
            "<sphinx:attr name=\"{}\" type=\"multi\"/>\n",
            escape_text(self.schema.tag_attribute())
        ));
        xml.push_str("</sphinx:schema>\n");
        xml
    }

    /// Closing marker
    pub fn footer(&self) -> &'static str {
        DOCSET_FOOTER
    }

    /// Whole docset as one string
    pub fn to_xml(&self) -> String {
        self.to_string()
    }

    /// Stream the docset, e.g. to the indexer's stdin
    pub fn write_to<W: Write>(&self, mut out: W) -> Result<()> {
        out.write_all(self.header().as_bytes())?;
        for doc in &self.documents {
            out.write_all(doc.to_xml().as_bytes())?;
            out.write_all(b"\n")?;
        }
        out.write_all(DOCSET_FOOTER.as_bytes())?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }
}

impl fmt::Display for DocumentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header())?;
        for doc in &self.documents {
            writeln!(f, "{}", doc)?;
        }
        writeln!(f, "{}", DOCSET_FOOTER)
    }
}

// ============================================================================
// DocsetBuilder
// ============================================================================

/// Builds docsets from batches of raw rows
///
/// Rows that cannot be typed or carry no numeric id are dropped, never
/// failing the batch.
#[derive(Debug, Clone)]
pub struct DocsetBuilder<'a> {
    catalog: &'a FieldCatalog,
    codec: MultiAttributeCodec,
    tag_attribute: String,
}

impl<'a> DocsetBuilder<'a> {
    /// Builder with the default codec and tag attribute
    pub fn new(catalog: &'a FieldCatalog) -> Self {
        DocsetBuilder {
            catalog,
            codec: MultiAttributeCodec::default(),
            tag_attribute: DEFAULT_TAG_ATTRIBUTE.to_string(),
        }
    }

    /// Builder configured from `couchsphinx.toml` settings
    pub fn from_config(catalog: &'a FieldCatalog, config: &IndexerConfig) -> Result<Self> {
        Self::new(catalog)
            .with_codec(MultiAttributeCodec::new(config.stride)?)
            .with_tag_attribute(&config.tag_attribute)
    }

    /// Builder: set the codec
    pub fn with_codec(mut self, codec: MultiAttributeCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Builder: set the name of the type-tag attribute
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if `name` is not usable as an XML element name.
    pub fn with_tag_attribute(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        check_element_name(&name)?;
        self.tag_attribute = name;
        Ok(self)
    }

    /// Codec used for type tags
    pub fn codec(&self) -> &MultiAttributeCodec {
        &self.codec
    }

    /// Build a docset from a batch of rows
    pub fn build<I>(&self, rows: I) -> DocumentSet
    where
        I: IntoIterator,
        I::Item: Into<RawRow>,
    {
        let normalizer = Normalizer::new(self.catalog);
        let mut deriver = SchemaDeriver::new(self.catalog);
        let mut records: Vec<Record> = Vec::new();
        let mut skipped = 0usize;

        // Phase 1: resolve every row and collect its type
        for row in rows {
            let doc = match normalizer.resolve(row.into()) {
                Ok(doc) => doc,
                Err(e) => {
                    debug!(target: "couchsphinx::docset", reason = %e, "Skipping unresolvable row");
                    skipped += 1;
                    continue;
                }
            };
            deriver.observe(doc.as_ref());
            match normalizer.record(doc.as_ref()) {
                Ok(record) => records.push(record),
                Err(e) => {
                    debug!(
                        target: "couchsphinx::docset",
                        type_name = doc.type_name(),
                        reason = %e,
                        "Skipping row without numeric id"
                    );
                    skipped += 1;
                }
            }
        }

        // Phase 2: the schema is final before any document is serialized
        let schema = deriver.derive(self.catalog.registry().type_field(), &self.tag_attribute);

        let mut documents = Vec::with_capacity(records.len());
        for record in &records {
            match Document::from_record(record, &schema, &self.codec) {
                Ok(doc) => documents.push(doc),
                Err(e) => {
                    warn!(
                        target: "couchsphinx::docset",
                        store_id = %record.store_id,
                        reason = %e,
                        "Skipping unserializable record"
                    );
                    skipped += 1;
                }
            }
        }

        info!(
            target: "couchsphinx::docset",
            documents = documents.len(),
            fields = schema.field_names().len(),
            skipped,
            "Built docset"
        );
        DocumentSet::new(schema, documents)
    }
}

// ============================================================================
// Rendering helpers
// ============================================================================

/// Text form of a property value
///
/// Null renders empty, strings as themselves, other scalars in their
/// textual form, arrays and objects as compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn check_element_name(name: &str) -> Result<()> {
    if is_element_name(name) {
        return Ok(());
    }
    Err(Error::InvalidConfig(format!(
        "{:?} cannot be used as a docset element name",
        name
    )))
}

fn push_element(xml: &mut String, name: &str, body: &str) {
    xml.push('<');
    xml.push_str(name);
    xml.push('>');
    xml.push_str(body);
    xml.push_str("</");
    xml.push_str(name);
    xml.push('>');
}

/// Wrap text in CDATA, splitting any embedded `]]>`
///
/// Characters XML 1.0 cannot carry at all are dropped.
pub fn cdata(text: &str) -> String {
    let clean: String = text.chars().filter(|&c| is_xml_char(c)).collect();
    format!("<![CDATA[{}]]>", clean.replace("]]>", "]]]]><![CDATA[>"))
}

/// Escape markup characters in element text or attribute values
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().filter(|&c| is_xml_char(c)) {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..)
}

//! Indexer configuration via `couchsphinx.toml`
//!
//! Every key has a default, so an empty file is a valid configuration.
//! The configuration is read once at startup; the type registry and the
//! codec stride derived from it are immutable afterwards.

use crate::error::{Error, Result};
use crate::registry::{is_element_name, is_type_name, TypeDef, TypeRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Config file name looked up by host applications.
pub const CONFIG_FILE_NAME: &str = "couchsphinx.toml";

/// Default name of the field holding a document's type name.
pub const DEFAULT_TYPE_FIELD: &str = "couchrest-type";

/// Default name of the multi-valued attribute holding the encoded type tag.
pub const DEFAULT_TAG_ATTRIBUTE: &str = "csphinx-class";

/// Default per-position stride of the multi-attribute codec.
pub const DEFAULT_STRIDE: u64 = 256;

/// Per-type section of the configuration (`[types.<Name>]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypeConfig {
    /// Declared properties, in order
    #[serde(default)]
    pub properties: Vec<String>,
    /// Declared full-text keys; empty means inferred from the first instance
    #[serde(default)]
    pub fulltext: Vec<String>,
}

/// Indexer configuration loaded from `couchsphinx.toml`.
///
/// # Example
///
/// ```toml
/// server = "localhost"
/// port = 3312
///
/// [types.Post]
/// properties = ["title", "body", "author"]
/// fulltext = ["title", "body"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexerConfig {
    /// Host of the search daemon, for the host's `SearchClient`
    #[serde(default = "default_server")]
    pub server: String,
    /// Port of the search daemon, for the host's `SearchClient`
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bit width of generated numeric store ids
    #[serde(default = "default_id_bits")]
    pub id_bits: u8,
    /// Codec stride; must exceed the largest byte value
    #[serde(default = "default_stride")]
    pub stride: u64,
    /// Field carrying the type name, in rows and in the docset
    #[serde(default = "default_type_field")]
    pub type_field: String,
    /// Multi-valued attribute carrying the encoded type name
    #[serde(default = "default_tag_attribute")]
    pub tag_attribute: String,
    /// Default match mode for queries
    #[serde(default = "default_match_mode")]
    pub match_mode: String,
    /// Indexable types
    #[serde(default)]
    pub types: BTreeMap<String, TypeConfig>,
}

fn default_server() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3312
}

fn default_id_bits() -> u8 {
    32
}

fn default_stride() -> u64 {
    DEFAULT_STRIDE
}

fn default_type_field() -> String {
    DEFAULT_TYPE_FIELD.to_string()
}

fn default_tag_attribute() -> String {
    DEFAULT_TAG_ATTRIBUTE.to_string()
}

fn default_match_mode() -> String {
    "extended".to_string()
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            port: default_port(),
            id_bits: default_id_bits(),
            stride: default_stride(),
            type_field: default_type_field(),
            tag_attribute: default_tag_attribute(),
            match_mode: default_match_mode(),
            types: BTreeMap::new(),
        }
    }
}

impl IndexerConfig {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: IndexerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(target: "couchsphinx::config", path = ?path, "No config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check the configuration for inconsistencies.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the stride does not exceed 255, `id_bits`
    /// is outside `1..=64`, the fixed field names are empty, equal or not
    /// usable as XML element names, or a type name could not survive a
    /// round trip through the index.
    pub fn validate(&self) -> Result<()> {
        if self.stride <= u8::MAX as u64 {
            return Err(Error::InvalidConfig(format!(
                "stride must exceed 255, got {}",
                self.stride
            )));
        }
        if !(1..=64).contains(&self.id_bits) {
            return Err(Error::InvalidConfig(format!(
                "id_bits must be within 1..=64, got {}",
                self.id_bits
            )));
        }
        if self.type_field.is_empty() || self.tag_attribute.is_empty() {
            return Err(Error::InvalidConfig(
                "type_field and tag_attribute must not be empty".to_string(),
            ));
        }
        if let Some(bad) = [&self.type_field, &self.tag_attribute]
            .into_iter()
            .find(|name| !is_element_name(name))
        {
            return Err(Error::InvalidConfig(format!(
                "{:?} cannot be used as a docset element name",
                bad
            )));
        }
        if self.type_field == self.tag_attribute {
            return Err(Error::InvalidConfig(format!(
                "type_field and tag_attribute must differ, both are {:?}",
                self.type_field
            )));
        }
        if let Some(bad) = self.types.keys().find(|name| !is_type_name(name)) {
            return Err(Error::InvalidConfig(format!("invalid type name {:?}", bad)));
        }
        Ok(())
    }

    /// `host:port` of the search daemon.
    ///
    /// The library never connects itself; hosts pass this to whatever wire
    /// client backs their `SearchClient`.
    pub fn daemon_address(&self) -> String {
        format!("{}:{}", self.server, self.port)
    }

    /// Build the type registry declared by `[types.*]`.
    pub fn registry(&self) -> TypeRegistry {
        let mut registry = TypeRegistry::new(&self.type_field);
        for (name, ty) in &self.types {
            registry.register(
                TypeDef::new(name)
                    .with_properties(ty.properties.iter().cloned())
                    .with_fulltext(ty.fulltext.iter().cloned()),
            );
        }
        registry
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# couchsphinx configuration
#
# Search daemon address
server = "localhost"
port = 3312

# Bit width of generated numeric ids (Post-<number>)
id_bits = 32

# Field names shared by the store and the search index
type_field = "couchrest-type"
tag_attribute = "csphinx-class"

# Default match mode: "all", "any", "phrase", "boolean" or "extended"
match_mode = "extended"

# [types.Post]
# properties = ["title", "body", "author"]
# fulltext = ["title", "body"]
"#
    }
}

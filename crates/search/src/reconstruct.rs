//! Search-hit reconstruction
//!
//! The search engine only knows the numeric part of a store id. The type
//! part comes back as the encoded type-tag attribute; decoding it and
//! joining the two restores the full `<TypeName>-<digits>` id.

use crate::multi_attribute::MultiAttributeCodec;
use crate::query::SearchHit;
use couchsphinx_core::{is_type_name, IndexerConfig, Result, StoreId, DEFAULT_TAG_ATTRIBUTE};
use tracing::warn;

/// Turns search hits back into store ids
#[derive(Debug, Clone)]
pub struct ResultReconstructor {
    codec: MultiAttributeCodec,
    tag_attribute: String,
}

impl Default for ResultReconstructor {
    fn default() -> Self {
        ResultReconstructor {
            codec: MultiAttributeCodec::default(),
            tag_attribute: DEFAULT_TAG_ATTRIBUTE.to_string(),
        }
    }
}

impl ResultReconstructor {
    /// Reconstructor with the default codec and tag attribute
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstructor matching the docsets built under `config`
    pub fn from_config(config: &IndexerConfig) -> Result<Self> {
        Ok(Self::new()
            .with_codec(MultiAttributeCodec::new(config.stride)?)
            .with_tag_attribute(&config.tag_attribute))
    }

    /// Builder: set the codec
    pub fn with_codec(mut self, codec: MultiAttributeCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Builder: set the name of the type-tag attribute
    pub fn with_tag_attribute(mut self, name: impl Into<String>) -> Self {
        self.tag_attribute = name.into();
        self
    }

    /// Decode the type name carried by a hit
    ///
    /// Returns `None` if the attribute is missing, does not decode cleanly,
    /// or decodes to a name indexing would have refused.
    pub fn type_name(&self, hit: &SearchHit) -> Option<String> {
        let tag = hit.attributes.get(&self.tag_attribute)?;
        let bytes = self.codec.try_decode(tag)?;
        let name = String::from_utf8(bytes).ok()?;
        is_type_name(&name).then_some(name)
    }

    /// Store id of a hit, or `None` if its type tag is unusable
    pub fn store_id(&self, hit: &SearchHit) -> Option<StoreId> {
        self.type_name(hit).map(|name| StoreId::new(name, hit.doc))
    }

    /// Store ids of all usable hits, in hit order
    pub fn reconstruct(&self, hits: &[SearchHit]) -> Vec<String> {
        hits.iter()
            .filter_map(|hit| match self.store_id(hit) {
                Some(id) => Some(id.to_string()),
                None => {
                    warn!(
                        target: "couchsphinx::reconstruct",
                        doc = hit.doc,
                        "Dropping hit with undecodable type tag"
                    );
                    None
                }
            })
            .collect()
    }
}

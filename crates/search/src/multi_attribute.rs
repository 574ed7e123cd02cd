//! Multi-attribute codec
//!
//! Translates short byte strings (type names) to and from sequences of
//! integers suitable for a multi-valued search engine attribute.
//!
//! Multi-valued attributes come back from the engine sorted ascending by
//! value, not in the order they were written. Each byte is therefore offset
//! by a per-position stride larger than any byte value:
//!
//! `encoded[i] = (i + 1) * stride + bytes[i]`
//!
//! which makes the sequence strictly increasing, so ascending order equals
//! positional order and decoding can ignore transport order.
//!
//! # Example
//!
//! ```
//! use couchsphinx_search::MultiAttributeCodec;
//!
//! let codec = MultiAttributeCodec::default();
//! let tag = codec.encode_str("Hello");
//! assert_eq!(tag.to_string(), "328,613,876,1132,1391");
//! assert_eq!(codec.decode_str("1391,328,876,613,1132"), b"Hello");
//! ```

use couchsphinx_core::{Error, Result, DEFAULT_STRIDE};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Largest value a 32-bit multi-valued attribute can hold
pub const MAX_ATTRIBUTE_VALUE: u64 = u32::MAX as u64;

// ============================================================================
// MultiAttributeValue
// ============================================================================

/// Integer sequence stored in a multi-valued attribute
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MultiAttributeValue(Vec<u64>);

impl MultiAttributeValue {
    /// Wrap an integer sequence as received or produced
    pub fn new(values: Vec<u64>) -> Self {
        MultiAttributeValue(values)
    }

    /// The integers, in their current order
    pub fn values(&self) -> &[u64] {
        &self.0
    }

    /// Unwrap into the integer sequence
    pub fn into_inner(self) -> Vec<u64> {
        self.0
    }

    /// Number of integers
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the sequence is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u64>> for MultiAttributeValue {
    fn from(values: Vec<u64>) -> Self {
        MultiAttributeValue(values)
    }
}

/// Comma-separated wire form, e.g. `328,613,876`
impl fmt::Display for MultiAttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

/// Lenient parse of the comma-separated wire form
///
/// Tokens that are not unsigned integers parse as 0, which later decodes
/// to garbage rather than failing. Empty input yields an empty value.
impl FromStr for MultiAttributeValue {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Infallible> {
        if s.trim().is_empty() {
            return Ok(MultiAttributeValue::default());
        }
        Ok(MultiAttributeValue(
            s.split(',')
                .map(|t| t.trim().parse().unwrap_or(0))
                .collect(),
        ))
    }
}

// ============================================================================
// MultiAttributeCodec
// ============================================================================

/// Encoder/decoder between byte strings and multi-attribute values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiAttributeCodec {
    stride: u64,
}

impl Default for MultiAttributeCodec {
    fn default() -> Self {
        MultiAttributeCodec {
            stride: DEFAULT_STRIDE,
        }
    }
}

impl MultiAttributeCodec {
    /// Create a codec with an explicit stride
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` unless the stride exceeds the largest byte value.
    pub fn new(stride: u64) -> Result<Self> {
        if stride <= u8::MAX as u64 {
            return Err(Error::InvalidConfig(format!(
                "codec stride must exceed 255, got {}",
                stride
            )));
        }
        Ok(MultiAttributeCodec { stride })
    }

    /// Per-position stride
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Longest byte string whose encoding fits a 32-bit attribute
    pub fn max_len(&self) -> usize {
        ((MAX_ATTRIBUTE_VALUE - u8::MAX as u64) / self.stride) as usize
    }

    /// Encode a byte string; output is strictly ascending
    pub fn encode(&self, bytes: &[u8]) -> MultiAttributeValue {
        MultiAttributeValue(
            bytes
                .iter()
                .enumerate()
                .map(|(i, &b)| self.offset(i) + b as u64)
                .collect(),
        )
    }

    /// Encode the UTF-8 bytes of a string
    pub fn encode_str(&self, s: &str) -> MultiAttributeValue {
        self.encode(s.as_bytes())
    }

    /// Decode a value received in any order
    ///
    /// Never fails: integers outside their positional window decode to
    /// arbitrary bytes. Use [`try_decode`](Self::try_decode) to detect that.
    pub fn decode(&self, value: &MultiAttributeValue) -> Vec<u8> {
        let mut sorted = value.values().to_vec();
        sorted.sort_unstable();
        sorted
            .iter()
            .enumerate()
            .map(|(i, &v)| v.wrapping_sub(self.offset(i)) as u8)
            .collect()
    }

    /// Decode the comma-separated wire form
    pub fn decode_str(&self, text: &str) -> Vec<u8> {
        // FromStr for MultiAttributeValue is infallible
        let value: MultiAttributeValue = text.parse().unwrap_or_default();
        self.decode(&value)
    }

    /// Strict decode
    ///
    /// Returns `None` if any integer, after sorting, lies outside
    /// `[(i + 1) * stride, (i + 1) * stride + 255]` for its position `i`.
    pub fn try_decode(&self, value: &MultiAttributeValue) -> Option<Vec<u8>> {
        let mut sorted = value.values().to_vec();
        sorted.sort_unstable();
        sorted
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let offset = (i as u64 + 1).checked_mul(self.stride)?;
                u8::try_from(v.checked_sub(offset)?).ok()
            })
            .collect()
    }

    fn offset(&self, position: usize) -> u64 {
        (position as u64 + 1).wrapping_mul(self.stride)
    }
}

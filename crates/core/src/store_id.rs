//! Store identifiers
//!
//! Documents that take part in full-text indexing carry ids of the form
//! `<TypeName>-<digits>`. Only the numeric suffix is handed to the search
//! engine as its document id; the type name travels separately as an
//! encoded attribute and is glued back on when hits are reconstructed.

use crate::error::{Error, Result};
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// A fully-qualified store identifier, e.g. `Address-234164`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreId {
    type_name: String,
    number: u64,
}

impl StoreId {
    /// Create a store id from its parts
    pub fn new(type_name: impl Into<String>, number: u64) -> Self {
        StoreId {
            type_name: type_name.into(),
            number,
        }
    }

    /// Type part of the id
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Numeric part of the id, the search engine's document id
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Extract the numeric suffix of `id` if it is exactly `<type_name>-<digits>`
    ///
    /// # Example
    ///
    /// ```
    /// use couchsphinx_core::StoreId;
    ///
    /// assert_eq!(StoreId::numeric_suffix("Post", "Post-921744775"), Some(921744775));
    /// assert_eq!(StoreId::numeric_suffix("Post", "Comment-12"), None);
    /// assert_eq!(StoreId::numeric_suffix("Post", "Post-12a"), None);
    /// ```
    pub fn numeric_suffix(type_name: &str, id: &str) -> Option<u64> {
        let digits = id.strip_prefix(type_name)?.strip_prefix('-')?;
        parse_digits(digits)
    }

    /// Draw a random candidate id with a number below `2^id_bits - 1`
    ///
    /// Checking the candidate against the store is left to the caller.
    pub fn random<R: Rng + ?Sized>(type_name: &str, id_bits: u8, rng: &mut R) -> Result<Self> {
        if !(1..=64).contains(&id_bits) {
            return Err(Error::InvalidConfig(format!(
                "id_bits must be within 1..=64, got {}",
                id_bits
            )));
        }
        if type_name.is_empty() {
            return Err(Error::MissingTypeName);
        }
        let limit = if id_bits == 64 {
            u64::MAX
        } else {
            (1u64 << id_bits) - 1
        };
        // id_bits == 1 gives a limit of 1, so the only candidate is 0
        let number = if limit <= 1 { 0 } else { rng.gen_range(0..limit) };
        Ok(StoreId::new(type_name, number))
    }
}

fn parse_digits(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.type_name, self.number)
    }
}

impl FromStr for StoreId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let incompatible = || Error::IncompatibleId {
            store_id: s.to_string(),
        };
        let (type_name, digits) = s.rsplit_once('-').ok_or_else(incompatible)?;
        if type_name.is_empty() {
            return Err(incompatible());
        }
        let number = parse_digits(digits).ok_or_else(incompatible)?;
        Ok(StoreId::new(type_name, number))
    }
}

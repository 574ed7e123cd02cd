//! Error types for couchsphinx
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Only strict, single-object operations return these errors. Batch
//! operations (docset building, hit reconstruction) skip bad rows instead.

use std::io;
use thiserror::Error;

/// Result type alias for couchsphinx operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for couchsphinx
#[derive(Debug, Error)]
pub enum Error {
    /// A document was constructed without an identifier
    #[error("Missing id")]
    MissingId,

    /// A document was constructed without a type name
    #[error("Missing type name")]
    MissingTypeName,

    /// A type name cannot travel through the index and back
    #[error("Invalid type name: {0:?}")]
    InvalidTypeName(String),

    /// The store id does not carry a numeric suffix for its type
    #[error("No compatible id: {store_id:?} is not of the form <TypeName>-<digits>")]
    IncompatibleId {
        /// The offending store id
        store_id: String,
    },

    /// A raw row is neither a typed document nor a property map
    #[error("Not a document: {0}")]
    NotADocument(String),

    /// No type with this name is registered
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// The factory for a registered type rejected the stored fields
    #[error("Cannot materialize {type_name}: {reason}")]
    Materialize {
        /// Type the row claimed to be
        type_name: String,
        /// Why the factory refused it
        reason: String,
    },

    /// The encoded type tag would overflow the engine's attribute range
    #[error("Type tag for {type_name:?} too long: {len} bytes, at most {max}")]
    TypeTagTooLong {
        /// Type name being encoded
        type_name: String,
        /// Its length in bytes
        len: usize,
        /// Longest length the codec supports
        max: usize,
    },

    /// Configuration values are inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    /// I/O error (reading config, writing docsets)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A search or store collaborator failed at the transport level
    #[error("Collaborator error: {0}")]
    Collaborator(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::ConfigParse(e.to_string())
    }
}

impl Error {
    /// Build a materialization error for `type_name`
    pub fn materialize(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Materialize {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Build a collaborator error from anything printable
    pub fn collaborator(reason: impl std::fmt::Display) -> Self {
        Error::Collaborator(reason.to_string())
    }
}

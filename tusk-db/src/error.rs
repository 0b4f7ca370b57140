use std::fmt;

use tusk_core::{CodecError, CollectionProperty, Identifier, IdentifierError};

/// Errors surfaced by the persistence core.
///
/// Nothing here is retried internally; retry policy belongs to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum DbError {
    /// Identifier absent from the store, or not resolvable
    NotFound(Identifier),
    /// Release without a matching acquire
    LockNotHeld(Identifier),
    /// Document has no extractable identifier or the wrong shape
    InvalidDocument(String),
    /// Actor does not carry the requested collection property
    MissingCollection {
        actor: Identifier,
        property: CollectionProperty,
    },
    /// Caller's cancellation fired while waiting on a lock
    Cancelled(Identifier),
    /// Reverse linkage requested for a federated identifier
    UnsupportedLocality(Identifier),
    /// Every freshly minted identifier collided with a stored one
    IdentifierExhausted { attempts: u32 },
    /// Backend internal error
    StorageError(String),
    /// Serialization failed
    SerializationError(String),
    /// Deserialization failed
    DeserializationError(String),
    /// Compression error
    CompressionError(String),
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::NotFound(id) => write!(f, "Not found: {id}"),
            DbError::LockNotHeld(id) => write!(f, "Lock not held: {id}"),
            DbError::InvalidDocument(e) => write!(f, "Invalid document: {e}"),
            DbError::MissingCollection { actor, property } => {
                write!(f, "Actor {actor} has no {property} collection")
            }
            DbError::Cancelled(id) => write!(f, "Cancelled while waiting for lock on {id}"),
            DbError::UnsupportedLocality(id) => {
                write!(f, "Reverse linkage unavailable for federated identifier {id}")
            }
            DbError::IdentifierExhausted { attempts } => {
                write!(f, "No unused identifier after {attempts} attempts")
            }
            DbError::StorageError(e) => write!(f, "Storage error: {e}"),
            DbError::SerializationError(e) => write!(f, "Serialization error: {e}"),
            DbError::DeserializationError(e) => write!(f, "Deserialization error: {e}"),
            DbError::CompressionError(e) => write!(f, "Compression error: {e}"),
        }
    }
}

impl std::error::Error for DbError {}

impl From<rocksdb::Error> for DbError {
    fn from(e: rocksdb::Error) -> Self {
        DbError::StorageError(e.to_string())
    }
}

impl From<CodecError> for DbError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::Encode(e) => DbError::SerializationError(e),
            CodecError::Decode(e) => DbError::DeserializationError(e),
        }
    }
}

impl From<IdentifierError> for DbError {
    fn from(e: IdentifierError) -> Self {
        DbError::InvalidDocument(e.to_string())
    }
}

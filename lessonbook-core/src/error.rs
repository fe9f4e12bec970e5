//! Error types and result types for document store operations.
//!
//! Every fallible store operation returns [`DocumentStoreResult<T>`]. Business outcomes such as
//! "no document matched this update" are *not* errors; they are reported through the result
//! payloads in [`crate::collection`].

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The store could not be reached or configured while starting up.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// The store stopped answering while serving a request.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    /// A document identifier could not be parsed.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
    /// The document or partial update has an invalid structure.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// The collection name is not registered with the store.
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),
    /// The collection does not accept updates.
    #[error("Collection {0} is read-only")]
    ReadOnly(String),
    /// A store call did not complete within the configured deadline.
    #[error("Store call timed out after {0} ms")]
    Timeout(u64),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl DocumentStoreError {
    /// Whether the error was caused by the caller's input rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DocumentStoreError::InvalidIdentifier(_)
                | DocumentStoreError::InvalidDocument(_)
                | DocumentStoreError::UnknownCollection(_)
                | DocumentStoreError::ReadOnly(_)
        )
    }
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

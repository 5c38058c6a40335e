//! The error type shared by mapping, stores and embedded servers.
//!
//! Mapping problems surface as [`DocumentStoreError::Mapping`] while the registry is built;
//! everything after that reports through the remaining variants. Fallible operations return
//! [`DocumentStoreResult<T>`].

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Errors raised while mapping values or talking to a store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// A value could not be converted to or from BSON or JSON, or a required element is missing.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// A backend could not be configured or connected.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// Insert of an id that is already stored: `(id, collection)`.
    #[error("Document {0} already exists in collection {1}")]
    DocumentAlreadyExists(String, String),
    /// Lookup or delete of an id that is not stored: `(id, collection)`.
    #[error("Document not found {0} in collection {1}")]
    DocumentNotFound(String, String),
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    /// A document does not agree with the id it is stored under.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// A class map or convention could not be configured.
    ///
    /// Raised while building a [`ClassMapRegistry`](crate::mapping::ClassMapRegistry),
    /// so it surfaces at startup before any store is touched.
    #[error("Mapping error: {0}")]
    Mapping(String),
    /// An update expression could not be applied to a document.
    #[error("Update error: {0}")]
    Update(String),
    /// The storage backend reported a failure.
    #[error("Backend error: {0}")]
    Backend(String),
    /// An embedded server failed to start or stop.
    #[error("Server error: {0}")]
    Server(String),
}

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

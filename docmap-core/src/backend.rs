//! Storage backend abstraction.
//!
//! A [`StoreBackend`] stores raw BSON documents keyed by [`ObjectId`] in named collections.
//! Everything type-aware (class maps, encoding, element paths) happens above this layer, in
//! [`DocumentStore`](crate::store::DocumentStore) and its collections.
//!
//! ```ignore
//! use bson::{doc, oid::ObjectId};
//! use docmap::backend::StoreBackend;
//!
//! let id = ObjectId::new();
//! backend.insert_documents(vec![(id, doc! { "_id": id, "name": "Paul" })], "test").await?;
//! let found = backend.get_documents(vec![id], "test").await?;
//! ```

use async_trait::async_trait;
use bson::{Document, oid::ObjectId};
use std::fmt::Debug;

use crate::{
    error::DocumentStoreResult,
    query::{Expr, Query},
    update::{ReturnDocument, Update},
};

/// Asynchronous document storage.
///
/// Implementations must be safe to share between tasks.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts new documents, creating the collection if needed.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DocumentAlreadyExists`](crate::error::DocumentStoreError::DocumentAlreadyExists)
    /// if any id is already stored.
    async fn insert_documents(
        &self,
        documents: Vec<(ObjectId, Document)>,
        collection: &str,
    ) -> DocumentStoreResult<()>;

    /// Deletes documents by id.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DocumentNotFound`](crate::error::DocumentStoreError::DocumentNotFound)
    /// if an id is not stored.
    async fn delete_documents(&self, ids: Vec<ObjectId>, collection: &str) -> DocumentStoreResult<()>;

    /// Fetches documents by id. Unknown ids are skipped.
    async fn get_documents(
        &self,
        ids: Vec<ObjectId>,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Document>>;

    /// Returns the documents matching `query`.
    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Document>>;

    /// Applies `update` to the first document matching `filter`.
    ///
    /// Returns the document as selected by `return_document`, or `None` if nothing matched.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Update`](crate::error::DocumentStoreError::Update) if the
    /// update cannot be applied to the matched document.
    async fn find_one_and_update(
        &self,
        filter: Expr,
        update: Update,
        return_document: ReturnDocument,
        collection: &str,
    ) -> DocumentStoreResult<Option<Document>>;

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()>;

    /// Removes a collection and all of its documents.
    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()>;

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;

    /// Releases connections and other resources held by the backend.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Asynchronously constructs a backend from configuration.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}

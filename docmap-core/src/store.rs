//! The document store: a backend paired with the class maps used to encode documents.
//!
//! ```ignore
//! use std::sync::Arc;
//! use docmap::store::DocumentStore;
//!
//! let registry = Arc::new(build_registry()?);
//! let store = DocumentStore::new(backend, registry);
//!
//! let people = store.typed_collection::<Person>();
//! people.insert_one(person).await?;
//! store.drop_collection("test").await?;
//! ```

use std::sync::Arc;

use crate::{
    backend::StoreBackend,
    collection::{Collection, TypedCollection},
    document::Document,
    error::DocumentStoreResult,
    mapping::ClassMapRegistry,
};

/// Typed access to a backend through a shared [`ClassMapRegistry`].
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
    registry: Arc<ClassMapRegistry>,
}

impl<B: StoreBackend> DocumentStore<B> {
    pub fn new(backend: B, registry: Arc<ClassMapRegistry>) -> Self {
        Self { backend, registry }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &ClassMapRegistry {
        &self.registry
    }

    /// Returns the collection `D` is stored in, as named by [`Document::collection_name`].
    pub fn typed_collection<D: Document>(&self) -> TypedCollection<'_, B, D> {
        TypedCollection::new(D::collection_name().to_string(), &self.backend, &self.registry)
    }

    /// Returns a raw BSON view of the named collection.
    pub fn collection(&self, name: &str) -> Collection<'_, B> {
        Collection::new(name.to_string(), &self.backend)
    }

    pub async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.backend
            .create_collection(name)
            .await
    }

    /// Drops a collection and everything in it.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::CollectionNotFound`](crate::error::DocumentStoreError::CollectionNotFound)
    /// if the backend reports the collection as missing.
    pub async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.backend.drop_collection(name).await
    }

    pub async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        self.backend.list_collections().await
    }

    /// Consumes the store and shuts the backend down.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.backend.shutdown().await
    }
}

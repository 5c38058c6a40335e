//! Handles to a single collection of a [`DocumentStore`](crate::store::DocumentStore).
//!
//! - [`Collection`] works with raw BSON documents.
//! - [`TypedCollection`] encodes and decodes a [`Document`] type through the store's class maps.
//!
//! # Example
//!
//! ```ignore
//! let people = store.typed_collection::<Person>();
//!
//! let person = Person::new("Paul", Contacts::new());
//! people.insert_one(person.clone()).await?;
//!
//! let found = people.get(vec![*person.id()]).await?;
//! ```

use bson::{Document as BsonDocument, oid::ObjectId};
use std::marker::PhantomData;

use crate::{
    backend::StoreBackend,
    document::{Document, DocumentExt},
    error::{DocumentStoreError, DocumentStoreResult},
    mapping::ClassMapRegistry,
    query::{Expr, Query},
    update::{ReturnDocument, Update},
};

/// A collection of raw BSON documents.
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend> {
    name: String,
    backend: &'a B,
}

impl<'a, B: StoreBackend> Collection<'a, B> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts documents keyed by the given ids.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DocumentAlreadyExists`] if an id is already stored.
    pub async fn insert(&self, documents: Vec<(ObjectId, BsonDocument)>) -> DocumentStoreResult<()> {
        self.backend
            .insert_documents(documents, self.name())
            .await
    }

    /// Deletes documents by id.
    pub async fn delete(&self, ids: Vec<ObjectId>) -> DocumentStoreResult<()> {
        self.backend
            .delete_documents(ids, self.name())
            .await
    }

    /// Fetches documents by id, skipping unknown ids.
    pub async fn get(&self, ids: Vec<ObjectId>) -> DocumentStoreResult<Vec<BsonDocument>> {
        self.backend
            .get_documents(ids, self.name())
            .await
    }

    pub async fn find(&self, query: Query) -> DocumentStoreResult<Vec<BsonDocument>> {
        self.backend
            .query_documents(query, self.name())
            .await
    }

    /// Applies `update` to the first document matching `filter`.
    ///
    /// # Arguments
    ///
    /// * `filter` - Selects the document to update
    /// * `update` - Operations to apply
    /// * `return_document` - Whether to return the document before or after the update
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Update`] if the update cannot be applied.
    pub async fn find_one_and_update(
        &self,
        filter: Expr,
        update: Update,
        return_document: ReturnDocument,
    ) -> DocumentStoreResult<Option<BsonDocument>> {
        self.backend
            .find_one_and_update(filter, update, return_document, self.name())
            .await
    }
}

/// A collection of documents of type `D`.
#[derive(Debug)]
pub struct TypedCollection<'a, B: StoreBackend, D: Document> {
    name: String,
    backend: &'a B,
    registry: &'a ClassMapRegistry,
    _marker: PhantomData<D>,
}

impl<'a, B: StoreBackend, D: Document> TypedCollection<'a, B, D> {
    pub(crate) fn new(name: String, backend: &'a B, registry: &'a ClassMapRegistry) -> Self {
        Self {
            name,
            backend,
            registry,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn decode_all(&self, documents: Vec<BsonDocument>) -> DocumentStoreResult<Vec<D>> {
        documents
            .iter()
            .map(|document| D::from_document(document, self.registry))
            .collect()
    }

    /// Encodes and inserts documents.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Mapping`] if a document cannot be encoded and
    /// [`DocumentStoreError::DocumentAlreadyExists`] if its id is already stored.
    pub async fn insert(&self, documents: Vec<D>) -> DocumentStoreResult<()> {
        let encoded = documents
            .iter()
            .map(|document| {
                document
                    .to_document(self.registry)
                    .map(|encoded| (*document.id(), encoded))
            })
            .collect::<DocumentStoreResult<Vec<_>>>()?;

        self.backend
            .insert_documents(encoded, self.name())
            .await
    }

    pub async fn insert_one(&self, document: D) -> DocumentStoreResult<()> {
        self.insert(vec![document]).await
    }

    pub async fn delete(&self, ids: Vec<ObjectId>) -> DocumentStoreResult<()> {
        self.backend
            .delete_documents(ids, self.name())
            .await
    }

    /// Fetches and decodes documents by id, skipping unknown ids.
    pub async fn get(&self, ids: Vec<ObjectId>) -> DocumentStoreResult<Vec<D>> {
        let documents = self
            .backend
            .get_documents(ids, self.name())
            .await?;

        self.decode_all(documents)
    }

    pub async fn find(&self, query: Query) -> DocumentStoreResult<Vec<D>> {
        let documents = self
            .backend
            .query_documents(query, self.name())
            .await?;

        self.decode_all(documents)
    }

    /// Returns the first document matching `filter`.
    pub async fn find_one(&self, filter: Expr) -> DocumentStoreResult<Option<D>> {
        let query = Query::builder()
            .filter(filter)
            .limit(1)
            .build();

        Ok(self.find(query).await?.into_iter().next())
    }

    /// Updates the first document matching `filter` and returns it as it was before the update.
    pub async fn find_one_and_update(&self, filter: Expr, update: Update) -> DocumentStoreResult<Option<D>> {
        self.find_one_and_update_with(filter, update, ReturnDocument::default())
            .await
    }

    /// Updates the first document matching `filter` and returns the version selected by
    /// `return_document`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Update`] if the update cannot be applied and
    /// [`DocumentStoreError::Serialization`] if the returned document no longer decodes.
    pub async fn find_one_and_update_with(
        &self,
        filter: Expr,
        update: Update,
        return_document: ReturnDocument,
    ) -> DocumentStoreResult<Option<D>> {
        if update.is_empty() {
            return Err(DocumentStoreError::Update(format!(
                "empty update for collection {}",
                self.name(),
            )));
        }

        self.backend
            .find_one_and_update(filter, update, return_document, self.name())
            .await?
            .map(|document| D::from_document(&document, self.registry))
            .transpose()
    }
}

//! Store backend over the official MongoDB driver.

use async_trait::async_trait;
use bson::{Bson, Document, doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, FindOptions, ReturnDocument as MongoReturnDocument},
};
use tracing::debug;

use docmap_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{DocumentStoreError, DocumentStoreResult},
    mapping::ID_ELEMENT,
    query::{Expr, Query, QueryVisitor, SortDirection},
    update::{ReturnDocument, Update},
};

use crate::query::{MongoQueryTranslator, MongoUpdateTranslator};

/// A backend bound to one database of a MongoDB deployment.
#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }

    /// Checks that the document's `_id` element agrees with the id it is stored under.
    fn prepare_document(id: ObjectId, mut document: Document) -> DocumentStoreResult<Document> {
        match document.get(ID_ELEMENT) {
            None => {
                document.insert(ID_ELEMENT, id);
                Ok(document)
            }
            Some(Bson::ObjectId(existing)) if *existing == id => Ok(document),
            Some(other) => Err(DocumentStoreError::InvalidDocument(format!(
                "document element '{}' is {} but the document is stored under {}",
                ID_ELEMENT, other, id,
            ))),
        }
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_documents(&self, documents: Vec<(ObjectId, Document)>, collection: &str) -> DocumentStoreResult<()> {
        let documents = documents
            .into_iter()
            .map(|(id, document)| Self::prepare_document(id, document))
            .collect::<DocumentStoreResult<Vec<Document>>>()?;
        let count = documents.len();

        self.get_collection(collection)
            .insert_many(documents)
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        debug!(collection, count, "documents inserted");

        Ok(())
    }

    async fn delete_documents(&self, ids: Vec<ObjectId>, collection: &str) -> DocumentStoreResult<()> {
        let expected = ids.len() as u64;
        let result = self
            .get_collection(collection)
            .delete_many(doc! { ID_ELEMENT: { "$in": ids } })
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        if result.deleted_count < expected {
            return Err(DocumentStoreError::DocumentNotFound(
                format!("{} of {} ids", expected - result.deleted_count, expected),
                collection.to_string(),
            ));
        }

        Ok(())
    }

    async fn get_documents(&self, ids: Vec<ObjectId>, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        self.get_collection(collection)
            .find(doc! { ID_ELEMENT: { "$in": ids } })
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        let mut options = FindOptions::default();

        if let Some(limit) = query.limit {
            options.limit = Some(limit as i64);
        }
        if let Some(skip) = query.offset {
            options.skip = Some(skip as u64);
        }
        if let Some(sort) = &query.sort {
            options.sort = Some(doc! {
                sort.field.clone(): match sort.direction {
                    SortDirection::Asc => 1,
                    SortDirection::Desc => -1,
                }
            })
        }

        let filter = match &query.filter {
            Some(expr) => MongoQueryTranslator.visit_expr(expr)?,
            None => doc! {},
        };

        self.get_collection(collection)
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))
    }

    async fn find_one_and_update(
        &self,
        filter: Expr,
        update: Update,
        return_document: ReturnDocument,
        collection: &str,
    ) -> DocumentStoreResult<Option<Document>> {
        let filter = MongoQueryTranslator.visit_expr(&filter)?;
        let update = MongoUpdateTranslator::translate(&update)?;

        debug!(collection, %filter, %update, "find-and-update");

        self.get_collection(collection)
            .find_one_and_update(filter, update)
            .return_document(match return_document {
                ReturnDocument::Before => MongoReturnDocument::Before,
                ReturnDocument::After => MongoReturnDocument::After,
            })
            .await
            .map_err(|e| DocumentStoreError::Update(e.to_string()))
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.client
            .database(&self.database)
            .create_collection(name)
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        if !self.list_collections().await?.iter().any(|existing| existing == name) {
            return Err(DocumentStoreError::CollectionNotFound(name.to_string()));
        }

        self.get_collection(name)
            .drop()
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        debug!(collection = name, "collection dropped");

        Ok(())
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        let mut names = self
            .client
            .database(&self.database)
            .list_collection_names()
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;
        names.sort();

        Ok(names)
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.shutdown().await
    }
}

pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;
        let client = Client::with_options(options)
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        Ok(MongoDbStore::new(client, self.database))
    }
}

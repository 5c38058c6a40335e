//! In-process storage backend.
//!
//! Collections are kept in a map guarded by an async read-write lock. Documents within a
//! collection are ordered by id, so scans and find-and-update see them in insertion-time order.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use bson::{Document, oid::ObjectId};
use mea::rwlock::RwLock;
use tracing::debug;

use docmap_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Expr, Query, SortDirection},
    update::{ReturnDocument, Update, UpdateVisitor},
};

use crate::{
    evaluator::{Comparable, DocumentEvaluator, resolve_path},
    update::DocumentUpdater,
};

type CollectionMap = BTreeMap<ObjectId, Document>;
type StoreMap = HashMap<String, CollectionMap>;

/// Thread-safe in-memory backend.
///
/// Clones share the same underlying data.
///
/// # Example
///
/// ```ignore
/// use bson::{doc, oid::ObjectId};
/// use docmap_memory::InMemoryStore;
///
/// let store = InMemoryStore::new();
/// let id = ObjectId::new();
/// store.insert_documents(vec![(id, doc! { "_id": id, "name": "Paul" })], "test").await?;
/// assert_eq!(store.get_documents(vec![id], "test").await?.len(), 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder
    }

    /// Removes every collection.
    pub async fn clear(&self) {
        self.store.write().await.clear();
    }
}

fn sort_key<'a>(document: &'a Document, field: &str) -> Comparable<'a> {
    resolve_path(document, field)
        .into_iter()
        .next()
        .map(Comparable::from)
        .unwrap_or(Comparable::Null)
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_documents(&self, documents: Vec<(ObjectId, Document)>, collection: &str) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;
        let collection_map = store
            .entry(collection.to_string())
            .or_default();

        if let Some((id, _)) = documents
            .iter()
            .find(|(id, _)| collection_map.contains_key(id))
        {
            return Err(DocumentStoreError::DocumentAlreadyExists(id.to_hex(), collection.to_string()));
        }

        let count = documents.len();
        collection_map.extend(documents);

        debug!(collection, count, "documents inserted");

        Ok(())
    }

    async fn delete_documents(&self, ids: Vec<ObjectId>, collection: &str) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;
        let collection_map = match store.get_mut(collection) {
            Some(col) => col,
            None => return Err(DocumentStoreError::CollectionNotFound(collection.to_string())),
        };

        for id in ids {
            if collection_map.remove(&id).is_none() {
                return Err(DocumentStoreError::DocumentNotFound(id.to_hex(), collection.to_string()));
            }
        }

        Ok(())
    }

    async fn get_documents(&self, ids: Vec<ObjectId>, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(vec![]);
        };

        Ok(ids
            .iter()
            .filter_map(|id| collection_map.get(id).cloned())
            .collect())
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(vec![]);
        };

        let mut documents = match &query.filter {
            Some(filter) => DocumentEvaluator::filter_documents(collection_map.values(), filter)?,
            None => collection_map.values().cloned().collect(),
        };

        if let Some(sort) = &query.sort {
            documents.sort_by(|a, b| {
                let left = sort_key(a, &sort.field);
                let right = sort_key(b, &sort.field);

                match sort.direction {
                    SortDirection::Asc => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
                    SortDirection::Desc => right.partial_cmp(&left).unwrap_or(Ordering::Equal),
                }
            });
        }

        Ok(documents
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn find_one_and_update(
        &self,
        filter: Expr,
        update: Update,
        return_document: ReturnDocument,
        collection: &str,
    ) -> DocumentStoreResult<Option<Document>> {
        let mut store = self.store.write().await;
        let Some(collection_map) = store.get_mut(collection) else {
            return Ok(None);
        };

        let mut matched = None;
        for (id, document) in collection_map.iter() {
            let mut evaluator = DocumentEvaluator::new(document);
            if evaluator.evaluate(&filter)? {
                matched = Some((*id, evaluator.positional()));
                break;
            }
        }

        let Some((id, positional)) = matched else {
            debug!(collection, "find-and-update matched no document");
            return Ok(None);
        };

        let Some(stored) = collection_map.get_mut(&id) else {
            return Ok(None);
        };

        let before = stored.clone();
        let mut after = before.clone();
        DocumentUpdater::new(&mut after, positional).visit_update(&update)?;
        *stored = after.clone();

        debug!(collection, id = %id, "document updated");

        Ok(Some(match return_document {
            ReturnDocument::Before => before,
            ReturnDocument::After => after,
        }))
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.store
            .write()
            .await
            .entry(name.to_string())
            .or_default();

        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;

        if store.remove(name).is_none() {
            return Err(DocumentStoreError::CollectionNotFound(name.to_string()));
        }

        debug!(collection = name, "collection dropped");

        Ok(())
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        let mut names: Vec<String> = self.store.read().await.keys().cloned().collect();
        names.sort();

        Ok(names)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docmap_core::query::Filter;

    fn person(name: &str) -> (ObjectId, Document) {
        let id = ObjectId::new();
        (id, doc! { "_id": id, "name": name, "contacts": { "phones": [] } })
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let store = InMemoryStore::new();
        let paul = person("Paul");

        store.insert_documents(vec![paul.clone()], "test").await.unwrap();
        let err = store.insert_documents(vec![paul], "test").await.unwrap_err();

        assert!(matches!(err, DocumentStoreError::DocumentAlreadyExists(_, _)));
    }

    #[tokio::test]
    async fn query_sorts_and_pages() {
        let store = InMemoryStore::new();
        store
            .insert_documents(vec![person("Carol"), person("Alice"), person("Bob")], "test")
            .await
            .unwrap();

        let query = Query::builder()
            .sort("name", SortDirection::Asc)
            .offset(1)
            .limit(1)
            .build();
        let found = store.query_documents(query, "test").await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get_str("name").unwrap(), "Bob");
    }

    #[tokio::test]
    async fn find_one_and_update_returns_requested_version() {
        let store = InMemoryStore::new();
        let (id, document) = person("Paul");
        store.insert_documents(vec![(id, document)], "test").await.unwrap();

        let before = store
            .find_one_and_update(
                Filter::eq("_id", id),
                Update::builder().set("name", "Paula").build(),
                ReturnDocument::Before,
                "test",
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(before.get_str("name").unwrap(), "Paul");

        let after = store
            .find_one_and_update(
                Filter::eq("_id", id),
                Update::builder().push("contacts.phones", doc! { "value": "1" }).build(),
                ReturnDocument::After,
                "test",
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.get_str("name").unwrap(), "Paula");
        assert_eq!(after.get_document("contacts").unwrap().get_array("phones").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn find_one_and_update_without_match_changes_nothing() {
        let store = InMemoryStore::new();
        let (id, document) = person("Paul");
        store.insert_documents(vec![(id, document.clone())], "test").await.unwrap();

        let filter = Filter::eq("_id", id)
            .and(Filter::elem_match("contacts.phones", Filter::eq("_id", ObjectId::new())));
        let result = store
            .find_one_and_update(
                filter,
                Update::builder().set("contacts.phones.$.value", "111-222").build(),
                ReturnDocument::Before,
                "test",
            )
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(store.get_documents(vec![id], "test").await.unwrap(), vec![document]);
    }

    #[tokio::test]
    async fn failed_update_leaves_document_unchanged() {
        let store = InMemoryStore::new();
        let (id, document) = person("Paul");
        store.insert_documents(vec![(id, document.clone())], "test").await.unwrap();

        let err = store
            .find_one_and_update(
                Filter::eq("_id", id),
                Update::builder()
                    .set("name", "Changed")
                    .set("contacts.phones.$.value", "x")
                    .build(),
                ReturnDocument::After,
                "test",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DocumentStoreError::Update(_)));
        assert_eq!(store.get_documents(vec![id], "test").await.unwrap(), vec![document]);
    }

    #[tokio::test]
    async fn dropping_a_missing_collection_fails() {
        let store = InMemoryStore::new();
        store.create_collection("test").await.unwrap();

        assert_eq!(store.list_collections().await.unwrap(), vec!["test".to_string()]);
        store.drop_collection("test").await.unwrap();

        let err = store.drop_collection("test").await.unwrap_err();
        assert!(matches!(err, DocumentStoreError::CollectionNotFound(_)));
    }
}

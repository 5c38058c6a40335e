//! Stored document types and conversion helpers.
//!
//! A [`Document`] is a [`Mapped`] type that lives in a collection and carries an
//! [`ObjectId`] stored under the reserved `_id` element. The usual way to implement it is
//! the derive macro re-exported by the `docmap` crate:
//!
//! ```ignore
//! use docmap::Document;
//!
//! #[derive(Debug, Clone, Document)]
//! #[document(collection = "test")]
//! pub struct Person {
//!     #[document(id)]
//!     entity: Entity,
//!     name: String,
//!     contacts: Contacts,
//! }
//! ```
//!
//! The derive only supplies [`Document`]; the type still implements [`Mapped`] by hand so
//! its members are described explicitly.

use bson::oid::ObjectId;
use serde_json::Value;

use crate::{
    error::DocumentStoreResult,
    mapping::{ClassMapRegistry, Mapped},
};

/// A mapped type stored as a top-level document in a collection.
pub trait Document: Mapped + Clone + Send + Sync + 'static {
    /// Returns the identifier stored under the `_id` element.
    fn id(&self) -> &ObjectId;

    /// Returns the collection this type is stored in.
    fn collection_name() -> &'static str;
}

/// Something that carries a document identifier.
///
/// Used by `#[derive(Document)]` to read the identifier from the field marked
/// `#[document(id)]`, which may be an [`ObjectId`] or a base entity embedding one.
pub trait Identified {
    fn object_id(&self) -> &ObjectId;
}

impl Identified for ObjectId {
    fn object_id(&self) -> &ObjectId {
        self
    }
}

/// Conversion helpers available on every [`Document`].
pub trait DocumentExt: Document {
    /// Encodes through the class maps in `registry`.
    fn to_document(&self, registry: &ClassMapRegistry) -> DocumentStoreResult<bson::Document>;

    /// Decodes through the class maps in `registry`.
    fn from_document(document: &bson::Document, registry: &ClassMapRegistry) -> DocumentStoreResult<Self>;

    /// Encodes to a JSON value, with BSON-specific values in extended JSON form.
    fn to_json(&self, registry: &ClassMapRegistry) -> DocumentStoreResult<Value>;
}

impl<D: Document> DocumentExt for D {
    fn to_document(&self, registry: &ClassMapRegistry) -> DocumentStoreResult<bson::Document> {
        registry.encode(self)
    }

    fn from_document(document: &bson::Document, registry: &ClassMapRegistry) -> DocumentStoreResult<Self> {
        registry.decode(document)
    }

    fn to_json(&self, registry: &ClassMapRegistry) -> DocumentStoreResult<Value> {
        Ok(serde_json::to_value(registry.encode(self)?)?)
    }
}

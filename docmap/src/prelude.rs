//! Convenient re-exports of commonly used types from docmap.
//!
//! ```ignore
//! use docmap::prelude::*;
//! ```
//!
//! This provides access to:
//! - Mapping descriptors, conventions and the class map registry
//! - Document traits and the derive macro
//! - Store, collections and backend traits
//! - Query and update construction
//! - Embedded server traits and error types

pub use bson::oid::ObjectId;

pub use docmap_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    collection::{Collection, TypedCollection},
    document::{Document, DocumentExt, Identified},
    error::{DocumentStoreError, DocumentStoreResult},
    mapping::{
        ClassMap, ClassMapRegistry, ClassMapRegistryBuilder, Convention, ConventionPack, DocumentReader,
        Mapped, MemberDescriptor, MemberValue, ReadOnlyMembersConvention, TypeDescriptor,
    },
    query::{Expr, FieldOp, Filter, Query, QueryBuilder, QueryVisitor, Sort, SortDirection},
    server::{EmbeddedServer, EmbeddedServerBuilder},
    store::DocumentStore,
    update::{ReturnDocument, Update, UpdateBuilder},
};

pub use docmap_macros::Document;

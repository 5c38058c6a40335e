//! Main docmap crate providing a unified interface for convention-driven document mapping.
//!
//! This crate is the primary entry point for users of the docmap framework. It re-exports the
//! core types from the sub-crates, the `#[derive(Document)]` macro and the storage backends.
//!
//! # Features
//!
//! - **Explicit member metadata** - Types describe their members once in a static descriptor
//! - **Conventions** - Pluggable rules decide which members become document elements
//! - **Class maps** - Per-type element names, adjusted after conventions run
//! - **Backends** - In-memory and MongoDB storage behind one trait
//! - **Ephemeral servers** - Throwaway database instances for demos and tests
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use docmap::{prelude::*, memory::InMemoryServer};
//!
//! #[derive(Debug, Clone, Document)]
//! #[document(collection = "test")]
//! pub struct Person {
//!     #[document(id)]
//!     id: ObjectId,
//!     name: String,
//! }
//!
//! static PERSON: TypeDescriptor = TypeDescriptor::new(
//!     "Person",
//!     &[MemberDescriptor::property("id"), MemberDescriptor::property("name")],
//! );
//!
//! impl Mapped for Person {
//!     fn descriptor() -> &'static TypeDescriptor { &PERSON }
//!
//!     fn member(&self, name: &str) -> Option<MemberValue<'_>> {
//!         match name {
//!             "id" => Some(MemberValue::value(self.id)),
//!             "name" => Some(MemberValue::value(self.name.clone())),
//!             _ => None,
//!         }
//!     }
//!
//!     fn decode(reader: &DocumentReader<'_>) -> DocumentStoreResult<Self> {
//!         Ok(Self { id: reader.value("id")?, name: reader.value("name")? })
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let mut builder = ClassMapRegistry::builder();
//!     builder.register_conventions(
//!         "Conventions",
//!         ConventionPack::new().with(ReadOnlyMembersConvention::new()),
//!         |_| true,
//!     );
//!     builder.register_class_map::<Person>(|m| {
//!         m.auto_map()?;
//!         m.set_id_member("id")?;
//!         Ok(())
//!     })?;
//!
//!     let server = InMemoryServer::builder().start().await?;
//!     let store = DocumentStore::new(server.connect("Person").await?, Arc::new(builder.build()?));
//!
//!     let people = store.typed_collection::<Person>();
//!     let paul = Person { id: ObjectId::new(), name: "Paul".to_string() };
//!     people.insert_one(paul.clone()).await?;
//!
//!     let found = people.find_one(Filter::eq("name", "Paul")).await?;
//!     println!("{:?}", found);
//!
//!     server.dispose().await
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-process storage and server for development and testing
//! - [`mongodb`] - MongoDB storage and a `mongod` runner (requires the `mongodb` feature)

#[allow(unused_extern_crates)]
extern crate self as docmap;

pub mod prelude;

pub use docmap_core::{backend, collection, document, error, mapping, query, server, store, update};

pub use docmap_macros::Document;

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend and embedded server.
pub mod memory {
    pub use docmap_memory::{InMemoryServer, InMemoryServerBuilder, InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend and `mongod` runner.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docmap_mongodb::{MongoDbStore, MongoDbStoreBuilder, MongodRunner, MongodRunnerBuilder};
}

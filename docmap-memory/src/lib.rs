//! In-process backend and embedded server for docmap.
//!
//! - [`InMemoryStore`] implements the store backend with an async read-write lock over
//!   ordered per-collection maps. Filters, including `elem_match`, are evaluated in process
//!   and updates support the positional path segment.
//! - [`InMemoryServer`] hands out one store per database name and discards everything when
//!   disposed, which makes it a drop-in for an ephemeral database in demos and tests.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use docmap::{memory::InMemoryServer, prelude::*};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = Arc::new(build_registry()?);
//!     let server = InMemoryServer::builder().start().await?;
//!
//!     let store = DocumentStore::new(server.connect("Person").await?, registry);
//!     store.typed_collection::<Person>().insert_one(Person::new("Paul", Contacts::new())).await?;
//!
//!     server.dispose().await?;
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmap_memory;

pub mod evaluator;
pub mod server;
pub mod store;
pub mod update;

pub use server::{InMemoryServer, InMemoryServerBuilder};
pub use store::{InMemoryStore, InMemoryStoreBuilder};

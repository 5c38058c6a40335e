//! Convention-driven object-to-document mapping over a thin document store layer.
//!
//! This crate is the core of the docmap project and provides:
//!
//! - **Mapping** ([`mapping`]) - Member descriptors, class maps, conventions and the registry that encodes and decodes values
//! - **Documents** ([`document`]) - The trait for types stored as top-level documents
//! - **Queries and updates** ([`query`], [`update`]) - Filter expressions and partial updates over element paths
//! - **Backends** ([`backend`]) - The storage abstraction implemented by the in-memory and MongoDB crates
//! - **Embedded servers** ([`server`]) - Ephemeral database instances tied to the process lifetime
//! - **Store and collections** ([`store`], [`collection`]) - Typed access to a backend through the registry
//! - **Errors** ([`error`])
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use docmap::prelude::*;
//!
//! let mut builder = ClassMapRegistry::builder();
//! builder.register_conventions(
//!     "Conventions",
//!     ConventionPack::new().with(ReadOnlyMembersConvention::new()),
//!     |_| true,
//! );
//! builder.register_class_map::<Person>(|m| {
//!     m.auto_map()?;
//!     m.map_member("name")?.set_element_name("name");
//!     Ok(())
//! })?;
//!
//! let store = DocumentStore::new(backend, Arc::new(builder.build()?));
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmap_core;

pub mod backend;
pub mod collection;
pub mod document;
pub mod error;
pub mod mapping;
pub mod query;
pub mod server;
pub mod store;
pub mod update;

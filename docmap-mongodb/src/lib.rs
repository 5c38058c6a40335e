//! MongoDB backend and `mongod` runner for docmap, behind the facade's `mongodb` feature.
//!
//! - [`MongoDbStore`] implements the store backend with the official driver. Filters and
//!   updates are translated into native query and update documents, so `elem_match` becomes
//!   `$elemMatch` and positional paths are passed to the server unchanged.
//! - [`MongodRunner`] starts a throwaway `mongod` process with its own data directory.
//!
//! ```ignore
//! use std::sync::Arc;
//! use docmap::{mongodb::MongodRunner, prelude::*};
//!
//! let runner = MongodRunner::builder().start().await?;
//! let store = DocumentStore::new(runner.connect("Person").await?, Arc::new(registry));
//!
//! // ...
//!
//! runner.dispose().await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmap_mongodb;

pub mod query;
pub mod runner;
pub mod store;

pub use runner::{MongodRunner, MongodRunnerBuilder};
pub use store::{MongoDbStore, MongoDbStoreBuilder};

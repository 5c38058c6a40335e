//! Ephemeral database servers started for the lifetime of a process.
//!
//! An [`EmbeddedServer`] owns whatever resources back a database instance (a child process,
//! a data directory, in-process state) and hands out backends connected to it. It must be
//! disposed exactly once, whatever way the process ends.
//!
//! ```ignore
//! let server = InMemoryServer::builder().start().await?;
//! let backend = server.connect("Person").await?;
//! // ...
//! server.dispose().await?;
//! ```

use async_trait::async_trait;

use crate::{backend::StoreBackend, error::DocumentStoreResult};

#[async_trait]
pub trait EmbeddedServer: Send + Sync + Sized {
    type Backend: StoreBackend;

    /// Returns the connection string clients use to reach the server.
    fn connection_string(&self) -> &str;

    /// Connects a backend to the named database.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Server`](crate::error::DocumentStoreError::Server) if the
    /// server is unreachable.
    async fn connect(&self, database: &str) -> DocumentStoreResult<Self::Backend>;

    /// Stops the server and releases its resources.
    async fn dispose(self) -> DocumentStoreResult<()>;
}

/// Starts an [`EmbeddedServer`] from configuration.
#[async_trait]
pub trait EmbeddedServerBuilder {
    type Server: EmbeddedServer;

    async fn start(self) -> DocumentStoreResult<Self::Server>;
}

//! An in-process stand-in for an ephemeral database server.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use mea::rwlock::RwLock;
use tracing::info;
use uuid::Uuid;

use docmap_core::{
    error::DocumentStoreResult,
    server::{EmbeddedServer, EmbeddedServerBuilder},
};

use crate::store::InMemoryStore;

/// Serves one [`InMemoryStore`] per database name.
///
/// Connecting twice to the same database yields stores sharing the same data. Disposing the
/// server discards every database.
#[derive(Debug)]
pub struct InMemoryServer {
    connection_string: String,
    databases: Arc<RwLock<HashMap<String, InMemoryStore>>>,
}

impl InMemoryServer {
    pub fn builder() -> InMemoryServerBuilder {
        InMemoryServerBuilder
    }
}

#[async_trait]
impl EmbeddedServer for InMemoryServer {
    type Backend = InMemoryStore;

    fn connection_string(&self) -> &str {
        &self.connection_string
    }

    async fn connect(&self, database: &str) -> DocumentStoreResult<InMemoryStore> {
        Ok(self
            .databases
            .write()
            .await
            .entry(database.to_string())
            .or_default()
            .clone())
    }

    async fn dispose(self) -> DocumentStoreResult<()> {
        let databases: Vec<InMemoryStore> = self
            .databases
            .write()
            .await
            .drain()
            .map(|(_, store)| store)
            .collect();

        for store in databases {
            store.clear().await;
        }

        info!(connection_string = %self.connection_string, "in-memory server disposed");

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryServerBuilder;

#[async_trait]
impl EmbeddedServerBuilder for InMemoryServerBuilder {
    type Server = InMemoryServer;

    async fn start(self) -> DocumentStoreResult<InMemoryServer> {
        let server = InMemoryServer {
            connection_string: format!("memory://{}", Uuid::new_v4()),
            databases: Arc::default(),
        };

        info!(connection_string = %server.connection_string, "in-memory server started");

        Ok(server)
    }
}

use std::{process::ExitCode, sync::Arc};

use anyhow::Context;
use tracing::{error, info};

use docmap::{
    server::{EmbeddedServer, EmbeddedServerBuilder},
    store::DocumentStore,
};
use docmap_demo::{class_maps, lifecycle, scenario, telemetry};

const DATABASE: &str = "Person";

#[cfg(not(feature = "mongodb"))]
async fn start_server() -> anyhow::Result<docmap::memory::InMemoryServer> {
    docmap::memory::InMemoryServer::builder()
        .start()
        .await
        .context("failed to start the in-memory server")
}

#[cfg(feature = "mongodb")]
async fn start_server() -> anyhow::Result<docmap::mongodb::MongodRunner> {
    docmap::mongodb::MongodRunner::builder()
        .start()
        .await
        .context("failed to start mongod")
}

async fn run() -> anyhow::Result<()> {
    let registry = Arc::new(class_maps().context("invalid class map configuration")?);
    let server = start_server().await?;

    info!(connection_string = server.connection_string(), "server ready");

    lifecycle::serve(server, DATABASE, lifecycle::shutdown_signal(), |backend| async move {
        let store = DocumentStore::new(backend, registry);
        let report = scenario::run(&store).await.context("scenario failed")?;

        info!(
            name = report.fetched.name(),
            phones = report.fetched.contacts().phones().len(),
            updated = report.updated.is_some(),
            "scenario finished",
        );

        store.shutdown().await.context("failed to shut down the store")
    })
    .await
}

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "docmap demo failed");
            ExitCode::FAILURE
        }
    }
}

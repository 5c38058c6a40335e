//! Ephemeral `mongod` instances for demos and tests.
//!
//! [`MongodRunner`] spawns a `mongod` process on a free loopback port with a fresh data
//! directory, waits until it accepts connections and tears both down on dispose. If the
//! runner is dropped without being disposed, the process is killed and the data directory
//! removed on a best-effort basis.
//!
//! ```ignore
//! use docmap::{mongodb::MongodRunner, server::{EmbeddedServer, EmbeddedServerBuilder}};
//!
//! let runner = MongodRunner::builder()
//!     .binary("/usr/local/bin/mongod")
//!     .startup_timeout(Duration::from_secs(10))
//!     .start()
//!     .await?;
//!
//! let backend = runner.connect("Person").await?;
//! runner.dispose().await?;
//! ```

use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use async_trait::async_trait;
use tokio::{
    net::{TcpListener, TcpStream},
    process::{Child, Command},
    time::{sleep, timeout},
};
use tracing::{info, warn};
use uuid::Uuid;

use docmap_core::{
    backend::StoreBackendBuilder,
    error::{DocumentStoreError, DocumentStoreResult},
    server::{EmbeddedServer, EmbeddedServerBuilder},
};

use crate::store::MongoDbStore;

const DEFAULT_BINARY: &str = "mongod";
const DEFAULT_BIND_IP: &str = "127.0.0.1";
const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A running `mongod` process owned by this process.
#[derive(Debug)]
pub struct MongodRunner {
    child: Child,
    data_dir: PathBuf,
    connection_string: String,
    disposed: bool,
}

impl MongodRunner {
    pub fn builder() -> MongodRunnerBuilder {
        MongodRunnerBuilder::default()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[async_trait]
impl EmbeddedServer for MongodRunner {
    type Backend = MongoDbStore;

    fn connection_string(&self) -> &str {
        &self.connection_string
    }

    async fn connect(&self, database: &str) -> DocumentStoreResult<MongoDbStore> {
        MongoDbStore::builder(&self.connection_string, database)
            .build()
            .await
            .map_err(|e| DocumentStoreError::Server(e.to_string()))
    }

    async fn dispose(mut self) -> DocumentStoreResult<()> {
        if self
            .child
            .try_wait()
            .map_err(|e| DocumentStoreError::Server(e.to_string()))?
            .is_none()
        {
            self.child
                .kill()
                .await
                .map_err(|e| DocumentStoreError::Server(format!("failed to stop mongod: {}", e)))?;
        }

        tokio::fs::remove_dir_all(&self.data_dir)
            .await
            .map_err(|e| DocumentStoreError::Server(format!(
                "failed to remove data directory {}: {}",
                self.data_dir.display(),
                e,
            )))?;
        self.disposed = true;

        info!(connection_string = %self.connection_string, "mongod disposed");

        Ok(())
    }
}

impl Drop for MongodRunner {
    fn drop(&mut self) {
        if self.disposed {
            return;
        }

        if let Err(e) = self.child.start_kill() {
            warn!(error = %e, "failed to kill mongod on drop");
        }
        if let Err(e) = std::fs::remove_dir_all(&self.data_dir) {
            warn!(error = %e, data_dir = %self.data_dir.display(), "failed to remove mongod data directory on drop");
        }
    }
}

/// Configuration for [`MongodRunner`].
#[derive(Debug, Clone)]
pub struct MongodRunnerBuilder {
    binary: PathBuf,
    bind_ip: String,
    port: Option<u16>,
    data_root: PathBuf,
    startup_timeout: Duration,
    args: Vec<String>,
}

impl Default for MongodRunnerBuilder {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            bind_ip: DEFAULT_BIND_IP.to_string(),
            port: None,
            data_root: std::env::temp_dir(),
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            args: Vec::new(),
        }
    }
}

impl MongodRunnerBuilder {
    /// Path of the `mongod` executable. Defaults to `mongod` on `PATH`.
    pub fn binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn bind_ip(mut self, bind_ip: impl Into<String>) -> Self {
        self.bind_ip = bind_ip.into();
        self
    }

    /// Fixed port to listen on. Defaults to a free port picked at start.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Directory under which the per-instance data directory is created.
    pub fn data_root(mut self, data_root: impl Into<PathBuf>) -> Self {
        self.data_root = data_root.into();
        self
    }

    pub fn startup_timeout(mut self, startup_timeout: Duration) -> Self {
        self.startup_timeout = startup_timeout;
        self
    }

    /// Extra command-line arguments passed to `mongod`.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    async fn free_port(&self) -> DocumentStoreResult<u16> {
        let listener = TcpListener::bind((self.bind_ip.as_str(), 0))
            .await
            .map_err(|e| DocumentStoreError::Server(format!("failed to find a free port: {}", e)))?;

        listener
            .local_addr()
            .map(|addr| addr.port())
            .map_err(|e| DocumentStoreError::Server(e.to_string()))
    }

    async fn wait_until_ready(&self, child: &mut Child, port: u16) -> DocumentStoreResult<()> {
        let ready = async {
            loop {
                if let Some(status) = child
                    .try_wait()
                    .map_err(|e| DocumentStoreError::Server(e.to_string()))?
                {
                    return Err(DocumentStoreError::Server(format!(
                        "mongod exited with {} before accepting connections",
                        status,
                    )));
                }

                if TcpStream::connect((self.bind_ip.as_str(), port)).await.is_ok() {
                    return Ok(());
                }

                sleep(POLL_INTERVAL).await;
            }
        };

        timeout(self.startup_timeout, ready)
            .await
            .map_err(|_| DocumentStoreError::Server(format!(
                "mongod did not accept connections within {:?}",
                self.startup_timeout,
            )))?
    }
}

#[async_trait]
impl EmbeddedServerBuilder for MongodRunnerBuilder {
    type Server = MongodRunner;

    async fn start(self) -> DocumentStoreResult<MongodRunner> {
        let port = match self.port {
            Some(port) => port,
            None => self.free_port().await?,
        };
        let data_dir = self
            .data_root
            .join(format!("docmap-mongod-{}", Uuid::new_v4()));

        tokio::fs::create_dir_all(&data_dir)
            .await
            .map_err(|e| DocumentStoreError::Server(format!(
                "failed to create data directory {}: {}",
                data_dir.display(),
                e,
            )))?;

        let spawned = Command::new(&self.binary)
            .arg("--dbpath")
            .arg(&data_dir)
            .arg("--port")
            .arg(port.to_string())
            .arg("--bind_ip")
            .arg(&self.bind_ip)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                let _ = tokio::fs::remove_dir_all(&data_dir).await;
                return Err(DocumentStoreError::Server(format!(
                    "failed to spawn {}: {}",
                    self.binary.display(),
                    e,
                )));
            }
        };

        if let Err(e) = self.wait_until_ready(&mut child, port).await {
            let _ = child.kill().await;
            let _ = tokio::fs::remove_dir_all(&data_dir).await;
            return Err(e);
        }

        let connection_string = format!("mongodb://{}:{}/?directConnection=true", self.bind_ip, port);

        info!(%connection_string, data_dir = %data_dir.display(), "mongod started");

        Ok(MongodRunner {
            child,
            data_dir,
            connection_string,
            disposed: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let builder = MongodRunner::builder();

        assert_eq!(builder.binary, PathBuf::from("mongod"));
        assert_eq!(builder.bind_ip, "127.0.0.1");
        assert_eq!(builder.port, None);
        assert_eq!(builder.startup_timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn missing_binary_fails_and_cleans_up() {
        let root = std::env::temp_dir().join(format!("docmap-runner-test-{}", Uuid::new_v4()));
        let err = MongodRunner::builder()
            .binary(root.join("no-such-mongod"))
            .data_root(&root)
            .start()
            .await
            .unwrap_err();

        assert!(matches!(err, DocumentStoreError::Server(_)));
        assert!(std::fs::read_dir(&root).map(|mut entries| entries.next().is_none()).unwrap_or(true));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    #[ignore = "requires a mongod binary on PATH"]
    async fn starts_and_disposes_a_real_instance() {
        let runner = MongodRunner::builder().start().await.unwrap();
        let data_dir = runner.data_dir().to_path_buf();

        assert!(data_dir.exists());
        runner.dispose().await.unwrap();
        assert!(!data_dir.exists());
    }
}

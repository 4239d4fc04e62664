//! Supervisor: drives an echo server from outside.
//!
//! Starts the server, parks until told to shut down, then stops it with the
//! configured grace period. Clones share the shutdown signal, so one clone
//! can run while another (a signal handler, a test) triggers shutdown.

use crate::config::ServerConfig;
use crate::error::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{Notify, oneshot};
use tracing::info;

use super::server::EchoServer;

#[derive(Clone)]
pub struct Supervisor {
    config: ServerConfig,
    shutdown: Arc<Notify>,
}

impl Supervisor {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Signal the supervised server to shut down.
    ///
    /// Safe to call before `run` reaches its wait; the signal is kept.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Run the server until shutdown.
    pub async fn run(&self) -> Result<()> {
        self.run_inner(None).await
    }

    /// Like [`run`](Self::run), reporting the bound address once listening.
    pub async fn run_with_ready(&self, ready: oneshot::Sender<SocketAddr>) -> Result<()> {
        self.run_inner(Some(ready)).await
    }

    async fn run_inner(&self, ready: Option<oneshot::Sender<SocketAddr>>) -> Result<()> {
        let mut server = EchoServer::new(self.config.clone());
        let addr = server.start().await?;
        info!(%addr, "supervisor: server running");
        if let Some(ready) = ready {
            let _ = ready.send(addr);
        }

        self.shutdown.notified().await;
        info!("supervisor: shutting down");
        server.stop().await
    }
}

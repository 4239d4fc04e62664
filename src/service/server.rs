//! Echo server lifecycle: bind, serve, drain, release.

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::model::ServiceState;
use crate::proto::{AiActionServiceServer, GreeterServer};
use crate::telemetry::rpc::record_state_transition;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::activity_log::ActivityLog;
use super::closable::ClosableStream;
use super::handler::{EchoHandler, GreeterHandler};

type ServeTask = JoinHandle<std::result::Result<(), tonic::transport::Error>>;

/// How long force-closed connections get to unwind before the serve task is
/// aborted outright.
const FORCE_CLOSE_WAIT: Duration = Duration::from_millis(500);

/// One echo server instance.
///
/// Runs through its lifecycle once; see [`ServiceState`]. Serves
/// `AiActionService` and the `Greeter` demo on the same listener.
pub struct EchoServer {
    config: ServerConfig,
    state: ServiceState,
    /// Set once the instance leaves its initial `Stopped` state.
    spent: bool,
    local_addr: Option<SocketAddr>,
    activity_log: Option<Arc<ActivityLog>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    /// Cancelled to cut off connections still open after the grace period.
    connections: CancellationToken,
    serve_task: Option<ServeTask>,
}

impl EchoServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            state: ServiceState::Stopped,
            spent: false,
            local_addr: None,
            activity_log: None,
            shutdown_tx: None,
            connections: CancellationToken::new(),
            serve_task: None,
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Bound address while the listener is open.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.filter(|_| self.state.is_serving())
    }

    fn transition(&mut self, to: ServiceState) -> Result<()> {
        if !self.state.can_transition_to(to) {
            return Err(Error::InvalidTransition {
                from: self.state,
                to,
            });
        }
        record_state_transition(&self.state.to_string(), &to.to_string());
        self.state = to;
        Ok(())
    }

    async fn record(&self, message: &str) {
        if let Some(log) = &self.activity_log {
            log.record(message).await;
        }
    }

    /// Bind the configured address and start serving.
    ///
    /// Returns the bound address (useful when the configured port is 0).
    pub async fn start(&mut self) -> Result<SocketAddr> {
        if self.spent {
            return Err(Error::InvalidTransition {
                from: self.state,
                to: ServiceState::Starting,
            });
        }
        self.transition(ServiceState::Starting)?;
        self.spent = true;

        let bind_address = self.config.bind_address();
        let (listener, local_addr) = match bind(&bind_address).await {
            Ok(bound) => bound,
            Err(e) => {
                warn!(address = %bind_address, "bind failed: {e}");
                self.transition(ServiceState::Stopped)?;
                return Err(e);
            }
        };

        // Only a bound instance owns the log; a failed start leaves it alone.
        if let Some(path) = &self.config.log_file {
            let log = Arc::new(ActivityLog::new(path));
            if let Err(e) = log.init("Log initialized for echo server.").await {
                warn!(path = %path.display(), "activity log init failed: {e}");
            }
            self.activity_log = Some(log);
        }

        let mut handler = EchoHandler::new();
        if let Some(log) = &self.activity_log {
            handler = handler.activity_log(Arc::clone(log));
        }
        if let Some(delay) = self.config.response_delay {
            handler = handler.response_delay(delay);
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let router = tonic::transport::Server::builder()
            .concurrency_limit_per_connection(self.config.max_concurrent_calls)
            .add_service(AiActionServiceServer::new(handler))
            .add_service(GreeterServer::new(GreeterHandler));
        let connections = self.connections.clone();
        let incoming = TcpListenerStream::new(listener).map(move |accepted| {
            accepted.map(|stream| ClosableStream::new(stream, connections.clone()))
        });
        let task = tokio::spawn(router.serve_with_incoming_shutdown(incoming, async move {
            let _ = shutdown_rx.await;
        }));

        self.shutdown_tx = Some(shutdown_tx);
        self.serve_task = Some(task);
        self.local_addr = Some(local_addr);
        self.transition(ServiceState::Running)?;

        info!(%local_addr, "echo server listening");
        self.record(&format!("Echo server started. Listening on {local_addr}."))
            .await;
        Ok(local_addr)
    }

    /// Stop with the configured grace period.
    pub async fn stop(&mut self) -> Result<()> {
        self.stop_with_grace(self.config.grace_period).await
    }

    /// Stop accepting calls, wait up to `grace` for in-flight calls, then
    /// force-close whatever is left and release the listener.
    pub async fn stop_with_grace(&mut self, grace: Duration) -> Result<()> {
        self.transition(ServiceState::Stopping)?;
        self.record("Echo server stopping.").await;

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(mut task) = self.serve_task.take() {
            match tokio::time::timeout(grace, &mut task).await {
                Ok(Ok(Ok(()))) => debug!("in-flight calls drained"),
                Ok(Ok(Err(e))) => warn!("server exited with error: {e}"),
                Ok(Err(e)) => warn!("serve task failed: {e}"),
                Err(_) => {
                    warn!(?grace, "grace period elapsed, closing remaining connections");
                    self.connections.cancel();
                    if tokio::time::timeout(FORCE_CLOSE_WAIT, &mut task).await.is_err() {
                        task.abort();
                        let _ = task.await;
                    }
                }
            }
        }

        self.local_addr = None;
        self.transition(ServiceState::Stopped)?;
        info!("echo server stopped");
        self.record("Echo server stopped.").await;
        Ok(())
    }
}

impl Drop for EchoServer {
    fn drop(&mut self) {
        // Dropped while running: ask the serving task to wind down.
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn bind(address: &str) -> Result<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind(address).await?;
    let local_addr = listener.local_addr()?;
    Ok((listener, local_addr))
}

//! Client helper for the echo service.
//!
//! Two call modes: [`EchoClient::send`] awaits the action directly, and
//! [`EchoClient::send_nonblocking`] / [`send_task_observation`] return a
//! [`PendingAction`] immediately, to be resolved later.

pub mod builder;

pub use builder::{ObservationBuilder, ObservationFields};

use crate::error::{Error, Result};
use crate::proto::{
    Action, AiActionServiceClient, GreeterClient, HelloRequest, TaskObservation,
};
use std::time::Duration;
use tokio::task::JoinHandle;
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection to an echo server. Clones share the underlying channel.
#[derive(Debug, Clone)]
pub struct EchoClient {
    actions: AiActionServiceClient<Channel>,
    greeter: GreeterClient<Channel>,
}

impl EchoClient {
    /// Connect to `addr`, either `host:port` or a full `http://` URI.
    ///
    /// `timeout` bounds both connection setup and every call made through
    /// this client.
    pub async fn connect(addr: &str, timeout: Duration) -> Result<Self> {
        let channel = endpoint(addr, timeout)?.connect().await?;
        debug!(%addr, "connected");
        Ok(Self::from_channel(channel))
    }

    /// Build a client whose connection is established on first use.
    pub fn connect_lazy(addr: &str, timeout: Duration) -> Result<Self> {
        Ok(Self::from_channel(endpoint(addr, timeout)?.connect_lazy()))
    }

    pub fn from_channel(channel: Channel) -> Self {
        Self {
            actions: AiActionServiceClient::new(channel.clone()),
            greeter: GreeterClient::new(channel),
        }
    }

    /// Send an observation and wait for the action.
    pub async fn send(&mut self, observation: TaskObservation) -> Result<Action> {
        let response = self.actions.send_task_observation(observation).await?;
        Ok(response.into_inner())
    }

    /// Send an observation without waiting; resolve via the returned handle.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn send_nonblocking(&self, observation: TaskObservation) -> PendingAction {
        let mut client = self.clone();
        PendingAction::spawn(async move { client.send(observation).await })
    }

    /// Call the greeter demo endpoint.
    pub async fn say_hello(&mut self, name: &str) -> Result<String> {
        let response = self
            .greeter
            .say_hello(HelloRequest {
                name: name.to_string(),
            })
            .await?;
        Ok(response.into_inner().message)
    }
}

/// Build an observation from loose fields and send it without blocking.
///
/// Connects lazily, so connection failures surface through the returned
/// handle rather than here. Fails immediately when no Tokio runtime is
/// running, since the call needs one to make progress.
pub fn send_task_observation(
    fields: ObservationFields,
    addr: &str,
    timeout: Duration,
) -> Result<PendingAction> {
    tokio::runtime::Handle::try_current()
        .map_err(|e| Error::Other(format!("send_task_observation needs a Tokio runtime: {e}")))?;
    let client = EchoClient::connect_lazy(addr, timeout)?;
    let observation = ObservationBuilder::from_fields(fields).build();
    debug!(event_id = %observation.event_id, %addr, "sending observation");
    Ok(client.send_nonblocking(observation))
}

/// An in-flight call.
///
/// Dropping the handle does not cancel the call; use [`cancel`](Self::cancel).
#[derive(Debug)]
pub struct PendingAction {
    handle: JoinHandle<Result<Action>>,
}

impl PendingAction {
    fn spawn<F>(call: F) -> Self
    where
        F: std::future::Future<Output = Result<Action>> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(call),
        }
    }

    /// Wait for the call to resolve.
    pub async fn wait(self) -> Result<Action> {
        self.handle
            .await
            .map_err(|e| Error::Other(format!("pending call failed: {e}")))?
    }

    /// Wait at most `timeout`. On timeout the call is cancelled.
    pub async fn wait_timeout(mut self, timeout: Duration) -> Result<Action> {
        match tokio::time::timeout(timeout, &mut self.handle).await {
            Ok(joined) => joined.map_err(|e| Error::Other(format!("pending call failed: {e}")))?,
            Err(_) => {
                self.handle.abort();
                Err(Error::Timeout(timeout))
            }
        }
    }

    /// Abandon the call.
    pub fn cancel(self) {
        self.handle.abort();
    }
}

fn endpoint(addr: &str, timeout: Duration) -> Result<Endpoint> {
    let uri = if addr.contains("://") {
        addr.to_string()
    } else {
        format!("http://{addr}")
    };
    let endpoint = Endpoint::from_shared(uri)?
        .connect_timeout(timeout)
        .timeout(timeout);
    Ok(endpoint)
}

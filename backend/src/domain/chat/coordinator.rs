//! Single-owner coordinator for live connection state.
//!
//! Every registry mutation and every broadcast is a [`Command`] processed in
//! order by one task, so callers never share the registry. Broadcast writes
//! fan out concurrently with a per-recipient deadline; recipients that fail
//! or miss the deadline are closed and unregistered after the pass.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::{mpsc, oneshot};
use tokio::time;
use tracing::{debug, info, warn};

use crate::domain::ports::ConnectionSink;
use crate::domain::{GroupId, UserId};

use super::registry::{Binding, ConnectionId, Registry, RegistrySnapshot};

/// Default bound on queued commands.
pub const DEFAULT_COMMAND_CAPACITY: usize = 1024;
/// Default per-recipient write deadline.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Errors surfaced to coordinator callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordinatorError {
    /// The coordinator task has exited.
    #[error("chat coordinator is not running")]
    Stopped,
}

/// Requests processed by the coordinator loop.
pub(crate) enum Command {
    Register {
        connection: ConnectionId,
        sink: Arc<dyn ConnectionSink>,
    },
    Authenticate {
        connection: ConnectionId,
        user: UserId,
    },
    Join {
        connection: ConnectionId,
        group: GroupId,
        ack: oneshot::Sender<bool>,
    },
    Leave {
        connection: ConnectionId,
        group: GroupId,
    },
    Unregister {
        connection: ConnectionId,
    },
    Broadcast {
        group: GroupId,
        payload: Arc<str>,
    },
    Snapshot {
        reply: oneshot::Sender<RegistrySnapshot>,
    },
}

/// Tuning for [`Coordinator::spawn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    pub command_capacity: usize,
    pub write_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

/// Cloneable entry point used by connection tasks.
///
/// Methods enqueue a command and return once it is accepted; only
/// [`join`](Self::join) and [`snapshot`](Self::snapshot) wait for the loop
/// to act on it.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<Command>,
}

impl CoordinatorHandle {
    async fn send(&self, command: Command) -> Result<(), CoordinatorError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| CoordinatorError::Stopped)
    }

    /// Track a new connection and its write side.
    pub async fn register(
        &self,
        connection: ConnectionId,
        sink: Arc<dyn ConnectionSink>,
    ) -> Result<(), CoordinatorError> {
        self.send(Command::Register { connection, sink }).await
    }

    /// Bind the authenticated user to a registered connection.
    pub async fn authenticate(
        &self,
        connection: ConnectionId,
        user: UserId,
    ) -> Result<(), CoordinatorError> {
        self.send(Command::Authenticate { connection, user }).await
    }

    /// Subscribe to a group and wait for the loop to apply it.
    ///
    /// Resolves to `true` when the connection is subscribed afterwards,
    /// including duplicate joins.
    pub async fn join(
        &self,
        connection: ConnectionId,
        group: GroupId,
    ) -> Result<bool, CoordinatorError> {
        let (ack, rx) = oneshot::channel();
        self.send(Command::Join {
            connection,
            group,
            ack,
        })
        .await?;
        rx.await.map_err(|_| CoordinatorError::Stopped)
    }

    /// Unsubscribe from one group.
    pub async fn leave(
        &self,
        connection: ConnectionId,
        group: GroupId,
    ) -> Result<(), CoordinatorError> {
        self.send(Command::Leave { connection, group }).await
    }

    /// Remove a connection from every view. Unknown ids are ignored.
    pub async fn unregister(&self, connection: ConnectionId) -> Result<(), CoordinatorError> {
        self.send(Command::Unregister { connection }).await
    }

    /// Deliver a serialised frame to every subscriber of `group`.
    pub async fn broadcast(
        &self,
        group: GroupId,
        payload: impl Into<Arc<str>>,
    ) -> Result<(), CoordinatorError> {
        self.send(Command::Broadcast {
            group,
            payload: payload.into(),
        })
        .await
    }

    /// Current registry counts.
    pub async fn snapshot(&self) -> Result<RegistrySnapshot, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| CoordinatorError::Stopped)
    }
}

/// Coordinator task state.
pub struct Coordinator {
    rx: mpsc::Receiver<Command>,
    registry: Registry,
    write_timeout: Duration,
}

impl Coordinator {
    /// Start the coordinator on the current Tokio runtime.
    ///
    /// The task exits once every [`CoordinatorHandle`] has been dropped.
    #[must_use]
    pub fn spawn(config: CoordinatorConfig) -> CoordinatorHandle {
        let (tx, rx) = mpsc::channel(config.command_capacity.max(1));
        let coordinator = Self {
            rx,
            registry: Registry::new(),
            write_timeout: config.write_timeout,
        };
        tokio::spawn(coordinator.run());
        CoordinatorHandle { tx }
    }

    async fn run(mut self) {
        info!(write_timeout_ms = self.write_timeout.as_millis(), "chat coordinator started");
        while let Some(command) = self.rx.recv().await {
            self.handle(command).await;
        }
        info!("chat coordinator stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Register { connection, sink } => {
                if self.registry.register(connection, sink) {
                    debug!(%connection, "connection registered");
                } else {
                    warn!(%connection, "duplicate connection registration ignored");
                }
            }
            Command::Authenticate { connection, user } => {
                match self.registry.authenticate(connection, user) {
                    Ok(Binding::Bound) => debug!(%connection, "connection authenticated"),
                    Ok(Binding::AlreadyBound) => {}
                    Err(error) => warn!(%connection, %error, "authentication ignored"),
                }
            }
            Command::Join {
                connection,
                group,
                ack,
            } => {
                let joined = match self.registry.join(connection, group) {
                    Ok(true) => {
                        debug!(%connection, %group, "connection joined group");
                        true
                    }
                    Ok(false) => {
                        debug!(%connection, %group, "duplicate join ignored");
                        true
                    }
                    Err(error) => {
                        warn!(%connection, %group, %error, "join refused");
                        false
                    }
                };
                if ack.send(joined).is_err() {
                    debug!(%connection, "join requester went away");
                }
            }
            Command::Leave { connection, group } => {
                if self.registry.leave(connection, group) {
                    debug!(%connection, %group, "connection left group");
                }
            }
            Command::Unregister { connection } => {
                if self.release(connection).await {
                    info!(%connection, "connection unregistered");
                }
            }
            Command::Broadcast { group, payload } => self.broadcast(group, payload).await,
            Command::Snapshot { reply } => {
                if reply.send(self.registry.snapshot()).is_err() {
                    debug!("snapshot requester went away");
                }
            }
        }
    }

    async fn broadcast(&mut self, group: GroupId, payload: Arc<str>) {
        let targets = self.registry.subscribers(group);
        if targets.is_empty() {
            debug!(%group, "broadcast to group with no subscribers");
            return;
        }

        let deadline = self.write_timeout;
        let writes = targets.into_iter().map(|(connection, sink)| {
            let payload = Arc::clone(&payload);
            async move {
                let outcome = time::timeout(deadline, sink.send_text(&payload)).await;
                (connection, outcome)
            }
        });

        let mut dead = Vec::new();
        let mut delivered = 0_usize;
        for (connection, outcome) in join_all(writes).await {
            match outcome {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(error)) => {
                    warn!(%connection, %group, %error, "broadcast write failed");
                    dead.push(connection);
                }
                Err(_) => {
                    warn!(%connection, %group, "broadcast write timed out");
                    dead.push(connection);
                }
            }
        }
        debug!(%group, delivered, failed = dead.len(), "broadcast complete");

        for connection in dead {
            self.evict(connection).await;
        }
    }

    async fn evict(&mut self, connection: ConnectionId) {
        if self.release(connection).await {
            info!(%connection, "evicted unresponsive connection");
        }
    }

    /// Drop every view of `connection` and close its transport.
    ///
    /// Returns `false` when the connection was already gone.
    async fn release(&mut self, connection: ConnectionId) -> bool {
        let Some(sink) = self.registry.unregister(connection) else {
            return false;
        };
        if time::timeout(self.write_timeout, sink.close()).await.is_err() {
            warn!(%connection, "transport close timed out");
        }
        true
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;

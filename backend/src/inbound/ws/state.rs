//! Shared WebSocket adapter state.
//!
//! Upgrade handlers and connection tasks depend on the chat router and the
//! coordinator handle it carries, never on concrete stores.

use std::time::Duration;

use crate::domain::chat::ChatRouter;

use super::origin::OriginPolicy;

/// Heartbeat cadence for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    /// Time between server pings.
    pub heartbeat_interval: Duration,
    /// Idle time after which the connection is closed.
    pub client_timeout: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(5),
            client_timeout: Duration::from_secs(10),
        }
    }
}

/// Dependency bundle for WebSocket handlers.
#[derive(Clone)]
pub struct WsState {
    pub router: ChatRouter,
    pub origins: OriginPolicy,
    pub timing: SessionTiming,
}

impl WsState {
    /// State with an open origin policy and default heartbeat timing.
    pub fn new(router: ChatRouter) -> Self {
        Self {
            router,
            origins: OriginPolicy::Any,
            timing: SessionTiming::default(),
        }
    }

    /// Replace the origin policy.
    #[must_use]
    pub fn with_origins(mut self, origins: OriginPolicy) -> Self {
        self.origins = origins;
        self
    }

    /// Replace the heartbeat timing.
    #[must_use]
    pub fn with_timing(mut self, timing: SessionTiming) -> Self {
        self.timing = timing;
        self
    }
}

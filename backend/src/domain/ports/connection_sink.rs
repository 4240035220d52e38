//! Outbound half of a live WebSocket connection as seen by the coordinator.
//!
//! The coordinator only ever writes serialised frames and closes; framing,
//! heartbeats and reads stay in the WebSocket adapter.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised when writing to a connection.
    pub enum ConnectionSinkError {
        /// The transport is already closed.
        Closed => "connection closed",
    }
}

/// Write side of one connection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionSink: Send + Sync {
    /// Send one text frame.
    async fn send_text(&self, payload: &str) -> Result<(), ConnectionSinkError>;

    /// Close the transport. Closing twice is harmless.
    async fn close(&self);
}

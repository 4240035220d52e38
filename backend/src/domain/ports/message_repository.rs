//! Port for the external message store.

use async_trait::async_trait;

use crate::domain::{Message, NewMessage};

use super::define_port_error;

define_port_error! {
    /// Errors raised by message store adapters.
    pub enum MessagePersistenceError {
        /// Store connection could not be established.
        Connection { message: String } => "message store connection failed: {message}",
        /// The append was rejected or failed part way.
        Write { message: String } => "message store write failed: {message}",
    }
}

/// Append-only access to persisted chat messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a message, returning it with its store-assigned id and timestamp.
    async fn create(&self, message: NewMessage) -> Result<Message, MessagePersistenceError>;
}

//! `ConnectionSink` backed by an `actix_ws` session.

use std::sync::Arc;

use actix_ws::Session;
use async_trait::async_trait;
use tokio::sync::Notify;

use crate::domain::ports::{ConnectionSink, ConnectionSinkError};

/// Write side handed to the coordinator.
///
/// Closing only signals the connection task; the task owns the read loop and
/// tears the socket down itself.
pub(super) struct SessionSink {
    session: Session,
    evicted: Arc<Notify>,
}

impl SessionSink {
    pub(super) fn new(session: Session, evicted: Arc<Notify>) -> Self {
        Self { session, evicted }
    }
}

#[async_trait]
impl ConnectionSink for SessionSink {
    async fn send_text(&self, payload: &str) -> Result<(), ConnectionSinkError> {
        let mut session = self.session.clone();
        session
            .text(payload.to_owned())
            .await
            .map_err(|_| ConnectionSinkError::closed())
    }

    async fn close(&self) {
        self.evicted.notify_one();
    }
}

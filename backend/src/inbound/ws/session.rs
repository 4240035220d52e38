//! Per-connection WebSocket task.
//!
//! Keeps framing and heartbeats at the edge and hands decoded frames to the
//! chat router. The connection registers with the coordinator before the
//! `connected` frame is sent and unregisters exactly once when the loop
//! ends, whatever the reason.

use std::sync::Arc;
use std::time::Instant;

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::Notify;
use tokio::time;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::domain::chat::{
    ChatRouter, ConnectionContext, ConnectionId, CoordinatorError, InboundFrame, OutboundFrame,
};
use crate::domain::{Group, TraceId, UserId};

use super::sink::SessionSink;
use super::state::{SessionTiming, WsState};

/// Identity established by the upgrade gate.
pub(super) struct Admission {
    pub user_id: UserId,
    pub group: Group,
}

pub(super) async fn handle_ws_session(
    state: WsState,
    admission: Admission,
    session: Session,
    stream: MessageStream,
) {
    let trace_id = TraceId::generate();
    let ctx = ConnectionContext::admitted(ConnectionId::random(), admission.user_id, &admission.group);
    let span = info_span!(
        "ws_connection",
        trace_id = %trace_id,
        connection_id = %ctx.connection_id,
        user_id = %ctx.user_id,
        group_id = %ctx.group_id,
        group_slug = %ctx.group_slug,
    );
    let ws = WsSession::new(state.router, state.timing, ctx);
    TraceId::scope(trace_id, ws.run(session, stream))
        .instrument(span)
        .await;
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    InvalidPayload,
    Network(Closed),
    Evicted,
    Unavailable(CoordinatorError),
}

enum CloseAction {
    None,
    Close(Option<CloseReason>),
}

struct WsSession {
    router: ChatRouter,
    timing: SessionTiming,
    ctx: ConnectionContext,
}

impl WsSession {
    fn new(router: ChatRouter, timing: SessionTiming, ctx: ConnectionContext) -> Self {
        Self { router, timing, ctx }
    }

    async fn run(&self, mut session: Session, mut stream: MessageStream) {
        let evicted = Arc::new(Notify::new());
        let result = match self.attach(&session, Arc::clone(&evicted)).await {
            Ok(()) => {
                info!("connection joined group");
                self.serve(&mut session, &mut stream, &evicted).await
            }
            Err(error) => error,
        };

        self.detach().await;
        self.log_shutdown_reason(&result);
        let close_action = self.close_action_for(&result);
        self.close_session_if_needed(session, close_action).await;
    }

    async fn attach(&self, session: &Session, evicted: Arc<Notify>) -> Result<(), SessionError> {
        let coordinator = self.router.coordinator();
        let connection = self.ctx.connection_id;
        let sink = Arc::new(SessionSink::new(session.clone(), evicted));
        coordinator
            .register(connection, sink)
            .await
            .map_err(SessionError::Unavailable)?;
        coordinator
            .authenticate(connection, self.ctx.user_id.clone())
            .await
            .map_err(SessionError::Unavailable)?;
        let joined = coordinator
            .join(connection, self.ctx.group_id)
            .await
            .map_err(SessionError::Unavailable)?;
        if joined {
            Ok(())
        } else {
            Err(SessionError::Unavailable(CoordinatorError::Stopped))
        }
    }

    async fn detach(&self) {
        if let Err(error) = self.router.coordinator().unregister(self.ctx.connection_id).await {
            debug!(%error, "coordinator gone before unregister");
        }
    }

    /// Runs until the connection ends; always yields the reason.
    async fn serve(
        &self,
        session: &mut Session,
        stream: &mut MessageStream,
        evicted: &Notify,
    ) -> SessionError {
        if let Err(error) = self.send_frame(session, &OutboundFrame::connected()).await {
            return SessionError::Network(error);
        }

        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(self.timing.heartbeat_interval);

        loop {
            let result = tokio::select! {
                () = evicted.notified() => Err(SessionError::Evicted),
                _ = heartbeat.tick() => {
                    self.handle_heartbeat_tick(session, &last_heartbeat).await
                }
                message = stream.recv() => {
                    self.handle_stream_message(session, &mut last_heartbeat, message)
                        .await
                }
            };

            if let Err(error) = result {
                return error;
            }
        }
    }

    async fn handle_heartbeat_tick(
        &self,
        session: &mut Session,
        last_heartbeat: &Instant,
    ) -> Result<(), SessionError> {
        if Instant::now().duration_since(*last_heartbeat) > self.timing.client_timeout {
            return Err(SessionError::HeartbeatTimeout);
        }

        session.ping(b"").await.map_err(SessionError::Network)
    }

    async fn handle_stream_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let Some(message) = message else {
            return Err(SessionError::StreamClosed);
        };

        match message {
            Ok(message) => self.handle_message(session, last_heartbeat, message).await,
            Err(error) => Err(SessionError::Protocol(error)),
        }
    }

    async fn handle_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Message,
    ) -> Result<(), SessionError> {
        *last_heartbeat = Instant::now();
        match message {
            Message::Ping(payload) => session.pong(&payload).await.map_err(SessionError::Network),
            Message::Text(text) => self.handle_text_message(session, text.as_ref()).await,
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                Ok(())
            }
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
        }
    }

    async fn handle_text_message(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<(), SessionError> {
        let frame = match serde_json::from_str::<InboundFrame>(text) {
            Ok(frame) => frame,
            Err(error) => {
                warn!(error = %error, "rejected malformed chat frame");
                return Err(SessionError::InvalidPayload);
            }
        };

        match self.router.dispatch(&self.ctx, frame).await {
            Some(reply) => self
                .send_frame(session, &reply)
                .await
                .map_err(SessionError::Network),
            None => Ok(()),
        }
    }

    async fn send_frame(&self, session: &mut Session, frame: &OutboundFrame) -> Result<(), Closed> {
        match frame.to_json() {
            Ok(body) => session.text(body).await,
            Err(error) => {
                warn!(error = %error, "failed to serialise outbound frame");
                Ok(())
            }
        }
    }

    fn log_shutdown_reason(&self, error: &SessionError) {
        match error {
            SessionError::HeartbeatTimeout => {
                warn!("WebSocket heartbeat timeout; closing connection");
            }
            SessionError::Protocol(error) => {
                warn!(error = %error, "WebSocket protocol error");
            }
            SessionError::Network(error) => {
                warn!(error = %error, "WebSocket send failed; closing connection");
            }
            SessionError::Evicted => {
                warn!("connection evicted by coordinator");
            }
            SessionError::Unavailable(error) => {
                warn!(error = %error, "could not attach connection to coordinator");
            }
            SessionError::InvalidPayload
            | SessionError::ClientClosed(_)
            | SessionError::StreamClosed => {
                info!("connection closed");
            }
        }
    }

    fn close_action_for(&self, error: &SessionError) -> CloseAction {
        match error {
            SessionError::HeartbeatTimeout => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Normal,
                description: Some("heartbeat timeout".to_owned()),
            })),
            SessionError::Protocol(_) => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Protocol,
                description: Some("protocol error".to_owned()),
            })),
            SessionError::InvalidPayload => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Policy,
                description: Some("invalid payload".to_owned()),
            })),
            SessionError::Unavailable(_) => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Error,
                description: Some("chat unavailable".to_owned()),
            })),
            SessionError::ClientClosed(reason) => CloseAction::Close(reason.clone()),
            SessionError::StreamClosed | SessionError::Network(_) | SessionError::Evicted => {
                CloseAction::None
            }
        }
    }

    async fn close_session_if_needed(&self, session: Session, close_action: CloseAction) {
        if let CloseAction::Close(reason) = close_action {
            if let Err(error) = session.close(reason).await {
                debug!(error = %error, "WebSocket session already closed");
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;

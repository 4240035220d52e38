//! `awc` WebSocket client helpers.

use std::time::Duration;

use actix_codec::Framed;
use actix_web::cookie::Cookie;
use awc::BoxedSocket;
use awc::ws::{CloseReason, Codec, Frame, Message};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};

use super::gateway::RunningGateway;

pub type Socket = Framed<BoxedSocket, Codec>;

/// Log in through `POST /api/v1/login` and return the session cookie.
pub async fn login(gateway: &RunningGateway, (username, password): (&str, &str)) -> Cookie<'static> {
    let response = awc::Client::default()
        .post(gateway.url("/api/v1/login"))
        .send_json(&json!({ "username": username, "password": password }))
        .await
        .expect("login request");
    assert!(
        response.status().is_success(),
        "login {username}: {}",
        response.status()
    );
    response
        .cookies()
        .expect("cookies parse")
        .iter()
        .find(|cookie| cookie.name() == "session")
        .cloned()
        .expect("session cookie")
}

/// Open a chat socket for `slug` and consume the `connected` frame.
pub async fn join(gateway: &RunningGateway, cookie: Cookie<'static>, slug: &str) -> Socket {
    let (_response, mut socket) = awc::Client::default()
        .ws(gateway.ws_url(&format!("/ws/chat/groups/{slug}")))
        .cookie(cookie)
        .connect()
        .await
        .expect("websocket connect");
    assert_eq!(next_json(&mut socket).await, json!({ "type": "connected" }));
    socket
}

/// Next non-control frame within `wait`, or `None` once it elapses.
pub async fn recv_within(socket: &mut Socket, wait: Duration) -> Option<Frame> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let frame = tokio::time::timeout_at(deadline, socket.next()).await.ok()??;
        match frame.expect("valid frame") {
            Frame::Ping(_) | Frame::Pong(_) => continue,
            other => return Some(other),
        }
    }
}

pub async fn next_frame(socket: &mut Socket) -> Frame {
    recv_within(socket, Duration::from_secs(2))
        .await
        .expect("frame before deadline")
}

pub async fn next_json(socket: &mut Socket) -> Value {
    match next_frame(socket).await {
        Frame::Text(bytes) => serde_json::from_slice(&bytes).expect("json frame"),
        other => panic!("expected text frame, got {other:?}"),
    }
}

pub async fn next_close(socket: &mut Socket) -> Option<CloseReason> {
    match next_frame(socket).await {
        Frame::Close(reason) => reason,
        other => panic!("expected close frame, got {other:?}"),
    }
}

pub async fn send_json(socket: &mut Socket, value: Value) {
    socket
        .send(Message::Text(value.to_string().into()))
        .await
        .expect("send frame");
}

//! Connection task tests against a real server.

use super::*;
use crate::domain::chat::{ChatPorts, Coordinator, CoordinatorConfig, CoordinatorHandle};
use crate::domain::{ApiResult, Error};
use crate::inbound::http::session::SessionContext;
use crate::inbound::ws;
use crate::outbound::memory::{InMemoryMessageStore, Seed};
use actix_codec::Framed;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::{App, HttpResponse, HttpServer, dev::ServerHandle, web};
use awc::ws::{Codec, Frame, Message as ClientMessage};
use awc::BoxedSocket;
use futures_util::{SinkExt, StreamExt};
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::{Value, json};
use std::time::Duration;

type Socket = Framed<BoxedSocket, Codec>;

const ALICE_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
const BOB_ID: &str = "5b3c2c1e-8d6f-4a7b-9e0d-1f2a3b4c5d6e";
const SESSION_COOKIE: &str = "session";

fn seed() -> Seed {
    let raw = json!({
        "users": [
            { "id": ALICE_ID, "username": "alice", "password": "wonderland" },
            { "id": BOB_ID, "username": "bob" }
        ],
        "groups": [{
            "id": "9b2f61a4-7c1e-4a43-9d0b-58f5a8e5e0c1",
            "name": "General",
            "slug": "g1",
            "creatorId": ALICE_ID,
            "memberIds": [BOB_ID]
        }]
    });
    Seed::from_json(&raw.to_string()).expect("valid seed")
}

async fn login_as(session: SessionContext, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let user = UserId::new(path.into_inner()).map_err(|err| Error::invalid_request(err.to_string()))?;
    session.persist_user(&user)?;
    Ok(HttpResponse::Ok().finish())
}

struct Gateway {
    url: String,
    coordinator: CoordinatorHandle,
    _server: ServerHandle,
}

fn start_gateway(timing: SessionTiming) -> Gateway {
    let seed = seed();
    let coordinator = Coordinator::spawn(CoordinatorConfig::default());
    let router = ChatRouter::new(
        ChatPorts {
            groups: seed.groups.clone(),
            messages: Arc::new(InMemoryMessageStore::new(Arc::new(DefaultClock))),
            profiles: seed.users.clone(),
        },
        coordinator.clone(),
    );
    let state = WsState::new(router).with_timing(timing);
    let key = Key::generate();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
                    .cookie_name(SESSION_COOKIE.to_owned())
                    .cookie_secure(false)
                    .build(),
            )
            .route("/login/{user_id}", web::post().to(login_as))
            .service(ws::chat_entry)
    })
    .workers(1)
    .listen(listener)
    .expect("listen")
    .disable_signals()
    .run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    Gateway {
        url: format!("http://{addr}"),
        coordinator,
        _server: handle,
    }
}

async fn connect(gateway: &Gateway, user: &str) -> Socket {
    let client = awc::Client::default();
    let login = client
        .post(format!("{}/login/{user}", gateway.url))
        .send()
        .await
        .expect("login request");
    let cookie = login
        .cookies()
        .expect("cookies parse")
        .iter()
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .cloned()
        .expect("session cookie");
    let (_response, socket) = client
        .ws(format!("{}/ws/chat/groups/g1", gateway.url))
        .cookie(cookie)
        .connect()
        .await
        .expect("websocket connect");
    socket
}

async fn next_frame(socket: &mut Socket) -> Frame {
    loop {
        let frame = time::timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("frame before deadline")
            .expect("stream open")
            .expect("valid frame");
        if !matches!(frame, Frame::Ping(_) | Frame::Pong(_)) {
            return frame;
        }
    }
}

async fn next_json(socket: &mut Socket) -> Value {
    match next_frame(socket).await {
        Frame::Text(bytes) => serde_json::from_slice(&bytes).expect("json frame"),
        other => panic!("expected text frame, got {other:?}"),
    }
}

async fn next_close(socket: &mut Socket) -> Option<CloseReason> {
    match next_frame(socket).await {
        Frame::Close(reason) => reason,
        other => panic!("expected close frame, got {other:?}"),
    }
}

async fn send_json(socket: &mut Socket, value: Value) {
    socket
        .send(ClientMessage::Text(value.to_string().into()))
        .await
        .expect("send frame");
}

async fn wait_for_connections(coordinator: &CoordinatorHandle, expected: usize) {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        let snapshot = coordinator.snapshot().await.expect("coordinator running");
        if snapshot.connections == expected {
            return;
        }
        assert!(
            Instant::now() < deadline,
            "expected {expected} connections, saw {}",
            snapshot.connections
        );
        time::sleep(Duration::from_millis(10)).await;
    }
}

#[rstest]
#[actix_rt::test]
async fn connected_frame_arrives_after_join() {
    let gateway = start_gateway(SessionTiming::default());
    let mut socket = connect(&gateway, ALICE_ID).await;

    assert_eq!(next_json(&mut socket).await, json!({ "type": "connected" }));
    let snapshot = gateway.coordinator.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.connections, 1);
    assert_eq!(snapshot.authenticated, 1);
    assert_eq!(snapshot.groups.values().copied().collect::<Vec<_>>(), vec![1]);
}

#[rstest]
#[actix_rt::test]
async fn malformed_json_closes_with_policy_violation() {
    let gateway = start_gateway(SessionTiming::default());
    let mut socket = connect(&gateway, ALICE_ID).await;
    next_json(&mut socket).await;

    socket
        .send(ClientMessage::Text("{not json".into()))
        .await
        .expect("send");
    let reason = next_close(&mut socket).await.expect("close reason");
    assert_eq!(reason.code, CloseCode::Policy);
    wait_for_connections(&gateway.coordinator, 0).await;
}

#[rstest]
#[actix_rt::test]
async fn null_message_gets_error_frame_and_keeps_connection() {
    let gateway = start_gateway(SessionTiming::default());
    let mut socket = connect(&gateway, ALICE_ID).await;
    next_json(&mut socket).await;

    send_json(&mut socket, json!({ "type": "chat_message", "message": null })).await;
    assert_eq!(next_json(&mut socket).await["type"], "error");

    send_json(&mut socket, json!({ "type": "typing" })).await;
    assert_eq!(next_json(&mut socket).await["type"], "typing");
    let snapshot = gateway.coordinator.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.connections, 1);
}

#[rstest]
#[actix_rt::test]
async fn unknown_frame_types_are_ignored() {
    let gateway = start_gateway(SessionTiming::default());
    let mut socket = connect(&gateway, ALICE_ID).await;
    next_json(&mut socket).await;

    send_json(&mut socket, json!({ "type": "reaction", "emoji": "+1" })).await;
    send_json(&mut socket, json!({ "type": "typing" })).await;

    let frame = next_json(&mut socket).await;
    assert_eq!(frame["type"], "typing");
    assert_eq!(frame["user_id"], ALICE_ID);
    assert_eq!(frame["group_slug"], "g1");
}

#[rstest]
#[actix_rt::test]
async fn idle_client_is_closed_after_timeout() {
    let gateway = start_gateway(SessionTiming {
        heartbeat_interval: Duration::from_millis(50),
        client_timeout: Duration::from_millis(150),
    });
    let mut socket = connect(&gateway, ALICE_ID).await;
    next_json(&mut socket).await;

    let reason = next_close(&mut socket).await.expect("close reason");
    assert_eq!(reason.code, CloseCode::Normal);
    assert_eq!(reason.description.as_deref(), Some("heartbeat timeout"));
    wait_for_connections(&gateway.coordinator, 0).await;
}

#[rstest]
#[actix_rt::test]
async fn client_close_unregisters_connection() {
    let gateway = start_gateway(SessionTiming::default());
    let mut alice = connect(&gateway, ALICE_ID).await;
    let mut bob = connect(&gateway, BOB_ID).await;
    next_json(&mut alice).await;
    next_json(&mut bob).await;
    wait_for_connections(&gateway.coordinator, 2).await;

    bob.send(ClientMessage::Close(None)).await.expect("close");
    wait_for_connections(&gateway.coordinator, 1).await;

    send_json(&mut alice, json!({ "type": "stop_typing" })).await;
    assert_eq!(next_json(&mut alice).await["type"], "stop_typing");
}

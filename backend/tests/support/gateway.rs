//! Gateway fixtures shared by the integration test crates.
//!
//! Builds the production `App` over the seeded in-memory stores, either for
//! `actix_web::test` or behind a real listener for `awc` clients.

use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;

use actix_web::cookie::{Key, SameSite};
use actix_web::dev::ServerHandle;
use actix_web::{HttpServer, web};
use chat_gateway::domain::chat::{
    ChatPorts, ChatRouter, Coordinator, CoordinatorConfig, CoordinatorHandle,
};
use chat_gateway::domain::ports::MessageRepository;
use chat_gateway::inbound::http::health::HealthState;
use chat_gateway::inbound::http::state::HttpState;
use chat_gateway::inbound::ws::origin::OriginPolicy;
use chat_gateway::inbound::ws::state::WsState;
use chat_gateway::outbound::memory::{InMemoryMessageStore, Seed};
use chat_gateway::server::{AppDependencies, build_app};
use mockable::DefaultClock;

pub const ALICE_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
pub const BOB_ID: &str = "5b3c2c1e-8d6f-4a7b-9e0d-1f2a3b4c5d6e";
pub const EVE_ID: &str = "9a1c73d2-6f0e-4b8e-8a55-2f4d1a0e1f02";

/// Credentials from `fixtures/seed.json`.
pub const ALICE: (&str, &str) = ("alice", "wonderland");
pub const BOB: (&str, &str) = ("bob", "builder");
pub const EVE: (&str, &str) = ("eve", "eavesdrop");

/// Knobs for [`Harness::new`].
#[derive(Default)]
pub struct HarnessOptions {
    pub origins: OriginPolicy,
    /// Replaces the in-memory message store.
    pub messages: Option<Arc<dyn MessageRepository>>,
}

/// Seeded stores, a running coordinator and the app dependencies over them.
pub struct Harness {
    pub seed: Seed,
    pub messages: Arc<InMemoryMessageStore>,
    pub coordinator: CoordinatorHandle,
    pub deps: AppDependencies,
}

impl Harness {
    /// Must run inside a Tokio runtime; the coordinator is spawned here.
    pub fn new(options: HarnessOptions) -> Self {
        let seed_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("fixtures")
            .join("seed.json");
        let seed = Seed::load(&seed_path).expect("fixture seed loads");
        let messages = Arc::new(InMemoryMessageStore::new(Arc::new(DefaultClock)));
        let message_port: Arc<dyn MessageRepository> = match options.messages {
            Some(port) => port,
            None => messages.clone(),
        };
        let coordinator = Coordinator::spawn(CoordinatorConfig::default());
        let router = ChatRouter::new(
            ChatPorts {
                groups: seed.groups.clone(),
                messages: message_port,
                profiles: seed.users.clone(),
            },
            coordinator.clone(),
        );
        let health = web::Data::new(HealthState::new());
        health.mark_ready();
        let deps = AppDependencies {
            health_state: health,
            http_state: web::Data::new(HttpState::new(
                seed.users.clone(),
                seed.users.clone(),
                seed.groups.clone(),
            )),
            ws_state: web::Data::new(WsState::new(router).with_origins(options.origins)),
            key: Key::generate(),
            cookie_secure: false,
            same_site: SameSite::Lax,
        };
        Self {
            seed,
            messages,
            coordinator,
            deps,
        }
    }

    /// Serve the app on an ephemeral port with a single worker.
    pub fn serve(&self) -> RunningGateway {
        let deps = self.deps.clone();
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        let server = HttpServer::new(move || build_app(deps.clone()))
            .workers(1)
            .listen(listener)
            .expect("listen")
            .disable_signals()
            .run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        RunningGateway {
            base_url: format!("http://{addr}"),
            _handle: handle,
        }
    }
}

/// Listener started by [`Harness::serve`].
pub struct RunningGateway {
    pub base_url: String,
    _handle: ServerHandle,
}

impl RunningGateway {
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.replacen("http", "ws", 1))
    }
}

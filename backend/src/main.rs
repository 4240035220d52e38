//! Gateway entry point: loads settings and seed data, starts the coordinator
//! and serves HTTP and WebSocket traffic.

use std::sync::Arc;

use actix_web::web;
use mockable::{DefaultClock, DefaultEnv};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use chat_gateway::domain::chat::{ChatPorts, ChatRouter, Coordinator};
use chat_gateway::inbound::http::health::HealthState;
use chat_gateway::inbound::http::session_config::{BuildMode, session_settings_from_env};
use chat_gateway::inbound::http::state::HttpState;
use chat_gateway::inbound::ws::origin::OriginPolicy;
use chat_gateway::inbound::ws::state::WsState;
use chat_gateway::outbound::memory::{InMemoryMessageStore, Seed};
use chat_gateway::server::{ServerConfig, create_server};
use chat_gateway::settings::GatewaySettings;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = GatewaySettings::load_from_iter(std::env::args_os())
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::current())
        .map_err(std::io::Error::other)?;
    let origins =
        OriginPolicy::from_entries(settings.allowed_origins()).map_err(std::io::Error::other)?;
    let timing = settings.session_timing().map_err(std::io::Error::other)?;
    let coordinator_config = settings.coordinator_config().map_err(std::io::Error::other)?;

    let seed_path = settings.seed_path();
    let seed = Seed::load(&seed_path).map_err(std::io::Error::other)?;
    let messages = Arc::new(InMemoryMessageStore::new(Arc::new(DefaultClock)));

    let coordinator = Coordinator::spawn(coordinator_config);
    let router = ChatRouter::new(
        ChatPorts {
            groups: seed.groups.clone(),
            messages,
            profiles: seed.users.clone(),
        },
        coordinator,
    );
    let ws_state = WsState::new(router).with_origins(origins).with_timing(timing);
    let http_state = HttpState::new(seed.users.clone(), seed.users, seed.groups);

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(
        health_state,
        http_state,
        ws_state,
        ServerConfig::from_session(session, bind_addr),
    )?;
    info!(%bind_addr, seed = %seed_path.display(), "chat gateway listening");
    server.await
}

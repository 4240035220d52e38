//! Gateway configuration loaded via OrthoConfig.
//!
//! Values come from CLI flags, `CHAT_GATEWAY_*` environment variables and an
//! optional config file, in that order of precedence. Optional fields fall
//! back to defaults in their accessors.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Deserializer};

use crate::domain::chat::{CoordinatorConfig, DEFAULT_WRITE_TIMEOUT};
use crate::inbound::ws::state::SessionTiming;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

fn default_seed_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join("seed.json")
}

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address `{value}`: {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
}

/// Runtime settings for the chat gateway.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CHAT_GATEWAY")]
pub struct GatewaySettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// JSON seed for the in-memory user directory and group store.
    pub seed_path: Option<PathBuf>,
    /// Per-recipient write deadline during a broadcast, in milliseconds.
    pub broadcast_timeout_ms: Option<u64>,
    /// Server ping cadence, in milliseconds.
    pub heartbeat_interval_ms: Option<u64>,
    /// Idle time before a connection is dropped, in milliseconds.
    pub client_timeout_ms: Option<u64>,
    /// Bound of the coordinator command queue.
    #[ortho_config(default = 1024)]
    pub command_capacity: usize,
    /// Origin allow-list; unset accepts any origin.
    #[serde(default, deserialize_with = "origin_list")]
    pub allowed_origins: Option<Vec<String>>,
}

/// Accepts a list or a single comma-separated string.
///
/// The environment provider yields a string for one origin and a sequence
/// once the value contains a comma.
fn origin_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::One(joined) => joined.split(',').map(str::to_owned).collect(),
        Raw::Many(entries) => entries,
    }))
}

impl GatewaySettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    pub fn seed_path(&self) -> PathBuf {
        self.seed_path.clone().unwrap_or_else(default_seed_path)
    }

    pub fn coordinator_config(&self) -> Result<CoordinatorConfig, SettingsError> {
        let command_capacity = self.command_capacity;
        if command_capacity == 0 {
            return Err(SettingsError::Zero {
                name: "command_capacity",
            });
        }
        Ok(CoordinatorConfig {
            command_capacity,
            write_timeout: millis(
                "broadcast_timeout_ms",
                self.broadcast_timeout_ms,
                DEFAULT_WRITE_TIMEOUT,
            )?,
        })
    }

    pub fn session_timing(&self) -> Result<SessionTiming, SettingsError> {
        let defaults = SessionTiming::default();
        Ok(SessionTiming {
            heartbeat_interval: millis(
                "heartbeat_interval_ms",
                self.heartbeat_interval_ms,
                defaults.heartbeat_interval,
            )?,
            client_timeout: millis(
                "client_timeout_ms",
                self.client_timeout_ms,
                defaults.client_timeout,
            )?,
        })
    }

    /// Trimmed, non-blank allow-list entries.
    pub fn allowed_origins(&self) -> Vec<&str> {
        self.allowed_origins
            .iter()
            .flatten()
            .map(|entry| entry.trim())
            .filter(|entry| !entry.is_empty())
            .collect()
    }
}

fn millis(
    name: &'static str,
    value: Option<u64>,
    default: Duration,
) -> Result<Duration, SettingsError> {
    match value {
        None => Ok(default),
        Some(0) => Err(SettingsError::Zero { name }),
        Some(ms) => Ok(Duration::from_millis(ms)),
    }
}

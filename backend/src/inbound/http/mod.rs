//! HTTP inbound adapter: REST endpoints, session handling and probes.

pub mod error;
pub mod groups;
pub mod health;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;

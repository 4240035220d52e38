//! Inbound adapters.
//!
//! [`http`] serves the REST surface and probes; [`ws`] hosts the chat upgrade
//! and the per-connection session tasks.

pub mod http;
pub mod ws;

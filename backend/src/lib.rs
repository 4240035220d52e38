//! Real-time group chat gateway.
//!
//! Authenticated users upgrade to a WebSocket bound to one group; chat
//! messages are persisted and fanned out to every connection subscribed to
//! that group.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;
pub mod settings;

pub use doc::ApiDoc;
pub use middleware::Trace;

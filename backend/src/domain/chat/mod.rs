//! Real-time group chat core.
//!
//! - [`frame`]: wire frames exchanged with clients.
//! - [`registry`]: connection, user, and group indexes.
//! - [`coordinator`]: the single task that owns the registry and fans out
//!   broadcasts.
//! - [`router`]: upgrade authorisation and per-frame handling.

pub mod coordinator;
pub mod frame;
pub mod registry;
pub mod router;

pub use self::coordinator::{
    Coordinator, CoordinatorConfig, CoordinatorError, CoordinatorHandle,
    DEFAULT_COMMAND_CAPACITY, DEFAULT_WRITE_TIMEOUT,
};
pub use self::frame::{FrameKind, InboundFrame, OutboundFrame, Sender};
pub use self::registry::{ConnectionId, Registry, RegistryError, RegistrySnapshot};
pub use self::router::{ChatPorts, ChatRouter, ConnectionContext, DELIVERY_FAILED, SAVE_FAILED};

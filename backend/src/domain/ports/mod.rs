//! Domain ports for the hexagonal boundary.
//!
//! Driven ports (`GroupRepository`, `MessageRepository`, `UserProfileQuery`,
//! `ConnectionSink`) are implemented by outbound and WebSocket adapters.
//! `LoginService` is a driving port called by the HTTP adapter.

mod macros;
pub(crate) use macros::define_port_error;

mod connection_sink;
mod group_repository;
mod login_service;
mod message_repository;
mod user_profile_query;

#[cfg(test)]
pub use connection_sink::MockConnectionSink;
pub use connection_sink::{ConnectionSink, ConnectionSinkError};
#[cfg(test)]
pub use group_repository::MockGroupRepository;
pub use group_repository::{GroupPersistenceError, GroupRepository};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use message_repository::MockMessageRepository;
pub use message_repository::{MessagePersistenceError, MessageRepository};
#[cfg(test)]
pub use user_profile_query::MockUserProfileQuery;
pub use user_profile_query::{UserProfileError, UserProfileQuery};

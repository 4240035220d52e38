//! Domain primitives, ports, and the chat routing core.
//!
//! Purpose: Define strongly typed entities shared by the WebSocket gateway,
//! the HTTP surface, and the store adapters. Types are immutable once built
//! and document their invariants and serde contracts in Rustdoc.
//!
//! Public surface:
//! - Error (alias to `error::Error`) — API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`) — stable error identifier.
//! - UserId / Username / UserProfile — user identity and display data.
//! - Group / GroupId / GroupSlug — chat rooms and their URL handles.
//! - Message / NewMessage / MessageContent — persisted chat text.
//! - chat — coordinator actor, connection registry, wire frames, router.

pub mod auth;
pub mod chat;
pub mod error;
pub mod group;
pub mod message;
pub mod ports;
mod slug;
pub mod trace_id;
pub mod user;

pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::group::{GROUP_NAME_MAX, Group, GroupId, GroupSlug, GroupValidationError};
pub use self::message::{
    MESSAGE_CONTENT_MAX, Message, MessageContent, MessageId, MessageValidationError, NewMessage,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{USERNAME_MAX, UserId, UserProfile, UserValidationError, Username};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use chat_gateway::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;

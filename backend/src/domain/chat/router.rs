//! Per-connection message routing.
//!
//! The router authorises upgrades against the group store and turns decoded
//! inbound frames into persistence calls and coordinator broadcasts. It owns
//! no connection state; everything per-connection arrives in a
//! [`ConnectionContext`].

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::ports::{GroupRepository, MessageRepository, UserProfileQuery};
use crate::domain::{Error, Group, GroupId, GroupSlug, MessageContent, NewMessage, UserId};

use super::coordinator::CoordinatorHandle;
use super::frame::{FrameKind, InboundFrame, OutboundFrame, Sender};
use super::registry::ConnectionId;

/// Error frame text for a failed persistence call.
pub const SAVE_FAILED: &str = "failed to save message";
/// Error frame text when the coordinator is unavailable.
pub const DELIVERY_FAILED: &str = "failed to deliver message";

/// Everything the router knows about one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionContext {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub group_id: GroupId,
    pub group_slug: GroupSlug,
}

impl ConnectionContext {
    /// Context for a connection admitted to `group`.
    #[must_use]
    pub fn admitted(connection_id: ConnectionId, user_id: UserId, group: &Group) -> Self {
        Self {
            connection_id,
            user_id,
            group_id: group.id(),
            group_slug: group.slug().clone(),
        }
    }
}

/// Store collaborators used by [`ChatRouter`].
#[derive(Clone)]
pub struct ChatPorts {
    pub groups: Arc<dyn GroupRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub profiles: Arc<dyn UserProfileQuery>,
}

/// Shared router; cheap to clone into each connection task.
#[derive(Clone)]
pub struct ChatRouter {
    ports: ChatPorts,
    coordinator: CoordinatorHandle,
}

impl ChatRouter {
    /// Build a router over the given ports.
    #[must_use]
    pub fn new(ports: ChatPorts, coordinator: CoordinatorHandle) -> Self {
        Self { ports, coordinator }
    }

    /// Coordinator handle used for registration and broadcasts.
    #[must_use]
    pub fn coordinator(&self) -> &CoordinatorHandle {
        &self.coordinator
    }

    /// Resolve `slug` and check that `user` may join it.
    ///
    /// Fails with `not_found` for malformed or unknown slugs, `forbidden`
    /// for non-members, and `service_unavailable` when the store errors.
    pub async fn authorize(&self, user: &UserId, slug: &str) -> Result<Group, Error> {
        let slug = GroupSlug::new(slug).map_err(|_| Error::not_found("group not found"))?;
        let group = self.lookup(&slug).await?;
        if !group.admits(user) {
            return Err(Error::forbidden("not a member of this group"));
        }
        Ok(group)
    }

    async fn lookup(&self, slug: &GroupSlug) -> Result<Group, Error> {
        self.ports
            .groups
            .find_by_slug(slug)
            .await
            .map_err(|error| {
                warn!(%slug, %error, "group lookup failed");
                Error::service_unavailable("group store unavailable")
            })?
            .ok_or_else(|| Error::not_found("group not found"))
    }

    /// Handle one decoded frame.
    ///
    /// Returns the frame to send back to the originating connection only,
    /// if any; broadcasts go through the coordinator.
    pub async fn dispatch(
        &self,
        ctx: &ConnectionContext,
        frame: InboundFrame,
    ) -> Option<OutboundFrame> {
        match frame {
            InboundFrame::ChatMessage { message } => self.chat_message(ctx, message).await,
            InboundFrame::Typing {} => self.presence(ctx, FrameKind::Typing).await,
            InboundFrame::StopTyping {} => self.presence(ctx, FrameKind::StopTyping).await,
            InboundFrame::Unknown => {
                debug!(connection_id = %ctx.connection_id, "ignoring frame with unknown type");
                None
            }
        }
    }

    async fn chat_message(&self, ctx: &ConnectionContext, raw: String) -> Option<OutboundFrame> {
        let content = match MessageContent::new(raw) {
            Ok(content) => content,
            Err(error) => return Some(OutboundFrame::error(error.to_string())),
        };

        // Group is re-read on every message so deletions made elsewhere win.
        let group = match self.lookup(&ctx.group_slug).await {
            Ok(group) => group,
            Err(error) => {
                warn!(connection_id = %ctx.connection_id, %error, "chat message rejected");
                return Some(OutboundFrame::error(error.message()));
            }
        };

        let stored = match self
            .ports
            .messages
            .create(NewMessage {
                sender_id: ctx.user_id.clone(),
                group_id: group.id(),
                content,
            })
            .await
        {
            Ok(stored) => stored,
            Err(error) => {
                warn!(connection_id = %ctx.connection_id, %error, "message persistence failed");
                return Some(OutboundFrame::error(SAVE_FAILED));
            }
        };

        let frame = OutboundFrame::activity(
            FrameKind::ChatMessage,
            self.sender(&ctx.user_id).await,
            group.slug(),
            Some(stored.content().to_owned()),
        );
        self.publish(ctx, group.id(), &frame).await
    }

    async fn presence(&self, ctx: &ConnectionContext, kind: FrameKind) -> Option<OutboundFrame> {
        let frame =
            OutboundFrame::activity(kind, self.sender(&ctx.user_id).await, &ctx.group_slug, None);
        self.publish(ctx, ctx.group_id, &frame).await
    }

    async fn sender(&self, user: &UserId) -> Sender {
        match self.ports.profiles.fetch_profile(user).await {
            Ok(profile) => Sender::from_profile(&profile),
            Err(error) => {
                warn!(user_id = %user, %error, "profile lookup failed; sending bare sender");
                Sender::anonymous(user.clone())
            }
        }
    }

    async fn publish(
        &self,
        ctx: &ConnectionContext,
        group: GroupId,
        frame: &OutboundFrame,
    ) -> Option<OutboundFrame> {
        let payload = match frame.to_json() {
            Ok(payload) => payload,
            Err(error) => {
                warn!(connection_id = %ctx.connection_id, %error, "frame encoding failed");
                return Some(OutboundFrame::error(DELIVERY_FAILED));
            }
        };
        match self.coordinator.broadcast(group, payload).await {
            Ok(()) => None,
            Err(error) => {
                warn!(connection_id = %ctx.connection_id, %error, "broadcast not queued");
                Some(OutboundFrame::error(DELIVERY_FAILED))
            }
        }
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;

//! JSON frames exchanged over a group chat WebSocket.
//!
//! Every frame is an object with a `type` discriminator. Inbound frames are
//! lenient: unknown fields are ignored and unknown `type` values decode to
//! [`InboundFrame::Unknown`]. Outbound frames are a single superset shape
//! whose optional fields are omitted when empty.

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{GroupSlug, UserId, UserProfile};

/// Discriminator carried in every outbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    /// Sent once after the connection has joined its group.
    Connected,
    /// A persisted chat message.
    ChatMessage,
    /// Sender started typing.
    Typing,
    /// Sender stopped typing.
    StopTyping,
    /// Rejection addressed to the sender only.
    Error,
}

/// Frame received from a client.
///
/// # Examples
/// ```
/// use chat_gateway::domain::chat::InboundFrame;
///
/// let frame: InboundFrame =
///     serde_json::from_str(r#"{"type":"chat_message","message":"hi","group_slug":"g1"}"#)
///         .expect("decode");
/// assert_eq!(frame, InboundFrame::ChatMessage { message: "hi".into() });
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    ChatMessage {
        /// Missing or `null` decodes as empty and is refused by the router.
        #[serde(default, deserialize_with = "null_as_empty")]
        message: String,
    },
    Typing {},
    StopTyping {},
    /// Any other `type`; ignored by the router.
    #[serde(other)]
    Unknown,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Frame sent to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    #[serde(rename = "type")]
    pub kind: FrameKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_image: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_authenticated: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Sender details attached to broadcast frames.
///
/// A failed profile lookup yields a sender with only the id filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    user_id: UserId,
    username: Option<String>,
    avatar_url: Option<String>,
}

impl Sender {
    /// Sender with no resolved profile.
    #[must_use]
    pub fn anonymous(user_id: UserId) -> Self {
        Self {
            user_id,
            username: None,
            avatar_url: None,
        }
    }

    /// Sender enriched from a directory profile.
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            user_id: profile.id().clone(),
            username: Some(profile.username().to_string()),
            avatar_url: profile.avatar_url().map(str::to_owned),
        }
    }
}

impl OutboundFrame {
    fn bare(kind: FrameKind) -> Self {
        Self {
            kind,
            message: None,
            username: None,
            user_id: None,
            group_slug: None,
            user_image: None,
            is_authenticated: false,
        }
    }

    /// `{"type":"connected"}`.
    #[must_use]
    pub fn connected() -> Self {
        Self::bare(FrameKind::Connected)
    }

    /// Error frame carrying a human-readable reason.
    ///
    /// # Examples
    /// ```
    /// use chat_gateway::domain::chat::OutboundFrame;
    ///
    /// let json = OutboundFrame::error("failed to save message").to_json().unwrap();
    /// assert_eq!(json, r#"{"type":"error","message":"failed to save message"}"#);
    /// ```
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::bare(FrameKind::Error)
        }
    }

    /// Broadcast frame describing activity by `sender` in `group`.
    #[must_use]
    pub fn activity(
        kind: FrameKind,
        sender: Sender,
        group: &GroupSlug,
        message: Option<String>,
    ) -> Self {
        let Sender {
            user_id,
            username,
            avatar_url,
        } = sender;
        Self {
            kind,
            message,
            username,
            user_id: Some(user_id.into()),
            group_slug: Some(group.to_string()),
            user_image: avatar_url,
            is_authenticated: true,
        }
    }

    /// Serialise to the wire representation.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

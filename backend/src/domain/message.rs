//! Chat message data model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{GroupId, UserId};

/// Longest chat message accepted, in characters.
pub const MESSAGE_CONTENT_MAX: usize = 4000;

/// Validation errors for chat message content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageValidationError {
    /// Content is blank once trimmed.
    #[error("message must not be empty")]
    Empty,
    /// Content exceeds [`MESSAGE_CONTENT_MAX`] characters.
    #[error("message must be at most {max} characters")]
    TooLong { max: usize },
}

/// Identifier assigned by the message store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Generate a new random id.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Validated chat text. Surrounding whitespace is preserved; only the
/// emptiness check trims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MessageContent(String);

impl MessageContent {
    /// Validate and construct message content.
    ///
    /// # Examples
    /// ```
    /// use chat_gateway::domain::MessageContent;
    ///
    /// assert!(MessageContent::new("hi").is_ok());
    /// assert!(MessageContent::new("   ").is_err());
    /// ```
    pub fn new(content: impl Into<String>) -> Result<Self, MessageValidationError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(MessageValidationError::Empty);
        }
        if content.chars().count() > MESSAGE_CONTENT_MAX {
            return Err(MessageValidationError::TooLong {
                max: MESSAGE_CONTENT_MAX,
            });
        }
        Ok(Self(content))
    }
}

impl AsRef<str> for MessageContent {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Append request handed to the message store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender_id: UserId,
    pub group_id: GroupId,
    pub content: MessageContent,
}

/// Persisted chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    id: MessageId,
    sender_id: UserId,
    group_id: GroupId,
    content: MessageContent,
    created_at: DateTime<Utc>,
}

impl Message {
    /// Materialise a stored message from an append request.
    #[must_use]
    pub fn from_new(id: MessageId, new: NewMessage, created_at: DateTime<Utc>) -> Self {
        let NewMessage {
            sender_id,
            group_id,
            content,
        } = new;
        Self {
            id,
            sender_id,
            group_id,
            content,
            created_at,
        }
    }

    /// Store-assigned identifier.
    #[must_use]
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Author.
    #[must_use]
    pub fn sender_id(&self) -> &UserId {
        &self.sender_id
    }

    /// Target group.
    #[must_use]
    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    /// Chat text.
    #[must_use]
    pub fn content(&self) -> &str {
        self.content.as_ref()
    }

    /// Store timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//! Chat group data model.
//!
//! Groups are owned by the external group store; the gateway only reads
//! them to authorise upgrades and route broadcasts.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::UserId;
use super::slug::is_valid_slug;

/// Maximum length of a group's human-readable name.
pub const GROUP_NAME_MAX: usize = 100;

/// Validation errors returned by group constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupValidationError {
    /// Group id is not a UUID.
    #[error("group id must be a valid UUID")]
    InvalidId,
    /// Slug is empty or contains characters outside `[a-z0-9-]`.
    #[error("group slug must be lowercase letters, digits, or hyphens")]
    InvalidSlug,
    /// Name is blank once trimmed.
    #[error("group name must not be empty")]
    EmptyName,
    /// Name exceeds [`GROUP_NAME_MAX`] characters.
    #[error("group name must be at most {max} characters")]
    NameTooLong { max: usize },
}

/// Stable group identifier; the key of the broadcast index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(Uuid);

impl GroupId {
    /// Parse a group id from its canonical string form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, GroupValidationError> {
        Uuid::parse_str(id.as_ref())
            .map(Self)
            .map_err(|_| GroupValidationError::InvalidId)
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random id.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// URL-safe, globally unique group handle used in upgrade paths.
///
/// # Examples
/// ```
/// use chat_gateway::domain::GroupSlug;
///
/// assert!(GroupSlug::new("rust-beginners").is_ok());
/// assert!(GroupSlug::new("Rust Beginners").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupSlug(String);

impl GroupSlug {
    /// Validate and construct a slug.
    pub fn new(value: impl Into<String>) -> Result<Self, GroupValidationError> {
        let value = value.into();
        if is_valid_slug(&value) {
            Ok(Self(value))
        } else {
            Err(GroupValidationError::InvalidSlug)
        }
    }
}

impl AsRef<str> for GroupSlug {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for GroupSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<GroupSlug> for String {
    fn from(value: GroupSlug) -> Self {
        value.0
    }
}

impl TryFrom<String> for GroupSlug {
    type Error = GroupValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Chat room with a creator and a member set.
///
/// ## Invariants
/// - `name` is trimmed-non-empty and at most [`GROUP_NAME_MAX`] characters.
/// - The creator is always admitted, whether or not listed as a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[schema(value_type = String, example = "9b2f61a4-7c1e-4a43-9d0b-58f5a8e5e0c1")]
    id: GroupId,
    #[schema(example = "Rust beginners")]
    name: String,
    #[schema(value_type = String, example = "rust-beginners")]
    slug: GroupSlug,
    #[schema(value_type = String)]
    creator_id: UserId,
    #[schema(value_type = Vec<String>)]
    member_ids: HashSet<UserId>,
}

impl Group {
    /// Build a group from validated parts.
    pub fn new(
        id: GroupId,
        name: impl Into<String>,
        slug: GroupSlug,
        creator_id: UserId,
        member_ids: impl IntoIterator<Item = UserId>,
    ) -> Result<Self, GroupValidationError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(GroupValidationError::EmptyName);
        }
        if trimmed.chars().count() > GROUP_NAME_MAX {
            return Err(GroupValidationError::NameTooLong {
                max: GROUP_NAME_MAX,
            });
        }
        Ok(Self {
            id,
            name: trimmed.to_owned(),
            slug,
            creator_id,
            member_ids: member_ids.into_iter().collect(),
        })
    }

    /// Stable identifier.
    #[must_use]
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// URL handle.
    #[must_use]
    pub fn slug(&self) -> &GroupSlug {
        &self.slug
    }

    /// User who created the group.
    #[must_use]
    pub fn creator_id(&self) -> &UserId {
        &self.creator_id
    }

    /// Listed members; the creator may or may not appear here.
    pub fn member_ids(&self) -> impl Iterator<Item = &UserId> {
        self.member_ids.iter()
    }

    /// Whether `user` may join the group's live channel.
    #[must_use]
    pub fn admits(&self, user: &UserId) -> bool {
        self.creator_id == *user || self.member_ids.contains(user)
    }
}

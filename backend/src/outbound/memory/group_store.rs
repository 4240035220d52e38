//! In-memory `GroupRepository` adapter.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard};

use async_trait::async_trait;

use crate::domain::ports::{GroupPersistenceError, GroupRepository};
use crate::domain::{Group, GroupId, GroupSlug, UserId};

/// Errors raised when loading groups into the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupStoreError {
    #[error("group slug `{slug}` is already taken")]
    DuplicateSlug { slug: String },
    #[error("group id {id} is already taken")]
    DuplicateId { id: GroupId },
    #[error("group store lock poisoned")]
    Poisoned,
}

#[derive(Default)]
struct Groups {
    by_id: HashMap<GroupId, Group>,
    by_slug: HashMap<GroupSlug, GroupId>,
}

/// Process-local group store keyed by id and slug.
#[derive(Default)]
pub struct InMemoryGroupStore {
    groups: RwLock<Groups>,
}

impl InMemoryGroupStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group; slugs and ids must be unique.
    pub fn insert(&self, group: Group) -> Result<(), GroupStoreError> {
        let mut groups = self.groups.write().map_err(|_| GroupStoreError::Poisoned)?;
        if groups.by_id.contains_key(&group.id()) {
            return Err(GroupStoreError::DuplicateId { id: group.id() });
        }
        if groups.by_slug.contains_key(group.slug()) {
            return Err(GroupStoreError::DuplicateSlug {
                slug: group.slug().to_string(),
            });
        }
        groups.by_slug.insert(group.slug().clone(), group.id());
        groups.by_id.insert(group.id(), group);
        Ok(())
    }

    /// Remove a group by id, returning it when present.
    #[cfg(test)]
    pub(crate) fn remove(&self, id: GroupId) -> Result<Option<Group>, GroupStoreError> {
        let mut groups = self.groups.write().map_err(|_| GroupStoreError::Poisoned)?;
        let removed = groups.by_id.remove(&id);
        if let Some(group) = &removed {
            groups.by_slug.remove(group.slug());
        }
        Ok(removed)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Groups>, GroupPersistenceError> {
        self.groups
            .read()
            .map_err(|_| GroupPersistenceError::query("group store lock poisoned"))
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupStore {
    async fn find_by_slug(&self, slug: &GroupSlug) -> Result<Option<Group>, GroupPersistenceError> {
        let groups = self.read()?;
        Ok(groups
            .by_slug
            .get(slug)
            .and_then(|id| groups.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: &GroupId) -> Result<Option<Group>, GroupPersistenceError> {
        Ok(self.read()?.by_id.get(id).cloned())
    }

    async fn list_for_member(&self, user_id: &UserId) -> Result<Vec<Group>, GroupPersistenceError> {
        let groups = self.read()?;
        let mut listed: Vec<Group> = groups
            .by_id
            .values()
            .filter(|group| group.admits(user_id))
            .cloned()
            .collect();
        listed.sort_by(|a, b| a.slug().as_ref().cmp(b.slug().as_ref()));
        Ok(listed)
    }
}

//! Port for the external group store.
//!
//! The gateway never caches groups: every upgrade and every chat message
//! re-reads through this port so membership changes made elsewhere are
//! observed on the next lookup.

use async_trait::async_trait;

use crate::domain::{Group, GroupId, GroupSlug, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by group store adapters.
    pub enum GroupPersistenceError {
        /// Store connection could not be established.
        Connection { message: String } => "group store connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => "group store query failed: {message}",
    }
}

/// Read access to persisted groups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Look a group up by its slug.
    async fn find_by_slug(&self, slug: &GroupSlug) -> Result<Option<Group>, GroupPersistenceError>;

    /// Look a group up by its identifier.
    async fn find_by_id(&self, id: &GroupId) -> Result<Option<Group>, GroupPersistenceError>;

    /// Groups the user created or is a member of.
    async fn list_for_member(&self, user_id: &UserId) -> Result<Vec<Group>, GroupPersistenceError>;
}

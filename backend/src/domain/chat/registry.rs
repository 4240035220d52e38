//! Connection registry owned by the coordinator loop.
//!
//! Holds three views over the same live connections: the connection map,
//! the authenticated-user binding of each entry, and the per-group
//! broadcast index. The registry is a plain data structure; only the
//! coordinator task touches it, so no method locks or awaits.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::ports::ConnectionSink;
use crate::domain::{GroupId, UserId};

/// Identity of one live WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Mint a fresh identity for a newly upgraded connection.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Registry operations that were refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("connection {0} is not registered")]
    UnknownConnection(ConnectionId),
    #[error("connection {0} has no authenticated user")]
    Unauthenticated(ConnectionId),
    #[error("connection {connection} is already bound to a different user")]
    UserMismatch { connection: ConnectionId },
}

/// Outcome of binding a user to a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Bound,
    AlreadyBound,
}

/// Point-in-time counts used by the stats endpoint and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySnapshot {
    /// Registered connections.
    pub connections: usize,
    /// Connections with a bound user.
    pub authenticated: usize,
    /// Subscriber count per group with at least one subscriber.
    #[schema(value_type = Object)]
    pub groups: BTreeMap<GroupId, usize>,
}

struct Entry {
    sink: Arc<dyn ConnectionSink>,
    user: Option<UserId>,
    groups: HashSet<GroupId>,
}

/// Live connection state.
///
/// ## Invariants
/// - A connection listed under a group is registered and authenticated.
/// - An entry's `groups` set mirrors its memberships in the group index.
/// - Groups with no subscribers are dropped from the index.
#[derive(Default)]
pub struct Registry {
    connections: HashMap<ConnectionId, Entry>,
    groups: HashMap<GroupId, HashSet<ConnectionId>>,
}

impl Registry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new connection. Returns `false` when it was already present,
    /// in which case the existing entry is kept.
    pub fn register(&mut self, id: ConnectionId, sink: Arc<dyn ConnectionSink>) -> bool {
        if self.connections.contains_key(&id) {
            return false;
        }
        self.connections.insert(
            id,
            Entry {
                sink,
                user: None,
                groups: HashSet::new(),
            },
        );
        true
    }

    /// Bind `user` to a registered connection.
    pub fn authenticate(&mut self, id: ConnectionId, user: UserId) -> Result<Binding, RegistryError> {
        let entry = self
            .connections
            .get_mut(&id)
            .ok_or(RegistryError::UnknownConnection(id))?;
        match &entry.user {
            Some(existing) if *existing == user => Ok(Binding::AlreadyBound),
            Some(_) => Err(RegistryError::UserMismatch { connection: id }),
            None => {
                entry.user = Some(user);
                Ok(Binding::Bound)
            }
        }
    }

    /// Subscribe a connection to a group. Returns `false` for a duplicate
    /// join, which leaves state unchanged.
    pub fn join(&mut self, id: ConnectionId, group: GroupId) -> Result<bool, RegistryError> {
        let entry = self
            .connections
            .get_mut(&id)
            .ok_or(RegistryError::UnknownConnection(id))?;
        if entry.user.is_none() {
            return Err(RegistryError::Unauthenticated(id));
        }
        if !entry.groups.insert(group) {
            return Ok(false);
        }
        self.groups.entry(group).or_default().insert(id);
        Ok(true)
    }

    /// Remove a connection from one group. Returns whether it was subscribed.
    pub fn leave(&mut self, id: ConnectionId, group: GroupId) -> bool {
        let Some(entry) = self.connections.get_mut(&id) else {
            return false;
        };
        if !entry.groups.remove(&group) {
            return false;
        }
        self.drop_subscriber(id, group);
        true
    }

    /// Forget a connection entirely, returning its sink so the caller can
    /// close it. Unknown ids return `None`.
    pub fn unregister(&mut self, id: ConnectionId) -> Option<Arc<dyn ConnectionSink>> {
        let entry = self.connections.remove(&id)?;
        for group in &entry.groups {
            self.drop_subscriber(id, *group);
        }
        Some(entry.sink)
    }

    fn drop_subscriber(&mut self, id: ConnectionId, group: GroupId) {
        if let Some(members) = self.groups.get_mut(&group) {
            members.remove(&id);
            if members.is_empty() {
                self.groups.remove(&group);
            }
        }
    }

    /// Sinks subscribed to `group`.
    #[must_use]
    pub fn subscribers(&self, group: GroupId) -> Vec<(ConnectionId, Arc<dyn ConnectionSink>)> {
        self.groups
            .get(&group)
            .into_iter()
            .flatten()
            .filter_map(|id| {
                self.connections
                    .get(id)
                    .map(|entry| (*id, Arc::clone(&entry.sink)))
            })
            .collect()
    }

    /// User bound to a connection.
    #[must_use]
    pub fn user_of(&self, id: ConnectionId) -> Option<&UserId> {
        self.connections.get(&id).and_then(|entry| entry.user.as_ref())
    }

    /// Current counts.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            connections: self.connections.len(),
            authenticated: self
                .connections
                .values()
                .filter(|entry| entry.user.is_some())
                .count(),
            groups: self
                .groups
                .iter()
                .map(|(group, members)| (*group, members.len()))
                .collect(),
        }
    }
}

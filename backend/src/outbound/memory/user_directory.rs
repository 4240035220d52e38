//! In-memory user directory serving profiles and development logins.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard};

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::ports::{LoginService, UserProfileError, UserProfileQuery};
use crate::domain::{Error, LoginCredentials, UserId, UserProfile};

/// Errors raised when loading users into the directory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserDirectoryError {
    #[error("username `{username}` is already taken")]
    DuplicateUsername { username: String },
    #[error("user id {id} is already taken")]
    DuplicateId { id: String },
    #[error("user directory lock poisoned")]
    Poisoned,
}

struct DirectoryEntry {
    profile: UserProfile,
    password: Option<Zeroizing<String>>,
}

#[derive(Default)]
struct Directory {
    by_id: HashMap<UserId, DirectoryEntry>,
    by_username: HashMap<String, UserId>,
}

/// Process-local user directory.
///
/// Users without a password can be resolved for profiles but cannot log in.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<Directory>,
}

impl InMemoryUserDirectory {
    /// Empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user, optionally with a development login password.
    pub fn insert(
        &self,
        profile: UserProfile,
        password: Option<String>,
    ) -> Result<(), UserDirectoryError> {
        let mut users = self.users.write().map_err(|_| UserDirectoryError::Poisoned)?;
        let username = profile.username().to_string();
        if users.by_id.contains_key(profile.id()) {
            return Err(UserDirectoryError::DuplicateId {
                id: profile.id().to_string(),
            });
        }
        if users.by_username.contains_key(&username) {
            return Err(UserDirectoryError::DuplicateUsername { username });
        }
        users.by_username.insert(username, profile.id().clone());
        users.by_id.insert(
            profile.id().clone(),
            DirectoryEntry {
                profile,
                password: password.map(Zeroizing::new),
            },
        );
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Directory>, Error> {
        self.users
            .read()
            .map_err(|_| Error::internal("user directory lock poisoned"))
    }
}

#[async_trait]
impl UserProfileQuery for InMemoryUserDirectory {
    async fn fetch_profile(&self, user_id: &UserId) -> Result<UserProfile, UserProfileError> {
        let users = self
            .users
            .read()
            .map_err(|_| UserProfileError::lookup("user directory lock poisoned"))?;
        users
            .by_id
            .get(user_id)
            .map(|entry| entry.profile.clone())
            .ok_or_else(|| UserProfileError::not_found(user_id.to_string()))
    }
}

#[async_trait]
impl LoginService for InMemoryUserDirectory {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let users = self.read()?;
        let entry = users
            .by_username
            .get(credentials.username())
            .and_then(|id| users.by_id.get(id));
        match entry {
            Some(DirectoryEntry {
                profile,
                password: Some(password),
            }) if password.as_str() == credentials.password() => Ok(profile.id().clone()),
            _ => Err(Error::unauthorized("invalid credentials")),
        }
    }
}

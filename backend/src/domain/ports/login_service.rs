//! Driving port for the development login endpoint.
//!
//! Production deployments sit behind an upstream authentication layer that
//! writes the user id into the session. This port lets the gateway produce
//! that session locally.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, UserId};

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the authenticated user id.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error>;
}

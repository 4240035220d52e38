//! Port for the user-profile collaborator used to enrich outbound frames.

use async_trait::async_trait;

use crate::domain::{UserId, UserProfile};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user directory adapters.
    pub enum UserProfileError {
        /// No profile exists for the user.
        NotFound { user_id: String } => "no profile for user {user_id}",
        /// Directory lookup failed.
        Lookup { message: String } => "user directory lookup failed: {message}",
    }
}

/// Read access to user profiles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserProfileQuery: Send + Sync {
    /// Return the profile for `user_id`.
    async fn fetch_profile(&self, user_id: &UserId) -> Result<UserProfile, UserProfileError>;
}

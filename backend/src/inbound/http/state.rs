//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only see domain ports, so
//! they can be exercised against mocks without any store behind them.

use std::sync::Arc;

use crate::domain::ports::{GroupRepository, LoginService, UserProfileQuery};

/// Ports used by the REST handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub profiles: Arc<dyn UserProfileQuery>,
    pub groups: Arc<dyn GroupRepository>,
}

impl HttpState {
    pub fn new(
        login: Arc<dyn LoginService>,
        profiles: Arc<dyn UserProfileQuery>,
        groups: Arc<dyn GroupRepository>,
    ) -> Self {
        Self {
            login,
            profiles,
            groups,
        }
    }
}

//! Process-local store adapters.
//!
//! Back the group, message and user ports with in-memory maps seeded from a
//! JSON file, so the gateway runs without an external database.

mod group_store;
mod message_store;
pub mod seed;
mod user_directory;

pub use group_store::{GroupStoreError, InMemoryGroupStore};
pub use message_store::InMemoryMessageStore;
pub use seed::{Seed, SeedError};
pub use user_directory::{InMemoryUserDirectory, UserDirectoryError};

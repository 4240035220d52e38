//! Outbound adapters implementing domain ports.
//!
//! [`memory`] keeps groups, messages and users in process, seeded from JSON.

pub mod memory;

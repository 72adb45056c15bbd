//! Access to the hosted database, object storage, and auth service.
//!
//! [`Gateway`] resolves credentials and lazily builds exactly one
//! [`BackendClient`] for its lifetime. Everything above it talks to the
//! trait, so tests swap in [`testing::MemoryBackend`].

pub mod client;
pub mod error;
pub mod gateway;
pub mod rest;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{AuthUser, BackendClient, Credentials, Direction, ListQuery, Row};
pub use error::BackendError;
pub use gateway::Gateway;
pub use rest::RestClient;

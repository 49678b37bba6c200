//! Session bookkeeping for Parlor.
//!
//! This crate owns everything that outlives a single connection:
//!
//! 1. **Connection registry**: which identity is on which live
//!    connection, and when each identity last lost its connection
//!    ([`ConnectionRegistry`])
//! 2. **Credentials**: the secret issued to each identity and the check
//!    every inbound message must pass ([`SecretStore`])
//! 3. **Reaping**: forgetting identities whose owner never came back
//!    within the grace window ([`Reaper`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Broker (above)   ← decides what to do with each message
//!     ↕
//! Session (this crate)   ← identity, secrets, logout records
//!     ↕
//! Protocol / Transport (below)   ← identifiers, connection handles
//! ```
//!
//! Nothing here locks or does I/O. The broker owns one of each and is the
//! only writer.

mod auth;
mod config;
mod error;
mod reaper;
mod registry;

pub use auth::SecretStore;
pub use config::SessionConfig;
pub use error::SessionError;
pub use reaper::Reaper;
pub use registry::{ConnectionRegistry, Displaced};

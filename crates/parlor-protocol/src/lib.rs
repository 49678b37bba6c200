//! Wire protocol for Parlor.
//!
//! This crate defines the "language" clients and the broker speak:
//!
//! - **Identifiers** ([`ClientIdentity`], [`ClientSecret`], [`GameCode`],
//!   [`RuntimeIdentifier`]): normalized on the way in, random on mint.
//! - **Messages** ([`Inbound`], [`Outbound`], [`Action`]): one flat JSON
//!   object per frame, routed by its `action` field.
//! - **Codec** ([`decode`], [`encode`]): text frames to messages and back.
//! - **Errors** ([`ProtocolError`]): what can go wrong doing so.
//!
//! ```text
//! Transport (text frames) → Protocol (Inbound/Outbound) → Session / Game
//! ```

mod action;
mod codec;
mod error;
mod message;
mod types;

pub use action::{
    Action, SET_SERVER_RUNTIME_IDENTIFIER, SET_SLUG, SET_UUID,
};
pub use codec::{decode, encode};
pub use error::ProtocolError;
pub use message::{Inbound, Object, Outbound, Vote};
pub use types::{
    normalize, ClientIdentity, ClientSecret, GameCode, RuntimeIdentifier,
};

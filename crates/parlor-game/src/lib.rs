//! Game hosting for Parlor.
//!
//! Games are plain state machines owned by the broker. This crate holds
//! them and decides which one an action goes to.
//!
//! # Key types
//!
//! - [`GameInstance`]: the trait game implementations provide
//! - [`GameRegistry`]: code → game and identity → game indexes
//! - [`route`]: one authenticated message in, at most one game call out
//! - [`BrokerFacade`]: what a game can ask of the broker

mod error;
mod facade;
mod instance;
mod registry;
mod router;

pub use error::GameError;
pub use facade::{BrokerFacade, DeletionQueue};
pub use instance::GameInstance;
pub use registry::GameRegistry;
pub use router::{route, Routed};

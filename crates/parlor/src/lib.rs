//! # Parlor
//!
//! Lobby and session broker for browser party games.
//!
//! Browsers connect over WebSocket and exchange flat JSON messages. Parlor
//! issues each browser an identity and a secret on first contact, checks
//! that pair on every later message, and routes each action to the game
//! the message names. Game rules are not Parlor's business: a game
//! implements [`GameInstance`](parlor_game::GameInstance) and Parlor hands
//! it authenticated actions.
//!
//! A client that loses its connection keeps its identity for a grace
//! period ([`SessionConfig::forget_after`](parlor_session::SessionConfig)),
//! so a reload or a flaky network does not throw it out of its game.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parlor::prelude::*;
//!
//! // Implement GameInstance for your game, then:
//! // let server = ParlorServer::builder()
//! //     .bind("0.0.0.0:8080")
//! //     .build::<MyGame>()
//! //     .await?;
//! // server.run().await
//! ```

mod broker;
mod error;
mod handler;
pub mod logging;
mod server;
mod stats;

pub use broker::{Admission, Broker, Continuation};
pub use error::ParlorError;
pub use server::{ParlorServer, ParlorServerBuilder};
pub use stats::Statistics;

pub mod prelude {
    //! Everything a game implementation and its binary usually need.

    pub use crate::{ParlorError, ParlorServer, ParlorServerBuilder, Statistics};
    pub use parlor_game::{BrokerFacade, GameInstance};
    pub use parlor_protocol::{ClientIdentity, GameCode, Object, Outbound, Vote};
    pub use parlor_session::SessionConfig;
    pub use parlor_transport::{ConnectionHandle, ConnectionId};
}

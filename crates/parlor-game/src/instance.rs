//! The `GameInstance` trait, the extension point for game rules.
//!
//! Parlor does not know any game rules. It knows which identity is in
//! which game and which action a message carries; the game decides what
//! that action means. Every method here is called from the broker's
//! single thread of control, one at a time, so implementations are plain
//! `&mut self` state machines with no locking.
//!
//! A game talks back through the [`BrokerFacade`] it receives at creation:
//! it sends messages to the connections it was handed in
//! [`join`](GameInstance::join) and asks to be deleted when it is over,
//! typically once its last member has been forgotten.

use parlor_protocol::{ClientIdentity, GameCode, Object, Vote};
use parlor_transport::ConnectionHandle;

use crate::BrokerFacade;

/// One running game.
///
/// Actions arrive already authenticated: `identity` is always the
/// verified sender. Whether that sender may perform the action (host-only
/// settings, wrong phase, not a member) is for the game to decide; the
/// broker never checks.
pub trait GameInstance: Send + 'static {
    /// Creates the game registered under `code`.
    fn create(code: GameCode, broker: BrokerFacade) -> Self
    where
        Self: Sized;

    /// A participant joins, or rejoins on a new connection.
    ///
    /// `connection` is where this participant's messages should go from now
    /// on; any handle previously held for `identity` is stale.
    fn join(
        &mut self,
        connection: ConnectionHandle,
        identity: ClientIdentity,
        pseudonym: String,
    );

    /// A participant's connection closed.
    ///
    /// The participant is still a member: it may come back through
    /// [`join`](GameInstance::join) on a new connection until it is
    /// forgotten. A game should not delete itself here.
    fn leave(&mut self, identity: &ClientIdentity);

    /// A participant is no longer a member, because its session expired or
    /// it joined another game.
    ///
    /// Once every member has been forgotten the game is usually over and
    /// can ask to be deleted.
    fn forget(&mut self, identity: &ClientIdentity);

    /// `update-config` with a non-empty configuration object.
    fn update_config(&mut self, identity: &ClientIdentity, configuration: &Object);

    /// `start-game`.
    fn start(&mut self, identity: &ClientIdentity);

    /// `send-answers` with an answers object.
    fn submit_answers(&mut self, identity: &ClientIdentity, answers: &Object);

    /// `send-vote` with a vote naming a category and a target.
    fn vote(&mut self, identity: &ClientIdentity, vote: Vote);

    /// `vote-ready`.
    fn vote_ready(&mut self, identity: &ClientIdentity);

    /// `restart`.
    fn restart(&mut self, identity: &ClientIdentity);
}

//! Error types for the game layer.

use parlor_protocol::{Action, GameCode};

/// Why an action was not dispatched to a game.
///
/// These are silent toward the client; the broker only logs them.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The action needs a game and the message's code resolved to none.
    #[error("{action}: no game for code {code:?}")]
    MissingGame {
        action: Action,
        code: Option<GameCode>,
    },

    /// The action's required payload is absent or malformed.
    #[error("{action}: missing or invalid {field}")]
    MissingPayload {
        action: Action,
        field: &'static str,
    },

    /// The game was not found in the registry.
    #[error("game {0} not found")]
    NotFound(GameCode),
}

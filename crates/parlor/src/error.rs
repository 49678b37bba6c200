//! Unified error type for Parlor.

use parlor_game::GameError;
use parlor_protocol::ProtocolError;
use parlor_session::SessionError;
use parlor_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Most of these never leave the broker: a message that fails to decode,
/// authenticate or route is dropped, and the error is only logged. The
/// `#[from]` attribute on each variant lets `?` convert sub-crate errors
/// automatically.
#[derive(Debug, thiserror::Error)]
pub enum ParlorError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (malformed frame, missing action).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (unknown identity, secret mismatch).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A game-level error (no such game, missing payload).
    #[error(transparent)]
    Game(#[from] GameError),
}

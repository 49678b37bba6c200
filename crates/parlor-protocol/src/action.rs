//! Action names: the `action` field of every message.

use std::fmt;

use crate::types::normalize;

/// Outbound: tells a freshly opened connection (or a client that must
/// re-provision) which runtime it is talking to.
pub const SET_SERVER_RUNTIME_IDENTIFIER: &str = "set-server-runtime-identifier";

/// Outbound: issues a new identity and its secret.
pub const SET_UUID: &str = "set-uuid";

/// Outbound: tells a client the code of the game it was just put in.
pub const SET_SLUG: &str = "set-slug";

/// An inbound action, parsed from the normalized `action` field.
///
/// Parsing never fails on a non-blank string: anything unrecognised
/// becomes [`Action::Unknown`] and is ignored by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `join-game`: join the named game, or create one if none resolves.
    JoinGame,
    /// `update-config`: change the game's configuration.
    UpdateConfig,
    /// `start-game`: leave the lobby and start playing.
    StartGame,
    /// `send-answers`: submit this round's answers.
    SendAnswers,
    /// `send-vote`: vote on another player's answer.
    SendVote,
    /// `vote-ready`: done voting for this round.
    VoteReady,
    /// `restart`: back to the lobby with the same roster.
    Restart,
    /// Anything else.
    Unknown(String),
}

impl Action {
    /// Parses a raw action string. Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let action = normalize(raw);
        let parsed = match action.as_str() {
            "" => return None,
            "join-game" => Self::JoinGame,
            "update-config" => Self::UpdateConfig,
            "start-game" => Self::StartGame,
            "send-answers" => Self::SendAnswers,
            "send-vote" => Self::SendVote,
            "vote-ready" => Self::VoteReady,
            "restart" => Self::Restart,
            _ => Self::Unknown(action),
        };
        Some(parsed)
    }

    /// The wire name of this action.
    pub fn as_str(&self) -> &str {
        match self {
            Self::JoinGame => "join-game",
            Self::UpdateConfig => "update-config",
            Self::StartGame => "start-game",
            Self::SendAnswers => "send-answers",
            Self::SendVote => "send-vote",
            Self::VoteReady => "vote-ready",
            Self::Restart => "restart",
            Self::Unknown(name) => name,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

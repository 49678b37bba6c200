//! Action router: turns one authenticated message into exactly one game
//! call.
//!
//! Every action maps to at most one handler. There is no fallthrough from
//! one action's handler into the next.

use parlor_protocol::{Action, ClientIdentity, GameCode, Inbound, Outbound};
use parlor_transport::ConnectionHandle;

use crate::{GameError, GameInstance, GameRegistry};

/// What routing did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// The sender joined `code`; `created` if the game was made for them.
    Joined { code: GameCode, created: bool },
    /// The action was handed to the sender's targeted game.
    Handled(Action),
    /// Unrecognised action; nothing happened.
    Ignored(Action),
}

/// Dispatches `action` from an authenticated `identity` on `connection`.
///
/// The target game is the one named by the message's `slug`. For
/// `join-game` with no resolvable game a new one is created, and its code
/// is sent to the connection before the join happens.
///
/// # Errors
/// - [`GameError::MissingGame`]: the action needs a game and none
///   resolved.
/// - [`GameError::MissingPayload`]: the action's payload is absent or
///   malformed.
pub fn route<G: GameInstance>(
    games: &mut GameRegistry<G>,
    action: Action,
    message: &Inbound,
    identity: &ClientIdentity,
    connection: &ConnectionHandle,
) -> Result<Routed, GameError> {
    let requested = message.game_code();

    match &action {
        Action::JoinGame => {
            let (code, created) = match requested.filter(|c| games.contains(c)) {
                Some(code) => (code, false),
                None => {
                    let code = games.create();
                    games.facade().send(connection, &Outbound::set_slug(&code));
                    (code, true)
                }
            };
            games.join(
                &code,
                connection.clone(),
                identity.clone(),
                message.pseudonym().to_owned(),
            )?;
            return Ok(Routed::Joined { code, created });
        }
        Action::UpdateConfig => {
            let game = resolve(games, requested, &action)?;
            let configuration = message
                .configuration()
                .ok_or_else(|| missing(&action, "configuration"))?;
            game.update_config(identity, configuration);
        }
        Action::StartGame => {
            resolve(games, requested, &action)?.start(identity);
        }
        Action::SendAnswers => {
            let game = resolve(games, requested, &action)?;
            let answers = message
                .answers()
                .ok_or_else(|| missing(&action, "answers"))?;
            game.submit_answers(identity, answers);
        }
        Action::SendVote => {
            let game = resolve(games, requested, &action)?;
            let vote = message.vote().ok_or_else(|| missing(&action, "vote"))?;
            game.vote(identity, vote);
        }
        Action::VoteReady => {
            resolve(games, requested, &action)?.vote_ready(identity);
        }
        Action::Restart => {
            resolve(games, requested, &action)?.restart(identity);
        }
        Action::Unknown(_) => return Ok(Routed::Ignored(action.clone())),
    }

    Ok(Routed::Handled(action))
}

fn resolve<'a, G: GameInstance>(
    games: &'a mut GameRegistry<G>,
    requested: Option<GameCode>,
    action: &Action,
) -> Result<&'a mut G, GameError> {
    match requested {
        Some(code) if games.contains(&code) => games
            .get_mut(&code)
            .ok_or(GameError::NotFound(code)),
        code => Err(GameError::MissingGame {
            action: action.clone(),
            code,
        }),
    }
}

fn missing(action: &Action, field: &'static str) -> GameError {
    GameError::MissingPayload {
        action: action.clone(),
        field,
    }
}

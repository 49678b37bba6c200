//! "Categories": each round draws a letter, and every player names
//! something starting with it in each category. Players then vote on each
//! other's answers; every answer that survives the vote scores a point.

use std::collections::{BTreeMap, HashMap, HashSet};

use parlor::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPRSTW";
const DEFAULT_CATEGORIES: [&str; 4] = ["City", "Animal", "Food", "Profession"];
const DEFAULT_ROUNDS: u32 = 3;
const MAX_CATEGORIES: usize = 12;
const MAX_ROUNDS: u32 = 10;

/// Action of the state snapshot broadcast after every change.
pub const GAME_STATE: &str = "game-state";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Lobby,
    Answering,
    Voting,
    Finished,
}

#[derive(Debug)]
struct Player {
    pseudonym: String,
    connection: Option<ConnectionHandle>,
    score: u32,
}

#[derive(Deserialize)]
struct ConfigUpdate {
    #[serde(default)]
    categories: Option<Vec<String>>,
    #[serde(default)]
    rounds: Option<u32>,
}

#[derive(Serialize)]
struct Snapshot<'a> {
    slug: &'a str,
    phase: Phase,
    round: u32,
    rounds: u32,
    letter: Option<char>,
    host: Option<&'a str>,
    categories: &'a [String],
    players: Vec<PlayerView<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    answers: Option<BTreeMap<&'a str, &'a BTreeMap<String, String>>>,
}

#[derive(Serialize)]
struct PlayerView<'a> {
    uuid: &'a str,
    pseudonym: &'a str,
    score: u32,
    connected: bool,
    submitted: bool,
    ready: bool,
}

/// Votes cast on one player's answer in one category, by voter.
type Ballot = HashMap<ClientIdentity, bool>;

pub struct PartyGame {
    code: GameCode,
    broker: BrokerFacade,
    /// In join order.
    players: Vec<(ClientIdentity, Player)>,
    host: Option<ClientIdentity>,
    categories: Vec<String>,
    rounds: u32,
    phase: Phase,
    round: u32,
    letter: Option<char>,
    answers: HashMap<ClientIdentity, BTreeMap<String, String>>,
    votes: HashMap<(ClientIdentity, String), Ballot>,
    ready: HashSet<ClientIdentity>,
}

impl GameInstance for PartyGame {
    fn create(code: GameCode, broker: BrokerFacade) -> Self {
        Self {
            code,
            broker,
            players: Vec::new(),
            host: None,
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            rounds: DEFAULT_ROUNDS,
            phase: Phase::Lobby,
            round: 0,
            letter: None,
            answers: HashMap::new(),
            votes: HashMap::new(),
            ready: HashSet::new(),
        }
    }

    fn join(&mut self, connection: ConnectionHandle, identity: ClientIdentity, pseudonym: String) {
        let pseudonym = pseudonym.trim().to_owned();
        match self.player_mut(&identity) {
            Some(player) => {
                player.connection = Some(connection);
                if !pseudonym.is_empty() {
                    player.pseudonym = pseudonym;
                }
            }
            None => {
                let pseudonym = if pseudonym.is_empty() {
                    format!("Player {}", self.players.len() + 1)
                } else {
                    pseudonym
                };
                self.players.push((
                    identity.clone(),
                    Player {
                        pseudonym,
                        connection: Some(connection),
                        score: 0,
                    },
                ));
            }
        }

        let host_present = self.host.as_ref().is_some_and(|h| self.is_connected(h));
        if !host_present {
            self.host = Some(identity);
        }
        self.broadcast();
    }

    fn leave(&mut self, identity: &ClientIdentity) {
        let Some(player) = self.player_mut(identity) else {
            return;
        };
        player.connection = None;

        // With nobody else around the host keeps the seat for a reload.
        if self.is_host(identity) {
            let next = self.connected().next().cloned();
            if next.is_some() {
                self.host = next;
            }
        }
        self.advance();
        self.broadcast();
    }

    fn forget(&mut self, identity: &ClientIdentity) {
        let before = self.players.len();
        self.players.retain(|(id, _)| id != identity);
        if self.players.len() == before {
            return;
        }
        self.answers.remove(identity);
        self.ready.remove(identity);
        self.votes.retain(|(target, _), _| target != identity);
        for ballot in self.votes.values_mut() {
            ballot.remove(identity);
        }

        if self.players.is_empty() {
            tracing::info!(code = %self.code, "last player gone, closing game");
            self.broker.delete_game(&self.code);
            return;
        }
        if self.is_host(identity) {
            let next = self
                .connected()
                .next()
                .or_else(|| self.players.first().map(|(id, _)| id))
                .cloned();
            self.host = next;
        }
        self.advance();
        self.broadcast();
    }

    fn update_config(&mut self, identity: &ClientIdentity, configuration: &Object) {
        if !self.is_host(identity) || self.phase != Phase::Lobby {
            return;
        }
        let update: ConfigUpdate =
            match serde_json::from_value(Value::Object(configuration.clone())) {
                Ok(update) => update,
                Err(e) => {
                    tracing::debug!(code = %self.code, error = %e, "ignoring malformed configuration");
                    return;
                }
            };

        if let Some(categories) = update.categories {
            let mut cleaned: Vec<String> = Vec::new();
            for category in categories {
                let category = category.trim();
                if !category.is_empty() && !cleaned.iter().any(|c| c == category) {
                    cleaned.push(category.to_owned());
                }
            }
            cleaned.truncate(MAX_CATEGORIES);
            if !cleaned.is_empty() {
                self.categories = cleaned;
            }
        }
        if let Some(rounds) = update.rounds {
            self.rounds = rounds.clamp(1, MAX_ROUNDS);
        }
        self.broadcast();
    }

    fn start(&mut self, identity: &ClientIdentity) {
        if !self.is_host(identity) || self.phase != Phase::Lobby {
            return;
        }
        self.round = 0;
        self.next_round();
        self.broadcast();
    }

    fn submit_answers(&mut self, identity: &ClientIdentity, answers: &Object) {
        if self.phase != Phase::Answering || self.player_mut(identity).is_none() {
            return;
        }
        let sheet = self
            .categories
            .iter()
            .map(|category| {
                let answer = answers
                    .get(category)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .unwrap_or_default();
                (category.clone(), answer.to_owned())
            })
            .collect();
        self.answers.insert(identity.clone(), sheet);
        self.advance();
        self.broadcast();
    }

    fn vote(&mut self, identity: &ClientIdentity, vote: Vote) {
        if self.phase != Phase::Voting
            || self.player_mut(identity).is_none()
            || vote.target == *identity
            || !self.answers.contains_key(&vote.target)
            || !self.categories.contains(&vote.category)
        {
            return;
        }
        self.votes
            .entry((vote.target, vote.category))
            .or_default()
            .insert(identity.clone(), vote.accept);
        self.broadcast();
    }

    fn vote_ready(&mut self, identity: &ClientIdentity) {
        if self.phase != Phase::Voting || self.player_mut(identity).is_none() {
            return;
        }
        self.ready.insert(identity.clone());
        self.advance();
        self.broadcast();
    }

    fn restart(&mut self, identity: &ClientIdentity) {
        if !self.is_host(identity) {
            return;
        }
        self.phase = Phase::Lobby;
        self.round = 0;
        self.letter = None;
        self.answers.clear();
        self.votes.clear();
        self.ready.clear();
        for (_, player) in &mut self.players {
            player.score = 0;
        }
        self.broadcast();
    }
}

impl PartyGame {
    fn player_mut(&mut self, identity: &ClientIdentity) -> Option<&mut Player> {
        self.players
            .iter_mut()
            .find(|(id, _)| id == identity)
            .map(|(_, player)| player)
    }

    fn is_connected(&self, identity: &ClientIdentity) -> bool {
        self.connected().any(|id| id == identity)
    }

    fn is_host(&self, identity: &ClientIdentity) -> bool {
        self.host.as_ref() == Some(identity)
    }

    fn connected(&self) -> impl Iterator<Item = &ClientIdentity> {
        self.players
            .iter()
            .filter(|(_, player)| player.connection.is_some())
            .map(|(id, _)| id)
    }

    fn next_round(&mut self) {
        self.round += 1;
        let index = rand::rng().random_range(0..LETTERS.len());
        self.letter = Some(char::from(LETTERS[index]));
        self.answers.clear();
        self.votes.clear();
        self.ready.clear();
        self.phase = Phase::Answering;
    }

    /// Moves to the next phase once every connected player is done with
    /// the current one. An empty table waits.
    fn advance(&mut self) {
        if self.connected().next().is_none() {
            return;
        }
        match self.phase {
            Phase::Answering if self.connected().all(|id| self.answers.contains_key(id)) => {
                self.phase = Phase::Voting;
            }
            Phase::Voting if self.connected().all(|id| self.ready.contains(id)) => {
                self.score_round();
                if self.round >= self.rounds {
                    self.phase = Phase::Finished;
                } else {
                    self.next_round();
                }
            }
            _ => {}
        }
    }

    fn score_round(&mut self) {
        let Some(letter) = self.letter else {
            return;
        };
        for (identity, player) in &mut self.players {
            let Some(sheet) = self.answers.get(identity) else {
                continue;
            };
            for (category, answer) in sheet {
                let ballot = self.votes.get(&(identity.clone(), category.clone()));
                if accepted(letter, answer, ballot) {
                    player.score += 1;
                }
            }
        }
    }

    fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            slug: self.code.as_str(),
            phase: self.phase,
            round: self.round,
            rounds: self.rounds,
            letter: self.letter,
            host: self.host.as_ref().map(ClientIdentity::as_str),
            categories: &self.categories,
            players: self
                .players
                .iter()
                .map(|(id, player)| PlayerView {
                    uuid: id.as_str(),
                    pseudonym: &player.pseudonym,
                    score: player.score,
                    connected: player.connection.is_some(),
                    submitted: self.answers.contains_key(id),
                    ready: self.ready.contains(id),
                })
                .collect(),
            answers: (self.phase == Phase::Voting).then(|| {
                self.answers
                    .iter()
                    .map(|(id, sheet)| (id.as_str(), sheet))
                    .collect()
            }),
        }
    }

    fn broadcast(&self) {
        let message = match Outbound::new(GAME_STATE, &self.snapshot()) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(code = %self.code, error = %e, "failed to encode game state");
                return;
            }
        };
        for (_, player) in &self.players {
            if let Some(connection) = &player.connection {
                self.broker.send(connection, &message);
            }
        }
    }
}

/// An answer scores if it starts with the round's letter and no majority
/// of the votes cast on it rejected it.
fn accepted(letter: char, answer: &str, ballot: Option<&Ballot>) -> bool {
    let starts_right = answer
        .chars()
        .next()
        .is_some_and(|c| c.to_uppercase().eq(letter.to_uppercase()));
    if !starts_right {
        return false;
    }
    let Some(ballot) = ballot else {
        return true;
    };
    let rejections = ballot.values().filter(|accept| !**accept).count();
    rejections * 2 <= ballot.len()
}

//! Game registry: which games exist, and which identity is in which game.

use std::collections::HashMap;

use parlor_protocol::{ClientIdentity, GameCode};
use parlor_transport::ConnectionHandle;

use crate::{BrokerFacade, DeletionQueue, GameError, GameInstance};

/// Owns every running game and the identity → game index.
///
/// Invariants:
/// - one game per code;
/// - an identity is in at most one game (the last one it joined);
/// - an identity is either connected to its game or departed from it,
///   never both;
/// - no identity points at a deleted game.
pub struct GameRegistry<G: GameInstance> {
    games: HashMap<GameCode, G>,
    memberships: HashMap<ClientIdentity, GameCode>,
    /// Identities whose connection closed, with the game they were in.
    departed: HashMap<ClientIdentity, GameCode>,
    facade: BrokerFacade,
    deletions: DeletionQueue,
}

impl<G: GameInstance> GameRegistry<G> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        let (facade, deletions) = BrokerFacade::channel();
        Self {
            games: HashMap::new(),
            memberships: HashMap::new(),
            departed: HashMap::new(),
            facade,
            deletions,
        }
    }

    /// The facade handed to every game this registry creates.
    pub fn facade(&self) -> &BrokerFacade {
        &self.facade
    }

    /// Creates a game under a fresh, unused code and returns the code.
    pub fn create(&mut self) -> GameCode {
        let code = loop {
            let candidate = GameCode::generate();
            if !self.games.contains_key(&candidate) {
                break candidate;
            }
        };
        let game = G::create(code.clone(), self.facade.clone());
        self.games.insert(code.clone(), game);
        tracing::info!(%code, "game created");
        code
    }

    /// Puts `identity` into the game under `code`.
    ///
    /// If it was in (or had departed from) a different game, that game
    /// forgets it first.
    ///
    /// # Errors
    /// Returns [`GameError::NotFound`] if no game has that code.
    pub fn join(
        &mut self,
        code: &GameCode,
        connection: ConnectionHandle,
        identity: ClientIdentity,
        pseudonym: String,
    ) -> Result<(), GameError> {
        if !self.games.contains_key(code) {
            return Err(GameError::NotFound(code.clone()));
        }

        let connected = self.memberships.remove(&identity);
        let departed = self.departed.remove(&identity);
        let previous = connected.or(departed);
        if let Some(previous) = previous.filter(|p| p != code) {
            if let Some(game) = self.games.get_mut(&previous) {
                game.forget(&identity);
                tracing::info!(code = %previous, %identity, "player moved to another game");
            }
        }

        let game = self
            .games
            .get_mut(code)
            .ok_or_else(|| GameError::NotFound(code.clone()))?;
        game.join(connection, identity.clone(), pseudonym);
        tracing::info!(%code, %identity, "player joined");
        self.memberships.insert(identity, code.clone());
        Ok(())
    }

    /// `identity`'s connection closed: tell its game, and remember the
    /// game so a rejoin or [`forget`](Self::forget) can find it.
    ///
    /// Returns the code of the game it was in, if any.
    pub fn leave(&mut self, identity: &ClientIdentity) -> Option<GameCode> {
        let code = self.memberships.remove(identity)?;
        if let Some(game) = self.games.get_mut(&code) {
            game.leave(identity);
            tracing::info!(%code, %identity, "player left");
        }
        self.departed.insert(identity.clone(), code.clone());
        Some(code)
    }

    /// `identity` is gone for good: its game drops it entirely.
    ///
    /// Returns the code of the game that forgot it, if any.
    pub fn forget(&mut self, identity: &ClientIdentity) -> Option<GameCode> {
        let departed = self.departed.remove(identity);
        let code = self.memberships.remove(identity).or(departed)?;
        if let Some(game) = self.games.get_mut(&code) {
            game.forget(identity);
            tracing::info!(%code, %identity, "player forgotten");
        }
        Some(code)
    }

    /// Removes a game and every membership pointing at it.
    ///
    /// Returns `false` if no game had that code.
    pub fn delete_game(&mut self, code: &GameCode) -> bool {
        if self.games.remove(code).is_none() {
            return false;
        }
        self.memberships.retain(|_, c| c != code);
        self.departed.retain(|_, c| c != code);
        tracing::info!(%code, "game deleted");
        true
    }

    /// Applies every deletion games have requested so far.
    pub fn apply_deletions(&mut self) -> Vec<GameCode> {
        let mut deleted = Vec::new();
        while let Some(code) = self.deletions.try_next() {
            if self.delete_game(&code) {
                deleted.push(code);
            }
        }
        deleted
    }

    /// Returns `true` if a game is registered under `code`.
    pub fn contains(&self, code: &GameCode) -> bool {
        self.games.contains_key(code)
    }

    /// Looks up a game.
    pub fn get(&self, code: &GameCode) -> Option<&G> {
        self.games.get(code)
    }

    /// Looks up a game for mutation.
    pub fn get_mut(&mut self, code: &GameCode) -> Option<&mut G> {
        self.games.get_mut(code)
    }

    /// The game `identity` is currently connected to.
    pub fn game_of(&self, identity: &ClientIdentity) -> Option<&GameCode> {
        self.memberships.get(identity)
    }

    /// The game `identity` was in when its connection closed.
    pub fn departed_from(&self, identity: &ClientIdentity) -> Option<&GameCode> {
        self.departed.get(identity)
    }

    /// Number of running games.
    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// Returns `true` if no game is running.
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

impl<G: GameInstance> Default for GameRegistry<G> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_protocol::{Object, Vote};
    use parlor_transport::{ConnectionId, Outbox};

    /// Tracks its roster; deletes itself once everyone is forgotten.
    struct RosterGame {
        code: GameCode,
        broker: BrokerFacade,
        roster: Vec<ClientIdentity>,
    }

    impl GameInstance for RosterGame {
        fn create(code: GameCode, broker: BrokerFacade) -> Self {
            Self {
                code,
                broker,
                roster: Vec::new(),
            }
        }

        fn join(&mut self, _: ConnectionHandle, identity: ClientIdentity, _: String) {
            self.roster.push(identity);
        }

        fn leave(&mut self, _: &ClientIdentity) {}

        fn forget(&mut self, identity: &ClientIdentity) {
            self.roster.retain(|i| i != identity);
            if self.roster.is_empty() {
                self.broker.delete_game(&self.code);
            }
        }

        fn update_config(&mut self, _: &ClientIdentity, _: &Object) {}
        fn start(&mut self, _: &ClientIdentity) {}
        fn submit_answers(&mut self, _: &ClientIdentity, _: &Object) {}
        fn vote(&mut self, _: &ClientIdentity, _: Vote) {}
        fn vote_ready(&mut self, _: &ClientIdentity) {}
        fn restart(&mut self, _: &ClientIdentity) {}
    }

    fn id(raw: &str) -> ClientIdentity {
        ClientIdentity::parse(raw).unwrap()
    }

    fn conn(n: u64) -> (ConnectionHandle, Outbox) {
        ConnectionHandle::channel(ConnectionId::new(n))
    }

    #[test]
    fn test_create_registers_distinct_codes() {
        let mut games = GameRegistry::<RosterGame>::new();

        let a = games.create();
        let b = games.create();

        assert_ne!(a, b);
        assert!(games.contains(&a));
        assert!(games.contains(&b));
        assert_eq!(games.len(), 2);
    }

    #[test]
    fn test_join_records_membership_and_calls_game() {
        let mut games = GameRegistry::<RosterGame>::new();
        let code = games.create();
        let (c1, _rx) = conn(1);

        games.join(&code, c1, id("alice"), "Al".into()).unwrap();

        assert_eq!(games.game_of(&id("alice")), Some(&code));
        assert_eq!(games.get(&code).unwrap().roster, vec![id("alice")]);
    }

    #[test]
    fn test_join_unknown_code_returns_not_found() {
        let mut games = GameRegistry::<RosterGame>::new();
        let (c1, _rx) = conn(1);
        let ghost = GameCode::parse("zzzzz").unwrap();

        let result = games.join(&ghost, c1, id("alice"), String::new());

        assert!(matches!(result, Err(GameError::NotFound(c)) if c == ghost));
        assert!(games.game_of(&id("alice")).is_none());
    }

    #[test]
    fn test_join_second_game_moves_membership_and_old_game_forgets() {
        let mut games = GameRegistry::<RosterGame>::new();
        let first = games.create();
        let second = games.create();
        let (c1, _rx) = conn(1);
        let (c2, _rx2) = conn(2);
        games.join(&first, c2, id("bob"), String::new()).unwrap();

        games.join(&first, c1.clone(), id("alice"), String::new()).unwrap();
        games.join(&second, c1, id("alice"), String::new()).unwrap();

        assert_eq!(games.game_of(&id("alice")), Some(&second));
        assert_eq!(games.get(&first).unwrap().roster, vec![id("bob")]);
        assert_eq!(games.get(&second).unwrap().roster, vec![id("alice")]);
    }

    #[test]
    fn test_join_another_game_after_leaving_lets_old_game_delete_itself() {
        let mut games = GameRegistry::<RosterGame>::new();
        let first = games.create();
        let second = games.create();
        let (c1, _rx1) = conn(1);
        let (c2, _rx2) = conn(2);
        games.join(&first, c1, id("alice"), String::new()).unwrap();
        games.leave(&id("alice"));

        games.join(&second, c2, id("alice"), String::new()).unwrap();

        assert!(games.departed_from(&id("alice")).is_none());
        assert_eq!(games.apply_deletions(), vec![first.clone()]);
        assert!(games.contains(&second));
    }

    #[test]
    fn test_rejoin_same_game_after_leaving_keeps_player() {
        let mut games = GameRegistry::<RosterGame>::new();
        let code = games.create();
        let (c1, _rx1) = conn(1);
        let (c2, _rx2) = conn(2);
        games.join(&code, c1, id("alice"), String::new()).unwrap();
        games.leave(&id("alice"));

        games.join(&code, c2, id("alice"), String::new()).unwrap();

        assert_eq!(games.game_of(&id("alice")), Some(&code));
        assert!(games.departed_from(&id("alice")).is_none());
        assert!(games.apply_deletions().is_empty());
    }

    #[test]
    fn test_leave_notifies_game_and_remembers_departure() {
        let mut games = GameRegistry::<RosterGame>::new();
        let code = games.create();
        let (c1, _rx1) = conn(1);
        games.join(&code, c1, id("alice"), String::new()).unwrap();

        assert_eq!(games.leave(&id("alice")), Some(code.clone()));

        assert!(games.game_of(&id("alice")).is_none());
        assert_eq!(games.departed_from(&id("alice")), Some(&code));
        assert_eq!(games.get(&code).unwrap().roster, vec![id("alice")]);
        assert!(games.apply_deletions().is_empty(), "a departed player keeps the game alive");
        assert_eq!(games.leave(&id("alice")), None);
    }

    #[test]
    fn test_forget_departed_player_drops_them_from_game() {
        let mut games = GameRegistry::<RosterGame>::new();
        let code = games.create();
        let (c1, _rx1) = conn(1);
        let (c2, _rx2) = conn(2);
        games.join(&code, c1, id("alice"), String::new()).unwrap();
        games.join(&code, c2, id("bob"), String::new()).unwrap();
        games.leave(&id("alice"));

        assert_eq!(games.forget(&id("alice")), Some(code.clone()));

        assert!(games.departed_from(&id("alice")).is_none());
        assert_eq!(games.get(&code).unwrap().roster, vec![id("bob")]);
        assert_eq!(games.forget(&id("alice")), None);
    }

    #[test]
    fn test_delete_game_drops_memberships() {
        let mut games = GameRegistry::<RosterGame>::new();
        let code = games.create();
        let (c1, _rx) = conn(1);
        let (c2, _rx2) = conn(2);
        games.join(&code, c1, id("alice"), String::new()).unwrap();
        games.join(&code, c2, id("bob"), String::new()).unwrap();
        games.leave(&id("bob"));

        assert!(games.delete_game(&code));

        assert!(games.is_empty());
        assert!(games.game_of(&id("alice")).is_none());
        assert!(games.departed_from(&id("bob")).is_none());
        assert!(!games.delete_game(&code));
    }

    #[test]
    fn test_apply_deletions_removes_games_that_asked() {
        let mut games = GameRegistry::<RosterGame>::new();
        let code = games.create();
        let kept = games.create();
        let (c1, _rx) = conn(1);
        games.join(&code, c1, id("alice"), String::new()).unwrap();

        // Last player forgotten: the game asks to be deleted.
        games.leave(&id("alice"));
        games.forget(&id("alice"));
        assert!(games.contains(&code), "deletion is deferred");

        assert_eq!(games.apply_deletions(), vec![code.clone()]);
        assert!(!games.contains(&code));
        assert!(games.contains(&kept));
        assert!(games.apply_deletions().is_empty());
    }
}

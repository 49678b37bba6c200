//! The broker: identity checks, connection bookkeeping and dispatch.
//!
//! A [`Broker`] owns every registry (connections, secrets, games) and is
//! driven one event at a time by the server's actor task. Nothing in here
//! locks or awaits. The one step that has to wait for I/O, delivering
//! freshly issued credentials before acting on the message that triggered
//! them, is split in two: [`Broker::on_message`] hands back a
//! [`Continuation`] and the actor calls [`Broker::resume`] once the
//! credentials are on the wire.
//!
//! Every inbound message is classified before anything else happens:
//!
//! | Presented                    | On record          | Outcome                          |
//! |------------------------------|--------------------|----------------------------------|
//! | no identity                  | n/a                | issue `set-uuid`, then dispatch  |
//! | identity                     | nothing            | decoy runtime identifier, drop   |
//! | identity + wrong/no secret   | secret             | drop, logged as a warning        |
//! | identity + matching secret   | secret             | dispatch                         |

use std::time::Instant;

use parlor_game::{route, GameInstance, GameRegistry, Routed};
use parlor_protocol::{
    decode, Action, ClientIdentity, GameCode, Inbound, Outbound, ProtocolError,
    RuntimeIdentifier,
};
use parlor_session::{
    ConnectionRegistry, Reaper, SecretStore, SessionConfig, SessionError,
};
use parlor_transport::{CloseReason, ConnectionHandle, ConnectionId};
use tokio::sync::oneshot;

use crate::{ParlorError, Statistics};

/// What became of one inbound message.
#[derive(Debug)]
pub enum Admission {
    /// The message was authenticated and routed.
    Dispatched(Routed),
    /// The message was dropped. Nothing was dispatched.
    Dropped(ParlorError),
    /// Credentials were issued. Once `delivered` resolves, pass
    /// `continuation` to [`Broker::resume`] to dispatch the message.
    /// If `delivered` errors, the connection died and the message is lost.
    AwaitingDelivery {
        delivered: oneshot::Receiver<()>,
        continuation: Continuation,
    },
}

/// A message parked until its sender's credentials have been delivered.
#[derive(Debug)]
pub struct Continuation {
    connection: ConnectionHandle,
    identity: ClientIdentity,
    action: Action,
    message: Inbound,
}

impl Continuation {
    /// The identity that was issued.
    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }
}

/// Single owner of all broker state.
pub struct Broker<G: GameInstance> {
    runtime_identifier: RuntimeIdentifier,
    connections: ConnectionRegistry,
    secrets: SecretStore,
    games: GameRegistry<G>,
    reaper: Reaper,
}

impl<G: GameInstance> Broker<G> {
    /// Creates a broker with empty registries and a fresh runtime
    /// identifier.
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            runtime_identifier: RuntimeIdentifier::generate(),
            connections: ConnectionRegistry::new(),
            secrets: SecretStore::new(),
            games: GameRegistry::new(),
            reaper: Reaper::new(config),
        }
    }

    /// The identifier of this broker run.
    pub fn runtime_identifier(&self) -> &RuntimeIdentifier {
        &self.runtime_identifier
    }

    /// A connection opened: tell it which broker run it is talking to.
    pub fn on_open(&mut self, connection: &ConnectionHandle) {
        tracing::debug!(conn_id = %connection.id(), "connection opened");
        let announce = Outbound::set_runtime_identifier(&self.runtime_identifier);
        self.games.facade().send(connection, &announce);
    }

    /// Handles one inbound text frame.
    pub fn on_message(&mut self, connection: &ConnectionHandle, text: &str) -> Admission {
        let admission = match self.admit(connection, text) {
            Ok(admission) => admission,
            Err(e) => {
                log_drop(connection.id(), &e);
                Admission::Dropped(e)
            }
        };
        self.games.apply_deletions();
        admission
    }

    fn admit(
        &mut self,
        connection: &ConnectionHandle,
        text: &str,
    ) -> Result<Admission, ParlorError> {
        let message = decode(text)?;
        let action = message.action().ok_or(ProtocolError::MissingAction)?;

        let Some(identity) = message.identity() else {
            return self.issue_credentials(connection, action, message);
        };

        if let Err(e) = self
            .secrets
            .verify(&identity, message.presented_secret().as_ref())
        {
            if matches!(e, SessionError::UnknownIdentity(_)) {
                // Make the client believe the broker restarted, so it
                // throws its credentials away and asks for new ones.
                let decoy = RuntimeIdentifier::decoy(&self.runtime_identifier);
                self.games
                    .facade()
                    .send(connection, &Outbound::set_runtime_identifier(&decoy));
            }
            return Err(e.into());
        }

        self.connections.clear_logout(&identity);
        self.bind(identity.clone(), connection);
        let routed = self.dispatch(connection, &identity, action, &message)?;
        Ok(Admission::Dispatched(routed))
    }

    fn issue_credentials(
        &mut self,
        connection: &ConnectionHandle,
        action: Action,
        message: Inbound,
    ) -> Result<Admission, ParlorError> {
        let (identity, secret) = self.secrets.provision();
        let text = Outbound::set_uuid(&identity, &secret).to_text()?;
        self.bind(identity.clone(), connection);
        tracing::info!(%identity, conn_id = %connection.id(), "credentials issued");

        Ok(Admission::AwaitingDelivery {
            delivered: connection.send_confirmed(text),
            continuation: Continuation {
                connection: connection.clone(),
                identity,
                action,
                message,
            },
        })
    }

    /// Dispatches a message whose credentials have been delivered.
    ///
    /// Returns `None` without dispatching if the connection closed or was
    /// rebound in the meantime, or if routing rejected the message.
    pub fn resume(&mut self, continuation: Continuation) -> Option<Routed> {
        let Continuation {
            connection,
            identity,
            action,
            message,
        } = continuation;

        if self.connections.connection_of(&identity) != Some(&connection) {
            tracing::debug!(
                %identity,
                conn_id = %connection.id(),
                "connection gone before dispatch, dropping message"
            );
            return None;
        }

        let routed = match self.dispatch(&connection, &identity, action, &message) {
            Ok(routed) => Some(routed),
            Err(e) => {
                log_drop(connection.id(), &e);
                None
            }
        };
        self.games.apply_deletions();
        routed
    }

    fn dispatch(
        &mut self,
        connection: &ConnectionHandle,
        identity: &ClientIdentity,
        action: Action,
        message: &Inbound,
    ) -> Result<Routed, ParlorError> {
        let routed = route(&mut self.games, action, message, identity, connection)?;
        match &routed {
            Routed::Joined { .. } => {
                self.statistics().report();
            }
            Routed::Ignored(action) => {
                tracing::debug!(%identity, %action, "ignoring unknown action");
            }
            Routed::Handled(_) => {}
        }
        Ok(routed)
    }

    /// Points `identity` at `connection`. If the connection used to speak
    /// for another identity, that identity is treated as disconnected.
    fn bind(&mut self, identity: ClientIdentity, connection: &ConnectionHandle) {
        let displaced = self.connections.register(identity.clone(), connection.clone());
        if let Some(stale) = displaced.connection {
            tracing::debug!(%identity, %stale, conn_id = %connection.id(), "superseded older connection");
        }
        if let Some(previous) = displaced.identity {
            self.games.leave(&previous);
            self.connections.mark_logged_out(previous, Instant::now());
        }
    }

    /// A connection closed at `now`.
    ///
    /// Its identity (if any) loses its connection, its game hears that it
    /// left, and it gets a logout record. The secret and the game's seat
    /// are kept so the client can come back until the reaper runs.
    pub fn on_close(
        &mut self,
        connection: ConnectionId,
        reason: &CloseReason,
        now: Instant,
    ) -> Statistics {
        match self.connections.identity_of(connection).cloned() {
            Some(identity) => {
                self.connections.unregister(&identity);
                self.connections.mark_logged_out(identity.clone(), now);
                self.games.leave(&identity);
                tracing::info!(%identity, conn_id = %connection, %reason, "connection closed");
            }
            None => {
                tracing::debug!(conn_id = %connection, %reason, "unbound connection closed");
            }
        }
        self.games.apply_deletions();
        self.statistics().report()
    }

    /// Forgets every identity logged out for longer than the threshold,
    /// along with its place in whatever game it left.
    pub fn reap(&mut self, now: Instant) -> Vec<ClientIdentity> {
        let evicted = self
            .reaper
            .sweep(&mut self.connections, &mut self.secrets, now);
        for identity in &evicted {
            self.games.forget(identity);
        }
        self.games.apply_deletions();
        evicted
    }

    /// Removes a game. Returns `false` if no game had that code.
    pub fn delete_game(&mut self, code: &GameCode) -> bool {
        self.games.delete_game(code)
    }

    /// Current counts, without reporting them.
    pub fn statistics(&self) -> Statistics {
        Statistics {
            games: self.games.len(),
            connections: self.connections.len(),
        }
    }

    /// The connection registry.
    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    /// The credential store.
    pub fn secrets(&self) -> &SecretStore {
        &self.secrets
    }

    /// The game registry.
    pub fn games(&self) -> &GameRegistry<G> {
        &self.games
    }
}

fn log_drop(conn_id: ConnectionId, error: &ParlorError) {
    match error {
        ParlorError::Session(SessionError::SecretMismatch(identity)) => {
            tracing::warn!(%conn_id, %identity, "secret mismatch, message dropped");
        }
        ParlorError::Session(SessionError::UnknownIdentity(identity)) => {
            tracing::info!(%conn_id, %identity, "unknown identity, forcing re-provisioning");
        }
        other => {
            tracing::debug!(%conn_id, error = %other, "message dropped");
        }
    }
}

//! The connection registry: which identity is on which live connection.
//!
//! Two maps kept in lockstep (identity → handle and connection → identity)
//! so both directions are O(1), plus the logout records: when each
//! identity last lost its connection.
//!
//! # Invariants
//!
//! - An identity has at most one connection. Registering a new one
//!   supersedes the old, which is unmapped but not closed.
//! - A connection belongs to at most one identity.
//! - An identity with a live connection has no logout record.

use std::collections::HashMap;
use std::time::Instant;

use parlor_protocol::ClientIdentity;
use parlor_transport::{ConnectionHandle, ConnectionId};

/// What [`ConnectionRegistry::register`] displaced.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Displaced {
    /// The identity's previous connection, if it had a different one.
    pub connection: Option<ConnectionId>,
    /// The identity previously bound to this connection, if different.
    pub identity: Option<ClientIdentity>,
}

/// Bidirectional identity ↔ connection map plus logout records.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    by_identity: HashMap<ClientIdentity, ConnectionHandle>,
    by_connection: HashMap<ConnectionId, ClientIdentity>,
    logouts: HashMap<ClientIdentity, Instant>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `identity` to `connection`, superseding any previous binding
    /// of either side.
    pub fn register(
        &mut self,
        identity: ClientIdentity,
        connection: ConnectionHandle,
    ) -> Displaced {
        let mut displaced = Displaced::default();
        let conn_id = connection.id();

        if let Some(previous) = self.by_connection.get(&conn_id) {
            if *previous != identity {
                let previous = previous.clone();
                self.by_identity.remove(&previous);
                displaced.identity = Some(previous);
            }
        }

        if let Some(old) = self.by_identity.insert(identity.clone(), connection) {
            if old.id() != conn_id {
                self.by_connection.remove(&old.id());
                displaced.connection = Some(old.id());
            }
        }
        self.by_connection.insert(conn_id, identity);

        displaced
    }

    /// Removes the identity's connection. No-op if it has none.
    pub fn unregister(&mut self, identity: &ClientIdentity) -> Option<ConnectionHandle> {
        let handle = self.by_identity.remove(identity)?;
        self.by_connection.remove(&handle.id());
        Some(handle)
    }

    /// The identity's live connection, if any.
    pub fn connection_of(&self, identity: &ClientIdentity) -> Option<&ConnectionHandle> {
        self.by_identity.get(identity)
    }

    /// Reverse lookup: which identity a connection is bound to.
    pub fn identity_of(&self, connection: ConnectionId) -> Option<&ClientIdentity> {
        self.by_connection.get(&connection)
    }

    /// Records that the identity lost its connection at `at`.
    pub fn mark_logged_out(&mut self, identity: ClientIdentity, at: Instant) {
        self.logouts.insert(identity, at);
    }

    /// Forgets the identity's logout record, if any.
    pub fn clear_logout(&mut self, identity: &ClientIdentity) -> Option<Instant> {
        self.logouts.remove(identity)
    }

    /// When the identity lost its connection, if it is logged out.
    pub fn logged_out_since(&self, identity: &ClientIdentity) -> Option<Instant> {
        self.logouts.get(identity).copied()
    }

    /// Iterates over all logout records.
    pub fn logouts(&self) -> impl Iterator<Item = (&ClientIdentity, Instant)> {
        self.logouts.iter().map(|(id, at)| (id, *at))
    }

    /// Number of identities with a live connection.
    pub fn len(&self) -> usize {
        self.by_identity.len()
    }

    /// Returns `true` if no identity has a live connection.
    pub fn is_empty(&self) -> bool {
        self.by_identity.is_empty()
    }
}

//! Statistics reporter.

use serde::Serialize;

/// A snapshot of how busy the broker is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    /// Running games.
    pub games: usize,
    /// Identities with a live connection.
    pub connections: usize,
}

impl Statistics {
    /// Emits the snapshot as a `parlor::stats` event and returns it.
    pub fn report(self) -> Self {
        tracing::info!(
            target: "parlor::stats",
            games = self.games,
            connections = self.connections,
            "statistics"
        );
        self
    }
}

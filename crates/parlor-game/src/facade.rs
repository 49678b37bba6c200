//! The broker as seen from inside a game.
//!
//! A game is owned by the registry it would need to mutate to delete
//! itself, so it cannot call back in directly. Deletion requests go
//! through a channel instead and the broker applies them after every event
//! it handles.
//! Sending needs no broker state at all: the facade serializes the message
//! and queues it on the connection handle.

use parlor_protocol::{GameCode, Outbound};
use parlor_transport::ConnectionHandle;
use tokio::sync::mpsc;

/// Handle a game uses to reach the broker. Cheap to clone.
#[derive(Debug, Clone)]
pub struct BrokerFacade {
    deletions: mpsc::UnboundedSender<GameCode>,
}

/// The broker's end of the deletion channel.
#[derive(Debug)]
pub struct DeletionQueue {
    receiver: mpsc::UnboundedReceiver<GameCode>,
}

impl BrokerFacade {
    /// Creates a facade together with the queue its deletions land in.
    pub fn channel() -> (Self, DeletionQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { deletions: tx }, DeletionQueue { receiver: rx })
    }

    /// Sends a message to a connection. Returns `false` if it could not be
    /// queued (connection gone, or the message failed to serialize).
    pub fn send(&self, connection: &ConnectionHandle, message: &Outbound) -> bool {
        match message.to_text() {
            Ok(text) => connection.send(text),
            Err(e) => {
                tracing::debug!(
                    conn_id = %connection.id(),
                    action = message.action(),
                    error = %e,
                    "dropping unencodable outbound message"
                );
                false
            }
        }
    }

    /// Asks the broker to remove the game registered under `code`.
    pub fn delete_game(&self, code: &GameCode) {
        // The queue lives as long as the broker; if it is gone, so is the game.
        let _ = self.deletions.send(code.clone());
    }
}

impl DeletionQueue {
    /// Takes the next pending deletion without waiting.
    pub fn try_next(&mut self) -> Option<GameCode> {
        self.receiver.try_recv().ok()
    }
}

//! Connection handles and the per-connection outbound queue.
//!
//! The broker never writes to a socket directly. Every live connection
//! owns an unbounded, ordered queue; a [`ConnectionHandle`] is the sending
//! half and [`pump`] drains the receiving half into the socket. Anything
//! enqueued on one handle reaches the peer in enqueue order.
//!
//! A message can optionally carry a delivery confirmation. The pump fires
//! it only after the frame was flushed to the socket, which is how callers
//! sequence "send, then continue" without blocking the broker.

use std::fmt;

use tokio::sync::{mpsc, oneshot};

use crate::{Connection, ConnectionId};

/// One queued outbound text frame.
#[derive(Debug)]
pub struct Outgoing {
    /// The serialized frame.
    pub text: String,
    /// Fired once the frame has been written and flushed.
    pub delivered: Option<oneshot::Sender<()>>,
}

/// Receiving half of a connection's outbound queue.
pub type Outbox = mpsc::UnboundedReceiver<Outgoing>;

/// Handle to one live connection.
///
/// Cheap to clone. Two handles are equal when they refer to the same
/// connection, regardless of which clone they are.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbox: mpsc::UnboundedSender<Outgoing>,
}

impl ConnectionHandle {
    /// Creates a handle for `id` together with the queue it feeds.
    pub fn channel(id: ConnectionId) -> (Self, Outbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id, outbox: tx }, rx)
    }

    /// Returns the connection's identifier.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues a text frame. Returns `false` if the connection is gone.
    pub fn send(&self, text: String) -> bool {
        self.outbox
            .send(Outgoing {
                text,
                delivered: None,
            })
            .is_ok()
    }

    /// Queues a text frame and returns a receiver that resolves once the
    /// frame has been flushed to the socket.
    ///
    /// If the connection dies first, the receiver resolves with an error.
    pub fn send_confirmed(&self, text: String) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        // On failure the `Outgoing` (and with it `tx`) is dropped, which
        // resolves `rx` with an error.
        let _ = self.outbox.send(Outgoing {
            text,
            delivered: Some(tx),
        });
        rx
    }

    /// Returns `true` once the writer side has gone away.
    pub fn is_closed(&self) -> bool {
        self.outbox.is_closed()
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectionHandle").field(&self.id).finish()
    }
}

/// Drains `outbox` into `conn` in order until every handle is dropped or
/// a send fails.
pub async fn pump<C: Connection>(
    conn: &C,
    mut outbox: Outbox,
) -> Result<(), C::Error> {
    while let Some(outgoing) = outbox.recv().await {
        conn.send(&outgoing.text).await?;
        if let Some(delivered) = outgoing.delivered {
            let _ = delivered.send(());
        }
    }
    tracing::debug!(conn_id = %conn.id(), "outbox closed, writer done");
    Ok(())
}

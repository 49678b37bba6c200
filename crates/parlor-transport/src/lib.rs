//! Transport layer for Parlor.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the socket implementation, plus the [`ConnectionHandle`]: the cheap,
//! cloneable handle the rest of the system uses to talk to one live socket.
//!
//! Everything above this crate deals in discrete text frames and
//! open/close events. Framing, the WebSocket handshake and ping/pong are
//! handled here and never leak upward.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

mod error;
mod handle;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::{BoxError, TransportError};
pub use handle::{pump, ConnectionHandle, Outbox, Outgoing};
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::future::Future;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Why a connection ended, as reported by the peer (or synthesized when
/// the socket dropped without a close frame).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    /// WebSocket close code (1000 = normal, 1006 = abnormal).
    pub code: u16,
    /// Free-form description sent with the close frame.
    pub description: String,
}

impl CloseReason {
    /// Close code used when the socket vanished without a close frame.
    pub const ABNORMAL: u16 = 1006;

    /// A close that happened without a close frame.
    pub fn abnormal() -> Self {
        Self {
            code: Self::ABNORMAL,
            description: String::new(),
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{} ({})", self.code, self.description)
        }
    }
}

/// One unit of inbound traffic from a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A text message. The only kind the broker acts on.
    Text(String),
    /// A binary message of the given length. Parlor speaks text only.
    Binary(usize),
    /// The connection is gone. No more frames will follow.
    Closed(CloseReason),
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send;
}

/// A single connection that can send and receive text frames.
///
/// Sending and receiving may happen concurrently from two tasks (a reader
/// loop and a writer pump), so implementations must not hold one side
/// locked while waiting on the other.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends a text frame to the remote peer and flushes it.
    fn send(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns [`Frame::Closed`] exactly once, when the connection ends.
    fn recv(&self) -> impl Future<Output = Result<Frame, Self::Error>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

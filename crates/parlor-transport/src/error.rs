/// Boxed cause from the WebSocket layer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why a listener or a connection failed.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listening socket could not be opened.
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// No TCP connection could be taken off the listener.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// The peer connected but the WebSocket upgrade did not complete.
    #[error("handshake failed: {0}")]
    Handshake(#[source] BoxError),

    /// A frame could not be written, or the close could not be sent.
    #[error("write failed: {0}")]
    Write(#[source] BoxError),

    /// The socket broke while waiting for a frame.
    #[error("read failed: {0}")]
    Read(#[source] BoxError),
}

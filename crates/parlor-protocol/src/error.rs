//! Error types for the protocol layer.

/// Errors that can occur while decoding inbound frames or encoding
/// outbound ones.
///
/// None of these ever produce a reply to the client. The broker logs them
/// and drops the frame.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into JSON).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed: malformed JSON or a field of the wrong type.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The message has no `action`, or the action is blank.
    #[error("message has no action")]
    MissingAction,

    /// The frame parsed as JSON but is not a message (e.g. not an object).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

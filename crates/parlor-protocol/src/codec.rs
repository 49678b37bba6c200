//! JSON codec: text frames in, text frames out.
//!
//! The wire format is fixed (JSON objects over text frames), so there is no
//! codec trait to swap. These two functions are the only place that turns
//! frames into messages and back.

use serde_json::Value;

use crate::{Inbound, Outbound, ProtocolError};

/// Decodes one inbound text frame.
///
/// # Errors
/// - [`ProtocolError::Decode`] if the frame is not JSON or a known field
///   has the wrong type.
/// - [`ProtocolError::InvalidMessage`] if the JSON is not an object.
pub fn decode(text: &str) -> Result<Inbound, ProtocolError> {
    let value: Value = serde_json::from_str(text).map_err(ProtocolError::Decode)?;
    if !value.is_object() {
        return Err(ProtocolError::InvalidMessage(
            "expected a JSON object".into(),
        ));
    }
    serde_json::from_value(value).map_err(ProtocolError::Decode)
}

/// Encodes an outbound message, injecting its `action` field.
pub fn encode(message: &Outbound) -> Result<String, ProtocolError> {
    serde_json::to_string(&message.to_object()).map_err(ProtocolError::Encode)
}

//! # Message Codec
//!
//! Encodes outgoing command requests and decodes inbound payloads from the
//! gateway's three read paths. Everything on the wire is UTF-8 JSON.
//!
//! Decoding never panics on truncated or non-conforming input: it returns a
//! typed `CodecError` the router path logs and drops. A malformed inbound
//! message must never be mistaken for a valid response, and must never
//! reach a pending waiter.

use crate::domain::{CommandRequest, DeviceStatus, EventEnvelope};
use thiserror::Error;

/// Failures while encoding or decoding wire payloads.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Payload bytes are not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),

    /// Payload is not the expected JSON shape.
    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload decoded but is empty where content is required.
    #[error("payload is empty")]
    Empty,
}

/// Serialize a command request for the command channel.
pub fn encode_command(request: &CommandRequest) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(request)?)
}

/// Decode a notification from the event channel into an envelope.
pub fn decode_event(payload: &[u8]) -> Result<EventEnvelope, CodecError> {
    let text = std::str::from_utf8(payload)?;
    Ok(serde_json::from_str(text)?)
}

/// Decode a direct read of the status channel.
pub fn decode_status(payload: &[u8]) -> Result<DeviceStatus, CodecError> {
    let text = std::str::from_utf8(payload)?;
    Ok(serde_json::from_str(text)?)
}

/// Decode the version channel's plain UTF-8 version string.
pub fn decode_version(payload: &[u8]) -> Result<String, CodecError> {
    let text = std::str::from_utf8(payload)?.trim();
    if text.is_empty() {
        return Err(CodecError::Empty);
    }
    Ok(text.to_string())
}

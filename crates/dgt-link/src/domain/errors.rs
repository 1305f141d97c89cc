//! # Domain Errors
//!
//! The failure taxonomy surfaced by the protocol engine. Decode and routing
//! failures are contained where they occur (logged and dropped); everything
//! here propagates to the immediate caller of the failing operation.

use super::envelope::CorrelationId;
use crate::codec::CodecError;
use crate::ports::outbound::TransportError;
use thiserror::Error;

/// Errors surfaced by gateway client operations.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Operation attempted before the handshake reached `Ready`.
    #[error("not connected to the gateway")]
    NotConnected,

    /// No correlated response arrived within the call's deadline.
    #[error("no response for command {id} within the timeout")]
    Timeout {
        /// Correlation id of the unanswered request.
        id: CorrelationId,
    },

    /// The underlying channel write/read/subscribe failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Malformed payload on a direct-read channel.
    #[error("decode error: {0}")]
    Decode(#[from] CodecError),

    /// The readiness signal was not observed within the handshake window.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// A response referenced an id with no pending slot. Surfaced only when
    /// a waiter's slot was consumed out from under it; inbound events with
    /// unknown ids are logged and dropped instead.
    #[error("no pending request for correlation id {0}")]
    UnknownCorrelation(CorrelationId),

    /// A request was registered under an id that is already outstanding.
    #[error("correlation id {0} already has a pending request")]
    DuplicateCorrelation(CorrelationId),

    /// The session was torn down while the request was pending.
    #[error("disconnected while waiting for a response")]
    Disconnected,

    /// The gateway answered the command with a non-success status.
    #[error("command failed on the device: {message} (code {code})")]
    CommandFailed {
        /// Device error code; 0 when the response carried none.
        code: u16,
        /// Device error message.
        message: String,
    },
}

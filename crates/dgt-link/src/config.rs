//! # Client Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the gateway client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Per-command wait for a correlated response.
    pub response_timeout: Duration,

    /// Single bounded wait for the readiness signal during the handshake.
    pub handshake_timeout: Duration,

    /// Buffer size of the notification channel between the transport and
    /// the router pump.
    pub event_buffer: usize,

    /// Treat a protocol version mismatch as a handshake failure instead of
    /// a logged warning.
    pub strict_version: bool,

    /// After reaching `Ready`, send a confirmation `displayText` round trip
    /// (" Connected" with a short beep).
    pub confirm_on_ready: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_secs(5),
            handshake_timeout: Duration::from_secs(5),
            event_buffer: 64,
            strict_version: false,
            confirm_on_ready: true,
        }
    }
}

impl ClientConfig {
    /// Config for tests: tight timeouts, no confirmation round trip.
    pub fn for_testing() -> Self {
        Self {
            response_timeout: Duration::from_millis(250),
            handshake_timeout: Duration::from_millis(250),
            event_buffer: 16,
            strict_version: false,
            confirm_on_ready: false,
        }
    }
}

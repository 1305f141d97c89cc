//! # Typed Event Payloads
//!
//! Structured views over the `data` mapping of inbound envelopes. All of
//! these decode leniently: unknown fields are ignored and missing fields
//! fall back to defaults, so a partially filled payload never poisons
//! routing.

use serde::{Deserialize, Serialize};

/// Payload of a `timeUpdate` event: both timers' current values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeUpdate {
    /// Left timer hours.
    pub left_hours: u8,
    /// Left timer minutes.
    pub left_minutes: u8,
    /// Left timer seconds.
    pub left_seconds: u8,
    /// Right timer hours.
    pub right_hours: u8,
    /// Right timer minutes.
    pub right_minutes: u8,
    /// Right timer seconds.
    pub right_seconds: u8,
}

/// Payload of a `buttonEvent` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ButtonPress {
    /// Which button, as named by the gateway.
    pub button: String,
    /// Raw button code from the clock.
    pub button_code: u8,
    /// Whether this is an auto-repeat of a held button.
    pub is_repeat: bool,
    /// Repeat counter, absent on the initial press.
    pub repeat_count: u32,
}

/// Payload of a `connectionStatus` event: the gateway's link to the clock.
///
/// The session becomes usable only after an event with both flags true,
/// the readiness signal the handshake waits for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkStatus {
    /// Clock is physically connected to the gateway.
    pub connected: bool,
    /// Gateway finished configuring the clock.
    pub configured: bool,
}

impl LinkStatus {
    /// Both connected and configured.
    pub fn is_ready(&self) -> bool {
        self.connected && self.configured
    }
}

/// Payload of an `error` event, and of the `data` mapping on a failed
/// command response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceError {
    /// Numeric error code from the gateway's error table.
    pub error_code: u16,
    /// Human-readable message.
    pub error_message: String,
}

/// Current timer values, parsed from a successful `getTime` result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClockTime {
    /// Left timer hours.
    pub left_hours: u8,
    /// Left timer minutes.
    pub left_minutes: u8,
    /// Left timer seconds.
    pub left_seconds: u8,
    /// Right timer hours.
    pub right_hours: u8,
    /// Right timer minutes.
    pub right_minutes: u8,
    /// Right timer seconds.
    pub right_seconds: u8,
}

/// Gateway status mapping returned by a direct read of the status channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceStatus {
    /// Gateway system state name, e.g. `"Active"`.
    pub system_state: String,
    /// Whether a BLE central is connected to the gateway.
    pub ble_connected: bool,
    /// Whether the clock is connected to the gateway.
    pub dgt_connected: bool,
    /// Whether the clock has been configured.
    pub dgt_configured: bool,
    /// Gateway uptime in seconds.
    pub uptime: u64,
    /// Free heap in KB.
    pub free_heap: u64,
    /// Internal temperature in degrees Celsius; -999 when unreadable.
    pub temperature: i16,
    /// Commands processed since boot.
    pub commands_processed: u64,
    /// Events generated since boot.
    pub events_generated: u64,
}

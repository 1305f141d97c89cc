//! # Command Definitions
//!
//! The typed command set accepted by the gateway's command channel, and the
//! parameter shapes each command carries on the wire.

use serde::{Deserialize, Serialize};

/// Commands understood by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockCommand {
    /// Set both timers (mode + h/m/s per side).
    SetTime,
    /// Show a text message on the clock display.
    DisplayText,
    /// Return the display to normal clock mode.
    EndDisplay,
    /// Stop both timers.
    Stop,
    /// Start both timers with the given modes.
    Run,
    /// Read the current timer values.
    GetTime,
}

impl ClockCommand {
    /// Wire name of the command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SetTime => "setTime",
            Self::DisplayText => "displayText",
            Self::EndDisplay => "endDisplay",
            Self::Stop => "stop",
            Self::Run => "run",
            Self::GetTime => "getTime",
        }
    }
}

/// Parameters of `setTime`: per-side mode and time values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTimeParams {
    /// Left timer mode.
    pub left_mode: u8,
    /// Left timer hours.
    pub left_hours: u8,
    /// Left timer minutes.
    pub left_minutes: u8,
    /// Left timer seconds.
    pub left_seconds: u8,
    /// Right timer mode.
    pub right_mode: u8,
    /// Right timer hours.
    pub right_hours: u8,
    /// Right timer minutes.
    pub right_minutes: u8,
    /// Right timer seconds.
    pub right_seconds: u8,
}

/// Parameters of `displayText`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayTextParams {
    /// Text to show (the clock truncates past its display width).
    pub text: String,
    /// Beep duration in device units; 0 for silent.
    pub beep: u8,
    /// Left-side dot flags.
    pub left_dots: u8,
    /// Right-side dot flags.
    pub right_dots: u8,
}

/// Parameters of `run`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunParams {
    /// Left timer mode.
    pub left_mode: u8,
    /// Right timer mode.
    pub right_mode: u8,
}

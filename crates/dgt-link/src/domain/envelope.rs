//! # Wire Envelopes
//!
//! Serde representations of the JSON payloads exchanged with the gateway:
//! outgoing command requests and incoming event envelopes, plus the
//! correlation id that pairs a request with its asynchronous response.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Opaque correlation token pairing a command with its response event.
///
/// The gateway treats this as an arbitrary string; this client generates
/// 8-character tokens from a v4 UUID, matching the observed wire traffic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Wrap an existing token.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh token, unique per outstanding request.
    pub fn generate() -> Self {
        let full = Uuid::new_v4().simple().to_string();
        Self(full[..8].to_string())
    }

    /// The token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An outgoing command, serialized to JSON and written to the command
/// channel. The response arrives later on the event channel, tagged with
/// the same `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Correlation token.
    pub id: CorrelationId,
    /// Command name, e.g. `"displayText"`.
    pub command: String,
    /// Client-side send time, milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Named command arguments, omitted entirely when absent.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub params: Option<Value>,
}

impl CommandRequest {
    /// Build a request stamped with the current time.
    pub fn new(id: CorrelationId, command: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            id,
            command: command.into(),
            timestamp: now_millis(),
            params,
        }
    }
}

/// Milliseconds since the Unix epoch; 0 if the clock is before the epoch.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Classification of an inbound event by its `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Periodic clock time broadcast.
    TimeUpdate,
    /// A physical button was pressed on the clock.
    ButtonEvent,
    /// Link state between the gateway and the clock changed.
    ConnectionStatus,
    /// Device-side error report.
    Error,
    /// Asynchronous reply to a previously written command.
    CommandResponse,
    /// Gateway system status broadcast.
    SystemStatus,
    /// Any `type` value this client does not recognize.
    Other,
}

impl EventKind {
    /// Classify a raw `type` string.
    pub fn classify(tag: &str) -> Self {
        match tag {
            "timeUpdate" => Self::TimeUpdate,
            "buttonEvent" => Self::ButtonEvent,
            "connectionStatus" => Self::ConnectionStatus,
            "error" => Self::Error,
            "command_response" => Self::CommandResponse,
            "systemStatus" => Self::SystemStatus,
            _ => Self::Other,
        }
    }
}

/// An inbound message from the event channel, decoded but not yet routed.
///
/// The envelope is immutable once decoded: it is classified, dispatched to
/// exactly one consumer, and discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Raw `type` tag as sent by the gateway.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Correlation token, present only on command responses.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<CorrelationId>,
    /// `"success"` or an error marker, present only on command responses.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<String>,
    /// Device-side timestamp, when the gateway includes one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timestamp: Option<u64>,
    /// Event payload mapping.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Value>,
    /// Result mapping of a successful command response.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<Value>,
}

impl EventEnvelope {
    /// Classify this envelope by its `type` tag.
    pub fn kind(&self) -> EventKind {
        EventKind::classify(&self.event_type)
    }

    /// Leniently parse the `data` mapping into a typed payload. Missing or
    /// non-conforming data yields the payload's default.
    pub fn parse_data<T>(&self) -> T
    where
        T: serde::de::DeserializeOwned + Default,
    {
        self.data
            .clone()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }
}

/// A resolved command response, delivered exactly once to the caller that
/// registered its correlation id.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    /// Correlation token of the originating request.
    pub id: CorrelationId,
    /// Whether the gateway reported `"success"`. The firmware writes
    /// `"error"` for failures; anything other than `"success"` counts as one.
    pub success: bool,
    /// Result mapping of a successful response; empty when absent.
    pub result: Map<String, Value>,
    /// The raw envelope, for consumers that need fields not modeled here.
    pub envelope: EventEnvelope,
}

impl CommandOutcome {
    /// Build an outcome from a `command_response` envelope. Returns `None`
    /// when the envelope carries no correlation id.
    pub fn from_envelope(envelope: EventEnvelope) -> Option<Self> {
        let id = envelope.id.clone()?;
        let success = envelope.status.as_deref() == Some("success");
        let result = match &envelope.result {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };
        Some(Self {
            id,
            success,
            result,
            envelope,
        })
    }

    /// Extract the device error carried by a failed response. The gateway
    /// puts `errorCode`/`errorMessage` in the `data` mapping.
    pub fn device_error(&self) -> super::events::DeviceError {
        self.envelope.parse_data()
    }
}

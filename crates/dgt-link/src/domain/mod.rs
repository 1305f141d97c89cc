//! # Domain Layer
//!
//! Core types for the gateway protocol: wire envelopes, typed event
//! payloads, command definitions, session bookkeeping, and errors.
//! No I/O happens here.

pub mod commands;
pub mod envelope;
pub mod errors;
pub mod events;
pub mod session;

pub use commands::{ClockCommand, DisplayTextParams, RunParams, SetTimeParams};
pub use envelope::{CommandOutcome, CommandRequest, CorrelationId, EventEnvelope, EventKind};
pub use errors::LinkError;
pub use events::{ButtonPress, ClockTime, DeviceError, DeviceStatus, LinkStatus, TimeUpdate};
pub use session::{SessionState, SessionStats, StatsSnapshot};

/// Protocol version this client speaks. The gateway publishes its own
/// version on the version channel; a mismatch is advisory by default.
pub const PROTOCOL_VERSION: &str = "1.0";

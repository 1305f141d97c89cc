//! # DGT-Link
//!
//! Async client protocol engine for the DGT3000 BLE chess-clock gateway.
//!
//! The gateway exposes four logical channels: a read-only version probe, a
//! write-only command channel, a read-only status channel, and a push-based
//! event channel. Commands are fire-and-forget JSON writes; their replies
//! arrive later on the event channel tagged with an opaque correlation id.
//! This crate does the bookkeeping that makes that usable:
//!
//! - pairing each command write with its asynchronous response,
//! - demultiplexing the event channel into typed event kinds,
//! - a bounded-wait handshake that holds the session back until the
//!   gateway reports the clock connected **and** configured.
//!
//! The physical BLE link is not part of this crate: any backend
//! implementing [`Transport`] works, including the bundled
//! [`MockTransport`] used throughout the tests.
//!
//! ## Module Structure
//!
//! ```text
//! dgt-link/
//! ├── domain/        # Wire types, typed events, session state, errors
//! ├── codec/         # JSON encode/decode, lenient on malformed input
//! ├── correlation/   # Pending-request table keyed by correlation id
//! ├── router/        # Event demultiplexer + observer registry
//! ├── handshake/     # Post-connect state machine
//! ├── application/   # GatewayClient command façade
//! ├── ports/         # GatewayApi (inbound) + Transport (outbound)
//! └── config.rs      # ClientConfig
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use dgt_link::{ClientConfig, GatewayApi, GatewayClient, MockTransport};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), dgt_link::LinkError> {
//! let transport = Arc::new(MockTransport::new());
//! transport.set_auto_respond(true);
//!
//! let client = GatewayClient::new(ClientConfig::default(), transport);
//! client.connect().await?;
//!
//! let time = client.get_time().await?;
//! println!("{:02}:{:02}", time.left_hours, time.left_minutes);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod application;
pub mod codec;
pub mod config;
pub mod correlation;
pub mod domain;
pub mod handshake;
pub mod ports;
pub mod router;

// Re-exports
pub use application::GatewayClient;
pub use codec::CodecError;
pub use config::ClientConfig;
pub use correlation::{CorrelationTable, WaitHandle};
pub use domain::{
    ButtonPress, ClockCommand, ClockTime, CommandOutcome, CommandRequest, CorrelationId,
    DeviceError, DeviceStatus, DisplayTextParams, EventEnvelope, EventKind, LinkError,
    LinkStatus, RunParams, SessionState, SessionStats, SetTimeParams, StatsSnapshot,
    TimeUpdate, PROTOCOL_VERSION,
};
pub use handshake::{HandshakeController, HandshakePhase};
pub use ports::{
    Channel, GatewayApi, MockTransport, Transport, TransportError, DEVICE_NAME, SERVICE_UUID,
};
pub use router::EventRouter;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

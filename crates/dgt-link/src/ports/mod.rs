//! # Ports
//!
//! Trait seams of the engine: the inbound API offered to applications and
//! the outbound transport dependency a BLE (or simulated) backend must
//! implement.

pub mod inbound;
pub mod outbound;

pub use inbound::GatewayApi;
pub use outbound::{Channel, MockTransport, Transport, TransportError, DEVICE_NAME, SERVICE_UUID};

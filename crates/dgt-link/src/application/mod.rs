//! # Application Layer
//!
//! `GatewayClient` orchestrates the codec, correlation table, router, and
//! handshake into the typed operation surface of the inbound port.

pub mod client;

pub use client::GatewayClient;

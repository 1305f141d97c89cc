//! # Inbound Port: Gateway API
//!
//! The typed operation surface offered to applications. `GatewayClient` is
//! the production implementation.

use crate::domain::{
    ClockTime, CommandOutcome, DeviceStatus, DisplayTextParams, LinkError, RunParams,
    SetTimeParams, StatsSnapshot,
};
use async_trait::async_trait;

/// Typed operations against a connected gateway.
///
/// Command operations require a ready session and fail `NotConnected`
/// otherwise; `device_status` and `protocol_version` are direct reads that
/// only need the raw link.
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// Set both timers.
    async fn set_time(&self, params: SetTimeParams) -> Result<CommandOutcome, LinkError>;

    /// Show a text message on the clock display.
    async fn display_text(&self, params: DisplayTextParams) -> Result<CommandOutcome, LinkError>;

    /// Return the display to normal clock mode.
    async fn end_display(&self) -> Result<CommandOutcome, LinkError>;

    /// Stop both timers.
    async fn stop_timers(&self) -> Result<CommandOutcome, LinkError>;

    /// Start both timers with the given modes.
    async fn run_timers(&self, params: RunParams) -> Result<CommandOutcome, LinkError>;

    /// Read the current timer values.
    async fn get_time(&self) -> Result<ClockTime, LinkError>;

    /// Direct read of the gateway's status channel.
    async fn device_status(&self) -> Result<DeviceStatus, LinkError>;

    /// Direct read of the gateway's protocol version string.
    async fn protocol_version(&self) -> Result<String, LinkError>;

    /// Per-session counters.
    fn stats(&self) -> StatsSnapshot;
}

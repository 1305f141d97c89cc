//! # Gateway Client
//!
//! The command façade. Each typed operation builds a request under a fresh
//! correlation id, registers it, writes the encoded payload to the command
//! channel, and awaits the correlated response with a fixed per-call
//! timeout. Direct reads (status, protocol version) bypass correlation
//! entirely: they use dedicated read channels.
//!
//! Any number of calls may be in flight concurrently; each await suspends
//! only its own caller. Timed-out requests are never resent internally:
//! resending under a new id is the caller's decision.

use crate::codec;
use crate::config::ClientConfig;
use crate::correlation::CorrelationTable;
use crate::domain::{
    ClockCommand, ClockTime, CommandOutcome, CommandRequest, CorrelationId, DeviceStatus,
    DisplayTextParams, EventEnvelope, EventKind, LinkError, RunParams, SessionState,
    SessionStats, SetTimeParams, StatsSnapshot,
};
use crate::handshake::HandshakeController;
use crate::ports::inbound::GatewayApi;
use crate::ports::outbound::{Channel, Transport};
use crate::router::EventRouter;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Client for one gateway session.
///
/// Constructed over an established transport link; `connect` drives the
/// handshake, after which command operations become available. A client
/// whose session ended can `connect` again, starting a fresh handshake and
/// fresh counters semantics per session.
pub struct GatewayClient<T: Transport> {
    config: ClientConfig,
    transport: Arc<T>,
    correlations: Arc<CorrelationTable>,
    router: Arc<EventRouter>,
    session: Arc<SessionState>,
    stats: Arc<SessionStats>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Transport> GatewayClient<T> {
    /// Client over the given transport.
    pub fn new(config: ClientConfig, transport: Arc<T>) -> Self {
        let correlations = Arc::new(CorrelationTable::new());
        let stats = Arc::new(SessionStats::new());
        let router = Arc::new(EventRouter::new(
            Arc::clone(&correlations),
            Arc::clone(&stats),
        ));
        Self {
            config,
            transport,
            correlations,
            router,
            session: Arc::new(SessionState::new()),
            stats,
            pump: Mutex::new(None),
        }
    }

    /// Drive the handshake to `Ready`.
    ///
    /// Runs a fresh single-shot handshake instance: version probe, event
    /// subscription, bounded wait for the readiness signal. When
    /// `confirm_on_ready` is set, a confirmation `displayText` round trip
    /// is issued after the session becomes usable.
    pub async fn connect(&self) -> Result<(), LinkError> {
        if self.session.is_ready() {
            return Err(LinkError::HandshakeFailed(
                "session already connected".to_string(),
            ));
        }

        self.stats.reset();
        self.session.mark_connected();
        let mut handshake = HandshakeController::new(self.config.clone());
        let pump = match handshake.run(self.transport.as_ref(), &self.router).await {
            Ok(pump) => pump,
            Err(error) => {
                self.session.reset();
                return Err(error);
            }
        };

        if let Ok(mut slot) = self.pump.lock() {
            *slot = Some(pump);
        }
        self.session.mark_ready();
        info!("session ready");

        if self.config.confirm_on_ready {
            let confirmation = self.display_text(DisplayTextParams {
                text: " Connected".to_string(),
                beep: 2,
                left_dots: 0,
                right_dots: 0,
            })
            .await;
            // A session whose confirmation never answered is not usable;
            // tear it down so the caller can retry connect.
            if let Err(error) = confirmation {
                warn!(%error, "confirmation round trip failed; closing session");
                self.disconnect().await;
                return Err(error);
            }
        }
        Ok(())
    }

    /// Tear the session down.
    ///
    /// Stops notifications, wakes every outstanding waiter with
    /// `Disconnected`, and resets session state. Safe to call on an
    /// already-disconnected client.
    pub async fn disconnect(&self) {
        if let Err(error) = self.transport.unsubscribe(Channel::Event).await {
            warn!(%error, "unsubscribe during disconnect");
        }
        let pump = self.pump.lock().ok().and_then(|mut slot| slot.take());
        if let Some(pump) = pump {
            pump.abort();
        }
        self.correlations.fail_all();
        self.session.reset();
        info!("session closed");
    }

    /// Send a raw command with a generated correlation id.
    pub async fn send_command(
        &self,
        command: ClockCommand,
        params: Option<Value>,
    ) -> Result<CommandOutcome, LinkError> {
        self.send_command_with_id(CorrelationId::generate(), command, params)
            .await
    }

    /// Send a raw command under a caller-chosen correlation id.
    pub async fn send_command_with_id(
        &self,
        id: CorrelationId,
        command: ClockCommand,
        params: Option<Value>,
    ) -> Result<CommandOutcome, LinkError> {
        if !self.session.is_ready() {
            return Err(LinkError::NotConnected);
        }

        let request = CommandRequest::new(id.clone(), command.as_str(), params);
        let payload = codec::encode_command(&request)?;
        let handle = self.correlations.register(id.clone())?;

        if let Err(error) = self.transport.write(Channel::Command, &payload).await {
            // The response can never arrive; reclaim the slot immediately.
            self.correlations.remove(&id);
            return Err(error.into());
        }
        self.stats.record_command_sent();
        debug!(%id, command = command.as_str(), "command sent");

        let outcome = self
            .correlations
            .await_response(handle, self.config.response_timeout)
            .await?;
        self.stats.record_response_received();

        if outcome.success {
            Ok(outcome)
        } else {
            let device_error = outcome.device_error();
            Err(LinkError::CommandFailed {
                code: device_error.error_code,
                message: if device_error.error_message.is_empty() {
                    "unknown device error".to_string()
                } else {
                    device_error.error_message
                },
            })
        }
    }

    /// Register an observer for one event kind (time updates, button
    /// presses, errors, system status). The `ConnectionStatus` slot is used
    /// by the handshake during `connect`; re-register after it completes if
    /// needed.
    pub fn on_event<F>(&self, kind: EventKind, observer: F)
    where
        F: Fn(EventEnvelope) + Send + Sync + 'static,
    {
        self.router.set_observer(kind, observer);
    }

    /// Register the fallback observer for unclassified or unobserved kinds.
    pub fn on_unclassified<F>(&self, observer: F)
    where
        F: Fn(EventEnvelope) + Send + Sync + 'static,
    {
        self.router.set_fallback(observer);
    }

    /// Number of requests currently awaiting a response.
    pub fn pending_requests(&self) -> usize {
        self.correlations.len()
    }

    /// Whether the session completed its handshake and is usable.
    pub fn is_ready(&self) -> bool {
        self.session.is_ready()
    }

    fn require_link(&self) -> Result<(), LinkError> {
        if self.session.is_connected() {
            Ok(())
        } else {
            Err(LinkError::NotConnected)
        }
    }
}

#[async_trait]
impl<T: Transport> GatewayApi for GatewayClient<T> {
    async fn set_time(&self, params: SetTimeParams) -> Result<CommandOutcome, LinkError> {
        let params = serde_json::to_value(params).map_err(codec::CodecError::from)?;
        self.send_command(ClockCommand::SetTime, Some(params)).await
    }

    async fn display_text(&self, params: DisplayTextParams) -> Result<CommandOutcome, LinkError> {
        let params = serde_json::to_value(params).map_err(codec::CodecError::from)?;
        self.send_command(ClockCommand::DisplayText, Some(params))
            .await
    }

    async fn end_display(&self) -> Result<CommandOutcome, LinkError> {
        self.send_command(ClockCommand::EndDisplay, None).await
    }

    async fn stop_timers(&self) -> Result<CommandOutcome, LinkError> {
        self.send_command(ClockCommand::Stop, None).await
    }

    async fn run_timers(&self, params: RunParams) -> Result<CommandOutcome, LinkError> {
        let params = serde_json::to_value(params).map_err(codec::CodecError::from)?;
        self.send_command(ClockCommand::Run, Some(params)).await
    }

    async fn get_time(&self) -> Result<ClockTime, LinkError> {
        let outcome = self.send_command(ClockCommand::GetTime, None).await?;
        let time = serde_json::from_value(Value::Object(outcome.result))
            .map_err(codec::CodecError::from)?;
        Ok(time)
    }

    async fn device_status(&self) -> Result<DeviceStatus, LinkError> {
        self.require_link()?;
        let payload = self.transport.read(Channel::Status).await?;
        Ok(codec::decode_status(&payload)?)
    }

    async fn protocol_version(&self) -> Result<String, LinkError> {
        self.require_link()?;
        let payload = self.transport.read(Channel::Version).await?;
        Ok(codec::decode_version(&payload)?)
    }

    fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

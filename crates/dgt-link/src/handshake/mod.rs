//! # Handshake Controller
//!
//! Drives the post-connect sequence as an explicit state machine:
//!
//! ```text
//! Disconnected → TransportUp → VersionChecked → SubscribedForEvents
//!              → AwaitingReady → Ready | Failed
//! ```
//!
//! The gateway announces readiness with a `connectionStatus` event carrying
//! both `connected` and `configured`; the controller performs one bounded
//! wait for it. `Ready` and `Failed` are terminal: a new connection attempt
//! constructs a new controller. Retrying is the caller's decision.

use crate::codec;
use crate::config::ClientConfig;
use crate::domain::{EventKind, LinkError, LinkStatus, PROTOCOL_VERSION};
use crate::ports::outbound::{Channel, Transport};
use crate::router::EventRouter;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Phases of the connection handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakePhase {
    /// No handshake attempted yet.
    Disconnected,
    /// Raw link reported up; sequence started.
    TransportUp,
    /// Version probe completed (mismatch is advisory unless strict).
    VersionChecked,
    /// Event channel subscribed; router pump running.
    SubscribedForEvents,
    /// Bounded wait for the readiness signal in progress.
    AwaitingReady,
    /// Readiness observed; session usable. Terminal.
    Ready,
    /// Sequence failed. Terminal.
    Failed,
}

/// Single-shot controller for one connection attempt.
pub struct HandshakeController {
    config: ClientConfig,
    phase: HandshakePhase,
}

impl HandshakeController {
    /// Controller in the `Disconnected` phase.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            phase: HandshakePhase::Disconnected,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> HandshakePhase {
        self.phase
    }

    /// Run the sequence against an established transport link.
    ///
    /// On success the router pump task handle is returned; it keeps
    /// draining notifications for the life of the session. On failure the
    /// pump is stopped and the event channel unsubscribed (best effort).
    pub async fn run<T>(
        &mut self,
        transport: &T,
        router: &Arc<EventRouter>,
    ) -> Result<JoinHandle<()>, LinkError>
    where
        T: Transport + ?Sized,
    {
        if self.phase != HandshakePhase::Disconnected {
            return Err(LinkError::HandshakeFailed(
                "handshake instance already driven".to_string(),
            ));
        }
        self.phase = HandshakePhase::TransportUp;

        self.check_version(transport).await?;
        self.phase = HandshakePhase::VersionChecked;

        let notifications = match transport
            .subscribe(Channel::Event, self.config.event_buffer)
            .await
        {
            Ok(rx) => rx,
            Err(error) => {
                self.phase = HandshakePhase::Failed;
                return Err(error.into());
            }
        };
        // Watch first, pump second: the readiness event may already be
        // queued and must not be routed before the observer exists.
        let ready_rx = install_ready_watch(router);
        let pump = router.spawn_pump(notifications);
        self.phase = HandshakePhase::SubscribedForEvents;

        debug!(timeout = ?self.config.handshake_timeout, "awaiting readiness signal");
        self.phase = HandshakePhase::AwaitingReady;

        match tokio::time::timeout(self.config.handshake_timeout, ready_rx).await {
            Ok(_) => {
                self.phase = HandshakePhase::Ready;
                info!("gateway reported connected and configured");
                Ok(pump)
            }
            Err(_elapsed) => {
                self.phase = HandshakePhase::Failed;
                pump.abort();
                if let Err(error) = transport.unsubscribe(Channel::Event).await {
                    debug!(%error, "unsubscribe after failed handshake");
                }
                Err(LinkError::HandshakeFailed(format!(
                    "readiness signal not observed within {:?}",
                    self.config.handshake_timeout
                )))
            }
        }
    }

    /// Read and compare the protocol version. Mismatch and probe failure
    /// are advisory unless `strict_version` is set: the connection proceeds
    /// with a warning, matching the gateway's documented tolerance.
    async fn check_version<T>(&mut self, transport: &T) -> Result<(), LinkError>
    where
        T: Transport + ?Sized,
    {
        let version = match transport.read(Channel::Version).await {
            Ok(bytes) => codec::decode_version(&bytes).ok(),
            Err(error) => {
                warn!(%error, "protocol version probe failed");
                None
            }
        };

        match version.as_deref() {
            Some(PROTOCOL_VERSION) => {
                debug!(version = PROTOCOL_VERSION, "protocol version matches");
                Ok(())
            }
            Some(other) => {
                if self.config.strict_version {
                    self.phase = HandshakePhase::Failed;
                    return Err(LinkError::HandshakeFailed(format!(
                        "unsupported protocol version {other:?}, expected {PROTOCOL_VERSION:?}"
                    )));
                }
                warn!(
                    got = other,
                    expected = PROTOCOL_VERSION,
                    "protocol version mismatch; continuing"
                );
                Ok(())
            }
            None => {
                if self.config.strict_version {
                    self.phase = HandshakePhase::Failed;
                    return Err(LinkError::HandshakeFailed(
                        "protocol version unreadable".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Install a single-fire `connectionStatus` watch on the router, returning
/// the receiver that resolves when the gateway is connected and configured.
fn install_ready_watch(router: &Arc<EventRouter>) -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();
    let slot = Mutex::new(Some(tx));
    router.set_observer(EventKind::ConnectionStatus, move |envelope| {
        let status: LinkStatus = envelope.parse_data();
        debug!(connected = status.connected, configured = status.configured, "link status");
        if status.is_ready() {
            if let Ok(mut slot) = slot.lock() {
                if let Some(tx) = slot.take() {
                    let _ = tx.send(());
                }
            }
        }
    });
    rx
}

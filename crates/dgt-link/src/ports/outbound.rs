//! # Outbound Port: Transport
//!
//! Abstraction over the physical link to the gateway. The engine only needs
//! four operations against four logical channels; device discovery,
//! pairing, and reconnect policy all live behind this trait.
//!
//! Notification delivery is an explicit message-passing boundary: a
//! subscription hands back an mpsc receiver of raw payloads, and the
//! transport side must never be blocked by slow consumers beyond the
//! channel's buffer.

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;

/// GATT service UUID advertised by the gateway.
pub const SERVICE_UUID: &str = "73822f6e-edcd-44bb-974b-93ee97cb0000";

/// Advertised device name transports should scan for.
pub const DEVICE_NAME: &str = "DGT3000-Gateway";

/// The gateway's four logical channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Read-only protocol version probe.
    Version,
    /// Write-only command channel.
    Command,
    /// Notification-based event channel.
    Event,
    /// Read-only structured status channel.
    Status,
}

impl Channel {
    /// GATT characteristic UUID backing this channel.
    pub const fn uuid(&self) -> &'static str {
        match self {
            Self::Version => "73822f6e-edcd-44bb-974b-93ee97cb0001",
            Self::Command => "73822f6e-edcd-44bb-974b-93ee97cb0002",
            Self::Event => "73822f6e-edcd-44bb-974b-93ee97cb0003",
            Self::Status => "73822f6e-edcd-44bb-974b-93ee97cb0004",
        }
    }
}

/// Failures of the underlying transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// A write to a channel failed.
    #[error("write to {channel:?} failed: {reason}")]
    WriteFailed {
        /// Target channel.
        channel: Channel,
        /// Backend-specific reason.
        reason: String,
    },

    /// A direct read from a channel failed.
    #[error("read from {channel:?} failed: {reason}")]
    ReadFailed {
        /// Source channel.
        channel: Channel,
        /// Backend-specific reason.
        reason: String,
    },

    /// Subscribing to a channel's notifications failed.
    #[error("subscribe to {channel:?} failed: {reason}")]
    SubscribeFailed {
        /// Target channel.
        channel: Channel,
        /// Backend-specific reason.
        reason: String,
    },

    /// The link dropped out from under an operation.
    #[error("transport link lost")]
    LinkLost,
}

/// Transport over which the engine talks to the gateway.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Write a discrete message to a channel.
    async fn write(&self, channel: Channel, payload: &[u8]) -> Result<(), TransportError>;

    /// Read the current value of a channel (version and status only).
    async fn read(&self, channel: Channel) -> Result<Vec<u8>, TransportError>;

    /// Subscribe to a channel's notifications. Each notification arrives as
    /// one discrete payload on the returned receiver, in delivery order.
    /// `capacity` bounds the receiver's buffer; delivery past a full buffer
    /// waits for the consumer.
    async fn subscribe(
        &self,
        channel: Channel,
        capacity: usize,
    ) -> Result<mpsc::Receiver<Vec<u8>>, TransportError>;

    /// Stop notifications for a channel. Closes the receiver returned by
    /// `subscribe`.
    async fn unsubscribe(&self, channel: Channel) -> Result<(), TransportError>;
}

// =============================================================================
// Mock Implementation for Testing
// =============================================================================

/// In-memory transport simulating a gateway, used by every test in this
/// workspace.
///
/// Behavior knobs:
/// - scripted payloads for version/status reads,
/// - `auto_respond`: every command write is answered with a success
///   `command_response` echoing the request's params as the result,
/// - `ready_on_subscribe`: a ready `connectionStatus` event is queued as
///   soon as the event channel is subscribed, so handshakes complete
///   immediately,
/// - per-operation failure switches.
pub struct MockTransport {
    version_payload: Mutex<Vec<u8>>,
    status_payload: Mutex<Vec<u8>>,
    writes: Mutex<Vec<(Channel, Vec<u8>)>>,
    notify_tx: Mutex<Option<mpsc::Sender<Vec<u8>>>>,
    auto_respond: AtomicBool,
    ready_on_subscribe: AtomicBool,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    fail_subscribe: AtomicBool,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self {
            version_payload: Mutex::new(b"1.0".to_vec()),
            status_payload: Mutex::new(
                json!({
                    "systemState": "Active",
                    "bleConnected": true,
                    "dgtConnected": true,
                    "dgtConfigured": true,
                    "uptime": 42,
                    "freeHeap": 180,
                    "temperature": 38,
                    "commandsProcessed": 0,
                    "eventsGenerated": 0
                })
                .to_string()
                .into_bytes(),
            ),
            writes: Mutex::new(Vec::new()),
            notify_tx: Mutex::new(None),
            auto_respond: AtomicBool::new(false),
            ready_on_subscribe: AtomicBool::new(true),
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            fail_subscribe: AtomicBool::new(false),
        }
    }
}

impl MockTransport {
    /// Mock with default scripted payloads and ready-on-subscribe enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the version channel's payload.
    pub fn set_version(&self, version: &str) {
        if let Ok(mut v) = self.version_payload.lock() {
            *v = version.as_bytes().to_vec();
        }
    }

    /// Script the status channel's payload.
    pub fn set_status_json(&self, status: serde_json::Value) {
        if let Ok(mut s) = self.status_payload.lock() {
            *s = status.to_string().into_bytes();
        }
    }

    /// Answer every command write with a success response echoing params.
    pub fn set_auto_respond(&self, enabled: bool) {
        self.auto_respond.store(enabled, Ordering::SeqCst);
    }

    /// Queue a ready `connectionStatus` event when the event channel is
    /// subscribed. Disable to test handshake timeouts.
    pub fn set_ready_on_subscribe(&self, enabled: bool) {
        self.ready_on_subscribe.store(enabled, Ordering::SeqCst);
    }

    /// Make writes fail.
    pub fn set_fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }

    /// Make direct reads fail.
    pub fn set_fail_reads(&self, enabled: bool) {
        self.fail_reads.store(enabled, Ordering::SeqCst);
    }

    /// Make subscribe fail.
    pub fn set_fail_subscribe(&self, enabled: bool) {
        self.fail_subscribe.store(enabled, Ordering::SeqCst);
    }

    /// Push a raw notification onto the event channel. Returns false when
    /// nothing is subscribed.
    pub async fn notify(&self, payload: Vec<u8>) -> bool {
        let tx = match self.notify_tx.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        };
        match tx {
            Some(tx) => tx.send(payload).await.is_ok(),
            None => false,
        }
    }

    /// Push a JSON notification onto the event channel.
    pub async fn notify_json(&self, value: serde_json::Value) -> bool {
        self.notify(value.to_string().into_bytes()).await
    }

    /// Push a ready `connectionStatus` event.
    pub async fn notify_ready(&self) -> bool {
        self.notify_json(json!({
            "type": "connectionStatus",
            "data": {"connected": true, "configured": true}
        }))
        .await
    }

    /// Raw payloads written so far, per channel.
    pub fn writes(&self) -> Vec<(Channel, Vec<u8>)> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }

    /// Command-channel writes decoded as requests; malformed writes are
    /// skipped.
    pub fn written_commands(&self) -> Vec<crate::domain::CommandRequest> {
        self.writes()
            .into_iter()
            .filter(|(channel, _)| *channel == Channel::Command)
            .filter_map(|(_, bytes)| serde_json::from_slice(&bytes).ok())
            .collect()
    }

    fn ready_event_bytes() -> Vec<u8> {
        json!({
            "type": "connectionStatus",
            "data": {"connected": true, "configured": true}
        })
        .to_string()
        .into_bytes()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn write(&self, channel: Channel, payload: &[u8]) -> Result<(), TransportError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TransportError::WriteFailed {
                channel,
                reason: "simulated write failure".to_string(),
            });
        }

        if let Ok(mut writes) = self.writes.lock() {
            writes.push((channel, payload.to_vec()));
        }

        if channel == Channel::Command && self.auto_respond.load(Ordering::SeqCst) {
            if let Ok(request) =
                serde_json::from_slice::<crate::domain::CommandRequest>(payload)
            {
                let response = json!({
                    "type": "command_response",
                    "id": request.id,
                    "status": "success",
                    "result": request.params.unwrap_or_else(|| json!({})),
                });
                self.notify(response.to_string().into_bytes()).await;
            }
        }

        Ok(())
    }

    async fn read(&self, channel: Channel) -> Result<Vec<u8>, TransportError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(TransportError::ReadFailed {
                channel,
                reason: "simulated read failure".to_string(),
            });
        }

        match channel {
            Channel::Version => Ok(self
                .version_payload
                .lock()
                .map(|v| v.clone())
                .unwrap_or_default()),
            Channel::Status => Ok(self
                .status_payload
                .lock()
                .map(|s| s.clone())
                .unwrap_or_default()),
            other => Err(TransportError::ReadFailed {
                channel: other,
                reason: "channel is not readable".to_string(),
            }),
        }
    }

    async fn subscribe(
        &self,
        channel: Channel,
        capacity: usize,
    ) -> Result<mpsc::Receiver<Vec<u8>>, TransportError> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(TransportError::SubscribeFailed {
                channel,
                reason: "simulated subscribe failure".to_string(),
            });
        }

        let (tx, rx) = mpsc::channel(capacity.max(1));
        if self.ready_on_subscribe.load(Ordering::SeqCst) {
            // Queued before the engine starts draining; capacity > 1.
            let _ = tx.send(Self::ready_event_bytes()).await;
        }
        if let Ok(mut guard) = self.notify_tx.lock() {
            *guard = Some(tx);
        }
        Ok(rx)
    }

    async fn unsubscribe(&self, _channel: Channel) -> Result<(), TransportError> {
        if let Ok(mut guard) = self.notify_tx.lock() {
            *guard = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_uuids_are_distinct() {
        let uuids = [
            Channel::Version.uuid(),
            Channel::Command.uuid(),
            Channel::Event.uuid(),
            Channel::Status.uuid(),
        ];
        for (i, a) in uuids.iter().enumerate() {
            for b in &uuids[i + 1..] {
                assert_ne!(a, b);
            }
            assert!(a.starts_with("73822f6e"));
        }
    }

    #[tokio::test]
    async fn test_mock_read_version() {
        let mock = MockTransport::new();
        let bytes = mock.read(Channel::Version).await.unwrap();
        assert_eq!(bytes, b"1.0");

        mock.set_version("2.0");
        let bytes = mock.read(Channel::Version).await.unwrap();
        assert_eq!(bytes, b"2.0");
    }

    #[tokio::test]
    async fn test_mock_records_writes() {
        let mock = MockTransport::new();
        mock.write(Channel::Command, b"{\"id\":\"x\",\"command\":\"stop\",\"timestamp\":1}")
            .await
            .unwrap();
        assert_eq!(mock.writes().len(), 1);
        assert_eq!(mock.written_commands()[0].command, "stop");
    }

    #[tokio::test]
    async fn test_mock_ready_on_subscribe() {
        let mock = MockTransport::new();
        let mut rx = mock.subscribe(Channel::Event, 16).await.unwrap();
        let payload = rx.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value["type"], "connectionStatus");
        assert_eq!(value["data"]["configured"], true);
    }

    #[tokio::test]
    async fn test_subscribe_capacity_bounds_delivery() {
        let mock = MockTransport::new();
        mock.set_ready_on_subscribe(false);
        let _rx = mock.subscribe(Channel::Event, 2).await.unwrap();

        assert!(mock.notify(b"{}".to_vec()).await);
        assert!(mock.notify(b"{}".to_vec()).await);
        // Buffer full: a further delivery waits for the consumer.
        let blocked = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            mock.notify(b"{}".to_vec()),
        )
        .await;
        assert!(blocked.is_err());
    }

    #[tokio::test]
    async fn test_mock_notify_without_subscriber() {
        let mock = MockTransport::new();
        assert!(!mock.notify(b"{}".to_vec()).await);
    }

    #[tokio::test]
    async fn test_mock_auto_respond_echoes_params() {
        let mock = MockTransport::new();
        mock.set_ready_on_subscribe(false);
        mock.set_auto_respond(true);
        let mut rx = mock.subscribe(Channel::Event, 16).await.unwrap();

        let request = json!({
            "id": "abc123",
            "command": "getTime",
            "timestamp": 1,
            "params": {"seq": 7}
        });
        mock.write(Channel::Command, request.to_string().as_bytes())
            .await
            .unwrap();

        let payload = rx.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value["type"], "command_response");
        assert_eq!(value["id"], "abc123");
        assert_eq!(value["status"], "success");
        assert_eq!(value["result"]["seq"], 7);
    }

    #[tokio::test]
    async fn test_mock_failure_switches() {
        let mock = MockTransport::new();
        mock.set_fail_writes(true);
        assert!(mock.write(Channel::Command, b"x").await.is_err());

        mock.set_fail_reads(true);
        assert!(mock.read(Channel::Status).await.is_err());

        mock.set_fail_subscribe(true);
        assert!(mock.subscribe(Channel::Event, 16).await.is_err());
    }
}

//! # Event Router
//!
//! Demultiplexes the event channel. Every decoded envelope reaches exactly
//! one terminal action:
//!
//! - `command_response` → the correlation table (waking a blocked caller),
//! - any other recognized kind → the observer registered for that kind,
//! - everything else → the fallback observer, or a debug log.
//!
//! The router also owns the pump: a spawned task draining the transport's
//! notification receiver, decoding each payload and routing it. Decode
//! failures are logged and dropped there; they never reach a waiter. The
//! transport's delivery context is decoupled by the mpsc buffer, so
//! routing stays off its critical path.

use crate::codec;
use crate::correlation::CorrelationTable;
use crate::domain::{CommandOutcome, EventEnvelope, EventKind, SessionStats};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Callback invoked with events of one kind. Must be fast and non-blocking;
/// slow consumers should hand off to their own channel.
pub type Observer = Arc<dyn Fn(EventEnvelope) + Send + Sync>;

/// Routes decoded events to the correlation table or to observers.
pub struct EventRouter {
    correlations: Arc<CorrelationTable>,
    observers: Mutex<HashMap<EventKind, Observer>>,
    fallback: Mutex<Option<Observer>>,
    stats: Arc<SessionStats>,
}

impl EventRouter {
    /// Router over the given correlation table and counters.
    pub fn new(correlations: Arc<CorrelationTable>, stats: Arc<SessionStats>) -> Self {
        Self {
            correlations,
            observers: Mutex::new(HashMap::new()),
            fallback: Mutex::new(None),
            stats,
        }
    }

    /// Register (or replace) the observer for one event kind.
    ///
    /// `CommandResponse` observers are never invoked: responses always go
    /// to the correlation table.
    pub fn set_observer<F>(&self, kind: EventKind, observer: F)
    where
        F: Fn(EventEnvelope) + Send + Sync + 'static,
    {
        if let Ok(mut observers) = self.observers.lock() {
            observers.insert(kind, Arc::new(observer));
        }
    }

    /// Register (or replace) the fallback observer for kinds with no
    /// specific observer, including unclassified events.
    pub fn set_fallback<F>(&self, observer: F)
    where
        F: Fn(EventEnvelope) + Send + Sync + 'static,
    {
        if let Ok(mut fallback) = self.fallback.lock() {
            *fallback = Some(Arc::new(observer));
        }
    }

    /// Route one decoded envelope to its single terminal action.
    pub fn route(&self, envelope: EventEnvelope) {
        self.stats.record_event_received();

        let kind = envelope.kind();
        if kind == EventKind::CommandResponse {
            self.route_response(envelope);
            return;
        }

        let observer = self
            .observers
            .lock()
            .ok()
            .and_then(|observers| observers.get(&kind).cloned());
        if let Some(observer) = observer {
            observer(envelope);
            return;
        }

        let fallback = self.fallback.lock().ok().and_then(|f| f.clone());
        match fallback {
            Some(fallback) => fallback(envelope),
            None => debug!(?kind, event_type = %envelope.event_type, "event with no observer"),
        }
    }

    fn route_response(&self, envelope: EventEnvelope) {
        match CommandOutcome::from_envelope(envelope) {
            Some(outcome) => {
                let id = outcome.id.clone();
                // Unknown ids are logged inside resolve and dropped.
                self.correlations.resolve(&id, outcome);
            }
            None => warn!("command response without correlation id dropped"),
        }
    }

    /// Spawn the pump task draining raw notifications into this router.
    /// The task ends when the transport closes the channel (unsubscribe or
    /// link loss), or when aborted at disconnect.
    pub fn spawn_pump(self: &Arc<Self>, mut notifications: mpsc::Receiver<Vec<u8>>) -> JoinHandle<()> {
        let router = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(payload) = notifications.recv().await {
                match codec::decode_event(&payload) {
                    Ok(envelope) => router.route(envelope),
                    Err(error) => {
                        warn!(%error, len = payload.len(), "dropping malformed event payload");
                    }
                }
            }
            debug!("event pump stopped");
        })
    }
}

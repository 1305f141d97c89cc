//! # Session State
//!
//! Connection lifecycle flags and per-session counters. Flags are flipped
//! by the handshake (`ready`) and the connect/disconnect boundary
//! (`connected`); counters are monotonic for the life of a session and
//! reset only when a new session starts.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Connection lifecycle flags for one session.
#[derive(Debug, Default)]
pub struct SessionState {
    connected: AtomicBool,
    ready: AtomicBool,
    connected_at: Mutex<Option<Instant>>,
}

impl SessionState {
    /// Fresh disconnected state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw transport link is up.
    pub fn mark_connected(&self) {
        self.connected.store(true, Ordering::SeqCst);
        if let Ok(mut at) = self.connected_at.lock() {
            *at = Some(Instant::now());
        }
    }

    /// The readiness signal was observed; commands may now be sent.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    /// Tear down: clears both flags and the connection timestamp.
    pub fn reset(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.ready.store(false, Ordering::SeqCst);
        if let Ok(mut at) = self.connected_at.lock() {
            *at = None;
        }
    }

    /// Raw transport link is up.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Handshake completed; the session is usable for commands.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Time since the transport link came up, if connected.
    pub fn uptime(&self) -> Option<Duration> {
        self.connected_at
            .lock()
            .ok()
            .and_then(|at| at.map(|t| t.elapsed()))
    }
}

/// Monotonic per-session counters.
#[derive(Debug, Default)]
pub struct SessionStats {
    commands_sent: AtomicU64,
    responses_received: AtomicU64,
    events_received: AtomicU64,
}

impl SessionStats {
    /// Fresh zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// A command was written to the command channel.
    pub fn record_command_sent(&self) {
        self.commands_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// A correlated response was delivered to its waiter.
    pub fn record_response_received(&self) {
        self.responses_received.fetch_add(1, Ordering::Relaxed);
    }

    /// A decoded event reached the router (regardless of any observer).
    pub fn record_event_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Zero all counters, called when a new session starts.
    pub fn reset(&self) {
        self.commands_sent.store(0, Ordering::Relaxed);
        self.responses_received.store(0, Ordering::Relaxed);
        self.events_received.store(0, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            commands_sent: self.commands_sent.load(Ordering::Relaxed),
            responses_received: self.responses_received.load(Ordering::Relaxed),
            events_received: self.events_received.load(Ordering::Relaxed),
        }
    }
}

/// Counter values at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Commands written to the command channel.
    pub commands_sent: u64,
    /// Correlated responses delivered to waiters.
    pub responses_received: u64,
    /// Decoded events routed, including ones with no interested observer.
    pub events_received: u64,
}

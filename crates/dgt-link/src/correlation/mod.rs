//! # Correlation Table
//!
//! Pending-request bookkeeping: one slot per outstanding correlation id,
//! holding a single-fire wake channel to the caller awaiting that id.
//!
//! Claiming a slot means removing its map entry while holding the lock, so
//! normal resolution, timeout cleanup, and disconnect flush are mutually
//! exclusive: whichever removes the entry first wins and the others become
//! no-ops. The lock is never held across an await.

use crate::domain::{CommandOutcome, CorrelationId, LinkError};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

type SlotResult = Result<CommandOutcome, LinkError>;

struct PendingSlot {
    tx: oneshot::Sender<SlotResult>,
}

/// Handle held by the caller awaiting one response.
pub struct WaitHandle {
    id: CorrelationId,
    rx: oneshot::Receiver<SlotResult>,
}

impl WaitHandle {
    /// Correlation id this handle is waiting on.
    pub fn id(&self) -> &CorrelationId {
        &self.id
    }
}

/// Table of in-flight requests keyed by correlation id.
///
/// Invariant: size equals requests registered minus responses delivered
/// minus timeouts fired minus disconnect flushes, and is never negative.
#[derive(Default)]
pub struct CorrelationTable {
    slots: Mutex<HashMap<CorrelationId, PendingSlot>>,
}

impl CorrelationTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CorrelationId, PendingSlot>> {
        match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Register a pending slot for `id`.
    ///
    /// Rejects an id that already has a pending slot: silently overwriting
    /// would drop the earlier waiter permanently.
    pub fn register(&self, id: CorrelationId) -> Result<WaitHandle, LinkError> {
        let (tx, rx) = oneshot::channel();
        let mut slots = self.lock();
        if slots.contains_key(&id) {
            return Err(LinkError::DuplicateCorrelation(id));
        }
        slots.insert(id.clone(), PendingSlot { tx });
        Ok(WaitHandle { id, rx })
    }

    /// Deliver a response to the waiter for `id`, waking it exactly once.
    ///
    /// Returns true when a waiter was woken. An unknown id (already timed
    /// out, already resolved, or never registered) is logged and dropped.
    pub fn resolve(&self, id: &CorrelationId, outcome: CommandOutcome) -> bool {
        let slot = self.lock().remove(id);
        match slot {
            Some(slot) => {
                if slot.tx.send(Ok(outcome)).is_err() {
                    debug!(%id, "waiter abandoned before response delivery");
                    return false;
                }
                true
            }
            None => {
                warn!(%id, "response for unknown correlation id dropped");
                false
            }
        }
    }

    /// Remove the slot for `id` without waking anyone, e.g. after a failed
    /// transport write. Returns true when a slot was present.
    pub fn remove(&self, id: &CorrelationId) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Block the calling task until the slot resolves or `timeout` elapses.
    ///
    /// On timeout the caller claims its own slot; if resolution claimed it
    /// first, the already-delivered value is returned instead of a timeout.
    pub async fn await_response(
        &self,
        handle: WaitHandle,
        timeout: Duration,
    ) -> Result<CommandOutcome, LinkError> {
        let WaitHandle { id, mut rx } = handle;

        match tokio::time::timeout(timeout, &mut rx).await {
            Ok(Ok(delivered)) => delivered,
            // Sender dropped without a send: the slot was consumed out from
            // under this waiter.
            Ok(Err(_closed)) => Err(LinkError::UnknownCorrelation(id)),
            Err(_elapsed) => {
                if self.remove(&id) {
                    debug!(%id, "request timed out; slot removed");
                    return Err(LinkError::Timeout { id });
                }
                // Resolution won the removal race; the value may already be
                // in the channel.
                match rx.try_recv() {
                    Ok(delivered) => delivered,
                    Err(_) => Err(LinkError::Timeout { id }),
                }
            }
        }
    }

    /// Wake every outstanding waiter with `Disconnected` and empty the
    /// table. Called at session teardown so no waiter is left to time out
    /// naturally.
    pub fn fail_all(&self) {
        let drained: Vec<(CorrelationId, PendingSlot)> = self.lock().drain().collect();
        let count = drained.len();
        for (id, slot) in drained {
            if slot.tx.send(Err(LinkError::Disconnected)).is_err() {
                debug!(%id, "waiter already gone during disconnect flush");
            }
        }
        if count > 0 {
            debug!(count, "flushed pending requests on disconnect");
        }
    }

    /// Number of outstanding requests.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// No outstanding requests.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` currently has a pending slot.
    pub fn contains(&self, id: &CorrelationId) -> bool {
        self.lock().contains_key(id)
    }
}

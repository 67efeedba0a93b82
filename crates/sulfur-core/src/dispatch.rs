use std::panic::{catch_unwind, AssertUnwindSafe};

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::error;

/// An opaque unit of work to run on the owning context.
pub type PendingAction = Box<dyn FnOnce() + Send + 'static>;

/// Thread-safe FIFO handoff from background workers to the owning context.
///
/// Any thread may enqueue at any time; only the owning context drains, on
/// its own schedule (once per tick). This queue is the only sanctioned path
/// for background work to touch catalog or host-facing state afterwards.
pub struct DispatchQueue {
    tx: Sender<PendingAction>,
    rx: Receiver<PendingAction>,
}

impl DispatchQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Append an action to the tail. Never blocks.
    pub fn enqueue<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        // Send only fails when the receiver half is gone, and we own both.
        let _ = self.tx.send(Box::new(action));
    }

    /// Run every action that was queued before this call, in enqueue order.
    ///
    /// A panicking action is logged and does not abort the rest of the
    /// drain. Actions enqueued while draining wait for the next cycle.
    /// Returns the number of actions run.
    pub fn drain_all(&self) -> usize {
        let pending: Vec<PendingAction> = self.rx.try_iter().collect();
        let count = pending.len();
        for action in pending {
            if catch_unwind(AssertUnwindSafe(action)).is_err() {
                error!("dispatched action panicked; continuing drain");
            }
        }
        count
    }
}

impl Default for DispatchQueue {
    fn default() -> Self {
        Self::new()
    }
}

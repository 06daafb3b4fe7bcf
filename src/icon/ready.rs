//! One-shot readiness rendezvous between a backend and the setup thread.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};

/// The producing side, handed to a backend's `run`/`run_detached`.
///
/// Clones share the same slot: whichever clone fires first wins, and every
/// later [`fire`](Self::fire) or [`cancel`](Self::cancel) is a no-op.
#[derive(Clone)]
pub struct ReadySignal {
    slot: Arc<Mutex<Option<SyncSender<()>>>>,
}

/// The consuming side, owned by the setup thread.
pub struct ReadyWaiter {
    receiver: Receiver<()>,
}

/// Creates a connected signal/waiter pair.
pub fn ready_pair() -> (ReadySignal, ReadyWaiter) {
    let (sender, receiver) = sync_channel(1);
    (
        ReadySignal {
            slot: Arc::new(Mutex::new(Some(sender))),
        },
        ReadyWaiter { receiver },
    )
}

impl ReadySignal {
    /// Marks the native loop as initialized, waking the waiter.
    pub fn fire(&self) {
        if let Some(sender) = self.slot.lock().take() {
            let _ = sender.send(());
        }
    }

    /// Wakes the waiter without reporting readiness.
    pub fn cancel(&self) {
        self.slot.lock().take();
    }

    /// Returns `true` until the signal has been fired or cancelled.
    pub fn is_pending(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl ReadyWaiter {
    /// Blocks until the signal fires (`true`) or is cancelled (`false`).
    pub fn wait(self) -> bool {
        self.receiver.recv().is_ok()
    }
}

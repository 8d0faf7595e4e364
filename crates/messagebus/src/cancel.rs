//! The external cancellation scope a [`crate::broker::Broker`] subscriber is
//! tied to.
//!
//! Grounded on the teacher's `subscription::CancellationSignal`: an atomic
//! flag plus a [`tokio::sync::Notify`] so firing it is idempotent and every
//! waiter wakes, whether they started waiting before or after the fire.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// A one-shot, broadcastable cancellation handle.
///
/// Cloning a `CancellationSignal` directly would duplicate the flag; callers
/// share one signal across tasks by wrapping it in `Arc`, matching how the
/// broker hands the same `Arc<CancellationSignal>` to both the caller and its
/// own housekeeping task.
#[derive(Debug, Default)]
pub struct CancellationSignal {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Fire the signal. Idempotent: firing twice has the same effect as
    /// firing once.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve immediately if already cancelled, otherwise wait for `cancel`.
    ///
    /// `notify_waiters` only wakes tasks already registered as waiters at the
    /// time it's called, so a naive "check flag, then await notified()" has a
    /// gap: a `cancel()` landing between the check and the first poll of
    /// `notified()` would be missed, hanging this call forever. `enable()`
    /// registers the waiter before the flag is (re)checked, closing the gap.
    pub async fn cancelled(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

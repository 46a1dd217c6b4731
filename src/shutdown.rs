use crossbeam_utils::CachePadded;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct SharedState {
    raised: CachePadded<AtomicBool>,
    notify: Notify,
}

/// One-shot broadcast cancellation signal.
///
/// Clones share the same flag. Once raised it stays raised; every current and
/// future waiter observes it.
#[derive(Debug, Clone, Default)]
pub struct Shutdown(Arc<SharedState>);

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the signal and wakes every waiter.
    ///
    /// Returns `true` only for the call that actually raised it.
    pub fn trigger(&self) -> bool {
        if self.0.raised.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.0.notify.notify_waiters();
        true
    }

    #[inline]
    pub fn is_raised(&self) -> bool {
        self.0.raised.load(Ordering::Acquire)
    }

    /// Resolves once the signal has been raised.
    pub async fn wait(&self) {
        loop {
            // `notified()` is registered for `notify_waiters` as soon as it is
            // created, so a trigger between the check and the await is not lost.
            let notified = self.0.notify.notified();

            if self.is_raised() {
                return;
            }

            notified.await;
        }
    }
}

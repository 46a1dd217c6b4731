//! Counting semaphores that enforce the bounded-buffer capacity contract.
//!
//! `free` counts the slots a producer may write, `filled` the slots a consumer may
//! read. A producer turns one `free` unit into one `filled` unit and a consumer does
//! the reverse, so the pair always sums to the buffer capacity once nobody is in
//! the middle of an operation.
//!
//! Waiting is built from an atomic count and a `Notify`, the same double-check
//! pattern the shutdown signal uses: register interest first, re-check the count,
//! then sleep. Every wait also races the shutdown signal.

use crate::error::ShutdownInProgress;
use crate::shutdown::Shutdown;
use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// A counting semaphore bounded to `[0, capacity]`.
#[derive(Debug)]
pub struct CountingSemaphore {
    count: CachePadded<AtomicUsize>,
    capacity: usize,
    notify: Notify,
}

impl CountingSemaphore {
    /// Creates a semaphore holding `initial` units out of `capacity`.
    ///
    /// # Panics
    ///
    /// Panics if `initial > capacity`.
    pub fn new(initial: usize, capacity: usize) -> Self {
        assert!(
            initial <= capacity,
            "initial count {initial} exceeds capacity {capacity}"
        );
        Self {
            count: CachePadded::new(AtomicUsize::new(initial)),
            capacity,
            notify: Notify::new(),
        }
    }

    /// Takes one unit if any is available, without waiting.
    pub fn try_acquire(&self) -> bool {
        let mut current = self.count.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return false;
            }
            match self.count.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Waits for one unit, or for the shutdown signal, whichever comes first.
    ///
    /// A raised signal always wins, even if a unit is available at the same time.
    ///
    /// # Cancellation Safety
    ///
    /// The unit is taken synchronously in the same poll that returns `Ok`, so
    /// dropping this future never leaks a unit.
    pub async fn acquire(&self, shutdown: &Shutdown) -> Result<(), ShutdownInProgress> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Become a registered waiter before checking, so a `release` between
            // the check and the await targets us.
            notified.as_mut().enable();

            if shutdown.is_raised() {
                return Err(ShutdownInProgress);
            }

            if self.try_acquire() {
                self.pass_on();
                return Ok(());
            }

            tokio::select! {
                biased;
                _ = shutdown.wait() => return Err(ShutdownInProgress),
                _ = &mut notified => {}
            }
        }
    }

    /// Returns one unit and wakes one waiter.
    ///
    /// # Panics
    ///
    /// Panics if the count would exceed capacity, which means a unit was released
    /// without a matching acquire.
    pub fn release(&self) {
        let previous = self.count.fetch_add(1, Ordering::AcqRel);
        assert!(
            previous < self.capacity,
            "release would exceed capacity {}",
            self.capacity
        );
        self.notify.notify_one();
    }

    /// Snapshot of the current count. Diagnostic only, stale as soon as it is read.
    #[inline]
    pub fn available(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // Several releases can collapse into one stored wakeup; whoever wins a unit
    // hands the wakeup on while units remain.
    fn pass_on(&self) {
        if self.count.load(Ordering::Acquire) > 0 {
            self.notify.notify_one();
        }
    }
}

/// The `free`/`filled` pair guarding one ring buffer.
#[derive(Debug)]
pub struct SlotSemaphores {
    pub free: CountingSemaphore,
    pub filled: CountingSemaphore,
}

impl SlotSemaphores {
    /// `free` starts full, `filled` starts empty.
    pub fn new(capacity: usize) -> Self {
        Self {
            free: CountingSemaphore::new(capacity, capacity),
            filled: CountingSemaphore::new(0, capacity),
        }
    }

    /// Checks `free + filled == capacity`. Only meaningful when no acquire or
    /// release is in flight.
    pub fn is_balanced(&self) -> bool {
        self.free.available() + self.filled.available() == self.free.capacity()
    }
}

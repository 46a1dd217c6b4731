//! Provides `Fence`, the async-spin lock that guards the shared ring buffer.
//!
//! A `Fence<T>` owns the state it protects. The only way to reach that state is
//! through a `Guard`, so every read, write and full/empty determination on the
//! buffer happens inside one critical section. Waiting tasks never block a
//! runtime thread: they retry with `compare_exchange` and yield to the scheduler
//! between attempts via `tokio::task::yield_now()`.
//!
//! Critical sections in `sluice` are short and never span an `.await`, which is
//! what makes the spin-and-yield strategy adequate here.

use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};

/// An RAII guard that signifies a `Fence` has been locked.
///
/// When this guard is `drop`ped, it releases the `Fence`. Because release happens
/// in `Drop`, the lock is freed on every exit path, unwinding included.
pub struct Guard<'a, T> {
    fence: &'a Fence<T>,
}

impl<T> Deref for Guard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // SAFETY: holding the guard means the flag is set by us, so no other
        // reference to the value exists.
        unsafe { &*self.fence.value.get() }
    }
}

impl<T> DerefMut for Guard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: same as `deref`; the guard is the unique access path.
        unsafe { &mut *self.fence.value.get() }
    }
}

impl<T> Drop for Guard<'_, T> {
    fn drop(&mut self) {
        // Release ordering publishes every write made under the lock to the next holder.
        self.fence.flag.store(false, Ordering::Release);
    }
}

/// A lightweight asynchronous lock that owns the value it protects.
///
/// The lock state is an `AtomicBool` wrapped in `CachePadded` to keep it off the
/// cache lines of neighbouring hot atomics.
#[derive(Debug, Default)]
pub struct Fence<T> {
    flag: CachePadded<AtomicBool>,
    value: UnsafeCell<T>,
}

// SAFETY: access to `value` is serialized by `flag`; moving `T` between threads
// requires `T: Send`, and that is all a lock needs to be shared.
unsafe impl<T: Send> Send for Fence<T> {}
unsafe impl<T: Send> Sync for Fence<T> {}

impl<T> Fence<T> {
    pub fn new(value: T) -> Self {
        Self {
            flag: CachePadded::new(AtomicBool::new(false)),
            value: UnsafeCell::new(value),
        }
    }

    /// Attempts to acquire the lock immediately.
    ///
    /// Returns `None` if the lock is currently held by another task.
    #[inline]
    pub fn try_lock(&self) -> Option<Guard<'_, T>> {
        if self
            .flag
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(Guard { fence: self })
        } else {
            None
        }
    }

    /// Acquires the lock, yielding to the scheduler until it becomes free.
    pub async fn lock(&self) -> Guard<'_, T> {
        loop {
            if let Some(guard) = self.try_lock() {
                return guard;
            }
            tokio::task::yield_now().await;
        }
    }

    /// Runs `f` with exclusive access to the protected value.
    ///
    /// The closure is synchronous, so the lock can never be held across an await point.
    pub async fn with_lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.lock().await;
        f(&mut guard)
    }

    /// Returns `true` while some task holds the lock. Diagnostic only.
    pub fn is_locked(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

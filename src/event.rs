//! Structured diagnostic events and the observer seam they are delivered through.

use crate::worker::WorkerId;

/// Everything a run reports about itself.
///
/// `ProduceAttempt`, `ItemProduced` and `ItemConsumed` are only emitted in verbose
/// mode. The rest are always emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    BufferInitialized {
        capacity: usize,
        producers: usize,
        consumers: usize,
    },
    WorkerStarted {
        worker: WorkerId,
    },
    /// A producer drew `value` and is about to wait for a free slot. `free` is a
    /// stale snapshot of the free count.
    ProduceAttempt {
        worker: WorkerId,
        value: u32,
        free: usize,
        capacity: usize,
    },
    ItemProduced {
        op: u64,
        worker: WorkerId,
        value: u32,
        slot: usize,
        before: Vec<Option<u32>>,
        after: Vec<Option<u32>>,
    },
    ItemConsumed {
        op: u64,
        worker: WorkerId,
        value: u32,
        slot: usize,
        before: Vec<Option<u32>>,
        after: Vec<Option<u32>>,
    },
    /// Observed under the buffer lock right after a write filled the last slot.
    BufferFull {
        op: u64,
        occupied: usize,
        capacity: usize,
    },
    /// Observed under the buffer lock right after a read emptied the buffer.
    BufferEmpty {
        op: u64,
        capacity: usize,
    },
    /// Best-effort: the consumer saw a single filled unit before waiting.
    LastItemWarning {
        worker: WorkerId,
    },
    WorkerStopped {
        worker: WorkerId,
        processed: usize,
    },
    AllStopped {
        produced: usize,
        consumed: usize,
        remaining: usize,
    },
}

/// Receives every [`Event`] of a run.
///
/// Buffer events are delivered while the buffer lock is held, so implementations
/// must return quickly and must not block.
pub trait Observer: Send + Sync + 'static {
    fn observe(&self, event: &Event);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Observer for Silent {
    fn observe(&self, _event: &Event) {}
}

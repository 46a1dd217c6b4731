use crate::config::Settings;
use crate::event::{Event, Observer};
use crate::fence::Fence;
use crate::ring_buffer::RingBuffer;
use crate::semaphore::SlotSemaphores;
use crate::shutdown::Shutdown;
use std::sync::Arc;

/// State that only changes under the buffer lock.
#[derive(Debug)]
pub(crate) struct Ledger {
    pub(crate) ring: RingBuffer<u32>,
    /// Global operation order, bumped once per read or write.
    pub(crate) operations: u64,
}

impl Ledger {
    #[inline]
    pub(crate) fn next_op(&mut self) -> u64 {
        self.operations += 1;
        self.operations
    }
}

/// Everything the workers of one run share.
///
/// Owned by the coordinator and handed to each worker as an `Arc`.
pub(crate) struct Context {
    pub(crate) settings: Settings,
    pub(crate) buffer: Fence<Ledger>,
    pub(crate) slots: SlotSemaphores,
    pub(crate) shutdown: Shutdown,
    observer: Arc<dyn Observer>,
}

impl Context {
    pub(crate) fn new(settings: Settings, observer: Arc<dyn Observer>) -> Self {
        let capacity = settings.capacity;
        Self {
            settings,
            buffer: Fence::new(Ledger {
                ring: RingBuffer::new(capacity),
                operations: 0,
            }),
            slots: SlotSemaphores::new(capacity),
            shutdown: Shutdown::new(),
            observer,
        }
    }

    #[inline]
    pub(crate) fn emit(&self, event: Event) {
        self.observer.observe(&event);
    }

    #[inline]
    pub(crate) fn verbose(&self) -> bool {
        self.settings.verbose
    }
}

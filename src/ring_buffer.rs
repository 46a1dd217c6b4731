//! Defines `RingBuffer`, the fixed-capacity circular storage shared by every worker.
//!
//! `RingBuffer` carries no concurrency policy of its own. It is only ever reached
//! through the `Fence` that owns it, and callers must have taken the matching
//! semaphore unit before touching it:
//!
//! 1.  **Write**: the caller holds one `free` unit, so the slot under the write
//!     cursor is guaranteed to be empty.
//! 2.  **Read**: the caller holds one `filled` unit, so the slot under the read
//!     cursor is guaranteed to hold a value.
//!
//! Both guarantees are still asserted on every operation. A failed assertion means
//! the semaphore discipline was broken somewhere, and continuing would corrupt data.

/// A fixed-size circular buffer.
///
/// Empty slots are `None`. Consumed slots are cleared back to `None`, which keeps
/// diagnostic snapshots honest about which region is free.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Box<[Option<T>]>,
    write_cursor: usize,
    read_cursor: usize,
    occupied: usize,
}

impl<T> RingBuffer<T> {
    /// Creates a new `RingBuffer` with every slot empty.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Configuration is validated before any buffer is built.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be at least 1");

        let slots = (0..capacity)
            .map(|_| None)
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            slots,
            write_cursor: 0,
            read_cursor: 0,
            occupied: 0,
        }
    }

    /// Stores `value` under the write cursor and advances it. Returns the slot index.
    ///
    /// # Panics
    ///
    /// Panics if the target slot still holds an unconsumed value.
    pub fn write(&mut self, value: T) -> usize {
        let index = self.write_cursor;
        let slot = &mut self.slots[index];
        assert!(slot.is_none(), "overwrite of unconsumed slot {index}");

        *slot = Some(value);
        self.write_cursor = self.advance(index);
        self.occupied += 1;
        self.debug_check();
        index
    }

    /// Takes the value under the read cursor, clears the slot and advances the cursor.
    ///
    /// Returns the slot index together with the value.
    ///
    /// # Panics
    ///
    /// Panics if the slot under the read cursor is empty.
    pub fn read(&mut self) -> (usize, T) {
        let index = self.read_cursor;
        let Some(value) = self.slots[index].take() else {
            panic!("read of empty slot {index}");
        };

        self.read_cursor = self.advance(index);
        self.occupied -= 1;
        self.debug_check();
        (index, value)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots currently holding an unconsumed value.
    #[inline]
    pub fn len(&self) -> usize {
        self.occupied
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.occupied == self.capacity()
    }

    #[inline]
    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    #[inline]
    pub fn read_cursor(&self) -> usize {
        self.read_cursor
    }

    #[inline]
    fn advance(&self, index: usize) -> usize {
        (index + 1) % self.capacity()
    }

    // The occupied region starts at the read cursor and ends right before the write cursor.
    #[inline]
    fn debug_check(&self) {
        debug_assert!(self.occupied <= self.capacity());
        debug_assert_eq!(
            self.write_cursor,
            (self.read_cursor + self.occupied) % self.capacity()
        );
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Copies every slot, empty ones included, for diagnostic output.
    pub fn snapshot(&self) -> Vec<Option<T>> {
        self.slots.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_creation_and_capacity() {
        // Any positive capacity works, powers of two are not required
        let rb = RingBuffer::<u32>::new(5);
        assert_eq!(rb.capacity(), 5);
        assert!(rb.is_empty());
        assert!(!rb.is_full());

        let rb = RingBuffer::<u32>::new(1);
        assert_eq!(rb.capacity(), 1);
    }

    #[test]
    #[should_panic(expected = "capacity must be at least 1")]
    fn test_ring_buffer_invalid_capacity_zero() {
        RingBuffer::<u32>::new(0);
    }

    #[test]
    fn test_cursors_wrap_around() {
        let mut rb = RingBuffer::<u32>::new(3);

        assert_eq!(rb.write(10), 0);
        assert_eq!(rb.write(20), 1);
        assert_eq!(rb.write(30), 2);
        assert!(rb.is_full());
        assert_eq!(rb.write_cursor(), 0);

        assert_eq!(rb.read(), (0, 10));
        assert_eq!(rb.read_cursor(), 1);

        // Slot 0 is free again, the write cursor wraps into it
        assert_eq!(rb.write(40), 0);
        assert_eq!(rb.read(), (1, 20));
        assert_eq!(rb.read(), (2, 30));
        assert_eq!(rb.read(), (0, 40));
        assert!(rb.is_empty());
        assert_eq!(rb.read_cursor(), 1);
        assert_eq!(rb.write_cursor(), 1);
    }

    #[test]
    fn test_read_clears_slot() {
        let mut rb = RingBuffer::<u32>::new(3);
        rb.write(7);
        rb.write(8);
        assert_eq!(rb.snapshot(), vec![Some(7), Some(8), None]);

        rb.read();
        assert_eq!(rb.snapshot(), vec![None, Some(8), None]);
        assert_eq!(rb.len(), 1);
    }

    #[test]
    #[should_panic(expected = "overwrite of unconsumed slot 0")]
    fn test_write_into_full_buffer_panics() {
        let mut rb = RingBuffer::<u32>::new(2);
        rb.write(1);
        rb.write(2);
        rb.write(3);
    }

    #[test]
    #[should_panic(expected = "read of empty slot 0")]
    fn test_read_from_empty_buffer_panics() {
        let mut rb = RingBuffer::<u32>::new(2);
        rb.read();
    }

    #[test]
    fn test_ring_buffer_stores_initial_none() {
        let rb = RingBuffer::<String>::new(4);
        assert!(rb.snapshot().iter().all(Option::is_none));
    }
}

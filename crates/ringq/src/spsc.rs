use crate::invariants::{
    debug_assert_bounded_count, debug_assert_monotonic, debug_assert_read_not_past_write,
};
use crate::metrics::{record, Metrics};
use crate::padding::{Padded, Padding, Unpadded};
use crate::shim::atomic::{AtomicU64, Ordering};
use crate::shim::thread;
use crate::slots::{Addressing, Bitmask, Slots};
use crate::trace::debug;
use crate::{Config, ConfigError, Empty, Full, MetricsSnapshot, RingBuffer, SplitRing};

// =============================================================================
// MEMORY ORDERING
// =============================================================================
//
// **Producer (enqueue):**
// 1. Load `write` with Relaxed (only the producer stores it)
// 2. Load `read` with Acquire (pairs with the consumer's Release store, so the
//    consumer's move out of the slot happens-before we overwrite it)
// 3. Write the slot
// 4. Store `write + 1` with Release (publishes the slot to the consumer)
//
// **Consumer (dequeue):** the mirror image on `read` / `write`.
//
// Whether `write` and `read` share a cache line is the only difference
// between `SpscRing<T, Unpadded>` and `SpscRing<T, Padded>`.
//
// =============================================================================

/// Single-producer single-consumer ring with atomic indices.
///
/// `!Sync`. Use it directly from one thread, or [`split`](crate::split) it
/// into a `Producer`/`Consumer` pair. Requires a power-of-two capacity.
pub struct SpscRing<T, P: Padding> {
    /// Written by producer, read by consumer
    write: P::Cell<AtomicU64>,
    /// Written by consumer, read by producer
    read: P::Cell<AtomicU64>,
    capacity: u64,
    slots: Slots<T>,
    metrics: Metrics,
    config: Config,
}

/// [`SpscRing`] with both indices on one cache line.
pub type UnpaddedSpscRing<T> = SpscRing<T, Unpadded>;

/// [`SpscRing`] with each index on its own cache line.
pub type PaddedSpscRing<T> = SpscRing<T, Padded>;

impl<T, P: Padding> SpscRing<T, P> {
    /// Creates a ring with `capacity` slots and metrics disabled.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        Self::with_config(Config::new(capacity, false))
    }

    /// Creates a ring from a full configuration.
    pub fn with_config(config: Config) -> Result<Self, ConfigError> {
        config.validate::<Bitmask>()?;
        debug!(
            capacity = config.capacity,
            variant = "spsc",
            padding = std::any::type_name::<P>(),
            "ring created"
        );
        Ok(Self {
            write: P::cell(AtomicU64::new(0)),
            read: P::cell(AtomicU64::new(0)),
            capacity: config.capacity as u64,
            slots: Slots::new(config.capacity),
            metrics: Metrics::new(),
            config,
        })
    }
}

impl<T, P: Padding> RingBuffer<T> for SpscRing<T, P> {
    fn enqueue(&self, item: T) -> Result<(), Full<T>> {
        let read = self.read.load(Ordering::Acquire);
        let write = self.write.load(Ordering::Relaxed);

        if write.wrapping_sub(read) == self.capacity {
            record!(self.config, self.metrics, add_full_rejection);
            thread::yield_now();
            return Err(Full(item));
        }

        // SAFETY: only the producer writes slots, and slot `write` is vacant:
        // the Acquire load of `read` shows the consumer has moved out of it.
        unsafe { self.slots.write(Bitmask::slot(write, self.capacity), item) };

        let new_write = write.wrapping_add(1);
        debug_assert_bounded_count!(new_write.wrapping_sub(read), self.capacity);
        debug_assert_monotonic!("write", write, new_write);
        self.write.store(new_write, Ordering::Release);

        record!(self.config, self.metrics, add_enqueued, 1);
        Ok(())
    }

    fn dequeue(&self) -> Result<T, Empty> {
        let write = self.write.load(Ordering::Acquire);
        let read = self.read.load(Ordering::Relaxed);

        if write == read {
            record!(self.config, self.metrics, add_empty_rejection);
            thread::yield_now();
            return Err(Empty);
        }

        // SAFETY: only the consumer reads slots, and slot `read` was published
        // by the producer's Release store of `write`, which we acquired.
        let item = unsafe { self.slots.take(Bitmask::slot(read, self.capacity)) };

        let new_read = read.wrapping_add(1);
        debug_assert_read_not_past_write!(new_read, write);
        self.read.store(new_read, Ordering::Release);

        record!(self.config, self.metrics, add_dequeued, 1);
        Ok(item)
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.config.capacity()
    }

    #[inline]
    fn len(&self) -> usize {
        // `read` first: `write` can only have grown by the time we load it.
        let read = self.read.load(Ordering::Acquire);
        let write = self.write.load(Ordering::Acquire);
        write.wrapping_sub(read).min(self.capacity) as usize
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

// SAFETY: `enqueue` stores only `write` and vacant slots, `dequeue` stores
// only `read` and moves out of published slots; handoff is Release/Acquire.
unsafe impl<T, P: Padding> SplitRing<T> for SpscRing<T, P> {}

impl<T, P: Padding> Drop for SpscRing<T, P> {
    fn drop(&mut self) {
        let read = self.read.load(Ordering::Relaxed);
        let write = self.write.load(Ordering::Relaxed);
        // SAFETY: `&mut self` rules out concurrent access; exactly the slots
        // in [read, write) hold items.
        unsafe { self.slots.drop_range::<Bitmask>(read, write) };
    }
}

//! SPSC rings that cache the other side's index.
//!
//! The producer keeps a private copy of `read`, the consumer a private copy
//! of `write`. The shared index is only loaded when the private copy says
//! the ring is full (producer) or empty (consumer), so a ring that is
//! neither touches the other side's cache line once per lap instead of once
//! per operation.

use crate::invariants::{
    debug_assert_bounded_count, debug_assert_monotonic, debug_assert_read_not_past_write,
};
use crate::metrics::{record, Metrics};
use crate::shim::atomic::{AtomicU64, Ordering};
use crate::shim::thread;
use crate::slots::{Addressing, Bitmask, Slots};
use crate::trace::debug;
use crate::{Config, ConfigError, Empty, Full, MetricsSnapshot, RingBuffer, SplitRing};
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;

// =============================================================================
// SINGLE-WRITER FIELDS
// =============================================================================
//
// `read_cache` is read and written only by the producer, `write_cache` only
// by the consumer. They sit in `UnsafeCell` without atomics; the SPSC split
// guarantees one thread per side.
//
// =============================================================================

/// Layout and slot handoff shared by [`CachedRing`] and
/// [`BlockingCachedRing`].
struct CachedCore<T> {
    /// Written by producer, read by consumer
    write: CachePadded<AtomicU64>,
    /// Written by consumer, read by producer
    read: CachePadded<AtomicU64>,
    /// Consumer's view of `write`
    write_cache: CachePadded<UnsafeCell<u64>>,
    /// Producer's view of `read`
    read_cache: CachePadded<UnsafeCell<u64>>,
    capacity: u64,
    slots: Slots<T>,
    metrics: Metrics,
    config: Config,
}

impl<T> CachedCore<T> {
    fn new(config: Config, variant: &'static str) -> Result<Self, ConfigError> {
        config.validate::<Bitmask>()?;
        debug!(capacity = config.capacity, variant, "ring created");
        Ok(Self {
            write: CachePadded::new(AtomicU64::new(0)),
            read: CachePadded::new(AtomicU64::new(0)),
            write_cache: CachePadded::new(UnsafeCell::new(0)),
            read_cache: CachePadded::new(UnsafeCell::new(0)),
            capacity: config.capacity as u64,
            slots: Slots::new(config.capacity),
            metrics: Metrics::new(),
            config,
        })
    }

    /// Producer: is slot `write` free? Loads `read` only when the cached
    /// copy says the ring is full.
    #[inline]
    fn has_room(&self, write: u64) -> bool {
        // SAFETY: `read_cache` is producer-owned; see SINGLE-WRITER FIELDS.
        let cached = unsafe { *self.read_cache.get() };
        if write.wrapping_sub(cached) < self.capacity {
            return true;
        }

        let read = self.read.load(Ordering::Acquire);
        // SAFETY: as above. The Acquire load pairs with the consumer's Release.
        unsafe { *self.read_cache.get() = read };
        write.wrapping_sub(read) < self.capacity
    }

    /// Consumer: is slot `read` published? Loads `write` only when the
    /// cached copy says the ring is empty.
    #[inline]
    fn has_item(&self, read: u64) -> bool {
        // SAFETY: `write_cache` is consumer-owned; see SINGLE-WRITER FIELDS.
        let cached = unsafe { *self.write_cache.get() };
        if cached != read {
            return true;
        }

        let write = self.write.load(Ordering::Acquire);
        // SAFETY: as above. The Acquire load pairs with the producer's Release.
        unsafe { *self.write_cache.get() = write };
        write != read
    }

    /// Producer: fill slot `write` and publish it. Caller checked `has_room`.
    #[inline]
    fn publish(&self, write: u64, item: T) {
        // SAFETY: `has_room(write)` returned true, so the consumer has moved
        // out of this slot; only the producer writes slots.
        unsafe { self.slots.write(Bitmask::slot(write, self.capacity), item) };

        let new_write = write.wrapping_add(1);
        // SAFETY: producer-owned, see SINGLE-WRITER FIELDS.
        let cached_read = unsafe { *self.read_cache.get() };
        debug_assert_bounded_count!(new_write.wrapping_sub(cached_read), self.capacity);
        debug_assert_monotonic!("write", write, new_write);

        self.write.store(new_write, Ordering::Release);
        record!(self.config, self.metrics, add_enqueued, 1);
    }

    /// Consumer: move out of slot `read` and release it. Caller checked
    /// `has_item`.
    #[inline]
    fn consume(&self, read: u64) -> T {
        // SAFETY: `has_item(read)` returned true, so the producer published
        // this slot with a Release store we acquired; only the consumer reads.
        let item = unsafe { self.slots.take(Bitmask::slot(read, self.capacity)) };

        let new_read = read.wrapping_add(1);
        // SAFETY: consumer-owned, see SINGLE-WRITER FIELDS.
        let cached_write = unsafe { *self.write_cache.get() };
        debug_assert_read_not_past_write!(new_read, cached_write);

        self.read.store(new_read, Ordering::Release);
        record!(self.config, self.metrics, add_dequeued, 1);
        item
    }

    #[inline]
    fn len(&self) -> usize {
        let read = self.read.load(Ordering::Acquire);
        let write = self.write.load(Ordering::Acquire);
        write.wrapping_sub(read).min(self.capacity) as usize
    }
}

impl<T> Drop for CachedCore<T> {
    fn drop(&mut self) {
        let read = self.read.load(Ordering::Relaxed);
        let write = self.write.load(Ordering::Relaxed);
        // SAFETY: exclusive access; exactly [read, write) holds items.
        unsafe { self.slots.drop_range::<Bitmask>(read, write) };
    }
}

/// Index-caching SPSC ring that fails fast with `Full`/`Empty`.
///
/// `!Sync`; [`split`](crate::split) it for cross-thread use. Requires a
/// power-of-two capacity.
pub struct CachedRing<T> {
    core: CachedCore<T>,
}

impl<T> CachedRing<T> {
    /// Creates a ring with `capacity` slots and metrics disabled.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        Self::with_config(Config::new(capacity, false))
    }

    /// Creates a ring from a full configuration.
    pub fn with_config(config: Config) -> Result<Self, ConfigError> {
        Ok(Self {
            core: CachedCore::new(config, "spsc-cached")?,
        })
    }
}

impl<T> RingBuffer<T> for CachedRing<T> {
    fn enqueue(&self, item: T) -> Result<(), Full<T>> {
        let write = self.core.write.load(Ordering::Relaxed);
        if !self.core.has_room(write) {
            record!(self.core.config, self.core.metrics, add_full_rejection);
            thread::yield_now();
            return Err(Full(item));
        }
        self.core.publish(write, item);
        Ok(())
    }

    fn dequeue(&self) -> Result<T, Empty> {
        let read = self.core.read.load(Ordering::Relaxed);
        if !self.core.has_item(read) {
            record!(self.core.config, self.core.metrics, add_empty_rejection);
            thread::yield_now();
            return Err(Empty);
        }
        Ok(self.core.consume(read))
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.core.config.capacity()
    }

    #[inline]
    fn len(&self) -> usize {
        self.core.len()
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.core.metrics.snapshot()
    }
}

// SAFETY: `enqueue` touches `write`, `read_cache`, and vacant slots;
// `dequeue` touches `read`, `write_cache`, and published slots.
unsafe impl<T> SplitRing<T> for CachedRing<T> {}

/// Index-caching SPSC ring that waits instead of failing.
///
/// `enqueue` spins (yielding each round) until a slot frees up, `dequeue`
/// until an item arrives. Neither ever returns `Err`, and neither has a
/// timeout: if the other side stops, the call waits forever.
pub struct BlockingCachedRing<T> {
    core: CachedCore<T>,
}

impl<T> BlockingCachedRing<T> {
    /// Creates a ring with `capacity` slots and metrics disabled.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        Self::with_config(Config::new(capacity, false))
    }

    /// Creates a ring from a full configuration.
    pub fn with_config(config: Config) -> Result<Self, ConfigError> {
        Ok(Self {
            core: CachedCore::new(config, "spsc-cached-blocking")?,
        })
    }

    /// Waits for a free slot, then stores `item`.
    pub fn enqueue_blocking(&self, item: T) {
        let write = self.core.write.load(Ordering::Relaxed);
        while !self.core.has_room(write) {
            record!(self.core.config, self.core.metrics, add_retry);
            thread::yield_now();
        }
        self.core.publish(write, item);
    }

    /// Waits for an item, then removes it.
    pub fn dequeue_blocking(&self) -> T {
        let read = self.core.read.load(Ordering::Relaxed);
        while !self.core.has_item(read) {
            record!(self.core.config, self.core.metrics, add_retry);
            thread::yield_now();
        }
        self.core.consume(read)
    }
}

impl<T> RingBuffer<T> for BlockingCachedRing<T> {
    #[inline]
    fn enqueue(&self, item: T) -> Result<(), Full<T>> {
        self.enqueue_blocking(item);
        Ok(())
    }

    #[inline]
    fn dequeue(&self) -> Result<T, Empty> {
        Ok(self.dequeue_blocking())
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.core.config.capacity()
    }

    #[inline]
    fn len(&self) -> usize {
        self.core.len()
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.core.metrics.snapshot()
    }
}

// SAFETY: same field ownership as `CachedRing`.
unsafe impl<T> SplitRing<T> for BlockingCachedRing<T> {}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use crate::split;

    #[test]
    fn test_cache_refreshes_only_on_apparent_full() {
        let ring = CachedRing::<u32>::new(4).unwrap();
        for i in 0..4 {
            ring.enqueue(i).unwrap();
        }
        assert_eq!(ring.enqueue(9), Err(Full(9)));

        // Consumer frees two slots; producer's cache is stale until it
        // looks full again.
        assert_eq!(ring.dequeue(), Ok(0));
        assert_eq!(ring.dequeue(), Ok(1));
        ring.enqueue(4).unwrap();
        ring.enqueue(5).unwrap();
        assert!(ring.enqueue(6).is_err());
        assert_eq!(ring.len(), 4);

        for expected in 2..6 {
            assert_eq!(ring.dequeue(), Ok(expected));
        }
        assert_eq!(ring.dequeue(), Err(Empty));
    }

    #[test]
    fn test_blocking_never_errors_single_thread() {
        let ring = BlockingCachedRing::<u32>::new(2).unwrap();
        ring.enqueue(1).unwrap();
        ring.enqueue(2).unwrap();
        assert!(ring.is_full());
        assert_eq!(ring.dequeue(), Ok(1));
        assert_eq!(ring.dequeue_blocking(), 2);
    }

    #[test]
    fn test_blocking_handoff_across_threads() {
        const N: u64 = 50_000;
        let ring = BlockingCachedRing::with_config(Config::new(8, true)).unwrap();
        let (mut tx, mut rx) = split(ring);

        let producer = std::thread::spawn(move || {
            for i in 0..N {
                tx.enqueue(i).unwrap();
            }
            tx
        });

        let mut sum = 0;
        for i in 0..N {
            let v = rx.dequeue().unwrap();
            assert_eq!(v, i);
            sum += v;
        }
        let tx = producer.join().unwrap();

        assert_eq!(sum, N * (N - 1) / 2);
        let m = tx.metrics();
        assert_eq!(m.enqueued, N);
        assert_eq!(m.dequeued, N);
        assert_eq!(m.full_rejections + m.empty_rejections, 0);
    }
}

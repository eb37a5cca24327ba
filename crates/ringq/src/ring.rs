use crate::shim::sync::Arc;
use crate::{Backoff, Empty, Full, MetricsSnapshot};
use std::fmt;
use std::marker::PhantomData;

// =============================================================================
// COMMON CONTRACT
// =============================================================================
//
// Every variant implements `RingBuffer<T>` with `&self` receivers. Which
// threads may call those methods is decided by the variant's auto traits,
// never by documentation alone:
//
// - `LocalRing`, `BitmaskRing`, and the SPSC rings are `!Sync`. They can be
//   driven from one thread directly, or (SPSC only) split into one
//   `Producer` and one `Consumer` that may live on different threads.
// - `MutexRing` and the CAS rings are `Sync` and are shared through `Arc`.
//
// =============================================================================

/// Bounded FIFO queue with a fixed number of slots.
pub trait RingBuffer<T> {
    /// Stores `item`, or hands it back inside [`Full`] when no slot is free.
    ///
    /// Blocking variants wait for a free slot and never return `Err`.
    fn enqueue(&self, item: T) -> Result<(), Full<T>>;

    /// Removes the oldest available item, or returns [`Empty`].
    ///
    /// Blocking variants wait for an item and never return `Err`.
    fn dequeue(&self) -> Result<T, Empty>;

    /// Number of slots, fixed at construction.
    fn capacity(&self) -> usize;

    /// Number of stored items.
    ///
    /// Exact for single-threaded use; a best-effort snapshot while other
    /// threads are enqueueing or dequeueing.
    fn len(&self) -> usize;

    /// Counters recorded so far (zeros when metrics are disabled).
    fn metrics(&self) -> MetricsSnapshot;

    /// Returns true if the ring holds no items.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if every slot is occupied.
    #[inline]
    fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    /// Enqueue with adaptive backoff. Spins, yields, then gives up and
    /// returns the item.
    fn enqueue_with_backoff(&self, item: T) -> Result<(), Full<T>> {
        let mut backoff = Backoff::new();
        let mut item = item;
        loop {
            match self.enqueue(item) {
                Ok(()) => return Ok(()),
                Err(Full(rejected)) if !backoff.is_completed() => {
                    item = rejected;
                    backoff.snooze();
                }
                Err(full) => return Err(full),
            }
        }
    }

    /// Dequeue with adaptive backoff. Spins, yields, then gives up.
    fn dequeue_with_backoff(&self) -> Result<T, Empty> {
        let mut backoff = Backoff::new();
        loop {
            match self.dequeue() {
                Ok(item) => return Ok(item),
                Err(Empty) if !backoff.is_completed() => backoff.snooze(),
                Err(empty) => return Err(empty),
            }
        }
    }
}

// =============================================================================
// SPSC HANDLES
// =============================================================================

/// Ring whose enqueue path and dequeue path touch disjoint state.
///
/// # Safety
///
/// Implementors guarantee that one thread calling only `enqueue` and another
/// calling only `dequeue` on the same instance never race: producer-owned
/// fields are written only by `enqueue`, consumer-owned fields only by
/// `dequeue`, and slot handoff is published with release/acquire pairs.
/// `len`, `capacity`, and `metrics` must be callable from either side.
pub unsafe trait SplitRing<T>: RingBuffer<T> {}

/// Splits an SPSC ring into its two endpoints.
///
/// The endpoints share the ring; it is freed when both are dropped.
pub fn split<T, R: SplitRing<T>>(ring: R) -> (Producer<T, R>, Consumer<T, R>) {
    let ring = Arc::new(ring);
    (
        Producer {
            ring: Arc::clone(&ring),
            _marker: PhantomData,
        },
        Consumer {
            ring,
            _marker: PhantomData,
        },
    )
}

/// Enqueue endpoint of a split SPSC ring. Not `Clone`: there is exactly one.
pub struct Producer<T, R: SplitRing<T>> {
    ring: Arc<R>,
    _marker: PhantomData<fn(T)>,
}

/// Dequeue endpoint of a split SPSC ring. Not `Clone`: there is exactly one.
pub struct Consumer<T, R: SplitRing<T>> {
    ring: Arc<R>,
    _marker: PhantomData<fn() -> T>,
}

// SAFETY: the ring is reachable only through one Producer and one Consumer.
// `SplitRing` guarantees those two sides may run on different threads. Items
// cross threads, and the ring may be dropped on either side, hence `T: Send`.
unsafe impl<T: Send, R: SplitRing<T>> Send for Producer<T, R> {}
unsafe impl<T: Send, R: SplitRing<T>> Send for Consumer<T, R> {}

impl<T, R: SplitRing<T>> Producer<T, R> {
    /// See [`RingBuffer::enqueue`].
    #[inline]
    pub fn enqueue(&mut self, item: T) -> Result<(), Full<T>> {
        self.ring.enqueue(item)
    }

    /// See [`RingBuffer::enqueue_with_backoff`].
    pub fn enqueue_with_backoff(&mut self, item: T) -> Result<(), Full<T>> {
        self.ring.enqueue_with_backoff(item)
    }

    /// Number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Snapshot of the number of stored items.
    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns true if the ring looked empty at the time of the call.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Counters recorded so far.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.ring.metrics()
    }
}

impl<T, R: SplitRing<T>> Consumer<T, R> {
    /// See [`RingBuffer::dequeue`].
    #[inline]
    pub fn dequeue(&mut self) -> Result<T, Empty> {
        self.ring.dequeue()
    }

    /// See [`RingBuffer::dequeue_with_backoff`].
    pub fn dequeue_with_backoff(&mut self) -> Result<T, Empty> {
        self.ring.dequeue_with_backoff()
    }

    /// Number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Snapshot of the number of stored items.
    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns true if the ring looked empty at the time of the call.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Counters recorded so far.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.ring.metrics()
    }
}

impl<T, R: SplitRing<T>> fmt::Debug for Producer<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}

impl<T, R: SplitRing<T>> fmt::Debug for Consumer<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}

use crate::invariants::{debug_assert_bounded_count, debug_assert_sequence};
use crate::metrics::{record, Metrics};
use crate::padding::{Padded, Padding, Unpadded};
use crate::shim::atomic::{AtomicU64, Ordering};
use crate::shim::thread;
use crate::slots::{Bitmask, Node};
use crate::trace::debug;
use crate::{Config, ConfigError, Empty, Full, MetricsSnapshot, RingBuffer};

// =============================================================================
// NODE-SEQUENCE PROTOCOL
// =============================================================================
//
// Every node carries a sequence tag, initialised to the node's own index.
//
// **Enqueue** at candidate position `w` (Acquire load of `write`):
// 1. Acquire-load `node[w].sequence`. Anything but `w` means the node still
//    belongs to an earlier lap (ring full) or another producer already
//    claimed `w`.
// 2. CAS `write` from `w` to `w + 1`. Winning the CAS grants exclusive
//    ownership of the node for this lap.
// 3. Write the value, then Release-store `sequence = w + 1`. The Release is
//    what makes the value visible to whichever consumer Acquires the tag.
//
// **Dequeue** at candidate position `r` mirrors this, expecting
// `sequence == r + 1`, and finally Release-stores `sequence = r + capacity`
// to hand the node to the producer of the next lap.
//
// The non-blocking ring gives up on the first mismatch or lost CAS. The
// blocking ring retries from the freshest index it has seen.
//
// =============================================================================

/// Outcome of one attempt to claim a position.
enum Claim {
    /// We own the node at this position.
    Won(u64),
    /// The node's sequence is not the one this position needs.
    NotReady,
    /// Another thread moved the index first; carries the index it saw.
    Lost(u64),
}

/// Lock-free MPMC ring using per-node sequence tags.
///
/// `Sync`; share it through `Arc` between any number of producers and
/// consumers. Requires a power-of-two capacity. Cross-producer order is the
/// order in which producers win the CAS on `write`.
///
/// A single node cannot tell "written for position `i`" (`sequence == i + 1`)
/// from "free for position `i + 1`", so the minimum capacity is two.
pub struct CasRing<T, P: Padding = Padded> {
    write: P::Cell<AtomicU64>,
    read: P::Cell<AtomicU64>,
    mask: P::Cell<u64>,
    nodes: P::Cell<Box<[Node<T>]>>,
    metrics: Metrics,
    config: Config,
}

/// [`CasRing`] with indices, mask, and node array packed together.
pub type UnpaddedCasRing<T> = CasRing<T, Unpadded>;

// SAFETY: nodes are only accessed by the thread that won the CAS for their
// position, and handoff goes through Release/Acquire on `sequence`.
unsafe impl<T: Send, P: Padding> Send for CasRing<T, P> {}
unsafe impl<T: Send, P: Padding> Sync for CasRing<T, P> {}

impl<T, P: Padding> CasRing<T, P> {
    /// Smallest capacity the sequence protocol supports.
    pub const MIN_CAPACITY: usize = 2;

    /// Creates a ring with `capacity` slots and metrics disabled.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        Self::with_config(Config::new(capacity, false))
    }

    /// Creates a ring from a full configuration.
    pub fn with_config(config: Config) -> Result<Self, ConfigError> {
        config.validate::<Bitmask>()?;
        config.require_at_least(Self::MIN_CAPACITY)?;
        debug!(
            capacity = config.capacity,
            variant = "cas",
            padding = std::any::type_name::<P>(),
            "ring created"
        );
        let nodes: Box<[Node<T>]> = (0..config.capacity as u64).map(Node::new).collect();
        Ok(Self {
            write: P::cell(AtomicU64::new(0)),
            read: P::cell(AtomicU64::new(0)),
            mask: P::cell(config.mask() as u64),
            nodes: P::cell(nodes),
            metrics: Metrics::new(),
            config,
        })
    }

    #[inline]
    fn node(&self, index: u64) -> &Node<T> {
        &self.nodes[(index & *self.mask) as usize]
    }

    #[inline]
    fn capacity_u64(&self) -> u64 {
        *self.mask + 1
    }

    #[inline]
    fn claim_write(&self, write: u64) -> Claim {
        if self.node(write).sequence.load(Ordering::Acquire) != write {
            return Claim::NotReady;
        }
        match self.write.compare_exchange(
            write,
            write.wrapping_add(1),
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => Claim::Won(write),
            Err(actual) => Claim::Lost(actual),
        }
    }

    #[inline]
    fn claim_read(&self, read: u64) -> Claim {
        if self.node(read).sequence.load(Ordering::Acquire) != read.wrapping_add(1) {
            return Claim::NotReady;
        }
        match self.read.compare_exchange(
            read,
            read.wrapping_add(1),
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => Claim::Won(read),
            Err(actual) => Claim::Lost(actual),
        }
    }

    /// Fill the node won at `write` and hand it to consumers.
    #[inline]
    fn publish(&self, write: u64, item: T) {
        let node = self.node(write);
        debug_assert_sequence!(node, write);
        // SAFETY: winning the CAS for `write` after seeing `sequence == write`
        // makes us the only thread that may touch this node until the store
        // below.
        unsafe { node.write(item) };
        node.sequence.store(write.wrapping_add(1), Ordering::Release);
        record!(self.config, self.metrics, add_enqueued, 1);
    }

    /// Move out of the node won at `read` and hand it to the next lap.
    #[inline]
    fn consume(&self, read: u64) -> T {
        let node = self.node(read);
        debug_assert_sequence!(node, read.wrapping_add(1));
        // SAFETY: the Acquire load of `sequence == read + 1` synchronized with
        // the producer's Release, and winning the CAS for `read` makes us the
        // only consumer of this lap.
        let item = unsafe { node.take() };
        node.sequence
            .store(read.wrapping_add(self.capacity_u64()), Ordering::Release);
        record!(self.config, self.metrics, add_dequeued, 1);
        item
    }

    /// Claim a write position, retrying until one is won.
    fn enqueue_spin(&self, item: T) {
        let mut write = self.write.load(Ordering::Acquire);
        loop {
            match self.claim_write(write) {
                Claim::Won(won) => return self.publish(won, item),
                Claim::NotReady => write = self.write.load(Ordering::Acquire),
                Claim::Lost(actual) => write = actual,
            }
            record!(self.config, self.metrics, add_retry);
            thread::yield_now();
        }
    }

    /// Claim a read position, retrying until one is won.
    fn dequeue_spin(&self) -> T {
        let mut read = self.read.load(Ordering::Acquire);
        loop {
            match self.claim_read(read) {
                Claim::Won(won) => return self.consume(won),
                Claim::NotReady => read = self.read.load(Ordering::Acquire),
                Claim::Lost(actual) => read = actual,
            }
            record!(self.config, self.metrics, add_retry);
            thread::yield_now();
        }
    }

    fn snapshot_len(&self) -> usize {
        let read = self.read.load(Ordering::Acquire);
        let write = self.write.load(Ordering::Acquire);
        // `write` may have moved on after `read` was loaded. `read` never
        // overtakes `write`, so the difference cannot underflow.
        write.wrapping_sub(read).min(self.capacity_u64()) as usize
    }
}

impl<T, P: Padding> RingBuffer<T> for CasRing<T, P> {
    fn enqueue(&self, item: T) -> Result<(), Full<T>> {
        let write = self.write.load(Ordering::Acquire);
        match self.claim_write(write) {
            Claim::Won(won) => {
                self.publish(won, item);
                Ok(())
            }
            Claim::NotReady => {
                record!(self.config, self.metrics, add_full_rejection);
                Err(Full(item))
            }
            Claim::Lost(_) => {
                record!(self.config, self.metrics, add_retry);
                record!(self.config, self.metrics, add_full_rejection);
                thread::yield_now();
                Err(Full(item))
            }
        }
    }

    fn dequeue(&self) -> Result<T, Empty> {
        let read = self.read.load(Ordering::Acquire);
        match self.claim_read(read) {
            Claim::Won(won) => Ok(self.consume(won)),
            Claim::NotReady => {
                record!(self.config, self.metrics, add_empty_rejection);
                Err(Empty)
            }
            Claim::Lost(_) => {
                record!(self.config, self.metrics, add_retry);
                record!(self.config, self.metrics, add_empty_rejection);
                thread::yield_now();
                Err(Empty)
            }
        }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.config.capacity()
    }

    #[inline]
    fn len(&self) -> usize {
        self.snapshot_len()
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl<T, P: Padding> Drop for CasRing<T, P> {
    fn drop(&mut self) {
        let read = self.read.load(Ordering::Relaxed);
        let write = self.write.load(Ordering::Relaxed);
        debug_assert_bounded_count!(write.wrapping_sub(read), self.capacity_u64());
        let mut index = read;
        while index != write {
            // SAFETY: `&mut self` means no claim is in flight, so every
            // position in [read, write) was published and not consumed.
            drop(unsafe { self.node(index).take() });
            index = index.wrapping_add(1);
        }
    }
}

/// Node-sequence MPMC ring whose operations wait instead of failing.
///
/// Same protocol as [`CasRing`] (padded). On a sequence mismatch it reloads
/// the shared index, on a lost CAS it continues from the index the winner
/// left, and it yields the thread every round. `enqueue` and `dequeue` never
/// return `Err` and have no timeout; use [`len`](RingBuffer::len) and
/// [`capacity`](RingBuffer::capacity) to avoid blocking on a ring known to
/// be full or empty.
pub struct BlockingCasRing<T> {
    inner: CasRing<T, Padded>,
}

impl<T> BlockingCasRing<T> {
    /// Creates a ring with `capacity` slots and metrics disabled.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        Self::with_config(Config::new(capacity, false))
    }

    /// Creates a ring from a full configuration.
    pub fn with_config(config: Config) -> Result<Self, ConfigError> {
        Ok(Self {
            inner: CasRing::with_config(config)?,
        })
    }

    /// Waits for a free slot, then stores `item`.
    #[inline]
    pub fn enqueue_blocking(&self, item: T) {
        self.inner.enqueue_spin(item);
    }

    /// Waits for an item, then removes it.
    #[inline]
    pub fn dequeue_blocking(&self) -> T {
        self.inner.dequeue_spin()
    }
}

impl<T> RingBuffer<T> for BlockingCasRing<T> {
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
        self.inner.capacity()
    }

    #[inline]
    fn len(&self) -> usize {
        self.inner.snapshot_len()
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics()
    }
}

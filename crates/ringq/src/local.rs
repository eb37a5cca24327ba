//! Single-threaded rings: the modulo baseline and the bitmask variant.

use crate::invariants::{debug_assert_bounded_count, debug_assert_read_not_past_write};
use crate::metrics::{record, Metrics};
use crate::slots::{Addressing, Bitmask, Modulo};
use crate::trace::debug;
use crate::{Config, ConfigError, Empty, Full, MetricsSnapshot, RingBuffer};
use std::cell::UnsafeCell;
use std::marker::PhantomData;

/// Plain indices and slots, mutated through `&mut self`.
///
/// Shared by [`LocalRing`] (behind an `UnsafeCell`) and
/// [`MutexRing`](crate::MutexRing) (behind a lock).
pub(crate) struct RingCore<T, A> {
    write: u64,
    read: u64,
    capacity: u64,
    slots: Box<[Option<T>]>,
    _addressing: PhantomData<A>,
}

impl<T, A: Addressing> RingCore<T, A> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            write: 0,
            read: 0,
            capacity: capacity as u64,
            slots: (0..capacity).map(|_| None).collect(),
            _addressing: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, item: T) -> Result<(), Full<T>> {
        if self.write.wrapping_sub(self.read) == self.capacity {
            return Err(Full(item));
        }
        self.slots[A::slot(self.write, self.capacity)] = Some(item);
        self.write = self.write.wrapping_add(1);
        debug_assert_bounded_count!(self.write.wrapping_sub(self.read), self.capacity);
        Ok(())
    }

    #[inline]
    pub(crate) fn pop(&mut self) -> Result<T, Empty> {
        if self.write == self.read {
            return Err(Empty);
        }
        let item = self.slots[A::slot(self.read, self.capacity)].take();
        debug_assert_read_not_past_write!(self.read + 1, self.write);
        self.read = self.read.wrapping_add(1);
        item.ok_or(Empty)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.write.wrapping_sub(self.read) as usize
    }
}

/// Unsynchronized ring for use from a single thread.
///
/// `!Sync`: the compiler rejects sharing it between threads. The addressing
/// scheme defaults to [`Modulo`], which accepts any positive capacity.
pub struct LocalRing<T, A: Addressing = Modulo> {
    core: UnsafeCell<RingCore<T, A>>,
    metrics: Metrics,
    config: Config,
}

/// [`LocalRing`] with AND-mask addressing. Requires a power-of-two capacity.
pub type BitmaskRing<T> = LocalRing<T, Bitmask>;

impl<T, A: Addressing> LocalRing<T, A> {
    /// Creates a ring with `capacity` slots and metrics disabled.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        Self::with_config(Config::new(capacity, false))
    }

    /// Creates a ring from a full configuration.
    pub fn with_config(config: Config) -> Result<Self, ConfigError> {
        config.validate::<A>()?;
        debug!(capacity = config.capacity, variant = "local", "ring created");
        Ok(Self {
            core: UnsafeCell::new(RingCore::new(config.capacity)),
            metrics: Metrics::new(),
            config,
        })
    }

    #[inline]
    fn with_core<R>(&self, f: impl FnOnce(&mut RingCore<T, A>) -> R) -> R {
        // SAFETY: `LocalRing` is `!Sync`, so no other thread holds a
        // reference. `f` is one of push/pop/len, which never call back into
        // this ring, so the exclusive borrow cannot alias.
        f(unsafe { &mut *self.core.get() })
    }
}

impl<T, A: Addressing> RingBuffer<T> for LocalRing<T, A> {
    fn enqueue(&self, item: T) -> Result<(), Full<T>> {
        let result = self.with_core(|core| core.push(item));
        match &result {
            Ok(()) => record!(self.config, self.metrics, add_enqueued, 1),
            Err(_) => record!(self.config, self.metrics, add_full_rejection),
        }
        result
    }

    fn dequeue(&self) -> Result<T, Empty> {
        let result = self.with_core(RingCore::pop);
        match &result {
            Ok(_) => record!(self.config, self.metrics, add_dequeued, 1),
            Err(_) => record!(self.config, self.metrics, add_empty_rejection),
        }
        result
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.config.capacity()
    }

    #[inline]
    fn len(&self) -> usize {
        self.with_core(|core| core.len())
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_modulo_ring_non_power_of_two() {
        let ring = LocalRing::<u32>::new(3).unwrap();
        for round in 0..4 {
            for i in 0..3 {
                ring.enqueue(round * 10 + i).unwrap();
            }
            assert_eq!(ring.enqueue(99), Err(Full(99)));
            for i in 0..3 {
                assert_eq!(ring.dequeue(), Ok(round * 10 + i));
            }
            assert_eq!(ring.dequeue(), Err(Empty));
        }
    }

    #[test]
    fn test_bitmask_rejects_non_power_of_two() {
        assert!(matches!(
            BitmaskRing::<u8>::new(3),
            Err(ConfigError::NotPowerOfTwo { capacity: 3 })
        ));
        assert!(matches!(
            LocalRing::<u8>::new(0),
            Err(ConfigError::ZeroCapacity)
        ));
    }

    #[test]
    fn test_dequeue_releases_item() {
        let tracker = Rc::new(());
        let ring = BitmaskRing::new(2).unwrap();
        ring.enqueue(Rc::clone(&tracker)).unwrap();
        drop(ring.dequeue().unwrap());
        // The slot must not keep a second reference alive.
        assert_eq!(Rc::strong_count(&tracker), 1);
    }

    #[test]
    fn test_metrics_when_enabled() {
        let ring = LocalRing::<u8>::with_config(Config::new(1, true)).unwrap();
        ring.enqueue(1).unwrap();
        assert!(ring.enqueue(2).is_err());
        ring.dequeue().unwrap();
        assert!(ring.dequeue().is_err());

        let m = ring.metrics();
        assert_eq!((m.enqueued, m.dequeued), (1, 1));
        assert_eq!((m.full_rejections, m.empty_rejections), (1, 1));
    }

    #[test]
    fn test_metrics_when_disabled() {
        let ring = LocalRing::<u8>::new(1).unwrap();
        ring.enqueue(1).unwrap();
        assert_eq!(ring.metrics(), MetricsSnapshot::default());
    }
}

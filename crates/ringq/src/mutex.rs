use crate::local::RingCore;
use crate::metrics::{record, Metrics};
use crate::shim::sync::{Mutex, MutexGuard};
use crate::slots::Modulo;
use crate::trace::debug;
use crate::{Config, ConfigError, Empty, Full, MetricsSnapshot, RingBuffer};
use std::sync::PoisonError;

/// MPMC ring serialized by a single mutex.
///
/// The lock covers index updates and slot access alike, so any number of
/// producers and consumers may share it through `Arc`. This is the baseline
/// the lock-free rings are measured against.
pub struct MutexRing<T> {
    core: Mutex<RingCore<T, Modulo>>,
    metrics: Metrics,
    config: Config,
}

impl<T> MutexRing<T> {
    /// Creates a ring with `capacity` slots and metrics disabled.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        Self::with_config(Config::new(capacity, false))
    }

    /// Creates a ring from a full configuration.
    pub fn with_config(config: Config) -> Result<Self, ConfigError> {
        config.validate::<Modulo>()?;
        debug!(capacity = config.capacity, variant = "mutex", "ring created");
        Ok(Self {
            core: Mutex::new(RingCore::new(config.capacity)),
            metrics: Metrics::new(),
            config,
        })
    }

    // Nothing panics while the lock is held, so a poisoned lock still guards
    // a consistent core.
    #[inline]
    fn lock(&self) -> MutexGuard<'_, RingCore<T, Modulo>> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> RingBuffer<T> for MutexRing<T> {
    fn enqueue(&self, item: T) -> Result<(), Full<T>> {
        let result = self.lock().push(item);
        match &result {
            Ok(()) => record!(self.config, self.metrics, add_enqueued, 1),
            Err(_) => record!(self.config, self.metrics, add_full_rejection),
        }
        result
    }

    fn dequeue(&self) -> Result<T, Empty> {
        let result = self.lock().pop();
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
        self.lock().len()
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

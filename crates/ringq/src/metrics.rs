use std::sync::atomic::{AtomicU64, Ordering};

/// Per-ring operation counters.
///
/// Updated with relaxed atomics, and only when `Config::enable_metrics` is
/// set. Always `std` atomics, also under loom: the counters carry no
/// synchronization.
#[derive(Debug, Default)]
pub(crate) struct Metrics {
    enqueued: AtomicU64,
    dequeued: AtomicU64,
    full_rejections: AtomicU64,
    empty_rejections: AtomicU64,
    retries: AtomicU64,
}

impl Metrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn add_enqueued(&self, n: u64) {
        self.enqueued.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_dequeued(&self, n: u64) {
        self.dequeued.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_full_rejection(&self) {
        self.full_rejections.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_empty_rejection(&self) {
        self.empty_rejections.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dequeued: self.dequeued.load(Ordering::Relaxed),
            full_rejections: self.full_rejections.load(Ordering::Relaxed),
            empty_rejections: self.empty_rejections.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a ring's counters.
///
/// All zeros when metrics are disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Successful enqueues.
    pub enqueued: u64,
    /// Successful dequeues.
    pub dequeued: u64,
    /// Enqueues that returned `Full`.
    pub full_rejections: u64,
    /// Dequeues that returned `Empty`.
    pub empty_rejections: u64,
    /// Lost CAS races and blocking spin iterations.
    pub retries: u64,
}

impl MetricsSnapshot {
    /// Items enqueued but not yet dequeued, as far as the counters know.
    pub fn in_flight(&self) -> u64 {
        self.enqueued.saturating_sub(self.dequeued)
    }
}

/// Records into `$metrics` only when `$config.enable_metrics` is set.
macro_rules! record {
    ($config:expr, $metrics:expr, $method:ident $(, $arg:expr)?) => {
        if $config.enable_metrics {
            $metrics.$method($($arg)?);
        }
    };
}

pub(crate) use record;

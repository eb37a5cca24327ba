//! Cache-line padding selected at the type level.
//!
//! Hot fields written by different threads are wrapped in `P::Cell<_>`.
//! With [`Padded`] every such field occupies its own cache line (via
//! `crossbeam_utils::CachePadded`); with [`Unpadded`] the fields pack
//! together, which is the false-sharing baseline the padded rings are
//! measured against.

use crossbeam_utils::CachePadded;
use std::fmt;
use std::ops::Deref;

/// Alignment `CachePadded` uses on this target (128 on x86_64 and aarch64,
/// where the adjacent-line prefetcher pulls lines in pairs).
pub const CACHE_LINE: usize = std::mem::align_of::<CachePadded<u8>>();

/// Wrapping strategy for hot fields.
pub trait Padding: Send + Sync + 'static {
    /// Wrapper around a field of type `X`.
    type Cell<X>: Deref<Target = X>;

    /// Wraps `value`.
    fn cell<X>(value: X) -> Self::Cell<X>;
}

/// Every hot field on its own cache line.
#[derive(Debug, Clone, Copy, Default)]
pub struct Padded;

/// Hot fields packed next to each other.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unpadded;

impl Padding for Padded {
    type Cell<X> = CachePadded<X>;

    #[inline]
    fn cell<X>(value: X) -> CachePadded<X> {
        CachePadded::new(value)
    }
}

impl Padding for Unpadded {
    type Cell<X> = Tight<X>;

    #[inline]
    fn cell<X>(value: X) -> Tight<X> {
        Tight(value)
    }
}

/// Transparent wrapper used by [`Unpadded`].
#[repr(transparent)]
#[derive(Default)]
pub struct Tight<X>(X);

impl<X> Deref for Tight<X> {
    type Target = X;

    #[inline]
    fn deref(&self) -> &X {
        &self.0
    }
}

impl<X: fmt::Debug> fmt::Debug for Tight<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

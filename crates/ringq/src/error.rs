//! Error types for ring buffer operations.

use std::fmt;
use thiserror::Error;

/// Returned by `enqueue` when every slot is occupied.
///
/// Carries the rejected item so the caller can retry without cloning.
/// The condition is transient: a later `enqueue` may succeed.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Recovers the item that could not be enqueued.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

// Written by hand so `T` does not need `Debug`.
impl<T> fmt::Debug for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Full(..)")
    }
}

impl<T> fmt::Display for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("buffer full")
    }
}

impl<T> std::error::Error for Full<T> {}

/// Returned by `dequeue` when no item is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("buffer empty")]
pub struct Empty;

/// Item-less view of both transient conditions.
///
/// Neither variant is terminal: a full buffer drains, an empty one refills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    /// Producer side: no free slot.
    #[error("buffer full")]
    BufferFull,
    /// Consumer side: no published item.
    #[error("buffer empty")]
    BufferEmpty,
}

impl<T> From<Full<T>> for RingError {
    fn from(_: Full<T>) -> Self {
        Self::BufferFull
    }
}

impl From<Empty> for RingError {
    fn from(_: Empty) -> Self {
        Self::BufferEmpty
    }
}

/// Rejected ring configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Capacity must be at least one slot.
    #[error("capacity must be positive")]
    ZeroCapacity,
    /// Mask-addressed variants need `capacity & (capacity - 1) == 0`.
    #[error("capacity {capacity} is not a power of two")]
    NotPowerOfTwo {
        /// The rejected capacity.
        capacity: usize,
    },
    /// The variant needs more slots than were requested.
    #[error("capacity {capacity} is below the minimum of {min}")]
    TooSmall {
        /// The rejected capacity.
        capacity: usize,
        /// Smallest capacity the variant supports.
        min: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_returns_item() {
        let err = Full(String::from("payload"));
        assert_eq!(err.to_string(), "buffer full");
        assert_eq!(err.into_inner(), "payload");
    }

    #[test]
    fn test_conversions_into_ring_error() {
        fn produce() -> Result<(), RingError> {
            Err::<(), _>(Full(7u32))?;
            Ok(())
        }
        fn consume() -> Result<u32, RingError> {
            Err(Empty)?
        }

        assert_eq!(produce(), Err(RingError::BufferFull));
        assert_eq!(consume(), Err(RingError::BufferEmpty));
    }

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::NotPowerOfTwo { capacity: 3 }.to_string(),
            "capacity 3 is not a power of two"
        );
        assert_eq!(ConfigError::ZeroCapacity.to_string(), "capacity must be positive");
    }
}

//! Debug assertion macros for ring buffer invariants.
//!
//! Active only with `debug_assertions`; release builds compile them away.
//! Shared by every ring variant.

// =============================================================================
// Bounded count: 0 <= write - read <= capacity
// =============================================================================

/// Assert that the number of stored items does not exceed capacity.
///
/// `$count` is `write.wrapping_sub(read)`, so a read index that overtook the
/// write index shows up as a huge count and trips this as well.
macro_rules! debug_assert_bounded_count {
    ($count:expr, $capacity:expr) => {
        debug_assert!(
            $count <= $capacity,
            "bounded count violated: {} items in a ring of {}",
            $count,
            $capacity
        )
    };
}

/// Assert that the read index does not advance past the write index.
///
/// Used before publishing a new read index.
macro_rules! debug_assert_read_not_past_write {
    ($new_read:expr, $write:expr) => {
        debug_assert!(
            $new_read <= $write,
            "advancing read index {} beyond write index {}",
            $new_read,
            $write
        )
    };
}

// =============================================================================
// Monotonic progress: indices only increase
// =============================================================================

macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new > $old,
            "{} index did not advance: {} -> {}",
            $name,
            $old,
            $new
        )
    };
}

// =============================================================================
// Sequence tags (CAS rings)
// =============================================================================

/// Assert that a claimed node carries the sequence the claimant expected.
///
/// The CAS on the shared index only succeeds after the sequence matched, and
/// nobody else may touch the node until we republish it.
macro_rules! debug_assert_sequence {
    ($node:expr, $expected:expr) => {
        debug_assert_eq!(
            $node.sequence.load($crate::shim::atomic::Ordering::Relaxed),
            $expected,
            "claimed node carries an unexpected sequence tag"
        )
    };
}

pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_monotonic;
pub(crate) use debug_assert_read_not_past_write;
pub(crate) use debug_assert_sequence;

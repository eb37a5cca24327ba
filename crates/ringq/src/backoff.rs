use crate::shim::thread;
use std::hint;

/// Caller-side retry policy for the non-blocking rings.
///
/// Spins with PAUSE hints for the first few steps, then yields to the OS
/// scheduler, then reports completion so the caller can stop retrying.
#[derive(Debug, Default)]
pub struct Backoff {
    step: u32,
}

impl Backoff {
    const SPIN_LIMIT: u32 = 6; // up to 2^6 PAUSE hints per step
    const YIELD_LIMIT: u32 = 10;

    /// Creates a new backoff instance.
    #[inline]
    pub fn new() -> Self {
        Self { step: 0 }
    }

    /// Busy-wait only, never leaves the CPU.
    #[inline]
    pub fn spin(&mut self) {
        for _ in 0..1u32 << self.step.min(Self::SPIN_LIMIT) {
            hint::spin_loop();
        }
        if self.step <= Self::SPIN_LIMIT {
            self.step += 1;
        }
    }

    /// Spin while cheap, yield once spinning stops paying off.
    #[inline]
    pub fn snooze(&mut self) {
        if self.step <= Self::SPIN_LIMIT {
            self.spin();
        } else {
            thread::yield_now();
            if self.step <= Self::YIELD_LIMIT {
                self.step += 1;
            }
        }
    }

    /// `true` once both the spin and the yield budget are spent.
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.step > Self::YIELD_LIMIT
    }

    /// Reset for next wait cycle.
    #[inline]
    pub fn reset(&mut self) {
        self.step = 0;
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_progression() {
        let mut b = Backoff::new();
        assert_eq!(b.step, 0);

        b.spin();
        assert_eq!(b.step, 1);

        let mut snoozes = 0;
        while !b.is_completed() {
            b.snooze();
            snoozes += 1;
        }
        assert_eq!(b.step, Backoff::YIELD_LIMIT + 1);
        assert_eq!(snoozes, Backoff::YIELD_LIMIT);

        b.reset();
        assert!(!b.is_completed());
    }

    #[test]
    fn test_spin_saturates_before_yield_phase() {
        let mut b = Backoff::new();
        for _ in 0..20 {
            b.spin();
        }
        assert_eq!(b.step, Backoff::SPIN_LIMIT + 1);
        assert!(!b.is_completed());
    }
}

use crate::slots::Addressing;
use crate::trace::warn;
use crate::ConfigError;

/// Configuration shared by every ring variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of slots. Fixed for the lifetime of the ring.
    pub capacity: usize,
    /// Enable metrics collection (slight overhead)
    pub enable_metrics: bool,
}

impl Config {
    /// Creates a new configuration with custom settings.
    pub const fn new(capacity: usize, enable_metrics: bool) -> Self {
        Self {
            capacity,
            enable_metrics,
        }
    }

    /// Power-of-two configuration with `1 << bits` slots, metrics off.
    pub const fn with_bits(bits: u8) -> Self {
        Self::new(1 << bits, false)
    }

    /// Returns the capacity of the ring buffer.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the mask for index wrapping.
    ///
    /// Only meaningful for power-of-two capacities.
    #[inline]
    pub const fn mask(&self) -> usize {
        self.capacity.wrapping_sub(1)
    }

    /// Checks the capacity against what addressing scheme `A` can handle.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub(crate) fn validate<A: Addressing>(&self) -> Result<(), ConfigError> {
        let result = if self.capacity == 0 {
            Err(ConfigError::ZeroCapacity)
        } else if A::REQUIRES_POWER_OF_TWO && !self.capacity.is_power_of_two() {
            Err(ConfigError::NotPowerOfTwo {
                capacity: self.capacity,
            })
        } else {
            Ok(())
        };

        if let Err(err) = result {
            warn!(capacity = self.capacity, error = %err, "rejecting ring configuration");
        }
        result
    }

    /// Rejects capacities below `min`.
    pub(crate) fn require_at_least(&self, min: usize) -> Result<(), ConfigError> {
        if self.capacity >= min {
            return Ok(());
        }
        warn!(capacity = self.capacity, min, "rejecting ring configuration");
        Err(ConfigError::TooSmall {
            capacity: self.capacity,
            min,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_bits(16) // 64K slots
    }
}

/// Low latency configuration (4K slots, fits in L1 cache)
pub const LOW_LATENCY_CONFIG: Config = Config::with_bits(12);

/// High throughput configuration (2M slots)
pub const HIGH_THROUGHPUT_CONFIG: Config = Config::with_bits(21);

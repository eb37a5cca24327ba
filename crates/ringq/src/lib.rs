//! ringq - bounded ring-buffer queues, from a single-threaded baseline to
//! lock-free MPMC.
//!
//! Every variant has a fixed capacity and implements [`RingBuffer`]:
//! `enqueue` hands the item back in [`Full`] when no slot is free, `dequeue`
//! returns [`Empty`] when nothing is stored. Both conditions are transient.
//!
//! | Type                   | Threads                 | Notes                              |
//! |------------------------|-------------------------|------------------------------------|
//! | [`LocalRing`]          | one                     | modulo addressing, any capacity    |
//! | [`BitmaskRing`]        | one                     | AND-mask addressing                |
//! | [`MutexRing`]          | many producers/consumers| one lock around everything         |
//! | [`SpscRing`]           | one producer, one consumer | atomic indices, padded or not   |
//! | [`CachedRing`]         | one producer, one consumer | cached counterpart index        |
//! | [`BlockingCachedRing`] | one producer, one consumer | waits instead of failing        |
//! | [`CasRing`]            | many producers/consumers| per-node sequence tags, padded or not |
//! | [`BlockingCasRing`]    | many producers/consumers| waits instead of failing           |
//!
//! Thread-safety is enforced by auto traits: the single-threaded and SPSC
//! rings are `!Sync`. SPSC rings cross threads through [`split`], which
//! yields exactly one [`Producer`] and one [`Consumer`].
//!
//! Mask-addressed rings (everything except `LocalRing` and `MutexRing`)
//! reject non-power-of-two capacities with [`ConfigError::NotPowerOfTwo`].
//! The CAS rings also need at least two slots ([`ConfigError::TooSmall`]).
//!
//! # Example
//!
//! ```
//! use ringq_rs::{split, CasRing, PaddedSpscRing, RingBuffer};
//! use std::sync::Arc;
//!
//! // MPMC: share through Arc.
//! let ring = Arc::new(CasRing::<u64>::new(1024).unwrap());
//! ring.enqueue(1).unwrap();
//! assert_eq!(ring.dequeue(), Ok(1));
//!
//! // SPSC: split into endpoints.
//! let (mut tx, mut rx) = split(PaddedSpscRing::<u64>::new(1024).unwrap());
//! let producer = std::thread::spawn(move || {
//!     for i in 0..100 {
//!         let mut item = i;
//!         while let Err(full) = tx.enqueue(item) {
//!             item = full.into_inner();
//!         }
//!     }
//! });
//! let mut received = 0;
//! while received < 100 {
//!     if rx.dequeue().is_ok() {
//!         received += 1;
//!     }
//! }
//! producer.join().unwrap();
//! ```

mod backoff;
mod cached;
mod cas;
mod config;
mod error;
mod invariants;
mod local;
mod metrics;
mod mutex;
mod padding;
mod ring;
mod shim;
mod slots;
mod spsc;
mod trace;

pub use backoff::Backoff;
pub use cached::{BlockingCachedRing, CachedRing};
pub use cas::{BlockingCasRing, CasRing, UnpaddedCasRing};
pub use config::{Config, HIGH_THROUGHPUT_CONFIG, LOW_LATENCY_CONFIG};
pub use error::{ConfigError, Empty, Full, RingError};
pub use local::{BitmaskRing, LocalRing};
pub use metrics::MetricsSnapshot;
pub use mutex::MutexRing;
pub use padding::{Padded, Padding, Tight, Unpadded, CACHE_LINE};
pub use ring::{split, Consumer, Producer, RingBuffer, SplitRing};
pub use slots::{Addressing, Bitmask, Modulo};
pub use spsc::{PaddedSpscRing, SpscRing, UnpaddedSpscRing};
pub use trace::init_tracing;

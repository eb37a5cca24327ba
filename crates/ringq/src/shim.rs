//! Synchronization primitives that switch between `std` (production) and
//! `loom` (model checking, `--features loom`).
//!
//! Only the primitives that take part in cross-thread handoff go through the
//! shim. Slot contents stay in `std::cell::UnsafeCell`; their safety follows
//! from the index and sequence protocol that loom does check.

#[cfg(not(feature = "loom"))]
pub(crate) mod atomic {
    pub(crate) use std::sync::atomic::{AtomicU64, Ordering};
}

#[cfg(feature = "loom")]
pub(crate) mod atomic {
    pub(crate) use loom::sync::atomic::{AtomicU64, Ordering};
}

#[cfg(not(feature = "loom"))]
pub(crate) mod sync {
    pub(crate) use std::sync::{Arc, Mutex, MutexGuard};
}

#[cfg(feature = "loom")]
pub(crate) mod sync {
    pub(crate) use loom::sync::{Arc, Mutex, MutexGuard};
}

#[cfg(not(feature = "loom"))]
pub(crate) mod thread {
    pub(crate) use std::thread::yield_now;
}

#[cfg(feature = "loom")]
pub(crate) mod thread {
    pub(crate) use loom::thread::yield_now;
}

//! Slot storage and index-to-slot addressing.

use crate::shim::atomic::AtomicU64;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;

/// Maps a monotonically increasing index onto a physical slot.
pub trait Addressing: Send + Sync + 'static {
    /// Whether the scheme is only correct for power-of-two capacities.
    const REQUIRES_POWER_OF_TWO: bool;

    /// Slot for `index` in a ring of `capacity` slots.
    fn slot(index: u64, capacity: u64) -> usize;
}

/// `index % capacity`. Works for any positive capacity.
#[derive(Debug, Clone, Copy, Default)]
pub struct Modulo;

/// `index & (capacity - 1)`. Power-of-two capacities only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bitmask;

impl Addressing for Modulo {
    const REQUIRES_POWER_OF_TWO: bool = false;

    #[inline]
    fn slot(index: u64, capacity: u64) -> usize {
        (index % capacity) as usize
    }
}

impl Addressing for Bitmask {
    const REQUIRES_POWER_OF_TWO: bool = true;

    #[inline]
    fn slot(index: u64, capacity: u64) -> usize {
        (index & (capacity - 1)) as usize
    }
}

/// Fixed array of possibly-uninitialized values.
///
/// Holds no record of which slots are live; the owning ring knows that from
/// its indices and is responsible for dropping what is left (see
/// [`Slots::drop_range`]).
pub(crate) struct Slots<T> {
    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

impl<T> Slots<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        let buffer = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect();
        Self { buffer }
    }

    /// Moves `item` into slot `idx`.
    ///
    /// # Safety
    ///
    /// The caller must own slot `idx` exclusively and the slot must be
    /// vacant, otherwise the previous value leaks or a reader races.
    #[inline]
    pub(crate) unsafe fn write(&self, idx: usize, item: T) {
        (*self.buffer[idx].get()).write(item);
    }

    /// Moves the value out of slot `idx`, leaving it vacant.
    ///
    /// # Safety
    ///
    /// The caller must own slot `idx` exclusively and the slot must hold a
    /// value published by a prior `write`.
    #[inline]
    pub(crate) unsafe fn take(&self, idx: usize) -> T {
        (*self.buffer[idx].get()).assume_init_read()
    }

    /// Drops every value in index range `[read, write)`.
    ///
    /// # Safety
    ///
    /// Exactly the slots for `[read, write)` must hold values.
    pub(crate) unsafe fn drop_range<A: Addressing>(&mut self, read: u64, write: u64) {
        let capacity = self.buffer.len() as u64;
        let mut index = read;
        while index != write {
            let idx = A::slot(index, capacity);
            self.buffer[idx].get_mut().assume_init_drop();
            index = index.wrapping_add(1);
        }
    }
}

/// One slot of the CAS rings: a value plus the sequence tag that says which
/// lap of the ring currently owns it.
///
/// - `sequence == i`: free for the producer claiming index `i`
/// - `sequence == i + 1`: holds the value written for index `i`
/// - `sequence == i + capacity`: vacated, free for the next lap
pub(crate) struct Node<T> {
    pub(crate) sequence: AtomicU64,
    value: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Node<T> {
    pub(crate) fn new(sequence: u64) -> Self {
        Self {
            sequence: AtomicU64::new(sequence),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    /// # Safety
    ///
    /// The caller must have claimed this node for writing and not yet
    /// published it.
    #[inline]
    pub(crate) unsafe fn write(&self, item: T) {
        (*self.value.get()).write(item);
    }

    /// # Safety
    ///
    /// The caller must have claimed this node for reading after observing
    /// the producer's published sequence.
    #[inline]
    pub(crate) unsafe fn take(&self) -> T {
        (*self.value.get()).assume_init_read()
    }
}

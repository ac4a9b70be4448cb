//! Set-once size bounds.
//!
//! A pooling allocator serves one size class, described by a lower and an
//! upper byte bound. Bounds are either fixed at construction or set exactly
//! once afterwards, before the first allocation. Once observed by an
//! allocation they must never change, or recycled blocks would no longer
//! match the size class.

use core::sync::atomic::{AtomicUsize, Ordering};

const UNSET: usize = usize::MAX;

/// A size bound that can be written at most once.
///
/// Reads and the single write use atomics, so a bound shared across threads
/// is race-free. Misuse (double set, or allocating before `set`) trips a
/// `debug_assert!`; in release builds an unset bound simply fails every
/// in-range test, so the owning allocator rejects all requests.
#[derive(Debug)]
pub struct Bound(AtomicUsize);

impl Bound {
    /// An unset bound, to be fixed later with [`set`](Self::set).
    pub const fn unset() -> Self {
        Self(AtomicUsize::new(UNSET))
    }

    /// A bound fixed at construction time.
    pub const fn fixed(value: usize) -> Self {
        Self(AtomicUsize::new(value))
    }

    /// Fixes the bound. Valid exactly once, and only on an unset bound.
    pub fn set(&self, value: usize) {
        debug_assert!(value != UNSET, "bound value collides with the unset sentinel");
        let prev = self.0.swap(value, Ordering::Release);
        debug_assert!(prev == UNSET, "bound set twice");
    }

    /// The bound's value, or `None` if it was never set.
    #[inline]
    pub fn get(&self) -> Option<usize> {
        match self.0.load(Ordering::Acquire) {
            UNSET => None,
            v => Some(v),
        }
    }

    /// True once the bound has a value.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire) != UNSET
    }
}

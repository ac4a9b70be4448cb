//! Fixed-capacity pools of recycled block pointers.
//!
//! The free list stores only pointers; the size class is uniform, so the
//! length is implied. Two interchangeable pool flavors exist:
//!
//! - [`ConcurrentSlots`]: lock-free multi-producer/multi-consumer, for a
//!   free list shared across threads.
//! - [`LocalSlots`]: plain `RefCell`-backed storage for a single-owner free
//!   list; `!Sync` by construction, so misuse does not compile.
//!
//! Both never block: `push` reports `false` at capacity, `pop` reports
//! `None` when empty.

use std::cell::RefCell;
use std::ptr::NonNull;

use crossbeam_queue::ArrayQueue;

/// A recycled block pointer travelling through the concurrent pool.
///
/// Wrapping is needed only to carry `Send` across the queue.
struct Slot(NonNull<u8>);

// SAFETY: a pooled pointer refers to a free block exclusively owned by the
// pool; moving the pointer between threads moves that ownership with it.
unsafe impl Send for Slot {}

/// Fixed-capacity store of recycled pointers.
///
/// Implementations must be linearizable with respect to their own
/// synchronization level: `ConcurrentSlots` under free-threaded use,
/// `LocalSlots` under single ownership.
pub trait SlotPool {
    /// Creates a pool holding up to `capacity` pointers. `capacity` must be
    /// non-zero.
    fn with_capacity(capacity: usize) -> Self;

    /// Stores a pointer; `false` if the pool is at capacity.
    fn push(&self, slot: NonNull<u8>) -> bool;

    /// Removes a pointer; `None` if the pool is empty.
    fn pop(&self) -> Option<NonNull<u8>>;

    /// Current number of pooled pointers.
    fn len(&self) -> usize;

    /// True when nothing is pooled.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of pooled pointers.
    fn capacity(&self) -> usize;
}

/// Lock-free pool for a free list shared across threads.
pub struct ConcurrentSlots {
    queue: ArrayQueue<Slot>,
}

impl SlotPool for ConcurrentSlots {
    fn with_capacity(capacity: usize) -> Self {
        Self { queue: ArrayQueue::new(capacity) }
    }

    #[inline]
    fn push(&self, slot: NonNull<u8>) -> bool {
        self.queue.push(Slot(slot)).is_ok()
    }

    #[inline]
    fn pop(&self) -> Option<NonNull<u8>> {
        self.queue.pop().map(|s| s.0)
    }

    #[inline]
    fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.queue.capacity()
    }
}

/// Unsynchronized pool for a single-owner free list.
pub struct LocalSlots {
    slots: RefCell<Vec<NonNull<u8>>>,
    capacity: usize,
}

impl SlotPool for LocalSlots {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: RefCell::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    #[inline]
    fn push(&self, slot: NonNull<u8>) -> bool {
        let mut slots = self.slots.borrow_mut();
        if slots.len() == self.capacity {
            return false;
        }
        slots.push(slot);
        true
    }

    #[inline]
    fn pop(&self) -> Option<NonNull<u8>> {
        self.slots.borrow_mut().pop()
    }

    #[inline]
    fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake(addr: usize) -> NonNull<u8> {
        NonNull::new(addr as *mut u8).unwrap()
    }

    #[test]
    fn local_push_pop_lifo() {
        let pool = LocalSlots::with_capacity(2);
        assert!(pool.is_empty());
        assert!(pool.push(fake(0x10)));
        assert!(pool.push(fake(0x20)));
        assert!(!pool.push(fake(0x30)), "push past capacity must fail");
        assert_eq!(pool.pop(), Some(fake(0x20)));
        assert_eq!(pool.pop(), Some(fake(0x10)));
        assert_eq!(pool.pop(), None);
    }

    #[test]
    fn concurrent_respects_capacity() {
        let pool = ConcurrentSlots::with_capacity(1);
        assert_eq!(pool.capacity(), 1);
        assert!(pool.push(fake(0x10)));
        assert!(!pool.push(fake(0x20)));
        assert_eq!(pool.pop(), Some(fake(0x10)));
        assert!(pool.is_empty());
    }

    #[test]
    fn concurrent_pool_is_shareable() {
        use std::sync::Arc;

        let pool = Arc::new(ConcurrentSlots::with_capacity(64));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for i in 0..16 {
                        pool.push(fake(0x1000 + t * 0x100 + i * 0x10));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(pool.len(), 64);
    }
}

//! Bounded pooling free-list allocator.
//!
//! `FreeListAllocator` serves one size class, described by a lower and an
//! upper byte bound, and recycles blocks of that class through a
//! fixed-capacity [`SlotPool`] instead of returning them upstream. Upstream
//! misses are amortized by fetching `batch_size` blocks per miss, using one
//! of two strategies chosen by the delegate's
//! [`SUPPORTS_TRUNCATED_DEALLOCATION`] capability:
//!
//! - supported: one delegate allocation of `upper * batch_size` bytes,
//!   carved into sub-blocks that can later be released individually;
//! - unsupported: `batch_size` individual delegate allocations.
//!
//! Every successful allocation has length `upper`, whatever was requested
//! within the bounds. Requests outside the bounds are rejected with an
//! empty block so the caller can route them elsewhere.
//!
//! # Concurrency
//!
//! [`SharedFreelist`] (lock-free pool) is `Sync` whenever its delegate is;
//! [`Freelist`] (plain pool) is `!Sync` by construction. Bounds must be
//! fully established before any sharing begins.
//!
//! [`SUPPORTS_TRUNCATED_DEALLOCATION`]: BlockAllocator::SUPPORTS_TRUNCATED_DEALLOCATION

pub mod slots;

pub use slots::{ConcurrentSlots, LocalSlots, SlotPool};

use std::ptr::NonNull;

use crate::block::Block;
use crate::bound::Bound;
use crate::error::{AllocError, AllocResult};
use crate::macros::trace_log;
use crate::realloc::reallocate_trivially;
use crate::traits::{BlockAllocator, OwningAllocator};

/// Construction-time tuning for a free list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreelistConfig {
    /// Maximum number of recycled blocks held by the pool.
    pub pool_capacity: usize,
    /// Blocks fetched from the delegate per upstream miss.
    pub batch_size: usize,
}

impl Default for FreelistConfig {
    fn default() -> Self {
        Self { pool_capacity: 1024, batch_size: 8 }
    }
}

/// Pooling allocator for one size class over a delegate allocator.
///
/// Usually referred to through the [`Freelist`] (single-owner) or
/// [`SharedFreelist`] (thread-safe) aliases.
pub struct FreeListAllocator<A: BlockAllocator, P: SlotPool> {
    delegate: A,
    pool: P,
    lower: Bound,
    upper: Bound,
    batch_size: usize,
}

/// Single-owner free list; `!Sync` by construction.
pub type Freelist<A> = FreeListAllocator<A, LocalSlots>;

/// Free list safe for unsynchronized sharing across threads.
pub type SharedFreelist<A> = FreeListAllocator<A, ConcurrentSlots>;

impl<A: BlockAllocator, P: SlotPool> FreeListAllocator<A, P> {
    /// Creates a free list serving sizes in `[lower, upper]` with default
    /// tuning.
    pub fn new(delegate: A, lower: usize, upper: usize) -> AllocResult<Self> {
        Self::with_config(delegate, lower, upper, FreelistConfig::default())
    }

    /// Creates a free list serving sizes in `[lower, upper]`.
    pub fn with_config(
        delegate: A,
        lower: usize,
        upper: usize,
        config: FreelistConfig,
    ) -> AllocResult<Self> {
        if lower > upper {
            return Err(AllocError::InvalidBounds { lower, upper });
        }
        let mut this = Self::deferred(delegate, config)?;
        this.lower = Bound::fixed(lower);
        this.upper = Bound::fixed(upper);
        Ok(this)
    }

    /// Creates a free list whose bounds will be supplied later, exactly
    /// once, via [`set_bounds`](Self::set_bounds).
    ///
    /// Until then every request is rejected.
    pub fn deferred(delegate: A, config: FreelistConfig) -> AllocResult<Self> {
        if config.pool_capacity == 0 {
            return Err(AllocError::ZeroPoolCapacity);
        }
        if config.batch_size == 0 {
            return Err(AllocError::ZeroBatchSize);
        }
        Ok(Self {
            delegate,
            pool: P::with_capacity(config.pool_capacity),
            lower: Bound::unset(),
            upper: Bound::unset(),
            batch_size: config.batch_size,
        })
    }

    /// Fixes deferred bounds. Valid exactly once, before the first
    /// allocation and before the allocator is shared.
    pub fn set_bounds(&self, lower: usize, upper: usize) -> AllocResult<()> {
        if lower > upper {
            return Err(AllocError::InvalidBounds { lower, upper });
        }
        self.lower.set(lower);
        self.upper.set(upper);
        Ok(())
    }

    /// Smallest request size served, if bounds are established.
    pub fn min_size(&self) -> Option<usize> {
        self.lower.get()
    }

    /// Largest request size served (and the length of every block handed
    /// out), if bounds are established.
    pub fn max_size(&self) -> Option<usize> {
        self.upper.get()
    }

    /// Number of recycled blocks currently pooled.
    pub fn pooled_blocks(&self) -> usize {
        self.pool.len()
    }

    /// Maximum number of recycled blocks the pool can hold.
    pub fn pool_capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// The upstream allocator.
    pub fn delegate(&self) -> &A {
        &self.delegate
    }

    fn bounds(&self) -> Option<(usize, usize)> {
        Some((self.lower.get()?, self.upper.get()?))
    }

    /// Refill strategy when the delegate can release sub-regions of a batch
    /// independently: one big allocation, carved into `batch_size` blocks.
    fn allocate_batched(&self, upper: usize) -> Block {
        let total = match upper.checked_mul(self.batch_size) {
            Some(t) => t,
            None => return self.delegate.allocate(upper),
        };
        let batch = self.delegate.allocate(total);
        let Some(base) = batch.ptr() else {
            // Batch-sized request refused; a single block may still fit.
            return self.delegate.allocate(upper);
        };
        trace_log!(batch_bytes = total, "free list batch refill");
        for i in 1..self.batch_size {
            // SAFETY: `base + i*upper` stays within the `total`-byte batch.
            let sub = unsafe { NonNull::new_unchecked(base.as_ptr().add(i * upper)) };
            if !self.pool.push(sub) {
                // Pool filled up concurrently. The delegate supports
                // truncated deallocation, so this sub-block can go straight
                // back on its own.
                // SAFETY: `sub` heads an unshared `upper`-byte sub-region of
                // the batch.
                let mut leftover = unsafe { Block::from_raw_parts(sub, upper) };
                self.delegate.deallocate(&mut leftover);
            }
        }
        // The first sub-block goes to the caller; the batch handle is
        // consumed here, so each sub-region has exactly one owner.
        // SAFETY: `base` heads the first `upper`-byte sub-region.
        unsafe { Block::from_raw_parts(base, upper) }
    }

    /// Refill strategy for delegates that must see each block deallocated
    /// exactly as allocated: `batch_size` individual allocations.
    fn allocate_individually(&self, upper: usize) -> Block {
        for _ in 1..self.batch_size {
            let mut fresh = self.delegate.allocate(upper);
            let Some(ptr) = fresh.ptr() else {
                // Delegate exhausted mid-refill; failures are reported
                // upward, never retried.
                return Block::empty();
            };
            if !self.pool.push(ptr) {
                // Pool filled up concurrently; the caller takes this one.
                return fresh;
            }
            fresh.reset();
        }
        trace_log!(blocks = self.batch_size, "free list individual refill");
        self.delegate.allocate(upper)
    }
}

// SAFETY: pooled pointers always refer to free `upper`-byte regions with a
// single owner (the pool); handed-out blocks are uniformly `upper`-sized and
// are either recycled into the pool or returned to the delegate that
// produced them.
unsafe impl<A: BlockAllocator, P: SlotPool> BlockAllocator for FreeListAllocator<A, P> {
    // Handed-out blocks may be carved from a batch; a prefix of one cannot
    // be released on its own.
    const SUPPORTS_TRUNCATED_DEALLOCATION: bool = false;

    fn allocate(&self, size: usize) -> Block {
        let Some((lower, upper)) = self.bounds() else {
            debug_assert!(false, "free list used before bounds were set");
            return Block::empty();
        };
        if size == 0 || size < lower || size > upper {
            return Block::empty();
        }
        if let Some(ptr) = self.pool.pop() {
            // SAFETY: the pool holds exclusively-owned free `upper`-byte
            // regions; popping transfers that ownership to the new block.
            return unsafe { Block::from_raw_parts(ptr, upper) };
        }
        if A::SUPPORTS_TRUNCATED_DEALLOCATION && self.batch_size > 1 {
            self.allocate_batched(upper)
        } else {
            self.allocate_individually(upper)
        }
    }

    fn deallocate(&self, block: &mut Block) {
        if block.is_empty() {
            return;
        }
        let in_range = self
            .bounds()
            .is_some_and(|(lower, upper)| (lower..=upper).contains(&block.len()));
        if !in_range {
            // Not from this size class; route upstream untouched.
            self.delegate.deallocate(block);
            return;
        }
        let Some(ptr) = block.ptr() else { return };
        if self.pool.push(ptr) {
            block.reset();
        } else {
            trace_log!("free list pool full, forwarding block to delegate");
            self.delegate.deallocate(block);
        }
    }

    fn reallocate(&self, block: &mut Block, new_size: usize) -> bool {
        if let Some(done) = reallocate_trivially(self, block, new_size) {
            return done;
        }
        // Handed-out blocks already span the whole size class, so any
        // in-range target is a no-op. True resizing is unsupported.
        self.bounds()
            .is_some_and(|(lower, upper)| {
                block.len() == upper && new_size >= lower && new_size <= upper
            })
    }
}

impl<A: BlockAllocator, P: SlotPool> OwningAllocator for FreeListAllocator<A, P> {
    /// Size-range membership, not pointer membership: a foreign block whose
    /// length happens to fall inside the bounds is reported as owned. Known
    /// limitation of the size-class design.
    fn owns(&self, block: &Block) -> bool {
        block.is_some()
            && self
                .bounds()
                .is_some_and(|(lower, upper)| (lower..=upper).contains(&block.len()))
    }
}

impl<A: BlockAllocator, P: SlotPool> Drop for FreeListAllocator<A, P> {
    /// Drains the pool into the delegate; the pool itself leaks nothing.
    ///
    /// Blocks still held by callers are dangling after this.
    fn drop(&mut self) {
        let Some(upper) = self.upper.get() else { return };
        let mut drained = 0usize;
        while let Some(ptr) = self.pool.pop() {
            // SAFETY: the pool exclusively owns this free `upper`-byte
            // region; it goes back to the delegate that produced it.
            let mut block = unsafe { Block::from_raw_parts(ptr, upper) };
            self.delegate.deallocate(&mut block);
            drained += 1;
        }
        if drained > 0 {
            trace_log!(drained, "free list drained into delegate on drop");
        }
    }
}

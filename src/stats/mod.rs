//! Statistics-collecting decorator allocator.
//!
//! `StatsAllocator` wraps any [`BlockAllocator`] and maintains the metrics
//! selected by an immutable [`StatsFlags`] set: call counters, byte
//! counters, a high-tide peak, and optionally a trace record for every live
//! allocation (size, call site, timestamp), kept in an intrusive list whose
//! nodes live in a prefix ahead of each block.
//!
//! The per-allocation machinery is engaged structurally, once, at
//! construction: with a capture flag set, the internal delegate is an
//! [`AffixAllocator`] carrying the trace-node prefix; without one it is a
//! transparent wrapper and allocations have no extra cost.
//!
//! # Concurrency
//!
//! Counters and the trace list are unsynchronized (`Cell`-based), which
//! makes the wrapper `!Sync`: sharing one instance across threads without
//! external locking does not compile. Distinct instances are independent.

pub mod counters;
pub mod flags;
pub mod trace;

pub use counters::StatsSnapshot;
pub use flags::StatsFlags;
pub use trace::{AllocationInfo, Allocations, CallSite};

use std::alloc::Layout;
use std::cell::Cell;
use std::ptr;
use std::time::SystemTime;

use crate::affix::AffixAllocator;
use crate::block::Block;
use crate::error::AllocResult;
use crate::traits::{BlockAllocator, ExpandingAllocator, OwningAllocator};

use counters::{Counters, add, bump};

/// Decorator collecting flag-selected allocation metrics.
pub struct StatsAllocator<A: BlockAllocator> {
    inner: AffixAllocator<A>,
    flags: StatsFlags,
    counters: Counters,
    root: Cell<*mut AllocationInfo>,
}

impl<A: BlockAllocator> StatsAllocator<A> {
    /// Wraps `delegate`, maintaining the metrics selected by `flags`.
    pub fn new(delegate: A, flags: StatsFlags) -> AllocResult<Self> {
        let inner = if flags.captures_allocations() {
            AffixAllocator::new(delegate, Layout::new::<AllocationInfo>())?
        } else {
            AffixAllocator::transparent(delegate)
        };
        Ok(Self {
            inner,
            flags,
            counters: Counters::default(),
            root: Cell::new(ptr::null_mut()),
        })
    }

    /// The active metric selection.
    pub fn flags(&self) -> StatsFlags {
        self.flags
    }

    /// The wrapped allocator.
    pub fn delegate(&self) -> &A {
        self.inner.delegate()
    }

    /// Point-in-time copy of every counter.
    pub fn stats(&self) -> StatsSnapshot {
        self.counters.snapshot()
    }

    /// Iterates the live allocations' trace records, newest first.
    ///
    /// Empty unless a capture flag is active.
    pub fn allocations(&self) -> Allocations<'_> {
        Allocations::new(self.root.get())
    }

    /// Allocates with an explicit call site for the trace record.
    ///
    /// Equivalent to `allocate` when no caller-info flag is active. Pair
    /// with [`call_site!`](crate::call_site) to capture the caller.
    pub fn allocate_with_site(&self, size: usize, site: Option<CallSite>) -> Block {
        let result = self.inner.allocate(size);
        let c = &self.counters;
        bump(self.flags, StatsFlags::NUM_ALLOCATE, &c.num_allocate);
        if size > 0 && result.is_some() {
            bump(self.flags, StatsFlags::NUM_ALLOCATE_OK, &c.num_allocate_ok);
        }
        add(
            self.flags,
            StatsFlags::BYTES_ALLOCATED,
            &c.bytes_allocated,
            result.len() as u64,
        );
        c.update_high_tide(self.flags);
        if result.is_some() && self.flags.captures_allocations() {
            self.link(&result, size, site);
        }
        result
    }

    /// Writes a fresh trace node into `block`'s prefix and makes it the
    /// list head.
    fn link(&self, block: &Block, requested: usize, site: Option<CallSite>) {
        // SAFETY: `block` is a live allocation from `self.inner`, which
        // carries the trace-node prefix whenever capture flags are active.
        let Some(prefix) = (unsafe { self.inner.prefix_ptr(block) }) else {
            return;
        };
        let node = prefix.cast::<AllocationInfo>();
        let head = self.root.get();
        let want = |flag: StatsFlags| self.flags.contains(flag);
        let info = AllocationInfo {
            size: if want(StatsFlags::CALLER_SIZE) { requested } else { 0 },
            file: site
                .filter(|_| want(StatsFlags::CALLER_FILE))
                .map_or("", |s| s.file),
            function: site
                .filter(|_| want(StatsFlags::CALLER_FUNCTION))
                .map_or("", |s| s.function),
            line: site
                .filter(|_| want(StatsFlags::CALLER_LINE))
                .map_or(0, |s| s.line),
            time: want(StatsFlags::CALLER_TIME).then(SystemTime::now),
            prev: ptr::null_mut(),
            next: head,
        };
        // SAFETY: the prefix region is ours, properly aligned for the node
        // layout, and uninitialized until this write.
        unsafe {
            node.write(info);
            if !head.is_null() {
                (*head).prev = node.as_ptr();
            }
        }
        self.root.set(node.as_ptr());
    }

    /// Splices `block`'s trace node out of the list, wherever it sits.
    fn unlink(&self, block: &Block) {
        // SAFETY: as in `link`; the node was written when `block` was
        // allocated and is still live.
        let Some(prefix) = (unsafe { self.inner.prefix_ptr(block) }) else {
            return;
        };
        let node = prefix.cast::<AllocationInfo>().as_ptr();
        // SAFETY: prev/next are either null or nodes in live block
        // prefixes; patching them preserves list integrity.
        unsafe {
            let prev = (*node).prev;
            let next = (*node).next;
            if prev.is_null() {
                self.root.set(next);
            } else {
                (*prev).next = next;
            }
            if !next.is_null() {
                (*next).prev = prev;
            }
        }
    }

    /// Points `block`'s neighbors (and the head, if applicable) at the
    /// node's new address after a moving reallocation carried it along.
    fn relink_moved(&self, block: &Block) {
        // SAFETY: as in `link`; the node's contents moved with the block.
        let Some(prefix) = (unsafe { self.inner.prefix_ptr(block) }) else {
            return;
        };
        let node = prefix.cast::<AllocationInfo>().as_ptr();
        // SAFETY: prev/next still reference live nodes; only the addresses
        // pointing at this node are stale.
        unsafe {
            let prev = (*node).prev;
            let next = (*node).next;
            if prev.is_null() {
                self.root.set(node);
            } else {
                (*prev).next = node;
            }
            if !next.is_null() {
                (*next).prev = node;
            }
        }
    }
}

// SAFETY: every block is produced by and returned to `self.inner`;
// bookkeeping never touches block memory outside the prefix region the
// inner allocator reserved for it.
unsafe impl<A: BlockAllocator> BlockAllocator for StatsAllocator<A> {
    const SUPPORTS_TRUNCATED_DEALLOCATION: bool = false;

    fn allocate(&self, size: usize) -> Block {
        self.allocate_with_site(size, None)
    }

    fn deallocate(&self, block: &mut Block) {
        let c = &self.counters;
        bump(self.flags, StatsFlags::NUM_DEALLOCATE, &c.num_deallocate);
        add(
            self.flags,
            StatsFlags::BYTES_DEALLOCATED,
            &c.bytes_deallocated,
            block.len() as u64,
        );
        if block.is_some() && self.flags.captures_allocations() {
            self.unlink(block);
        }
        self.inner.deallocate(block);
    }

    fn reallocate(&self, block: &mut Block, new_size: usize) -> bool {
        let c = &self.counters;
        bump(self.flags, StatsFlags::NUM_REALLOCATE, &c.num_reallocate);
        let old_ptr = block.ptr();
        let old_len = block.len() as u64;

        // A shrink to zero releases the node's storage; unlink while the
        // prefix is still readable.
        if new_size == 0 && block.is_some() && self.flags.captures_allocations() {
            self.unlink(block);
        }

        if !self.inner.reallocate(block, new_size) {
            return false;
        }
        bump(self.flags, StatsFlags::NUM_REALLOCATE_OK, &c.num_reallocate_ok);

        let new_len = block.len() as u64;
        if old_ptr.is_some() && block.ptr() == old_ptr {
            bump(
                self.flags,
                StatsFlags::NUM_REALLOCATE_IN_PLACE,
                &c.num_reallocate_in_place,
            );
            if new_len > old_len {
                let delta = new_len - old_len;
                add(self.flags, StatsFlags::BYTES_ALLOCATED, &c.bytes_allocated, delta);
                add(self.flags, StatsFlags::BYTES_EXPANDED, &c.bytes_expanded, delta);
            } else if new_len < old_len {
                let delta = old_len - new_len;
                add(
                    self.flags,
                    StatsFlags::BYTES_DEALLOCATED,
                    &c.bytes_deallocated,
                    delta,
                );
                add(
                    self.flags,
                    StatsFlags::BYTES_CONTRACTED,
                    &c.bytes_contracted,
                    delta,
                );
            }
        } else {
            add(self.flags, StatsFlags::BYTES_ALLOCATED, &c.bytes_allocated, new_len);
            add(self.flags, StatsFlags::BYTES_MOVED, &c.bytes_moved, old_len);
            add(
                self.flags,
                StatsFlags::BYTES_DEALLOCATED,
                &c.bytes_deallocated,
                old_len,
            );
            if block.is_some() && self.flags.captures_allocations() {
                if old_ptr.is_some() {
                    // The node travelled inside the moved prefix; its
                    // neighbors still point at the old address.
                    self.relink_moved(block);
                } else {
                    // Reallocation of an empty block degenerated to a fresh
                    // allocation; its prefix has no node yet.
                    self.link(block, new_size, None);
                }
            }
        }
        c.update_high_tide(self.flags);
        true
    }
}

impl<A: OwningAllocator> OwningAllocator for StatsAllocator<A> {
    fn owns(&self, block: &Block) -> bool {
        bump(self.flags, StatsFlags::NUM_OWNS, &self.counters.num_owns);
        self.inner.owns(block)
    }
}

impl<A: ExpandingAllocator> ExpandingAllocator for StatsAllocator<A> {
    fn expand(&self, block: &mut Block, delta: usize) -> bool {
        let c = &self.counters;
        bump(self.flags, StatsFlags::NUM_EXPAND, &c.num_expand);
        if !self.inner.expand(block, delta) {
            return false;
        }
        bump(self.flags, StatsFlags::NUM_EXPAND_OK, &c.num_expand_ok);
        add(
            self.flags,
            StatsFlags::BYTES_ALLOCATED,
            &c.bytes_allocated,
            delta as u64,
        );
        add(
            self.flags,
            StatsFlags::BYTES_EXPANDED,
            &c.bytes_expanded,
            delta as u64,
        );
        c.update_high_tide(self.flags);
        true
    }
}

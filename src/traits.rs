//! The allocator capability contract.
//!
//! Every allocator in this crate (leaves, pools, decorators) speaks the
//! same minimal [`Block`]-based protocol, so allocators compose freely:
//! a decorator's delegate is just another `BlockAllocator`.
//!
//! # Contract
//!
//! - `allocate(n)` returns an owned block of *at least* `n` usable bytes, or
//!   the empty block on failure (including `n == 0`). Failure never panics.
//! - `deallocate` consumes the caller's block: on return the handle is empty
//!   and the memory belongs to the allocator again. Passing a block that was
//!   not produced by this allocator is a caller bug.
//! - `reallocate` resizes in place or by moving; it returns `true` on
//!   success (the block describes the new region, old contents preserved up
//!   to the shorter length) and `false` on failure (the block is untouched
//!   and still valid).
//!
//! Optional capabilities live in separate traits ([`OwningAllocator`],
//! [`ExpandingAllocator`]) so "does this allocator support X" is a trait
//! bound checked at compile time, not a runtime error path.

use crate::block::Block;

/// A composable block allocator.
///
/// # Safety
///
/// Implementors promise the contract above: returned non-empty blocks
/// reference valid, writable, exclusively-owned memory of at least the
/// requested length; `deallocate` and `reallocate` keep every outstanding
/// block valid per the rules in the module docs.
pub unsafe trait BlockAllocator {
    /// Whether a block obtained here may be returned through `deallocate`
    /// with a length *smaller* than it was allocated with, releasing only
    /// that prefix.
    ///
    /// Batch-allocating wrappers key their refill strategy on this.
    const SUPPORTS_TRUNCATED_DEALLOCATION: bool;

    /// Allocates at least `size` bytes. Empty block on failure or `size == 0`.
    fn allocate(&self, size: usize) -> Block;

    /// Returns `block`'s memory to this allocator and empties the handle.
    ///
    /// No-op for the empty block.
    fn deallocate(&self, block: &mut Block);

    /// Resizes `block` to at least `new_size` bytes.
    ///
    /// On success returns `true` and `block` describes the new region; on
    /// failure returns `false` and `block` is unchanged and still owned by
    /// the caller. `new_size == 0` degenerates to `deallocate` and succeeds.
    fn reallocate(&self, block: &mut Block, new_size: usize) -> bool;
}

/// Allocators that can answer whether a block came from them.
///
/// The answer only needs to be exact for blocks that are either owned by
/// this allocator or by an allocator it composes over; it is what fallback
/// compositions use to route deallocations.
pub trait OwningAllocator: BlockAllocator {
    /// True if `block` was handed out by this allocator and is still live.
    fn owns(&self, block: &Block) -> bool;
}

/// Allocators that can grow a block in place without moving it.
pub trait ExpandingAllocator: BlockAllocator {
    /// Grows `block` by `delta` bytes at the same address.
    ///
    /// Returns `false` (leaving `block` untouched) when in-place growth is
    /// impossible.
    fn expand(&self, block: &mut Block, delta: usize) -> bool;
}

// A shared reference to an allocator is itself an allocator; decorators can
// borrow their delegate instead of owning it.
unsafe impl<A: BlockAllocator> BlockAllocator for &A {
    const SUPPORTS_TRUNCATED_DEALLOCATION: bool = A::SUPPORTS_TRUNCATED_DEALLOCATION;

    #[inline]
    fn allocate(&self, size: usize) -> Block {
        (**self).allocate(size)
    }

    #[inline]
    fn deallocate(&self, block: &mut Block) {
        (**self).deallocate(block)
    }

    #[inline]
    fn reallocate(&self, block: &mut Block, new_size: usize) -> bool {
        (**self).reallocate(block, new_size)
    }
}

impl<A: OwningAllocator> OwningAllocator for &A {
    #[inline]
    fn owns(&self, block: &Block) -> bool {
        (**self).owns(block)
    }
}

impl<A: ExpandingAllocator> ExpandingAllocator for &A {
    #[inline]
    fn expand(&self, block: &mut Block, delta: usize) -> bool {
        (**self).expand(block, delta)
    }
}

//! Prefix-attaching decorator.
//!
//! `AffixAllocator` places a caller-chosen metadata region immediately
//! before every block it hands out. The delegate sees one enlarged
//! allocation; the caller sees a normal block and can recover the prefix
//! through [`prefix_ptr`](AffixAllocator::prefix_ptr).
//!
//! The prefix size is fixed at construction. A zero-sized prefix makes the
//! wrapper a transparent pass-through with no per-allocation overhead,
//! which is how callers opt out of metadata without changing types.
//!
//! # Layout
//!
//! ```text
//! |<- offset ->|<- user block ->|
//! ^ delegate    ^ caller-visible pointer
//! ```
//!
//! `offset` is the prefix size rounded up to [`MAX_ALIGNMENT`], so the user
//! block keeps the delegate's alignment.
//!
//! [`MAX_ALIGNMENT`]: crate::system::MAX_ALIGNMENT

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::block::Block;
use crate::error::{AllocError, AllocResult};
use crate::realloc::reallocate_trivially;
use crate::system::MAX_ALIGNMENT;
use crate::traits::{BlockAllocator, ExpandingAllocator, OwningAllocator};
use crate::util::align_up;

/// Decorator that co-locates a metadata prefix with each allocation.
#[derive(Debug)]
pub struct AffixAllocator<A> {
    delegate: A,
    offset: usize,
}

impl<A: BlockAllocator> AffixAllocator<A> {
    /// Wraps `delegate`, reserving room for `prefix` before each block.
    ///
    /// Fails if the prefix demands alignment stricter than the blocks the
    /// delegate produces.
    pub fn new(delegate: A, prefix: Layout) -> AllocResult<Self> {
        if prefix.align() > MAX_ALIGNMENT {
            return Err(AllocError::PrefixAlignment {
                align: prefix.align(),
                max: MAX_ALIGNMENT,
            });
        }
        let offset = align_up(prefix.size(), MAX_ALIGNMENT);
        Ok(Self { delegate, offset })
    }

    /// Wraps `delegate` with a zero-sized prefix: a pure pass-through.
    pub fn transparent(delegate: A) -> Self {
        Self { delegate, offset: 0 }
    }

    /// Bytes reserved before each user block. Zero for a transparent wrapper.
    #[inline]
    pub fn prefix_offset(&self) -> usize {
        self.offset
    }

    /// The wrapped allocator.
    #[inline]
    pub fn delegate(&self) -> &A {
        &self.delegate
    }

    /// Pointer to the prefix of `block`, or `None` for a transparent
    /// wrapper or an empty block.
    ///
    /// # Safety
    ///
    /// `block` must be a live block produced by this allocator. The returned
    /// pointer is valid for `prefix_offset()` bytes until the block is
    /// deallocated or moved by a reallocation.
    #[inline]
    pub unsafe fn prefix_ptr(&self, block: &Block) -> Option<NonNull<u8>> {
        if self.offset == 0 {
            return None;
        }
        let ptr = block.ptr()?;
        // SAFETY: the block was allocated with `offset` extra leading bytes,
        // so stepping back stays inside the delegate's allocation.
        Some(unsafe { NonNull::new_unchecked(ptr.as_ptr().sub(self.offset)) })
    }

    /// Rebuilds the delegate-facing block from a caller-facing one.
    ///
    /// # Safety
    ///
    /// `block` must be a live, non-empty block produced by this allocator.
    unsafe fn outer(&self, block: &Block) -> Block {
        debug_assert!(block.is_some());
        match block.ptr() {
            // SAFETY: per the caller contract, the delegate's allocation
            // starts `offset` bytes before the user pointer and is
            // `len + offset` bytes long.
            Some(ptr) => unsafe {
                Block::from_raw_parts(
                    NonNull::new_unchecked(ptr.as_ptr().sub(self.offset)),
                    block.len() + self.offset,
                )
            },
            None => Block::empty(),
        }
    }

    /// Shrinks a delegate block back to its caller-facing view.
    fn inner(&self, outer: Block) -> Block {
        match outer.ptr() {
            // SAFETY: the delegate returned at least `offset + requested`
            // bytes; the sub-block is fully contained in them. The outer
            // handle is consumed, so this stays the sole live handle.
            Some(ptr) => unsafe {
                Block::from_raw_parts(
                    NonNull::new_unchecked(ptr.as_ptr().add(self.offset)),
                    outer.len() - self.offset,
                )
            },
            None => Block::empty(),
        }
    }
}

// SAFETY: every caller-facing block is a suffix of a live delegate
// allocation with the prefix region in front; deallocate/reallocate always
// reconstruct the exact outer block before talking to the delegate.
unsafe impl<A: BlockAllocator> BlockAllocator for AffixAllocator<A> {
    // A prefixed sub-region cannot be released independently of its prefix.
    const SUPPORTS_TRUNCATED_DEALLOCATION: bool = false;

    fn allocate(&self, size: usize) -> Block {
        if size == 0 {
            return Block::empty();
        }
        if self.offset == 0 {
            return self.delegate.allocate(size);
        }
        let Some(total) = size.checked_add(self.offset) else {
            return Block::empty();
        };
        let outer = self.delegate.allocate(total);
        if outer.is_empty() {
            return Block::empty();
        }
        self.inner(outer)
    }

    fn deallocate(&self, block: &mut Block) {
        let owned = block.take();
        if owned.is_empty() {
            return;
        }
        // SAFETY: `owned` came from our `allocate` and is still live.
        let mut outer = unsafe { self.outer(&owned) };
        self.delegate.deallocate(&mut outer);
    }

    fn reallocate(&self, block: &mut Block, new_size: usize) -> bool {
        if let Some(done) = reallocate_trivially(self, block, new_size) {
            return done;
        }
        if self.offset == 0 {
            return self.delegate.reallocate(block, new_size);
        }
        let Some(total) = new_size.checked_add(self.offset) else {
            return false;
        };
        let current = block.take();
        // SAFETY: `current` came from our `allocate` and is still live.
        let mut outer = unsafe { self.outer(&current) };
        if self.delegate.reallocate(&mut outer, total) {
            *block = self.inner(outer);
            true
        } else {
            // Delegate left the outer block untouched; restore the view.
            *block = self.inner(outer);
            false
        }
    }
}

impl<A: OwningAllocator> OwningAllocator for AffixAllocator<A> {
    fn owns(&self, block: &Block) -> bool {
        if block.is_empty() {
            return false;
        }
        // SAFETY: `owns` is only meaningful for blocks from this allocator
        // or its delegate chain; reconstructing the outer view is valid for
        // those and merely yields a negative answer for others.
        let outer = unsafe { self.outer(block) };
        self.delegate.owns(&outer)
    }
}

impl<A: ExpandingAllocator> ExpandingAllocator for AffixAllocator<A> {
    fn expand(&self, block: &mut Block, delta: usize) -> bool {
        if delta == 0 {
            return true;
        }
        if block.is_empty() {
            return false;
        }
        if self.offset == 0 {
            return self.delegate.expand(block, delta);
        }
        let current = block.take();
        // SAFETY: `current` came from our `allocate` and is still live.
        let mut outer = unsafe { self.outer(&current) };
        // The prefix sits at the front; growth happens at the tail, so the
        // whole delta lands in the user region.
        let grown = self.delegate.expand(&mut outer, delta);
        *block = self.inner(outer);
        grown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::SystemAllocator;

    #[test]
    fn transparent_wrapper_passes_through() {
        let a = AffixAllocator::transparent(SystemAllocator::new());
        assert_eq!(a.prefix_offset(), 0);
        let mut b = a.allocate(32);
        assert_eq!(b.len(), 32);
        assert!(unsafe { a.prefix_ptr(&b) }.is_none());
        a.deallocate(&mut b);
    }

    #[test]
    fn prefix_round_trip() {
        let a = AffixAllocator::new(SystemAllocator::new(), Layout::new::<u64>()).unwrap();
        assert_eq!(a.prefix_offset(), MAX_ALIGNMENT);
        let mut b = a.allocate(24);
        assert_eq!(b.len(), 24);

        let prefix = unsafe { a.prefix_ptr(&b) }.unwrap();
        unsafe { prefix.cast::<u64>().write(0xDEAD_BEEF) };
        let read = unsafe { prefix.cast::<u64>().read() };
        assert_eq!(read, 0xDEAD_BEEF);

        a.deallocate(&mut b);
        assert!(b.is_empty());
    }

    #[test]
    fn prefix_survives_reallocation() {
        let a = AffixAllocator::new(SystemAllocator::new(), Layout::new::<u64>()).unwrap();
        let mut b = a.allocate(16);
        unsafe {
            a.prefix_ptr(&b).unwrap().cast::<u64>().write(7);
        }
        assert!(a.reallocate(&mut b, 4096));
        assert_eq!(b.len(), 4096);
        let read = unsafe { a.prefix_ptr(&b).unwrap().cast::<u64>().read() };
        assert_eq!(read, 7);
        a.deallocate(&mut b);
    }

    #[test]
    fn overaligned_prefix_is_rejected() {
        #[repr(align(64))]
        struct Wide;
        let err = AffixAllocator::new(SystemAllocator::new(), Layout::new::<Wide>()).unwrap_err();
        assert!(matches!(err, AllocError::PrefixAlignment { align: 64, .. }));
    }
}

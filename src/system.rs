//! Leaf allocator over the process heap.
//!
//! `SystemAllocator` is the terminal delegate for compositions in this
//! crate: it turns the [`BlockAllocator`] protocol into `std::alloc` calls.
//! Every block it hands out is aligned to [`MAX_ALIGNMENT`], so wrappers
//! that carve sub-regions (prefixes, batch splits) can rely on one uniform
//! alignment instead of threading layouts through the protocol.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::block::Block;
use crate::traits::{BlockAllocator, ExpandingAllocator};

/// Alignment of every block produced by [`SystemAllocator`], in bytes.
///
/// Sufficient for any primitive type and for the metadata prefixes this
/// crate attaches to blocks.
pub const MAX_ALIGNMENT: usize = 16;

/// Allocator backed by the global system heap.
///
/// Stateless and zero-sized; construct it freely wherever a leaf is needed.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

impl SystemAllocator {
    /// Creates a system allocator.
    pub const fn new() -> Self {
        Self
    }

    #[inline]
    fn layout(size: usize) -> Option<Layout> {
        Layout::from_size_align(size, MAX_ALIGNMENT).ok()
    }
}

// SAFETY: blocks come straight from the global allocator with the layout
// reconstructed from the block length, which is exactly the size that was
// allocated. Ownership transfers follow the std::alloc rules.
unsafe impl BlockAllocator for SystemAllocator {
    const SUPPORTS_TRUNCATED_DEALLOCATION: bool = false;

    fn allocate(&self, size: usize) -> Block {
        if size == 0 {
            return Block::empty();
        }
        let Some(layout) = Self::layout(size) else {
            return Block::empty();
        };
        // SAFETY: layout has non-zero size.
        let raw = unsafe { alloc::alloc(layout) };
        match NonNull::new(raw) {
            // SAFETY: `raw` points to `size` freshly allocated bytes that no
            // other Block references.
            Some(ptr) => unsafe { Block::from_raw_parts(ptr, size) },
            None => Block::empty(),
        }
    }

    fn deallocate(&self, block: &mut Block) {
        let owned = block.take();
        if let Some(ptr) = owned.ptr() {
            // The layout was valid when the block was allocated, so it is
            // valid now.
            if let Some(layout) = Self::layout(owned.len()) {
                // SAFETY: the block was produced by `allocate` with this
                // exact size, so the layout matches the original allocation.
                unsafe { alloc::dealloc(ptr.as_ptr(), layout) };
            }
        }
    }

    fn reallocate(&self, block: &mut Block, new_size: usize) -> bool {
        if new_size == 0 {
            self.deallocate(block);
            return true;
        }
        let Some(ptr) = block.ptr() else {
            *block = self.allocate(new_size);
            return block.is_some();
        };
        if block.len() == new_size {
            return true;
        }
        let Some(layout) = Self::layout(block.len()) else {
            return false;
        };
        if Self::layout(new_size).is_none() {
            return false;
        }
        // SAFETY: ptr/layout describe the live allocation behind `block`;
        // new_size is non-zero.
        let raw = unsafe { alloc::realloc(ptr.as_ptr(), layout, new_size) };
        match NonNull::new(raw) {
            Some(moved) => {
                // SAFETY: realloc returned a valid region of new_size bytes
                // and invalidated the old pointer, which we overwrite here.
                *block = unsafe { Block::from_raw_parts(moved, new_size) };
                true
            }
            None => false,
        }
    }
}

impl ExpandingAllocator for SystemAllocator {
    fn expand(&self, _block: &mut Block, _delta: usize) -> bool {
        // The global allocator offers no in-place growth probe.
        false
    }
}

//! The `Block` value type handed out and accepted by every allocator.
//!
//! A `Block` is a `{pointer, length}` pair describing one allocation. The
//! empty block (no pointer, zero length) doubles as the failure value for
//! `allocate`, so fallible paths never need `Result` plumbing.
//!
//! # Ownership
//!
//! Blocks transfer ownership by value: whoever holds a non-empty `Block` is
//! responsible for eventually returning it to the allocator that produced it.
//! `Block` is deliberately neither `Clone` nor `Copy`: two live handles to
//! the same allocation would both claim that responsibility.

use core::fmt;
use core::ptr::NonNull;

/// A `{pointer, length}` handle to a memory region.
///
/// Invariant: the pointer is present if and only if the length is non-zero.
/// Both constructors uphold this; nothing else in the crate can break it.
#[derive(Default, PartialEq, Eq)]
pub struct Block {
    ptr: Option<NonNull<u8>>,
    len: usize,
}

impl Block {
    /// The empty block: no memory, zero length. Also the failure value.
    pub const fn empty() -> Self {
        Self { ptr: None, len: 0 }
    }

    /// Builds a block from a raw pointer and length.
    ///
    /// # Safety
    ///
    /// `ptr` must point to `len` bytes obtained from some allocator in this
    /// crate's contract, `len` must be non-zero, and the caller must not
    /// create a second live `Block` for the same region.
    pub const unsafe fn from_raw_parts(ptr: NonNull<u8>, len: usize) -> Self {
        debug_assert!(len != 0);
        Self {
            ptr: Some(ptr),
            len,
        }
    }

    /// The block's pointer, or `None` for the empty block.
    #[inline]
    pub fn ptr(&self) -> Option<NonNull<u8>> {
        self.ptr
    }

    /// Length in bytes; zero exactly for the empty block.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for the empty (failure) block.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    /// True for a live allocation. The success test for `allocate`.
    #[inline]
    pub fn is_some(&self) -> bool {
        self.ptr.is_some()
    }

    /// Resets this handle to empty, dropping the claim on the memory.
    ///
    /// Used by allocators when they take over ownership (pool recycling,
    /// deallocation). Does not free anything by itself.
    #[inline]
    pub fn reset(&mut self) {
        self.ptr = None;
        self.len = 0;
    }

    /// Moves the block out, leaving this handle empty.
    #[inline]
    pub fn take(&mut self) -> Block {
        core::mem::take(self)
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ptr {
            Some(p) => write!(f, "Block({:p}, {})", p.as_ptr(), self.len),
            None => f.write_str("Block(empty)"),
        }
    }
}

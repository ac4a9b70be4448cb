//! Degenerate reallocation cases shared by every allocator.
//!
//! Each `reallocate` implementation starts with the same three cases: resize
//! to zero (a deallocation), resize of the empty block (an allocation), and
//! resize to the current length (a no-op). This helper handles them once.

use crate::block::Block;
use crate::traits::BlockAllocator;

/// Handles the trivial reallocation cases for `allocator`.
///
/// Returns `Some(outcome)` when the request was one of the degenerate cases
/// and has been fully handled; `None` when the caller must do a real resize.
pub fn reallocate_trivially<A: BlockAllocator + ?Sized>(
    allocator: &A,
    block: &mut Block,
    new_size: usize,
) -> Option<bool> {
    if new_size == 0 {
        allocator.deallocate(block);
        return Some(true);
    }
    if block.is_empty() {
        *block = allocator.allocate(new_size);
        return Some(block.is_some());
    }
    if block.len() == new_size {
        return Some(true);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::SystemAllocator;

    #[test]
    fn zero_target_deallocates() {
        let a = SystemAllocator::new();
        let mut b = a.allocate(8);
        assert_eq!(reallocate_trivially(&a, &mut b, 0), Some(true));
        assert!(b.is_empty());
    }

    #[test]
    fn empty_source_allocates() {
        let a = SystemAllocator::new();
        let mut b = Block::empty();
        assert_eq!(reallocate_trivially(&a, &mut b, 32), Some(true));
        assert_eq!(b.len(), 32);
        a.deallocate(&mut b);
    }

    #[test]
    fn same_size_is_a_no_op() {
        let a = SystemAllocator::new();
        let mut b = a.allocate(8);
        let ptr = b.ptr();
        assert_eq!(reallocate_trivially(&a, &mut b, 8), Some(true));
        assert_eq!(b.ptr(), ptr);
        a.deallocate(&mut b);
    }

    #[test]
    fn real_resize_is_not_handled() {
        let a = SystemAllocator::new();
        let mut b = a.allocate(8);
        assert_eq!(reallocate_trivially(&a, &mut b, 16), None);
        a.deallocate(&mut b);
    }
}

//! Test delegates that record every call made against them.
#![allow(dead_code)] // each integration test binary uses a subset

use std::alloc::{self, Layout};
use std::cell::RefCell;
use std::ptr::NonNull;

use brickalloc::{Block, BlockAllocator, MAX_ALIGNMENT};

/// Arena-style delegate: allocations are real memory, deallocations are
/// recorded but deferred until drop. Deferring makes it legitimately
/// capable of truncated deallocation, selected by the const parameter.
pub struct RecordingArena<const TRUNC: bool> {
    chunks: RefCell<Vec<(NonNull<u8>, Layout)>>,
    allocs: RefCell<Vec<usize>>,
    deallocs: RefCell<Vec<usize>>,
}

impl<const TRUNC: bool> RecordingArena<TRUNC> {
    pub fn new() -> Self {
        Self {
            chunks: RefCell::new(Vec::new()),
            allocs: RefCell::new(Vec::new()),
            deallocs: RefCell::new(Vec::new()),
        }
    }

    /// Sizes of every `allocate` call, in order.
    pub fn allocated_sizes(&self) -> Vec<usize> {
        self.allocs.borrow().clone()
    }

    /// Sizes of every `deallocate` call, in order.
    pub fn deallocated_sizes(&self) -> Vec<usize> {
        self.deallocs.borrow().clone()
    }

    pub fn allocate_calls(&self) -> usize {
        self.allocs.borrow().len()
    }

    pub fn deallocate_calls(&self) -> usize {
        self.deallocs.borrow().len()
    }
}

unsafe impl<const TRUNC: bool> BlockAllocator for RecordingArena<TRUNC> {
    const SUPPORTS_TRUNCATED_DEALLOCATION: bool = TRUNC;

    fn allocate(&self, size: usize) -> Block {
        self.allocs.borrow_mut().push(size);
        if size == 0 {
            return Block::empty();
        }
        let layout = Layout::from_size_align(size, MAX_ALIGNMENT).unwrap();
        let raw = unsafe { alloc::alloc(layout) };
        let ptr = NonNull::new(raw).unwrap();
        self.chunks.borrow_mut().push((ptr, layout));
        unsafe { Block::from_raw_parts(ptr, size) }
    }

    fn deallocate(&self, block: &mut Block) {
        self.deallocs.borrow_mut().push(block.len());
        block.reset();
    }

    fn reallocate(&self, _block: &mut Block, _new_size: usize) -> bool {
        false
    }
}

impl<const TRUNC: bool> Drop for RecordingArena<TRUNC> {
    fn drop(&mut self) {
        for (ptr, layout) in self.chunks.borrow_mut().drain(..) {
            unsafe { alloc::dealloc(ptr.as_ptr(), layout) };
        }
    }
}

/// Delegate whose reallocations always succeed in place: each block sits in
/// a slab large enough for any test-sized resize.
pub struct InPlaceDelegate;

const SLAB: usize = 4096;

unsafe impl BlockAllocator for InPlaceDelegate {
    const SUPPORTS_TRUNCATED_DEALLOCATION: bool = false;

    fn allocate(&self, size: usize) -> Block {
        if size == 0 || size > SLAB {
            return Block::empty();
        }
        let layout = Layout::from_size_align(SLAB, MAX_ALIGNMENT).unwrap();
        let raw = unsafe { alloc::alloc(layout) };
        match NonNull::new(raw) {
            Some(ptr) => unsafe { Block::from_raw_parts(ptr, size) },
            None => Block::empty(),
        }
    }

    fn deallocate(&self, block: &mut Block) {
        let owned = block.take();
        if let Some(ptr) = owned.ptr() {
            let layout = Layout::from_size_align(SLAB, MAX_ALIGNMENT).unwrap();
            unsafe { alloc::dealloc(ptr.as_ptr(), layout) };
        }
    }

    fn reallocate(&self, block: &mut Block, new_size: usize) -> bool {
        if new_size == 0 {
            self.deallocate(block);
            return true;
        }
        if block.is_empty() {
            *block = self.allocate(new_size);
            return block.is_some();
        }
        if new_size > SLAB {
            return false;
        }
        let ptr = block.ptr().unwrap();
        *block = unsafe { Block::from_raw_parts(ptr, new_size) };
        true
    }
}

/// Delegate whose reallocations always move the block to a fresh address.
pub struct MovingDelegate;

unsafe impl BlockAllocator for MovingDelegate {
    const SUPPORTS_TRUNCATED_DEALLOCATION: bool = false;

    fn allocate(&self, size: usize) -> Block {
        if size == 0 {
            return Block::empty();
        }
        let layout = Layout::from_size_align(size, MAX_ALIGNMENT).unwrap();
        let raw = unsafe { alloc::alloc(layout) };
        match NonNull::new(raw) {
            Some(ptr) => unsafe { Block::from_raw_parts(ptr, size) },
            None => Block::empty(),
        }
    }

    fn deallocate(&self, block: &mut Block) {
        let owned = block.take();
        if let Some(ptr) = owned.ptr() {
            let layout = Layout::from_size_align(owned.len(), MAX_ALIGNMENT).unwrap();
            unsafe { alloc::dealloc(ptr.as_ptr(), layout) };
        }
    }

    fn reallocate(&self, block: &mut Block, new_size: usize) -> bool {
        if new_size == 0 {
            self.deallocate(block);
            return true;
        }
        if block.is_empty() {
            *block = self.allocate(new_size);
            return block.is_some();
        }
        let mut fresh = self.allocate(new_size);
        let Some(dst) = fresh.ptr() else { return false };
        // The old block is still live while the copy happens, so the fresh
        // address is guaranteed distinct.
        let src = block.ptr().unwrap();
        unsafe {
            std::ptr::copy_nonoverlapping(
                src.as_ptr(),
                dst.as_ptr(),
                block.len().min(new_size),
            );
        }
        self.deallocate(block);
        *block = fresh.take();
        true
    }
}

//! Per-allocation trace records.
//!
//! When any capture flag is active, every live allocation carries an
//! [`AllocationInfo`] node in its block prefix. Nodes form an intrusive
//! doubly linked list rooted at the owning allocator, newest first; link
//! and unlink are O(1) and need no allocation of their own because the
//! node's storage travels with the block it describes.

use std::marker::PhantomData;
use std::time::SystemTime;

/// A call site captured by [`call_site!`](crate::call_site).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    /// Source file of the allocation request.
    pub file: &'static str,
    /// Function containing the request.
    pub function: &'static str,
    /// Line of the request.
    pub line: u32,
}

/// Trace record for one live allocation.
///
/// Fields not selected by the active flags hold their defaults: zero size,
/// empty strings, line 0, no timestamp.
#[derive(Debug)]
pub struct AllocationInfo {
    /// Requested size in bytes.
    pub size: usize,
    /// Source file of the allocation, when captured.
    pub file: &'static str,
    /// Function that requested the allocation, when captured.
    pub function: &'static str,
    /// Source line, when captured.
    pub line: u32,
    /// Wall-clock time of the allocation, when captured.
    pub time: Option<SystemTime>,
    pub(super) prev: *mut AllocationInfo,
    pub(super) next: *mut AllocationInfo,
}

/// Iterator over the live allocations of a stats allocator, newest first.
///
/// The borrow of the allocator keeps the list from being mutated while the
/// iterator is alive.
pub struct Allocations<'a> {
    current: *const AllocationInfo,
    _list: PhantomData<&'a AllocationInfo>,
}

impl<'a> Allocations<'a> {
    pub(super) fn new(head: *const AllocationInfo) -> Self {
        Self { current: head, _list: PhantomData }
    }
}

impl<'a> Iterator for Allocations<'a> {
    type Item = &'a AllocationInfo;

    fn next(&mut self) -> Option<&'a AllocationInfo> {
        if self.current.is_null() {
            return None;
        }
        // SAFETY: non-null list entries are nodes in live block prefixes,
        // valid for the lifetime of the borrowed allocator.
        let node = unsafe { &*self.current };
        self.current = node.next;
        Some(node)
    }
}

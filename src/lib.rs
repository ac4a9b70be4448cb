//! Composable memory-allocation building blocks.
//!
//! This crate provides small, independently testable allocator policies
//! that stack into an allocator matching an application's allocation
//! pattern:
//!
//! - [`Freelist`] / [`SharedFreelist`]: bounded pooling free lists that
//!   recycle fixed-size blocks, with batched upstream allocation and an
//!   optional lock-free pool for concurrent use
//! - [`StatsAllocator`]: a decorator collecting flag-selected metrics and,
//!   optionally, a trace record per live allocation
//! - [`AffixAllocator`]: a decorator co-locating caller metadata ahead of
//!   each block
//! - [`SystemAllocator`]: the leaf over the process heap
//!
//! Everything speaks the same minimal [`Block`]-based contract
//! ([`BlockAllocator`]), so policies compose freely; a stats wrapper around
//! a free list over the system heap is three type parameters, no glue.
//!
//! # Features
//!
//! - `logging` (default): `tracing` diagnostics on slow paths (batch
//!   refill, pool overflow, drop-time drain)
//!
//! # Example
//!
//! ```
//! use brickalloc::{BlockAllocator, Freelist, StatsAllocator, StatsFlags, SystemAllocator};
//!
//! # fn main() -> brickalloc::AllocResult<()> {
//! let pool = Freelist::new(SystemAllocator::new(), 64, 256)?;
//! let alloc = StatsAllocator::new(pool, StatsFlags::NUM_ALLOCATE | StatsFlags::BYTES_ALLOCATED)?;
//!
//! let mut block = alloc.allocate(100);
//! assert_eq!(block.len(), 256); // pooled blocks span the whole size class
//! alloc.deallocate(&mut block);
//!
//! assert_eq!(alloc.stats().num_allocate, 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod affix;
pub mod block;
pub mod bound;
pub mod error;
pub mod freelist;
pub mod realloc;
pub mod stats;
pub mod system;
pub mod traits;

mod macros;
mod util;

pub use affix::AffixAllocator;
pub use block::Block;
pub use bound::Bound;
pub use error::{AllocError, AllocResult};
pub use freelist::{
    ConcurrentSlots, FreeListAllocator, Freelist, FreelistConfig, LocalSlots, SharedFreelist,
    SlotPool,
};
pub use stats::{AllocationInfo, Allocations, CallSite, StatsAllocator, StatsFlags, StatsSnapshot};
pub use system::{MAX_ALIGNMENT, SystemAllocator};
pub use traits::{BlockAllocator, ExpandingAllocator, OwningAllocator};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

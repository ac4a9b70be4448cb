//! Free-list allocator behavior against counting delegates.

mod common;

use brickalloc::{
    Block, BlockAllocator, Freelist, FreelistConfig, OwningAllocator, SharedFreelist,
};
use common::RecordingArena;

type TruncArena = RecordingArena<true>;
type PlainArena = RecordingArena<false>;

#[test]
fn batched_refill_issues_one_upstream_call() {
    let arena = TruncArena::new();
    let config = FreelistConfig { pool_capacity: 16, batch_size: 4 };
    let fl = Freelist::with_config(&arena, 64, 64, config).unwrap();

    let mut b = fl.allocate(64);
    assert_eq!(b.len(), 64);
    assert_eq!(arena.allocated_sizes(), [64 * 4], "one batch allocation");
    assert_eq!(fl.pooled_blocks(), 3, "batch minus the caller's block");

    // The next request comes from the pool, not the delegate.
    let mut b2 = fl.allocate(64);
    assert_eq!(arena.allocate_calls(), 1);
    assert_eq!(fl.pooled_blocks(), 2);

    fl.deallocate(&mut b);
    fl.deallocate(&mut b2);
}

#[test]
fn batched_refill_returns_overflow_subblocks_individually() {
    let arena = TruncArena::new();
    let config = FreelistConfig { pool_capacity: 2, batch_size: 4 };
    let fl = Freelist::with_config(&arena, 64, 64, config).unwrap();

    let mut b = fl.allocate(64);
    // Three sub-blocks to pool, capacity two: the third goes straight back.
    assert_eq!(fl.pooled_blocks(), 2);
    assert_eq!(arena.deallocated_sizes(), [64]);

    fl.deallocate(&mut b);
}

#[test]
fn individual_refill_issues_batch_size_upstream_calls() {
    let arena = PlainArena::new();
    let config = FreelistConfig { pool_capacity: 16, batch_size: 4 };
    let fl = Freelist::with_config(&arena, 64, 64, config).unwrap();

    let b_len = fl.allocate(64).len();
    assert_eq!(b_len, 64);
    assert_eq!(arena.allocated_sizes(), [64, 64, 64, 64]);
    assert_eq!(fl.pooled_blocks(), 3);
}

#[test]
fn drop_drains_every_pooled_block_to_the_delegate() {
    let arena = PlainArena::new();
    let config = FreelistConfig { pool_capacity: 16, batch_size: 4 };
    {
        let fl = Freelist::with_config(&arena, 64, 64, config).unwrap();
        let mut b = fl.allocate(64);
        fl.deallocate(&mut b);
        assert_eq!(fl.pooled_blocks(), 4);
        assert_eq!(arena.deallocate_calls(), 0);
    }
    assert_eq!(arena.deallocate_calls(), 4);
    assert!(arena.deallocated_sizes().iter().all(|&s| s == 64));
}

#[test]
fn round_trip_recycles_without_new_upstream_calls() {
    let arena = PlainArena::new();
    let config = FreelistConfig { pool_capacity: 8, batch_size: 1 };
    let fl = Freelist::with_config(&arena, 16, 64, config).unwrap();

    let mut b = fl.allocate(20);
    let first = b.ptr();
    fl.deallocate(&mut b);
    assert!(b.is_empty());

    let calls = arena.allocate_calls();
    let mut again = fl.allocate(64);
    assert_eq!(again.ptr(), first, "block recycled, not reallocated");
    assert_eq!(arena.allocate_calls(), calls);
    fl.deallocate(&mut again);
}

#[test]
fn out_of_range_deallocation_is_forwarded() {
    let arena = PlainArena::new();
    let config = FreelistConfig { pool_capacity: 8, batch_size: 1 };
    let fl = Freelist::with_config(&arena, 64, 64, config).unwrap();

    // A foreign block whose length falls outside the size class.
    let mut foreign = arena.allocate(128);
    assert!(!fl.owns(&foreign));
    fl.deallocate(&mut foreign);
    assert_eq!(arena.deallocated_sizes(), [128]);
    assert_eq!(fl.pooled_blocks(), 0);
}

#[test]
fn full_pool_forwards_to_the_delegate() {
    let arena = PlainArena::new();
    let config = FreelistConfig { pool_capacity: 1, batch_size: 1 };
    let fl = Freelist::with_config(&arena, 32, 32, config).unwrap();

    let mut a = fl.allocate(32);
    let mut b = fl.allocate(32);
    fl.deallocate(&mut a);
    assert_eq!(fl.pooled_blocks(), 1);
    fl.deallocate(&mut b);
    assert_eq!(fl.pooled_blocks(), 1, "pool stays at capacity");
    assert_eq!(arena.deallocate_calls(), 1);
    assert!(b.is_empty());
}

#[test]
fn deallocating_an_empty_block_changes_nothing() {
    let arena = PlainArena::new();
    let fl = Freelist::new(&arena, 16, 16).unwrap();
    let mut empty = Block::empty();
    fl.deallocate(&mut empty);
    assert_eq!(fl.pooled_blocks(), 0);
    assert_eq!(arena.deallocate_calls(), 0);
}

#[test]
fn shared_freelist_with_deferred_bounds() {
    use std::sync::Arc;

    let fl = SharedFreelist::deferred(
        brickalloc::SystemAllocator::new(),
        FreelistConfig { pool_capacity: 32, batch_size: 2 },
    )
    .unwrap();
    fl.set_bounds(128, 128).unwrap();

    let fl = Arc::new(fl);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let fl = Arc::clone(&fl);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    let mut b = fl.allocate(128);
                    assert_eq!(b.len(), 128);
                    fl.deallocate(&mut b);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert!(fl.pooled_blocks() <= fl.pool_capacity());
}

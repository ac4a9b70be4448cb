//! Counter storage and snapshots.
//!
//! Counters live in `Cell`s: the stats allocator is deliberately
//! unsynchronized, and `Cell` makes the wrapper `!Sync`, so sharing it
//! across threads without external locking does not compile.

use std::cell::Cell;
use std::fmt;

use super::flags::StatsFlags;

/// Adds `delta` to `cell` if `flag` is selected in `flags`.
#[inline]
pub(super) fn add(flags: StatsFlags, flag: StatsFlags, cell: &Cell<u64>, delta: u64) {
    if flags.contains(flag) {
        cell.set(cell.get().wrapping_add(delta));
    }
}

/// Increments `cell` if `flag` is selected in `flags`.
#[inline]
pub(super) fn bump(flags: StatsFlags, flag: StatsFlags, cell: &Cell<u64>) {
    add(flags, flag, cell, 1);
}

/// Live counter cells, one per metric.
#[derive(Debug, Default)]
pub(super) struct Counters {
    pub num_owns: Cell<u64>,
    pub num_allocate: Cell<u64>,
    pub num_allocate_ok: Cell<u64>,
    pub num_expand: Cell<u64>,
    pub num_expand_ok: Cell<u64>,
    pub num_reallocate: Cell<u64>,
    pub num_reallocate_ok: Cell<u64>,
    pub num_reallocate_in_place: Cell<u64>,
    pub num_deallocate: Cell<u64>,
    pub bytes_allocated: Cell<u64>,
    pub bytes_deallocated: Cell<u64>,
    pub bytes_expanded: Cell<u64>,
    pub bytes_contracted: Cell<u64>,
    pub bytes_moved: Cell<u64>,
    pub bytes_slack: Cell<u64>,
    pub bytes_high_tide: Cell<u64>,
}

impl Counters {
    /// Raises the high tide to the current outstanding-byte total if that
    /// total is a new peak.
    pub fn update_high_tide(&self, flags: StatsFlags) {
        if !flags.contains(StatsFlags::BYTES_HIGH_TIDE) {
            return;
        }
        let outstanding = self
            .bytes_allocated
            .get()
            .saturating_sub(self.bytes_deallocated.get());
        if outstanding > self.bytes_high_tide.get() {
            self.bytes_high_tide.set(outstanding);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            num_owns: self.num_owns.get(),
            num_allocate: self.num_allocate.get(),
            num_allocate_ok: self.num_allocate_ok.get(),
            num_expand: self.num_expand.get(),
            num_expand_ok: self.num_expand_ok.get(),
            num_reallocate: self.num_reallocate.get(),
            num_reallocate_ok: self.num_reallocate_ok.get(),
            num_reallocate_in_place: self.num_reallocate_in_place.get(),
            num_deallocate: self.num_deallocate.get(),
            bytes_allocated: self.bytes_allocated.get(),
            bytes_deallocated: self.bytes_deallocated.get(),
            bytes_expanded: self.bytes_expanded.get(),
            bytes_contracted: self.bytes_contracted.get(),
            bytes_moved: self.bytes_moved.get(),
            bytes_slack: self.bytes_slack.get(),
            bytes_high_tide: self.bytes_high_tide.get(),
        }
    }
}

/// Point-in-time copy of every counter.
///
/// Counters whose flags were never selected read zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// `owns` calls.
    pub num_owns: u64,
    /// `allocate` calls.
    pub num_allocate: u64,
    /// Successful `allocate` calls.
    pub num_allocate_ok: u64,
    /// `expand` calls.
    pub num_expand: u64,
    /// Successful `expand` calls.
    pub num_expand_ok: u64,
    /// `reallocate` calls.
    pub num_reallocate: u64,
    /// Successful `reallocate` calls.
    pub num_reallocate_ok: u64,
    /// Reallocations served without moving the block.
    pub num_reallocate_in_place: u64,
    /// `deallocate` calls.
    pub num_deallocate: u64,
    /// Cumulative bytes handed out.
    pub bytes_allocated: u64,
    /// Cumulative bytes returned.
    pub bytes_deallocated: u64,
    /// Bytes gained by in-place growth.
    pub bytes_expanded: u64,
    /// Bytes released by in-place shrinking.
    pub bytes_contracted: u64,
    /// Bytes copied by moving reallocations.
    pub bytes_moved: u64,
    /// Over-allocation slack.
    pub bytes_slack: u64,
    /// Peak of (allocated − deallocated) bytes over the lifetime.
    pub bytes_high_tide: u64,
}

impl StatsSnapshot {
    /// Bytes currently outstanding: allocated minus deallocated.
    pub fn bytes_outstanding(&self) -> u64 {
        self.bytes_allocated.saturating_sub(self.bytes_deallocated)
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "allocate: {} calls ({} ok), deallocate: {} calls, reallocate: {} calls ({} ok, {} in place)",
            self.num_allocate,
            self.num_allocate_ok,
            self.num_deallocate,
            self.num_reallocate,
            self.num_reallocate_ok,
            self.num_reallocate_in_place,
        )?;
        writeln!(
            f,
            "expand: {} calls ({} ok), owns: {} calls",
            self.num_expand, self.num_expand_ok, self.num_owns,
        )?;
        write!(
            f,
            "bytes: {} allocated, {} deallocated, {} expanded, {} contracted, {} moved, {} slack, high tide {}",
            self.bytes_allocated,
            self.bytes_deallocated,
            self.bytes_expanded,
            self.bytes_contracted,
            self.bytes_moved,
            self.bytes_slack,
            self.bytes_high_tide,
        )
    }
}

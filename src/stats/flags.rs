//! Metric selection flags.
//!
//! Each flag enables exactly one counter or capture mode; unset flags keep
//! their counters at zero and cost nothing at runtime. The set is fixed at
//! construction of the [`StatsAllocator`](crate::stats::StatsAllocator).

use bitflags::bitflags;

bitflags! {
    /// Selects which metrics a stats allocator maintains.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StatsFlags: u32 {
        /// Count `owns` calls.
        const NUM_OWNS = 1 << 0;
        /// Count `allocate` calls.
        const NUM_ALLOCATE = 1 << 1;
        /// Count successful `allocate` calls.
        const NUM_ALLOCATE_OK = 1 << 2;
        /// Count `expand` calls.
        const NUM_EXPAND = 1 << 3;
        /// Count successful `expand` calls.
        const NUM_EXPAND_OK = 1 << 4;
        /// Count `reallocate` calls.
        const NUM_REALLOCATE = 1 << 5;
        /// Count successful `reallocate` calls.
        const NUM_REALLOCATE_OK = 1 << 6;
        /// Count reallocations that kept the block in place.
        const NUM_REALLOCATE_IN_PLACE = 1 << 7;
        /// Count `deallocate` calls.
        const NUM_DEALLOCATE = 1 << 8;

        /// Accumulate bytes handed out.
        const BYTES_ALLOCATED = 1 << 9;
        /// Accumulate bytes returned.
        const BYTES_DEALLOCATED = 1 << 10;
        /// Accumulate bytes gained by in-place growth.
        const BYTES_EXPANDED = 1 << 11;
        /// Accumulate bytes released by in-place shrinking.
        const BYTES_CONTRACTED = 1 << 12;
        /// Accumulate bytes copied by moving reallocations.
        const BYTES_MOVED = 1 << 13;
        /// Accumulate over-allocation slack.
        const BYTES_SLACK = 1 << 14;
        /// Track the peak of outstanding bytes (high tide).
        const BYTES_HIGH_TIDE = 1 << 15;

        /// Record each live allocation's requested size.
        const CALLER_SIZE = 1 << 16;
        /// Record each live allocation's source file.
        const CALLER_FILE = 1 << 17;
        /// Record each live allocation's calling function.
        const CALLER_FUNCTION = 1 << 18;
        /// Record each live allocation's source line.
        const CALLER_LINE = 1 << 19;
        /// Record each live allocation's wall-clock timestamp.
        const CALLER_TIME = 1 << 20;

        /// All call counters.
        const NUM_ALL = Self::NUM_OWNS.bits()
            | Self::NUM_ALLOCATE.bits()
            | Self::NUM_ALLOCATE_OK.bits()
            | Self::NUM_EXPAND.bits()
            | Self::NUM_EXPAND_OK.bits()
            | Self::NUM_REALLOCATE.bits()
            | Self::NUM_REALLOCATE_OK.bits()
            | Self::NUM_REALLOCATE_IN_PLACE.bits()
            | Self::NUM_DEALLOCATE.bits();

        /// All byte counters.
        const BYTES_ALL = Self::BYTES_ALLOCATED.bits()
            | Self::BYTES_DEALLOCATED.bits()
            | Self::BYTES_EXPANDED.bits()
            | Self::BYTES_CONTRACTED.bits()
            | Self::BYTES_MOVED.bits()
            | Self::BYTES_SLACK.bits()
            | Self::BYTES_HIGH_TIDE.bits();

        /// All per-allocation capture modes.
        const CALLER_ALL = Self::CALLER_SIZE.bits()
            | Self::CALLER_FILE.bits()
            | Self::CALLER_FUNCTION.bits()
            | Self::CALLER_LINE.bits()
            | Self::CALLER_TIME.bits();

        /// Everything.
        const ALL = Self::NUM_ALL.bits() | Self::BYTES_ALL.bits() | Self::CALLER_ALL.bits();
    }
}

impl StatsFlags {
    /// True when any per-allocation capture mode is selected; this is what
    /// switches the decorator onto the prefix-carrying delegate path.
    #[inline]
    pub fn captures_allocations(self) -> bool {
        self.intersects(Self::CALLER_ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_detection() {
        assert!(!StatsFlags::NUM_ALL.captures_allocations());
        assert!(!StatsFlags::BYTES_ALL.captures_allocations());
        assert!(StatsFlags::CALLER_SIZE.captures_allocations());
        assert!(StatsFlags::ALL.captures_allocations());
    }

    #[test]
    fn groups_cover_their_members() {
        assert!(StatsFlags::NUM_ALL.contains(StatsFlags::NUM_REALLOCATE_IN_PLACE));
        assert!(StatsFlags::BYTES_ALL.contains(StatsFlags::BYTES_HIGH_TIDE));
        assert!(StatsFlags::CALLER_ALL.contains(StatsFlags::CALLER_TIME));
    }
}

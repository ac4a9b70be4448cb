//! Configuration-time errors.
//!
//! Allocation-path failures are value-based (an empty [`Block`] or a `false`
//! return) and never go through this type; see the crate docs. `AllocError`
//! covers the things that can go wrong when *building* an allocator:
//! nonsensical bounds, zero capacities, unsupported prefix layouts.
//!
//! [`Block`]: crate::Block

use thiserror::Error;

/// Result alias for fallible construction.
pub type AllocResult<T> = Result<T, AllocError>;

/// Errors produced while configuring or constructing an allocator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
    /// The lower size bound exceeds the upper bound.
    #[error("invalid size bounds: lower {lower} exceeds upper {upper}")]
    InvalidBounds {
        /// Requested lower bound in bytes.
        lower: usize,
        /// Requested upper bound in bytes.
        upper: usize,
    },

    /// A pool was configured with capacity zero.
    #[error("pool capacity must be non-zero")]
    ZeroPoolCapacity,

    /// A batch refill size of zero was requested.
    #[error("batch size must be non-zero")]
    ZeroBatchSize,

    /// A prefix layout with alignment stricter than the leaf guarantees.
    #[error("prefix alignment {align} exceeds the supported maximum {max}")]
    PrefixAlignment {
        /// Alignment demanded by the prefix layout.
        align: usize,
        /// Largest alignment the underlying allocator guarantees.
        max: usize,
    },
}

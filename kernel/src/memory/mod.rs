//! Memory Management Subsystem
//!
//! Static partitioning: memory is split into six fixed partitions that are
//! never created, destroyed, merged or split. Only their occupant changes.
//!
//! # Memory Layout
//!
//! ```text
//! Partition:   1     2     3     4     5     6
//! Index:       0     1     2     3     4     5
//! Size (MB):  40    25    15    10     8     2
//! ```
//!
//! Allocation scans from the smallest partition (index 5) towards the
//! largest and takes the first empty one that fits. See [`allocator`].

#![deny(missing_docs)]

use core::fmt;

use static_assertions::const_assert;
use thiserror::Error;

use crate::process::{ProcessId, ProgramName};

pub mod allocator;

pub use allocator::PartitionTable;

/// Number of fixed partitions
pub const PARTITION_COUNT: usize = 6;

/// Partition capacities in MB, largest first
pub const PARTITION_CAPACITIES: [u32; PARTITION_COUNT] = [40, 25, 15, 10, 8, 2];

#[allow(clippy::indexing_slicing)] // bounded by the loop condition
const fn strictly_descending(capacities: &[u32]) -> bool {
    let mut i = 1;
    while i < capacities.len() {
        if capacities[i - 1] <= capacities[i] {
            return false;
        }
        i += 1;
    }
    true
}

const_assert!(strictly_descending(&PARTITION_CAPACITIES));
const_assert!(PARTITION_COUNT <= u8::MAX as usize);

/// Index of a partition (0 = largest, 5 = smallest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionIndex(u8);

impl PartitionIndex {
    /// Create an index, rejecting values past the last partition
    pub const fn new(index: usize) -> Option<Self> {
        if index < PARTITION_COUNT {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    /// Raw index into the partition table
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Partition number as printed in status tables (1..=6)
    pub const fn number(self) -> usize {
        self.0 as usize + 1
    }
}

impl fmt::Display for PartitionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Process image currently placed in a partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupant {
    /// Owning process
    pub pid: ProcessId,
    /// Program image loaded there
    pub program: ProgramName,
}

/// One fixed memory region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Position in the partition table
    pub index: PartitionIndex,
    /// Capacity in MB
    pub capacity: u32,
    /// Current occupant, `None` when empty
    pub occupant: Option<Occupant>,
}

impl Partition {
    /// Whether nothing is loaded in this partition
    pub const fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }

    /// Whether this partition is empty and big enough for `size` MB
    pub const fn fits(&self, size: u32) -> bool {
        self.is_empty() && self.capacity >= size
    }
}

/// Memory management errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// No empty partition can hold the requested size
    #[error("no empty partition can hold {size} MB")]
    NoFittingPartition {
        /// Requested size in MB
        size: u32,
    },
    /// The process already owns a partition
    #[error("process already holds partition {0}")]
    AlreadyAllocated(PartitionIndex),
}

/// Result type for memory operations
pub type MemoryResult<T> = Result<T, MemoryError>;

//! Fixed Partition Allocator
//!
//! One table of six partitions is owned by the simulator for the whole run
//! and passed by reference into every branch, so forked children and loaded
//! programs all compete for the same memory.
//!
//! # Algorithm
//!
//! 1. Scan from the smallest partition (index 5) up to the largest (index 0)
//! 2. Take the first partition that is empty and whose capacity fits
//! 3. Record the process as occupant and store the index in its PCB
//!
//! There is no compaction, merging or splitting. A request larger than the
//! largest partition (40 MB) always fails.
//!
//! # Time Complexity
//!
//! - Allocation: O(n) with n = 6
//! - Deallocation: O(1)

#![deny(missing_docs)]

use core::fmt;

use super::{
    MemoryError, MemoryResult, Occupant, PARTITION_CAPACITIES, PARTITION_COUNT, Partition,
    PartitionIndex,
};
use crate::debug_print;
use crate::process::Pcb;

/// The six fixed partitions and their occupants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionTable {
    partitions: [Partition; PARTITION_COUNT],
}

impl Default for PartitionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PartitionTable {
    /// Create a table with every partition empty
    pub fn new() -> Self {
        let mut next = 0;
        let partitions = PARTITION_CAPACITIES.map(|capacity| {
            let partition = Partition {
                index: PartitionIndex(next),
                capacity,
                occupant: None,
            };
            next += 1;
            partition
        });
        Self { partitions }
    }

    /// Partition at `index`
    pub fn get(&self, index: PartitionIndex) -> Option<&Partition> {
        self.partitions.get(index.as_usize())
    }

    /// Number of partitions holding a process image
    pub fn occupied(&self) -> usize {
        self.partitions.iter().filter(|p| !p.is_empty()).count()
    }

    /// Place `pcb` in the smallest empty partition that fits its size
    ///
    /// On failure the PCB keeps no partition and nothing changes.
    pub fn allocate(&mut self, pcb: &mut Pcb) -> MemoryResult<PartitionIndex> {
        if let Some(held) = pcb.partition {
            return Err(MemoryError::AlreadyAllocated(held));
        }

        let partition = self
            .partitions
            .iter_mut()
            .rev()
            .find(|p| p.fits(pcb.size))
            .ok_or(MemoryError::NoFittingPartition { size: pcb.size })?;

        partition.occupant = Some(Occupant {
            pid: pcb.pid,
            program: pcb.program.clone(),
        });
        pcb.partition = Some(partition.index);

        debug_print!(
            DEBUG,
            "pid {} ({}, {} MB) placed in partition {} ({} MB)",
            pcb.pid,
            pcb.program,
            pcb.size,
            partition.index,
            partition.capacity
        );
        Ok(partition.index)
    }

    /// Release the partition held by `pcb`, if any
    ///
    /// The partition is only emptied when `pcb` is still its occupant; the
    /// PCB's index is reset either way.
    pub fn free(&mut self, pcb: &mut Pcb) {
        let Some(index) = pcb.partition.take() else {
            return;
        };
        if let Some(partition) = self.partitions.get_mut(index.as_usize()) {
            if partition.occupant.as_ref().is_some_and(|o| o.pid == pcb.pid) {
                partition.occupant = None;
                debug_print!(DEBUG, "pid {} released partition {}", pcb.pid, index);
            }
        }
    }
}

impl fmt::Display for PartitionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for partition in &self.partitions {
            match &partition.occupant {
                Some(o) => writeln!(
                    f,
                    "partition {} ({} MB): {} (pid {})",
                    partition.index, partition.capacity, o.program, o.pid
                )?,
                None => writeln!(
                    f,
                    "partition {} ({} MB): empty",
                    partition.index, partition.capacity
                )?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ProcessId, program_name};

    fn pcb(pid: u32, size: u32) -> Pcb {
        Pcb::new(ProcessId::new(pid), None, program_name("prog").unwrap(), size)
    }

    #[test]
    fn picks_smallest_fitting_partition() {
        let mut table = PartitionTable::new();
        let mut small = pcb(0, 1);
        let mut medium = pcb(1, 9);
        assert_eq!(table.allocate(&mut small).unwrap().as_usize(), 5);
        assert_eq!(table.allocate(&mut medium).unwrap().as_usize(), 3);
        assert_eq!(medium.partition.unwrap().number(), 4);
        assert_eq!(table.occupied(), 2);
    }

    #[test]
    fn skips_occupied_partitions() {
        let mut table = PartitionTable::new();
        let mut first = pcb(0, 2);
        let mut second = pcb(1, 2);
        table.allocate(&mut first).unwrap();
        assert_eq!(table.allocate(&mut second).unwrap().as_usize(), 4);
    }

    #[test]
    fn oversized_request_fails_on_empty_table() {
        let mut table = PartitionTable::new();
        let mut huge = pcb(0, 41);
        assert_eq!(
            table.allocate(&mut huge),
            Err(MemoryError::NoFittingPartition { size: 41 })
        );
        assert!(huge.partition.is_none());
        assert_eq!(table.occupied(), 0);
    }

    #[test]
    fn free_then_allocate_returns_same_partition() {
        let mut table = PartitionTable::new();
        let mut process = pcb(0, 12);
        let first = table.allocate(&mut process).unwrap();
        table.free(&mut process);
        assert!(process.partition.is_none());
        assert!(table.get(first).unwrap().is_empty());
        assert_eq!(table.allocate(&mut process).unwrap(), first);
    }

    #[test]
    fn double_allocation_is_rejected() {
        let mut table = PartitionTable::new();
        let mut process = pcb(0, 1);
        let held = table.allocate(&mut process).unwrap();
        assert_eq!(table.allocate(&mut process), Err(MemoryError::AlreadyAllocated(held)));
    }

    #[test]
    fn free_does_not_evict_other_occupant() {
        let mut table = PartitionTable::new();
        let mut owner = pcb(0, 1);
        let held = table.allocate(&mut owner).unwrap();

        let mut stale = pcb(7, 1);
        stale.partition = Some(held);
        table.free(&mut stale);

        assert!(stale.partition.is_none());
        assert_eq!(table.get(held).unwrap().occupant.as_ref().unwrap().pid, owner.pid);
    }

    #[test]
    fn display_lists_every_partition() {
        let mut table = PartitionTable::new();
        table.allocate(&mut pcb(3, 2)).unwrap();
        let text = table.to_string();
        assert_eq!(text.lines().count(), PARTITION_COUNT);
        assert!(text.starts_with("partition 1 (40 MB): empty\n"));
        assert!(text.ends_with("partition 6 (2 MB): prog (pid 3)\n"));
    }

    #[test]
    fn free_without_partition_is_noop() {
        let mut table = PartitionTable::new();
        let mut process = pcb(0, 1);
        table.free(&mut process);
        assert_eq!(table, PartitionTable::new());
    }
}

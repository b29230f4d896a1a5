//! Interrupt Entry Sequence
//!
//! Every interrupt-driven activity (`FORK`, `EXEC`) starts with the same
//! four steps, each logged and charged to the virtual clock:
//!
//! ```text
//! 1. switch to kernel mode            cost 1
//! 2. context saved                    cost = context save time
//! 3. find vector n in memory position cost 1   (ADDR_BASE + n * VECTOR_SIZE)
//! 4. load address <entry> into the PC cost 1   (0x0000 if n is out of range)
//! ```

#![deny(missing_docs)]

use super::{DEFAULT_VECTOR_ADDRESS, ExecutionLog, VectorTable, vector_address};
use crate::debug_print;

/// Cost of switching to kernel mode
pub const MODE_SWITCH_COST: u64 = 1;

/// Cost of computing the vector position
pub const VECTOR_LOOKUP_COST: u64 = 1;

/// Cost of loading the handler address into the PC
pub const ADDRESS_LOAD_COST: u64 = 1;

/// Log fragment and resulting time of one interrupt entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterruptEntry {
    /// The four timed lines, newline terminated
    pub execution: String,
    /// Clock value after the last step
    pub end_time: u64,
}

/// Run the interrupt entry sequence starting at `current_time`
///
/// Pure: the only output is the returned fragment and time.
pub fn interrupt_entry(
    current_time: u64,
    number: u32,
    context_save_time: u64,
    vectors: &VectorTable,
) -> InterruptEntry {
    let mut log = ExecutionLog::starting_at(current_time);

    log.emit(MODE_SWITCH_COST, "switch to kernel mode");
    log.emit(context_save_time, "context saved");
    log.emit(
        VECTOR_LOOKUP_COST,
        format!("find vector {number} in memory position {}", vector_address(number)),
    );

    let target = vectors.lookup(number).unwrap_or_else(|| {
        debug_print!(DEBUG, "vector {} not in table ({} entries)", number, vectors.len());
        DEFAULT_VECTOR_ADDRESS
    });
    log.emit(ADDRESS_LOAD_COST, format!("load address {target} into the PC"));

    InterruptEntry {
        end_time: log.now(),
        execution: log.into_text(),
    }
}

impl ExecutionLog {
    /// Append an interrupt entry sequence at the current time
    pub fn enter_interrupt(&mut self, number: u32, context_save_time: u64, vectors: &VectorTable) {
        let entry = interrupt_entry(self.now(), number, context_save_time, vectors);
        self.absorb(&entry.execution, entry.end_time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fork_entry_sequence() {
        let vectors = VectorTable::new(["0x01E3", "0x029C", "0x0695", "0x042B"]);
        let entry = interrupt_entry(5, 2, 10, &vectors);
        assert_eq!(
            entry.execution,
            "5, 1, switch to kernel mode\n\
             6, 10, context saved\n\
             16, 1, find vector 2 in memory position 0x0004\n\
             17, 1, load address 0x0695 into the PC\n"
        );
        assert_eq!(entry.end_time, 18);
    }

    #[test]
    fn missing_vector_loads_null_address() {
        let entry = interrupt_entry(0, 3, 10, &VectorTable::default());
        assert!(entry.execution.ends_with("12, 1, load address 0x0000 into the PC\n"));
        assert_eq!(entry.end_time, 13);
    }

    #[test]
    fn enter_interrupt_advances_log() {
        let mut log = ExecutionLog::starting_at(100);
        log.enter_interrupt(3, 4, &VectorTable::default());
        assert_eq!(log.now(), 107);
        assert_eq!(log.as_str().lines().count(), 4);
    }
}

//! Simulation cost configuration
//!
//! Every fixed cost charged by the trace interpreter lives here. The
//! defaults reproduce the reference timings: a 10-unit context save,
//! `FORK` on vector 2, `EXEC` on vector 3, 15 units per MB loaded.

use crate::arch::vectors;

/// Costs and limits used by the trace interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    /// Cost of saving the CPU context on interrupt entry
    pub context_save_time: u64,
    /// Interrupt number raised by `FORK`
    pub fork_vector: u32,
    /// Interrupt number raised by `EXEC`
    pub exec_vector: u32,
    /// Loader cost per MB of program image
    pub loader_cost_per_mb: u64,
    /// Cost of marking a partition as occupied
    pub mark_partition_cost: u64,
    /// Cost of updating the PCB after `EXEC`
    pub update_pcb_cost: u64,
    /// Cost of calling the scheduler
    pub scheduler_cost: u64,
    /// Cost of returning from the interrupt
    pub iret_cost: u64,
    /// Deepest allowed nesting of `FORK`/`EXEC` branches
    pub max_depth: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            context_save_time: 10,
            fork_vector: vectors::FORK,
            exec_vector: vectors::EXEC,
            loader_cost_per_mb: 15,
            mark_partition_cost: 3,
            update_pcb_cost: 6,
            scheduler_cost: 0,
            iret_cost: 1,
            max_depth: 64,
        }
    }
}

impl SimConfig {
    /// Same configuration with a different context save time
    #[must_use]
    pub const fn with_context_save_time(mut self, context_save_time: u64) -> Self {
        self.context_save_time = context_save_time;
        self
    }

    /// Same configuration with a different nesting limit
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

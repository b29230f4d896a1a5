//! Sim Kernel Library
//!
//! Trace-driven model of a small kernel: it replays a scripted sequence of
//! process-lifecycle events (CPU bursts, `FORK`, `EXEC`) against a fixed
//! partition memory manager and a table-driven interrupt dispatcher, and
//! produces a timestamped execution log plus process-table snapshots.
//!
//! # Architecture
//!
//! - [`syscalls`]: the trace interpreter; dispatches directives and recurses
//!   into forked children and loaded programs
//! - [`arch`]: interrupt entry model and the virtual clock
//! - [`memory`]: six fixed partitions, smallest-fit-first allocation
//! - [`process`]: PCBs, branch-local process tables, status rendering
//! - [`platform`]: external tables and the source of `EXEC` sub-traces
//!
//! # Determinism
//!
//! Nothing here touches real time, threads or hardware. Given the same trace,
//! tables and configuration the logs are byte-for-byte identical.

#![deny(missing_docs)]

pub mod macros;

pub mod arch;
pub mod config;
pub mod memory;
pub mod platform;
pub mod process;
pub mod syscalls;

use thiserror::Error;

pub use config::SimConfig;
pub use syscalls::{SimulationOutcome, Simulator};

use crate::process::ProcessId;
use crate::syscalls::directive::DirectiveError;

#[doc(hidden)]
pub use tracing as __tracing;

/// Recoverable simulation errors
///
/// None of these stop the virtual clock. They are reported through
/// [`debug_print!`] and collected by the [`Simulator`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// A trace line could not be parsed and was treated as a no-op
    #[error(transparent)]
    MalformedTraceLine(#[from] DirectiveError),
    /// `EXEC` named a program missing from the external files table
    #[error("program `{program}` not found in the external files table")]
    ProgramNotFound {
        /// Requested program
        program: String,
    },
    /// No empty partition is large enough for the process image
    #[error("memory allocation failed for pid {pid} (`{program}`, {size} MB)")]
    MemoryAllocationFailure {
        /// Process that asked for memory
        pid: ProcessId,
        /// Program image being placed
        program: String,
        /// Requested size in MB
        size: u32,
    },
    /// The trace file of an `EXEC` target is absent or empty
    #[error("trace for program `{program}` is missing or empty")]
    MissingSubTraceFile {
        /// Program whose trace could not be loaded
        program: String,
    },
    /// The branch-local process table is full
    #[error("process table is full ({capacity} records), fork of pid {parent} dropped")]
    TooManyProcesses {
        /// Forking process
        parent: ProcessId,
        /// Table capacity
        capacity: usize,
    },
    /// Nested `FORK`/`EXEC` went deeper than the configured limit
    #[error("nesting depth {depth} reached, descent skipped")]
    RecursionLimit {
        /// Depth at which descent was refused
        depth: usize,
    },
}

//! Process Management Subsystem
//!
//! Process control blocks and the branch-local process table.
//!
//! - PIDs come from one [`PidAllocator`] per run, so they are unique and
//!   strictly increasing even across sibling branches
//! - A [`ProcessTable`] is a snapshot owned by one simulation branch: the
//!   running PCB plus the PCBs waiting behind it. Forking produces a new
//!   snapshot for the child and leaves the parent's untouched
//! - PCBs are never destroyed; the trace language has no terminate directive
//!
//! # Process States
//!
//! ```text
//!            FORK (parent)
//!  Running ----------------> Waiting
//!     ^
//!     | FORK (child) / init
//! ```

#![deny(missing_docs)]

use core::fmt;

use heapless::Vec;
use thiserror::Error;

use crate::memory::PartitionIndex;

pub mod status;

pub use status::render_status;

/// Maximum number of records in one branch's process table
pub const MAX_PROCESSES: usize = 64;

/// Maximum length of a program name in bytes
pub const MAX_PROGRAM_NAME: usize = 32;

/// Name of the first process
pub const INIT_PROGRAM: &str = "init";

/// Memory footprint of the first process in MB
pub const INIT_SIZE: u32 = 1;

/// Program name with fixed capacity
pub type ProgramName = heapless::String<MAX_PROGRAM_NAME>;

/// Build a [`ProgramName`], rejecting names longer than [`MAX_PROGRAM_NAME`]
pub fn program_name(name: &str) -> ProcessResult<ProgramName> {
    let mut program = ProgramName::new();
    program
        .push_str(name)
        .map_err(|()| ProcessError::NameTooLong { len: name.len() })?;
    Ok(program)
}

/// Process identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(u32);

impl ProcessId {
    /// Create a new process ID
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// The init process
    pub const INIT: ProcessId = ProcessId(0);
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out PIDs for one simulation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidAllocator {
    next: u32,
}

impl Default for PidAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl PidAllocator {
    /// Allocator whose first PID follows init
    pub const fn new() -> Self {
        Self {
            next: ProcessId::INIT.as_u32() + 1,
        }
    }

    /// Next unused PID
    pub const fn allocate(&mut self) -> ProcessId {
        let pid = ProcessId(self.next);
        self.next += 1;
        pid
    }

    /// Highest PID handed out so far, init included
    pub const fn last(&self) -> ProcessId {
        ProcessId(self.next - 1)
    }
}

/// Process states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Process owns the CPU in its branch
    Running,
    /// Process forked and is waiting for its child branch
    Waiting,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => f.write_str("running"),
            Self::Waiting => f.write_str("waiting"),
        }
    }
}

/// Process control block (PCB)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pcb {
    /// Process identifier
    pub pid: ProcessId,
    /// Parent process ID (`None` for init)
    pub parent: Option<ProcessId>,
    /// Loaded program image
    pub program: ProgramName,
    /// Image size in MB
    pub size: u32,
    /// Partition holding the image (`None` if unallocated)
    pub partition: Option<PartitionIndex>,
}

impl Pcb {
    /// Create a PCB with no memory allocated
    pub const fn new(pid: ProcessId, parent: Option<ProcessId>, program: ProgramName, size: u32) -> Self {
        Self {
            pid,
            parent,
            program,
            size,
            partition: None,
        }
    }

    /// The init process: pid 0, no parent, program `init`, 1 MB
    pub fn init() -> Self {
        let mut program = ProgramName::new();
        // INIT_PROGRAM is far below MAX_PROGRAM_NAME
        let _ = program.push_str(INIT_PROGRAM);
        Self::new(ProcessId::INIT, None, program, INIT_SIZE)
    }

    /// Copy of this PCB for a child: new pid, this pid as parent, no memory
    pub fn fork(&self, pid: ProcessId) -> Self {
        Self::new(pid, Some(self.pid), self.program.clone(), self.size)
    }

    /// Replace the program image in place; pid and parent are unchanged
    ///
    /// Memory must already have been released by the caller.
    pub fn replace_image(&mut self, program: ProgramName, size: u32) {
        self.program = program;
        self.size = size;
    }

    /// Parent PID as printed by the kernel (-1 for init)
    pub fn parent_pid(&self) -> i64 {
        self.parent.map_or(-1, |p| i64::from(p.as_u32()))
    }

    /// Partition number as printed by the kernel (1..=6, or -1)
    pub fn partition_number(&self) -> i64 {
        self.partition
            .and_then(|p| i64::try_from(p.number()).ok())
            .unwrap_or(-1)
    }
}

/// A PCB tagged with its run state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    /// Process control block
    pub pcb: Pcb,
    /// Run state
    pub state: ProcessState,
}

/// Process management errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProcessError {
    /// Too many processes for one branch
    #[error("too many processes (limit {})", MAX_PROCESSES)]
    TooManyProcesses,
    /// Program name does not fit in [`ProgramName`]
    #[error("program name of {len} bytes exceeds {} bytes", MAX_PROGRAM_NAME)]
    NameTooLong {
        /// Length of the rejected name
        len: usize,
    },
}

/// Result type for process operations
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Branch-local process table: one running PCB and the PCBs waiting on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessTable {
    running: Pcb,
    waiting: Vec<Pcb, MAX_PROCESSES>,
}

impl ProcessTable {
    /// Table with a single running process
    pub const fn new(running: Pcb) -> Self {
        Self {
            running,
            waiting: Vec::new(),
        }
    }

    /// The running PCB
    pub const fn running(&self) -> &Pcb {
        &self.running
    }

    /// The running PCB, mutably (used by `EXEC`)
    pub const fn running_mut(&mut self) -> &mut Pcb {
        &mut self.running
    }

    /// Waiting PCBs, oldest first
    pub fn waiting(&self) -> &[Pcb] {
        &self.waiting
    }

    /// Total number of records
    pub fn len(&self) -> usize {
        self.waiting.len() + 1
    }

    /// Always false: a table has at least its running process
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Every record: the running one first, then the waiting ones
    pub fn records(&self) -> impl Iterator<Item = ProcessRecord> + '_ {
        core::iter::once(ProcessRecord {
            pcb: self.running.clone(),
            state: ProcessState::Running,
        })
        .chain(self.waiting.iter().map(|pcb| ProcessRecord {
            pcb: pcb.clone(),
            state: ProcessState::Waiting,
        }))
    }

    /// Look up a record by PID
    pub fn find(&self, pid: ProcessId) -> Option<ProcessRecord> {
        self.records().find(|r| r.pcb.pid == pid)
    }

    /// Snapshot for a forked child: `child` runs, the current running PCB
    /// joins the waiting queue. `self` is left as it was.
    pub fn fork(&self, child: Pcb) -> ProcessResult<Self> {
        if self.len() >= MAX_PROCESSES {
            return Err(ProcessError::TooManyProcesses);
        }
        let mut waiting = self.waiting.clone();
        waiting
            .push(self.running.clone())
            .map_err(|_| ProcessError::TooManyProcesses)?;
        Ok(Self {
            running: child,
            waiting,
        })
    }
}

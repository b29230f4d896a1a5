//! Trace Interpreter
//!
//! This module replays a trace against the simulated kernel. Each directive
//! is dispatched to its handler the way a system call would be, and every
//! handler charges its costs to the branch's [`ExecutionLog`].
//!
//! # Design Principles
//!
//! - One [`PartitionTable`] and one [`PidAllocator`] for the whole run
//! - One [`ProcessTable`] snapshot per branch, copied on `FORK`
//! - Children and loaded programs run depth-first as nested calls
//! - Recoverable errors never stop the virtual clock
//!
//! # Directive Handling
//!
//! ```text
//! CPU        "<t>, <d>, CPU Burst"
//! FORK       interrupt entry, clone, scheduler, IRET, snapshot,
//!            run the child branch, resume at its IF_PARENT
//! EXEC       interrupt entry, size report, load, mark, update PCB,
//!            scheduler, IRET, snapshot, run the program's trace,
//!            then drop the rest of the caller's trace
//! IF_CHILD   \
//! IF_PARENT   > only meaningful to the fork branch scan
//! ENDIF      /
//! ```

#![deny(missing_docs)]

pub mod branch;
pub mod directive;

use crate::arch::ExecutionLog;
use crate::config::SimConfig;
use crate::debug_print;
use crate::memory::PartitionTable;
use crate::platform::{SystemTables, TraceSource};
use crate::process::{
    MAX_PROCESSES, Pcb, PidAllocator, ProcessId, ProcessTable, ProgramName, render_status,
};
use crate::SimError;

use branch::split_fork_branches;
use directive::{Directive, DirectiveKind, Trace};

/// Everything one run of the interpreter produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationOutcome {
    /// Timestamped event log
    pub execution: String,
    /// Process table snapshots, one block per `FORK`/`EXEC`
    pub system_status: String,
    /// Virtual time when the trace ran out
    pub end_time: u64,
    /// Process table of the branch as it ended
    pub processes: ProcessTable,
}

/// State of one branch while its trace is being walked
struct Frame {
    log: ExecutionLog,
    status: String,
    table: ProcessTable,
    depth: usize,
}

impl Frame {
    fn absorb(&mut self, nested: &SimulationOutcome) {
        self.log.absorb(&nested.execution, nested.end_time);
        self.status.push_str(&nested.system_status);
    }

    fn finish(self) -> SimulationOutcome {
        SimulationOutcome {
            end_time: self.log.now(),
            execution: self.log.into_text(),
            system_status: self.status,
            processes: self.table,
        }
    }
}

/// The simulated kernel
///
/// Owns the memory partitions and the PID counter for one run, borrows the
/// external tables and the source of `EXEC` sub-traces.
#[derive(Debug)]
pub struct Simulator<'a, S: TraceSource + ?Sized> {
    config: SimConfig,
    tables: &'a SystemTables,
    source: &'a S,
    memory: PartitionTable,
    pids: PidAllocator,
    lineage: Vec<Pcb>,
    diagnostics: Vec<SimError>,
}

impl<'a, S: TraceSource + ?Sized> Simulator<'a, S> {
    /// Create a simulator with empty memory and no processes
    pub fn new(config: SimConfig, tables: &'a SystemTables, source: &'a S) -> Self {
        debug_print!(
            DEBUG,
            "simulator ready: context save {}, {} device delays passed through",
            config.context_save_time,
            tables.device_delays.len()
        );
        Self {
            config,
            tables,
            source,
            memory: PartitionTable::new(),
            pids: PidAllocator::new(),
            lineage: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Start a fresh run: empty memory, PID counter back at init, no
    /// recorded processes or diagnostics, then create init and give it memory
    pub fn boot(&mut self) -> ProcessTable {
        self.memory = PartitionTable::new();
        self.pids = PidAllocator::new();
        self.lineage.clear();
        self.diagnostics.clear();

        let mut init = Pcb::init();
        self.place(&mut init);
        self.record(&init);
        ProcessTable::new(init)
    }

    /// Boot, then interpret `trace` from time 0
    pub fn run(&mut self, trace: &[Directive]) -> SimulationOutcome {
        let table = self.boot();
        self.simulate(trace, 0, table)
    }

    /// Parse `text` as a trace, then boot and interpret it like [`Self::run`]
    ///
    /// Malformed lines are reported at the start of the run's diagnostics.
    pub fn run_text(&mut self, text: &str) -> SimulationOutcome {
        let trace = Trace::parse(text);
        let table = self.boot();
        self.note_malformed(&trace);
        self.simulate(&trace.directives, 0, table)
    }

    /// Interpret `trace` starting at `start_time` with `table` as the
    /// branch's process table
    pub fn simulate(
        &mut self,
        trace: &[Directive],
        start_time: u64,
        table: ProcessTable,
    ) -> SimulationOutcome {
        self.simulate_at_depth(trace, start_time, table, 0)
    }

    /// Shared memory partitions
    pub const fn memory(&self) -> &PartitionTable {
        &self.memory
    }

    /// Recoverable errors reported so far, in order
    pub fn diagnostics(&self) -> &[SimError] {
        &self.diagnostics
    }

    /// Every PCB created during the run, in creation order, as last updated
    pub fn processes(&self) -> &[Pcb] {
        &self.lineage
    }

    /// Latest state of the PCB with `pid`
    pub fn process(&self, pid: ProcessId) -> Option<&Pcb> {
        self.lineage.iter().find(|pcb| pcb.pid == pid)
    }

    /// Highest PID handed out so far
    pub const fn last_pid(&self) -> ProcessId {
        self.pids.last()
    }

    fn simulate_at_depth(
        &mut self,
        trace: &[Directive],
        start_time: u64,
        table: ProcessTable,
        depth: usize,
    ) -> SimulationOutcome {
        let mut frame = Frame {
            log: ExecutionLog::starting_at(start_time),
            status: String::new(),
            table,
            depth,
        };

        let mut index = 0;
        while let Some(directive) = trace.get(index) {
            match &directive.kind {
                DirectiveKind::Cpu => frame.log.emit(directive.duration, "CPU Burst"),
                DirectiveKind::Fork => index = self.fork(&mut frame, trace, index, directive),
                DirectiveKind::Exec { program } => {
                    self.exec(&mut frame, directive, program);
                    break;
                }
                DirectiveKind::Unknown { activity } => {
                    debug_print!(DEBUG, "skipping unknown activity `{}`", activity);
                }
                DirectiveKind::IfChild | DirectiveKind::IfParent | DirectiveKind::EndIf => {}
            }
            index += 1;
        }

        frame.finish()
    }

    /// Handle `FORK`; returns the index the parent resumes after
    fn fork(
        &mut self,
        frame: &mut Frame,
        trace: &[Directive],
        index: usize,
        directive: &Directive,
    ) -> usize {
        let config = self.config;
        frame
            .log
            .enter_interrupt(config.fork_vector, config.context_save_time, &self.tables.vectors);
        frame.log.emit(directive.duration, "cloning the PCB");
        frame.log.emit(config.scheduler_cost, "scheduler called");
        frame.log.emit(config.iret_cost, "IRET");

        let split = split_fork_branches(trace, index);
        let resume = split.parent_resume.unwrap_or(index);

        let Some(depth) = self.next_depth(frame.depth) else {
            return resume;
        };
        let Some(child_table) = self.spawn_child(&frame.table) else {
            return resume;
        };
        frame
            .status
            .push_str(&render_status(frame.log.now(), directive, &child_table));

        let child = self.simulate_at_depth(&split.child, frame.log.now(), child_table, depth);
        frame.absorb(&child);
        resume
    }

    /// Handle `EXEC`; the caller stops walking its trace afterwards
    fn exec(&mut self, frame: &mut Frame, directive: &Directive, program: &ProgramName) {
        let config = self.config;
        frame
            .log
            .enter_interrupt(config.exec_vector, config.context_save_time, &self.tables.vectors);

        let size = match self.tables.programs.size_of(program) {
            Some(size) => size,
            None => {
                self.report(SimError::ProgramNotFound {
                    program: program.to_string(),
                });
                0
            }
        };

        frame
            .log
            .emit(directive.duration, format!("Program is {size} Mb large"));
        frame.log.emit(
            u64::from(size).saturating_mul(config.loader_cost_per_mb),
            "loading program into memory",
        );
        frame
            .log
            .emit(config.mark_partition_cost, "marking partition as occupied");

        let pcb = frame.table.running_mut();
        self.memory.free(pcb);
        pcb.replace_image(program.clone(), size);
        self.place(pcb);
        self.record(pcb);

        frame.log.emit(config.update_pcb_cost, "updating PCB");
        frame.log.emit(config.scheduler_cost, "scheduler called");
        frame.log.emit(config.iret_cost, "IRET");
        frame
            .status
            .push_str(&render_status(frame.log.now(), directive, &frame.table));

        let trace = match self.source.load(program) {
            Ok(text) => {
                let trace = Trace::parse(&text);
                self.note_malformed(&trace);
                trace
            }
            Err(error) => {
                debug_print!(DEBUG, "{}", error);
                Trace::default()
            }
        };
        if trace.is_empty() {
            self.report(SimError::MissingSubTraceFile {
                program: program.to_string(),
            });
            return;
        }

        let Some(depth) = self.next_depth(frame.depth) else {
            return;
        };
        let table = frame.table.clone();
        let loaded = self.simulate_at_depth(&trace.directives, frame.log.now(), table, depth);
        frame.absorb(&loaded);
        frame.table = loaded.processes;
    }

    /// Depth of a nested run below `depth`, unless that exceeds the limit
    fn next_depth(&mut self, depth: usize) -> Option<usize> {
        let depth = depth + 1;
        if depth > self.config.max_depth {
            self.report(SimError::RecursionLimit { depth });
            return None;
        }
        Some(depth)
    }

    /// Clone the running process of `table` into a new child snapshot
    fn spawn_child(&mut self, table: &ProcessTable) -> Option<ProcessTable> {
        let parent = table.running();
        let child = parent.fork(self.pids.allocate());
        let mut forked = match table.fork(child) {
            Ok(forked) => forked,
            Err(error) => {
                debug_print!(DEBUG, "{}", error);
                self.report(SimError::TooManyProcesses {
                    parent: parent.pid,
                    capacity: MAX_PROCESSES,
                });
                return None;
            }
        };

        let child = forked.running_mut();
        self.place(child);
        self.record(child);
        debug_print!(
            INFO,
            "pid {} forked pid {}",
            forked.running().parent_pid(),
            forked.running().pid
        );
        Some(forked)
    }

    /// Allocate memory for `pcb`, reporting failure
    fn place(&mut self, pcb: &mut Pcb) {
        if let Err(error) = self.memory.allocate(pcb) {
            debug_print!(DEBUG, "{}", error);
            self.report(SimError::MemoryAllocationFailure {
                pid: pcb.pid,
                program: pcb.program.to_string(),
                size: pcb.size,
            });
        }
    }

    fn record(&mut self, pcb: &Pcb) {
        match self.lineage.iter_mut().find(|known| known.pid == pcb.pid) {
            Some(known) => known.clone_from(pcb),
            None => self.lineage.push(pcb.clone()),
        }
    }

    fn note_malformed(&mut self, trace: &Trace) {
        for error in &trace.malformed {
            self.diagnostics.push(SimError::from(error.clone()));
        }
    }

    fn report(&mut self, error: SimError) {
        debug_print!(ERROR, "{}", error);
        self.diagnostics.push(error);
    }
}

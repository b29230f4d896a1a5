//! End-to-end runs of whole traces through the simulator.

use std::fs;

use sim_kernel::platform::{
    DirTraceSource, MemoryTraceSource, ProgramSizeTable, SystemTables, parse_vector_table,
    write_output,
};
use sim_kernel::process::ProcessId;
use sim_kernel::{SimConfig, SimError, Simulator};

const VECTORS: &str = "0x01E3\n0x029C\n0x0695\n0x042B\n0x0292\n";

fn tables() -> SystemTables {
    SystemTables {
        vectors: parse_vector_table(VECTORS),
        device_delays: vec![110, 150, 250],
        programs: ProgramSizeTable::new([("program1", 10), ("program2", 15)]),
    }
}

fn snapshot_headers(status: &str) -> Vec<&str> {
    status.lines().filter(|line| line.starts_with("time: ")).collect()
}

/// End of the log if every line starts where the previous one ended.
fn continuous_end(execution: &str, start: u64) -> Option<u64> {
    execution.lines().try_fold(start, |expected, line| {
        let mut fields = line.splitn(3, ", ");
        let time: u64 = fields.next()?.parse().ok()?;
        let cost: u64 = fields.next()?.parse().ok()?;
        (time == expected).then_some(time + cost)
    })
}

#[test]
fn fork_then_exec_in_both_branches() {
    let tables = tables();
    let source = MemoryTraceSource::new()
        .with_program("program1", "CPU, 100\n")
        .with_program("program2", "CPU, 20\n");
    let mut sim = Simulator::new(SimConfig::default(), &tables, &source);

    let outcome = sim.run_text(
        "FORK, 10\n\
         IF_CHILD, 0\n\
         EXEC program1, 50\n\
         IF_PARENT, 0\n\
         EXEC program2, 25\n\
         ENDIF, 0\n",
    );

    assert_eq!(outcome.end_time, 640);
    assert_eq!(continuous_end(&outcome.execution, 0), Some(outcome.end_time));
    assert_eq!(
        snapshot_headers(&outcome.system_status),
        [
            "time: 24; current trace: FORK, 10",
            "time: 247; current trace: EXEC program1, 50",
            "time: 620; current trace: EXEC program2, 25",
        ]
    );
    assert!(outcome.system_status.contains("| 1 | program1 | 4 | 10 | running |\n| 0 | init | 6 | 1 | waiting |\n"));
    assert!(outcome.system_status.contains("| 0 | program2 | 3 | 15 | running |\n"));
    assert!(outcome.execution.contains("247, 100, CPU Burst\n"));
    assert!(outcome.execution.ends_with("620, 20, CPU Burst\n"));

    let init = sim.process(ProcessId::INIT).unwrap();
    let child = sim.process(ProcessId::new(1)).unwrap();
    assert_eq!((init.program.as_str(), init.partition_number()), ("program2", 3));
    assert_eq!((child.program.as_str(), child.partition_number()), ("program1", 4));
    assert_eq!(child.parent, Some(ProcessId::INIT));
    assert_eq!(sim.memory().occupied(), 2);
    assert!(sim.diagnostics().is_empty());
}

#[test]
fn exec_inside_loaded_program_chains() {
    let tables = tables();
    let source = MemoryTraceSource::new()
        .with_program("program1", "CPU, 5\nEXEC program2, 1\nCPU, 999\n")
        .with_program("program2", "CPU, 7\n");
    let mut sim = Simulator::new(SimConfig::default(), &tables, &source);

    let outcome = sim.run_text("EXEC program1, 1\nCPU, 999\n");

    assert!(!outcome.execution.contains("999"));
    assert_eq!(snapshot_headers(&outcome.system_status).len(), 2);
    assert_eq!(continuous_end(&outcome.execution, 0), Some(outcome.end_time));
    assert_eq!(outcome.processes.running().program.as_str(), "program2");
    assert_eq!(outcome.processes.running().pid, ProcessId::INIT);
    assert_eq!(sim.processes().len(), 1);
}

#[test]
fn missing_sub_trace_is_skipped() {
    let tables = tables();
    let source = MemoryTraceSource::new().with_program("program1", "\n\n");
    let mut sim = Simulator::new(SimConfig::default(), &tables, &source);

    let outcome = sim.run_text("EXEC program1, 1\n");

    assert_eq!(outcome.end_time, 13 + 1 + 150 + 3 + 6 + 1);
    assert_eq!(
        sim.diagnostics(),
        [SimError::MissingSubTraceFile {
            program: "program1".to_string()
        }]
    );
}

#[test]
fn pids_stay_unique_across_sibling_branches() {
    let tables = tables();
    let source = MemoryTraceSource::new();
    let mut sim = Simulator::new(SimConfig::default(), &tables, &source);

    sim.run_text(
        "FORK, 1\nIF_CHILD\nCPU, 1\nIF_PARENT\nENDIF\n\
         FORK, 1\nIF_CHILD\nCPU, 1\nIF_PARENT\nENDIF\n",
    );

    let pids: Vec<u32> = sim.processes().iter().map(|pcb| pcb.pid.as_u32()).collect();
    let mut sorted = pids.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(pids, sorted);
    assert!(pids.len() > 2);
    for pcb in &sim.processes()[1..] {
        let parent = pcb.parent.unwrap();
        assert!(parent < pcb.pid);
        assert!(sim.process(parent).is_some());
    }
}

#[test]
fn memory_runs_out_for_many_children() {
    let tables = tables();
    let source = MemoryTraceSource::new();
    let mut sim = Simulator::new(SimConfig::default(), &tables, &source);

    // No IF_PARENT, so parent and child both keep forking; only six images fit.
    let trace = "FORK, 1\nIF_CHILD\n".repeat(7);
    sim.run_text(&trace);

    assert_eq!(sim.memory().occupied(), 6);
    let failures = sim
        .diagnostics()
        .iter()
        .filter(|error| matches!(error, SimError::MemoryAllocationFailure { .. }))
        .count();
    assert_eq!(failures, sim.processes().len() - 6);
}

#[test]
fn runs_from_files_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = |name: &str| dir.path().join(name);

    fs::write(path("trace.txt"), "CPU, 10\nEXEC program1, 50\n").unwrap();
    fs::write(path("vector_table.txt"), VECTORS).unwrap();
    fs::write(path("device_table.txt"), "110\n150\n").unwrap();
    fs::write(path("external_files.txt"), "program1, 10\nprogram2, 15\n").unwrap();
    fs::write(path("program1.txt"), "CPU, 40\n").unwrap();

    let tables = SystemTables::load(
        path("vector_table.txt"),
        path("device_table.txt"),
        path("external_files.txt"),
    )
    .unwrap();
    assert_eq!(tables.device_delays, [110, 150]);

    let source = DirTraceSource::new(dir.path());
    let mut sim = Simulator::new(SimConfig::default(), &tables, &source);
    let trace = fs::read_to_string(path("trace.txt")).unwrap();
    let outcome = sim.run_text(&trace);

    // 10 CPU, 13 entry, 50 size report, 150 load, 3 + 6 + 0 + 1, 40 CPU
    assert_eq!(outcome.end_time, 273);
    assert!(outcome.execution.contains("10, 1, switch to kernel mode\n"));
    assert!(outcome.execution.contains("find vector 3 in memory position 0x0006"));
    assert!(outcome.execution.contains("load address 0x042B into the PC"));

    let out = path("execution.txt");
    write_output(&out, &outcome.execution).unwrap();
    assert_eq!(fs::read_to_string(&out).unwrap(), outcome.execution);
}

#[test]
fn context_save_time_is_configurable() {
    let tables = tables();
    let source = MemoryTraceSource::new();
    let config = SimConfig::default().with_context_save_time(30);
    let mut sim = Simulator::new(config, &tables, &source);

    let outcome = sim.run_text("FORK, 0\nIF_CHILD\nIF_PARENT\nENDIF\n");

    assert!(outcome.execution.contains("1, 30, context saved\n"));
    assert_eq!(outcome.end_time, 34);
}

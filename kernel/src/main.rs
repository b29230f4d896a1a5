//! Sim Kernel - trace-driven kernel simulator
//!
//! Reads a trace and the three system tables, replays the trace and writes
//! `execution.txt` and `system_status.txt`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sim_kernel::macros::DebugLevel;
use sim_kernel::platform::{self, DirTraceSource, SystemTables};
use sim_kernel::{SimConfig, Simulator, debug_print};

/// Replay a process trace against the simulated kernel
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Top-level trace file
    trace: PathBuf,

    /// Interrupt vector table
    vector_table: PathBuf,

    /// Device delay table
    device_table: PathBuf,

    /// External program size table
    external_files: PathBuf,

    /// Directory holding `<program>.txt` traces for EXEC
    ///
    /// Defaults to the directory of the top-level trace.
    #[arg(long)]
    programs_dir: Option<PathBuf>,

    /// Directory the two logs are written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Cost of saving the context on interrupt entry
    #[arg(long, default_value_t = 10)]
    context_save: u64,

    /// Diagnostic level (error, warning, info, debug, trace)
    #[arg(long, default_value = "warning")]
    log_level: DebugLevel,
}

fn init_logging(level: DebugLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter().to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn programs_dir(args: &Args) -> PathBuf {
    args.programs_dir.clone().unwrap_or_else(|| {
        args.trace
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    })
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    init_logging(args.log_level);
    debug_print!(DEBUG, "args: {:?}", args);

    let tables = SystemTables::load(&args.vector_table, &args.device_table, &args.external_files)
        .context("Unable to load system tables")?;
    for program in tables.programs.programs() {
        debug_print!(INFO, "external program {}: {} MB", program.name, program.size);
    }

    let trace = platform::read_text(&args.trace).context("Unable to read trace file")?;

    let source = DirTraceSource::new(programs_dir(&args));
    let config = SimConfig::default().with_context_save_time(args.context_save);
    let mut sim = Simulator::new(config, &tables, &source);
    let outcome = sim.run_text(&trace);
    debug_print!(
        INFO,
        "finished at time {} with {} diagnostics",
        outcome.end_time,
        sim.diagnostics().len()
    );
    debug_print!(DEBUG, "final memory:\n{}", sim.memory());

    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("Unable to create output directory {}", args.output_dir.display())
    })?;
    platform::write_output(args.output_dir.join("execution.txt"), &outcome.execution)
        .context("Unable to write execution log")?;
    platform::write_output(args.output_dir.join("system_status.txt"), &outcome.system_status)
        .context("Unable to write system status log")?;

    println!("Simulation complete.");
    Ok(())
}

//! System status snapshots
//!
//! One block per `FORK`/`EXEC`, rendered after the interrupt returns:
//!
//! ```text
//! time: 24; current trace: FORK, 10
//! +------------------------------------------------------+
//! | PID | program name | partition number | size | state |
//! +------------------------------------------------------+
//! | 1 | init | 5 | 1 | running |
//! | 0 | init | 6 | 1 | waiting |
//! +------------------------------------------------------+
//! ```

use core::fmt::{self, Write};

use super::ProcessTable;

const RULE: &str = "+------------------------------------------------------+";
const HEADER: &str = "| PID | program name | partition number | size | state |";

/// Render the process table as seen at `time` while handling `trace`
pub fn render_status(time: u64, trace: impl fmt::Display, table: &ProcessTable) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "time: {time}; current trace: {trace}");
    let _ = writeln!(out, "{RULE}\n{HEADER}\n{RULE}");
    for record in table.records() {
        let pcb = &record.pcb;
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            pcb.pid,
            pcb.program,
            pcb.partition_number(),
            pcb.size,
            record.state
        );
    }
    let _ = writeln!(out, "{RULE}\n");
    out
}

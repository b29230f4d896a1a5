//! Virtual clock and execution log
//!
//! Every timed event is written as `<time>, <cost>, <description>` using the
//! time *before* the cost is applied; the clock then advances by the cost.

use core::fmt::{self, Write};

/// Virtual clock paired with the execution log it produces
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionLog {
    time: u64,
    text: String,
}

impl ExecutionLog {
    /// Start an empty log with the clock at `time`
    pub const fn starting_at(time: u64) -> Self {
        Self {
            time,
            text: String::new(),
        }
    }

    /// Current virtual time
    pub const fn now(&self) -> u64 {
        self.time
    }

    /// Log text emitted so far
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Emit one timed event, then advance the clock by its cost
    pub fn emit(&mut self, cost: u64, description: impl fmt::Display) {
        let _ = writeln!(self.text, "{}, {}, {}", self.time, cost, description);
        self.time = self.time.saturating_add(cost);
    }

    /// Append a log produced by a nested run that started at [`Self::now`]
    ///
    /// The clock never moves backwards, whatever `end_time` says.
    pub fn absorb(&mut self, execution: &str, end_time: u64) {
        self.text.push_str(execution);
        self.time = self.time.max(end_time);
    }

    /// Consume the log, keeping only its text
    pub fn into_text(self) -> String {
        self.text
    }
}

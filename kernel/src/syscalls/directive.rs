//! Trace directive parser
//!
//! Grammar of one trace line:
//!
//! ```text
//! <ACTIVITY>[ <program>], <duration>
//! ACTIVITY := CPU | FORK | EXEC | IF_CHILD | IF_PARENT | ENDIF
//! ```
//!
//! - The line is split on the first comma; the activity is trimmed
//! - The duration keeps its leading integer; no digits at all means 0
//! - `EXEC` takes the program name from its second token
//! - Structural markers may appear without a comma (`IF_CHILD`)
//! - Anything else parses to [`DirectiveKind::Unknown`] and is skipped

use core::fmt;
use core::str::FromStr;

use thiserror::Error;

use crate::debug_print;
use crate::platform::leading_integer;
use crate::process::{ProgramName, program_name};

/// What a directive asks the kernel to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveKind {
    /// Burn CPU time
    Cpu,
    /// Clone the running process
    Fork,
    /// Replace the running image with `program`
    Exec {
        /// Program to load
        program: ProgramName,
    },
    /// Start of the child-only block after a `FORK`
    IfChild,
    /// Start of the parent-only block after a `FORK`
    IfParent,
    /// End of the conditional blocks
    EndIf,
    /// Unrecognised activity, or a line that failed to parse
    Unknown {
        /// Activity text as written
        activity: String,
    },
}

/// One parsed trace line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Activity
    pub kind: DirectiveKind,
    /// Cost in time units; its meaning depends on the kind
    pub duration: u64,
}

impl Directive {
    /// Directive with the given kind and duration
    pub const fn new(kind: DirectiveKind, duration: u64) -> Self {
        Self { kind, duration }
    }

    /// No-op directive standing in for a line that did not parse
    pub fn unknown(activity: impl Into<String>) -> Self {
        Self::new(
            DirectiveKind::Unknown {
                activity: activity.into(),
            },
            0,
        )
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DirectiveKind::Cpu => write!(f, "CPU, {}", self.duration),
            DirectiveKind::Fork => write!(f, "FORK, {}", self.duration),
            DirectiveKind::Exec { program } => write!(f, "EXEC {program}, {}", self.duration),
            DirectiveKind::IfChild => write!(f, "IF_CHILD, {}", self.duration),
            DirectiveKind::IfParent => write!(f, "IF_PARENT, {}", self.duration),
            DirectiveKind::EndIf => write!(f, "ENDIF, {}", self.duration),
            DirectiveKind::Unknown { activity } => write!(f, "{activity}, {}", self.duration),
        }
    }
}

/// Malformed trace lines
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveError {
    /// No comma, so no duration field
    #[error("malformed trace line `{line}`: missing duration")]
    MissingDuration {
        /// Offending line
        line: String,
    },
    /// Duration below zero
    #[error("malformed trace line `{line}`: negative duration")]
    NegativeDuration {
        /// Offending line
        line: String,
    },
    /// `EXEC` without a program name
    #[error("malformed trace line `{line}`: EXEC without a program")]
    MissingProgram {
        /// Offending line
        line: String,
    },
    /// Program name longer than a PCB can hold
    #[error("malformed trace line `{line}`: program name too long")]
    ProgramNameTooLong {
        /// Offending line
        line: String,
    },
}

fn marker(activity: &str) -> Option<DirectiveKind> {
    match activity {
        "IF_CHILD" => Some(DirectiveKind::IfChild),
        "IF_PARENT" => Some(DirectiveKind::IfParent),
        "ENDIF" => Some(DirectiveKind::EndIf),
        _ => None,
    }
}

/// Parse one raw trace line
pub fn parse_directive(line: &str) -> Result<Directive, DirectiveError> {
    let line = line.trim_end_matches(['\r', '\n']);

    let Some((activity, rest)) = line.split_once(',') else {
        return marker(line.trim())
            .map(|kind| Directive::new(kind, 0))
            .ok_or_else(|| DirectiveError::MissingDuration {
                line: line.to_string(),
            });
    };
    let activity = activity.trim();

    let field = rest.split(',').next().unwrap_or_default();
    let duration = match leading_integer(field) {
        Some(value) if value < 0 => {
            return Err(DirectiveError::NegativeDuration {
                line: line.to_string(),
            });
        }
        Some(value) => value.unsigned_abs(),
        None => 0,
    };

    let kind = match activity {
        "CPU" => DirectiveKind::Cpu,
        "FORK" => DirectiveKind::Fork,
        other => match marker(other) {
            Some(kind) => kind,
            None => {
                let mut tokens = other.split_whitespace();
                if tokens.next() == Some("EXEC") {
                    let name = tokens.next().ok_or_else(|| DirectiveError::MissingProgram {
                        line: line.to_string(),
                    })?;
                    let program = program_name(name).map_err(|_| {
                        DirectiveError::ProgramNameTooLong {
                            line: line.to_string(),
                        }
                    })?;
                    DirectiveKind::Exec { program }
                } else {
                    DirectiveKind::Unknown {
                        activity: other.to_string(),
                    }
                }
            }
        },
    };

    Ok(Directive::new(kind, duration))
}

impl FromStr for Directive {
    type Err = DirectiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_directive(s)
    }
}

/// A parsed trace: one directive per non-blank line
///
/// Lines that fail to parse are kept in place as [`DirectiveKind::Unknown`]
/// so positions line up with the source; their errors are collected in
/// `malformed`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    /// Directives in trace order
    pub directives: Vec<Directive>,
    /// Errors of the lines that became no-ops
    pub malformed: Vec<DirectiveError>,
}

impl Trace {
    /// Parse trace text line by line, skipping blank lines
    pub fn parse(text: &str) -> Self {
        let mut trace = Self::default();
        for line in text.lines().filter(|line| !line.trim().is_empty()) {
            match parse_directive(line) {
                Ok(directive) => trace.directives.push(directive),
                Err(error) => {
                    debug_print!(WARN, "{}", error);
                    trace.directives.push(Directive::unknown(line.trim()));
                    trace.malformed.push(error);
                }
            }
        }
        trace
    }

    /// Whether the trace holds no directives
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

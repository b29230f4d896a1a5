//! Sim Kernel Macros
//!
//! Leveled debug output for the simulator. Messages are forwarded to
//! `tracing`, so the binary (or a test) decides where they end up and which
//! levels are shown. Diagnostic text never lands in the execution or status
//! logs.

#![deny(missing_docs)]

use core::fmt;
use core::str::FromStr;

use thiserror::Error;
use tracing::level_filters::LevelFilter;

/// Debug output levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum DebugLevel {
    /// Error messages - always shown
    Error = 0,
    /// Warning messages
    #[default]
    Warning = 1,
    /// Information messages
    Info = 2,
    /// Debug messages
    Debug = 3,
    /// Trace messages - most verbose
    Trace = 4,
}

impl DebugLevel {
    /// Level filter that shows this level and everything more severe
    pub const fn as_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::ERROR,
            Self::Warning => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }
}

impl fmt::Display for DebugLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        };
        f.write_str(name)
    }
}

/// Unrecognised debug level name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown debug level `{0}` (expected error, warning, info, debug or trace)")]
pub struct ParseLevelError(String);

impl FromStr for DebugLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// Leveled debug print: `debug_print!(WARN, "fmt", args...)`
#[macro_export]
macro_rules! debug_print {
    (ERROR, $($arg:tt)*) => {
        $crate::__tracing::error!(target: "sim_kernel", $($arg)*)
    };
    (WARN, $($arg:tt)*) => {
        $crate::__tracing::warn!(target: "sim_kernel", $($arg)*)
    };
    (INFO, $($arg:tt)*) => {
        $crate::__tracing::info!(target: "sim_kernel", $($arg)*)
    };
    (DEBUG, $($arg:tt)*) => {
        $crate::__tracing::debug!(target: "sim_kernel", $($arg)*)
    };
    (TRACE, $($arg:tt)*) => {
        $crate::__tracing::trace!(target: "sim_kernel", $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_level_names() {
        assert_eq!("warning".parse::<DebugLevel>().unwrap(), DebugLevel::Warning);
        assert_eq!("WARN".parse::<DebugLevel>().unwrap(), DebugLevel::Warning);
        assert_eq!(" trace ".parse::<DebugLevel>().unwrap(), DebugLevel::Trace);
        assert!("loud".parse::<DebugLevel>().is_err());
    }

    #[test]
    fn more_verbose_levels_open_wider_filters() {
        assert!(DebugLevel::Trace.as_filter() > DebugLevel::Error.as_filter());
        assert_eq!(DebugLevel::default().as_filter(), LevelFilter::WARN);
    }
}

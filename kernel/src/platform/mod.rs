//! Platform Abstraction Layer
//!
//! Everything the simulator needs from outside the core:
//!
//! - the interrupt vector table
//! - the device delay table (carried through, not used by any timing rule)
//! - the external program size table consulted by `EXEC`
//! - a [`TraceSource`] that yields the trace of a program loaded by `EXEC`
//! - a trivial writer for the two output logs
//!
//! # File Formats
//!
//! ```text
//! vector_table.txt     one address per line; the last token wins ("2 0x0695")
//! device_table.txt     one integer per line; other lines are ignored
//! external_files.txt   "<program name>, <size in MB>" per line
//! <program>.txt        a trace, same grammar as the top-level trace
//! ```

#![deny(missing_docs)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::arch::{DEFAULT_VECTOR_ADDRESS, VectorTable};
use crate::debug_print;

pub mod source;

pub use source::{DirTraceSource, MemoryTraceSource, TraceSource};

/// Platform errors
#[derive(Debug, Error)]
pub enum PlatformError {
    /// A file could not be read or written
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
    /// No trace exists for a program
    #[error("no trace for program `{program}`")]
    MissingTrace {
        /// Program asked for
        program: String,
    },
}

/// Result type for platform operations
pub type PlatformResult<T> = Result<T, PlatformError>;

/// One entry of the external files table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProgram {
    /// Program name as used by `EXEC`
    pub name: String,
    /// Image size in MB
    pub size: u32,
}

/// External program sizes, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramSizeTable {
    programs: Vec<ExternalProgram>,
}

impl ProgramSizeTable {
    /// Build a table from `(name, size)` entries
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        Self {
            programs: entries
                .into_iter()
                .map(|(name, size)| ExternalProgram {
                    name: name.into(),
                    size,
                })
                .collect(),
        }
    }

    /// Size of `program`; the first matching entry wins
    pub fn size_of(&self, program: &str) -> Option<u32> {
        self.programs
            .iter()
            .find(|p| p.name == program)
            .map(|p| p.size)
    }

    /// All entries
    pub fn programs(&self) -> &[ExternalProgram] {
        &self.programs
    }
}

/// The three tables handed to the simulator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemTables {
    /// Interrupt vector table
    pub vectors: VectorTable,
    /// Device delays, in device order
    pub device_delays: Vec<u64>,
    /// External program sizes
    pub programs: ProgramSizeTable,
}

impl SystemTables {
    /// Read and parse the three table files
    pub fn load(
        vector_table: impl AsRef<Path>,
        device_table: impl AsRef<Path>,
        external_files: impl AsRef<Path>,
    ) -> PlatformResult<Self> {
        let tables = Self {
            vectors: parse_vector_table(&read_text(vector_table)?),
            device_delays: parse_device_table(&read_text(device_table)?),
            programs: parse_external_files(&read_text(external_files)?),
        };
        debug_print!(
            DEBUG,
            "loaded {} vectors, {} device delays, {} external programs",
            tables.vectors.len(),
            tables.device_delays.len(),
            tables.programs.programs().len()
        );
        Ok(tables)
    }
}

/// Parse a vector table; every line is one slot, the last token is the address
pub fn parse_vector_table(text: &str) -> VectorTable {
    VectorTable::new(text.lines().map(|line| {
        line.split_whitespace()
            .next_back()
            .unwrap_or(DEFAULT_VECTOR_ADDRESS)
            .to_string()
    }))
}

/// Parse a device delay table, skipping blank and non-numeric lines
pub fn parse_device_table(text: &str) -> Vec<u64> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match line.parse::<u64>() {
            Ok(delay) => Some(delay),
            Err(_) => {
                debug_print!(DEBUG, "ignoring device table line `{}`", line);
                None
            }
        })
        .collect()
}

/// Parse the external files list (`name, size` per line)
///
/// Lines with fewer than two fields are skipped; sizes that do not parse
/// become 0.
pub fn parse_external_files(text: &str) -> ProgramSizeTable {
    let mut programs = Vec::new();
    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        let mut fields = line.split(',').map(str::trim);
        let (Some(name), Some(size)) = (fields.next(), fields.next()) else {
            debug_print!(WARN, "skipping external files line `{}`", line);
            continue;
        };
        let size = leading_integer(size)
            .and_then(|size| u32::try_from(size).ok())
            .unwrap_or(0);
        programs.push(ExternalProgram {
            name: name.to_string(),
            size,
        });
    }
    ProgramSizeTable { programs }
}

/// Integer at the start of `field`, after leading whitespace
///
/// Trailing garbage is ignored (`"10ms"` is 10). Returns `None` when there
/// are no digits or the value does not fit an `i64`.
pub fn leading_integer(field: &str) -> Option<i64> {
    let field = field.trim_start();
    let (negative, unsigned) = match field.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, field.strip_prefix('+').unwrap_or(field)),
    };
    let end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let magnitude = unsigned.get(..end)?.parse::<i64>().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Read a whole file as text
pub fn read_text(path: impl AsRef<Path>) -> PlatformResult<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|source| PlatformError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `text` to `path`, replacing any previous content
pub fn write_output(path: impl AsRef<Path>, text: &str) -> PlatformResult<()> {
    let path = path.as_ref();
    fs::write(path, text).map_err(|source| PlatformError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_table_takes_last_token() {
        let table = parse_vector_table("0x01E3\n1 0x029C\n\n3   0x042B  \n");
        assert_eq!(table.len(), 4);
        assert_eq!(table.lookup(1), Some("0x029C"));
        assert_eq!(table.lookup(2), Some("0x0000"));
        assert_eq!(table.lookup(3), Some("0x042B"));
    }

    #[test]
    fn device_table_skips_noise() {
        assert_eq!(parse_device_table("110\n\nabc\n 250 \n"), vec![110, 250]);
    }

    #[test]
    fn external_files_are_trimmed() {
        let table = parse_external_files("program1, 10\n program2 ,15MB\nbroken\nprogram3, ?\n");
        assert_eq!(table.size_of("program1"), Some(10));
        assert_eq!(table.size_of("program2"), Some(15));
        assert_eq!(table.size_of("program3"), Some(0));
        assert_eq!(table.size_of("broken"), None);
        assert_eq!(table.programs().len(), 3);
    }

    #[test]
    fn first_duplicate_entry_wins() {
        let table = ProgramSizeTable::new([("dup", 4), ("dup", 9)]);
        assert_eq!(table.size_of("dup"), Some(4));
    }

    #[test]
    fn leading_integer_behaves_like_stoi() {
        assert_eq!(leading_integer(" 42"), Some(42));
        assert_eq!(leading_integer("17 ms"), Some(17));
        assert_eq!(leading_integer("-3"), Some(-3));
        assert_eq!(leading_integer("+8"), Some(8));
        assert_eq!(leading_integer("abc"), None);
        assert_eq!(leading_integer(""), None);
        assert_eq!(leading_integer("99999999999999999999"), None);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        let err = SystemTables::load(&missing, &missing, &missing).unwrap_err();
        assert!(matches!(err, PlatformError::Io { ref path, .. } if path == &missing));
    }
}

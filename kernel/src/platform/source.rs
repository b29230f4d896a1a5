//! Sources of `EXEC` sub-traces
//!
//! `EXEC <program>` replaces the caller's instruction stream with the trace of
//! `<program>`. Where that trace comes from is a platform concern: a
//! directory of `<program>.txt` files when running the binary, an in-memory
//! map in tests.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use super::{PlatformError, PlatformResult};

/// Supplies the trace text of a program loaded by `EXEC`
pub trait TraceSource {
    /// Raw trace text of `program`
    fn load(&self, program: &str) -> PlatformResult<String>;
}

impl<T: TraceSource + ?Sized> TraceSource for &T {
    fn load(&self, program: &str) -> PlatformResult<String> {
        (**self).load(program)
    }
}

/// Reads `<root>/<program>.txt`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirTraceSource {
    root: PathBuf,
}

impl DirTraceSource {
    /// Source rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the trace file for `program`, if the name is a plain file stem
    pub fn trace_path(&self, program: &str) -> Option<PathBuf> {
        let plain = !program.is_empty()
            && program != "."
            && program != ".."
            && !program.contains(['/', '\\']);
        plain.then(|| self.root.join(format!("{program}.txt")))
    }
}

impl TraceSource for DirTraceSource {
    fn load(&self, program: &str) -> PlatformResult<String> {
        let missing = || PlatformError::MissingTrace {
            program: program.to_string(),
        };
        let path = self.trace_path(program).ok_or_else(missing)?;
        match super::read_text(&path) {
            Err(PlatformError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Err(missing())
            }
            other => other,
        }
    }
}

/// Program traces held in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryTraceSource {
    programs: HashMap<String, String>,
}

impl MemoryTraceSource {
    /// Empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the trace of `program`
    pub fn insert(&mut self, program: impl Into<String>, trace: impl Into<String>) {
        self.programs.insert(program.into(), trace.into());
    }

    /// Builder form of [`Self::insert`]
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>, trace: impl Into<String>) -> Self {
        self.insert(program, trace);
        self
    }
}

impl TraceSource for MemoryTraceSource {
    fn load(&self, program: &str) -> PlatformResult<String> {
        self.programs
            .get(program)
            .cloned()
            .ok_or_else(|| PlatformError::MissingTrace {
                program: program.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn memory_source_returns_inserted_trace() {
        let source = MemoryTraceSource::new().with_program("program1", "CPU, 5\n");
        assert_eq!(source.load("program1").unwrap(), "CPU, 5\n");
        assert!(matches!(
            source.load("program2"),
            Err(PlatformError::MissingTrace { program }) if program == "program2"
        ));
    }

    #[test]
    fn dir_source_reads_program_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("program1.txt"), "CPU, 50\n").unwrap();

        let source = DirTraceSource::new(dir.path());
        assert_eq!(source.load("program1").unwrap(), "CPU, 50\n");
        assert!(matches!(source.load("program9"), Err(PlatformError::MissingTrace { .. })));
    }

    #[test]
    fn dir_source_rejects_paths() {
        let source = DirTraceSource::new("traces");
        assert!(source.trace_path("../secret").is_none());
        assert!(source.trace_path("..").is_none());
        assert_eq!(
            source.trace_path("program1"),
            Some(Path::new("traces").join("program1.txt"))
        );
    }
}

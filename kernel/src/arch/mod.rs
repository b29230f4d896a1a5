//! Interrupt Dispatch Layer
//!
//! This module models the table-driven interrupt dispatcher of the simulated
//! machine. Nothing is delivered for real: entering an interrupt produces a
//! fixed sequence of timed log lines and advances the virtual clock.
//!
//! # Vector Table Layout
//!
//! ```text
//! ADDR_BASE + 0 * VECTOR_SIZE : vector 0
//! ADDR_BASE + 1 * VECTOR_SIZE : vector 1
//! ADDR_BASE + 2 * VECTOR_SIZE : vector 2  (FORK)
//! ADDR_BASE + 3 * VECTOR_SIZE : vector 3  (EXEC)
//! ...
//! ```
//!
//! Each slot holds the handler address as a literal string (`0x0695`), read
//! from the vector table file.

#![deny(missing_docs)]

pub mod clock;
pub mod exceptions;

pub use clock::ExecutionLog;
pub use exceptions::{InterruptEntry, interrupt_entry};

/// Base address of the vector table
pub const ADDR_BASE: u32 = 0;

/// Size of one vector table slot in bytes
pub const VECTOR_SIZE: u32 = 2;

/// Address reported when an interrupt number has no vector table entry
pub const DEFAULT_VECTOR_ADDRESS: &str = "0x0000";

/// Interrupt numbers raised by trace directives
pub mod vectors {
    /// Process cloning
    pub const FORK: u32 = 2;
    /// Program image replacement
    pub const EXEC: u32 = 3;
}

/// Ordered interrupt vector table, indexed by interrupt number
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VectorTable {
    entries: Vec<String>,
}

impl VectorTable {
    /// Create a vector table from handler addresses in interrupt order
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    /// Handler address for an interrupt number, if the table has one
    pub fn lookup(&self, number: u32) -> Option<&str> {
        let index = usize::try_from(number).ok()?;
        self.entries.get(index).map(String::as_str)
    }

    /// Number of vectors in the table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no vectors
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Memory position of a vector, formatted as a 4-hex-digit address
///
/// # Examples
/// ```
/// assert_eq!(sim_kernel::arch::vector_address(2), "0x0004");
/// ```
pub fn vector_address(number: u32) -> String {
    let position = u64::from(ADDR_BASE) + u64::from(number) * u64::from(VECTOR_SIZE);
    format!("0x{position:04X}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_address_is_zero_padded_hex() {
        assert_eq!(vector_address(0), "0x0000");
        assert_eq!(vector_address(3), "0x0006");
        assert_eq!(vector_address(8), "0x0010");
        assert_eq!(vector_address(0x1000), "0x2000");
    }

    #[test]
    fn lookup_is_bounded_by_table_length() {
        let table = VectorTable::new(["0x01E3", "0x029C", "0x0695"]);
        assert_eq!(table.lookup(2), Some("0x0695"));
        assert_eq!(table.lookup(3), None);
        assert_eq!(table.len(), 3);
        assert!(VectorTable::default().is_empty());
    }
}

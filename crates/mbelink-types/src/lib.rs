//! Shared types and constants for the mbelink system.
//!
//! This crate provides the foundational value types used across all mbelink
//! crates: the fixed-size codec control word, the lookup-table mode, and the
//! server address grammar. It holds layout and validation only; resolution
//! and connection logic live in `mbelink-synth`.
//!
//! No crate in the workspace depends on anything *except* `mbelink-types`
//! for cross-cutting type definitions. This keeps the dependency graph clean
//! and prevents circular dependencies.

use serde::{Deserialize, Serialize};

mod address;
mod control_word;

pub use address::{AddressError, ServerAddress, DEFAULT_PORT};
pub use control_word::{ControlWord, ControlWordError, CONTROL_WORD_BYTES, CONTROL_WORD_LEN};

/// A codec mode selected by index into the backend's mode table.
///
/// The index is passed through verbatim; whether it names a valid table
/// entry is for the backend to decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMode {
    pub index: u32,
}

impl TableMode {
    pub fn new(index: u32) -> Self {
        Self { index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_mode_carries_index_verbatim() {
        assert_eq!(TableMode::new(0).index, 0);
        assert_eq!(TableMode::new(33).index, 33);
        assert_eq!(TableMode::new(u32::MAX).index, u32::MAX);
    }

    #[test]
    fn table_mode_serde_round_trip() {
        let mode = TableMode::new(4);
        let json = serde_json::to_string(&mode).unwrap();
        let back: TableMode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mode);
    }
}

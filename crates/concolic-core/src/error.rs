//! Error types for the concolic core.
//!
//! Only the two error kinds that can legitimately originate from the data
//! model live here: malformed byte-range requests, and the invariant
//! violations the seed model itself can detect (a cursor stuck on a fixed
//! byte, for instance). Everything else in the error taxonomy (§7 of the
//! design notes) belongs to the crate that can actually observe it.

use std::fmt;

#[derive(Debug)]
pub enum CoreError {
    /// The byte cursor sits on a byte whose value is `Fixed`, so no sample
    /// range exists to draw from. This is an internal invariant violation:
    /// callers must never construct or step a seed into this state.
    CursorOnFixedByte { position: usize },

    /// A requested byte offset does not exist in the seed.
    OffsetOutOfRange { offset: usize, len: usize },

    /// A constrained range was degenerate (`low > high`) after saturation.
    EmptyRange { low: u16, high: u16 },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::CursorOnFixedByte { position } => {
                write!(f, "cursor at position {position} is on a Fixed byte")
            }
            CoreError::OffsetOutOfRange { offset, len } => {
                write!(f, "byte offset {offset} out of range for seed of length {len}")
            }
            CoreError::EmptyRange { low, high } => {
                write!(f, "range [{low}, {high}] is empty after saturation")
            }
        }
    }
}

impl std::error::Error for CoreError {}

pub type Result<T> = std::result::Result<T, CoreError>;

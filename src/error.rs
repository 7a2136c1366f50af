//! Error type of the sets.
//!
//! Growth can fail, so every insertion comes in two versions:
//!
//! - `try_insert`, returning a `Result` with `SetError` as the error type.
//! - `insert`, which calls `try_insert` and panics on error.
//!
//! Cursor operations report stale state through the same type.

use core::fmt;

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum SetError {
    /// The resize policy offers no capacity larger than `capacity`.
    CapacityExhausted { capacity: usize },
    /// An element could not be placed in a table of `capacity` slots; the
    /// previous table was kept.
    RehashFailed { capacity: usize },
    /// The set was structurally modified outside the cursor.
    ConcurrentModification,
    /// `Cursor::remove` without a preceding successful `next`.
    NoCurrentElement,
    /// The cursor was created by a different set.
    WrongSet,
}

impl std::error::Error for SetError {}

impl fmt::Display for SetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetError::CapacityExhausted { capacity } => {
                write!(f, "table exhausted: cannot grow beyond {capacity} slots")
            }
            SetError::RehashFailed { capacity } => {
                write!(f, "rehash to {capacity} slots could not place every element")
            }
            SetError::ConcurrentModification => {
                f.write_str("set modified while a cursor was active")
            }
            SetError::NoCurrentElement => f.write_str("cursor has no current element"),
            SetError::WrongSet => f.write_str("cursor used with a set that did not create it"),
        }
    }
}

pub type Result<T> = core::result::Result<T, SetError>;

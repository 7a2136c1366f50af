//! Structural modification counter.
//!
//! Every change to a set's cardinality or layout bumps its generation. A
//! cursor remembers the generation it last saw and refuses to continue when
//! they differ. This is a diagnostic for misuse on one thread, not a
//! synchronization primitive: nothing here makes shared mutation safe.
//!
//! Each set also draws a process-unique owner id when it is built (and when
//! it is duplicated), so a cursor handed to a set other than the one that
//! created it fails with `WrongSet` instead of reading foreign positions.

use crate::error::{Result, SetError};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Generation {
    owner: u64,
    count: u64,
}

impl Generation {
    /// A fresh generation with an owner id no other set has.
    pub fn new() -> Self {
        Generation {
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            count: 0,
        }
    }

    #[inline]
    pub fn bump(&mut self) {
        self.count = self.count.wrapping_add(1);
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.count
    }

    /// Fails with `WrongSet` if `captured` came from another set, and with
    /// `ConcurrentModification` unless it is still current.
    #[inline]
    pub(crate) fn ensure(self, captured: Generation) -> Result<()> {
        if self.owner != captured.owner {
            Err(SetError::WrongSet)
        } else if self.count != captured.count {
            Err(SetError::ConcurrentModification)
        } else {
            Ok(())
        }
    }
}

impl Default for Generation {
    fn default() -> Self {
        Self::new()
    }
}

//! Structural health reports.
//!
//! `check_health` never panics; it streams `Violation`s to a sink. The checks
//! walk every element's probe path and are meant for tests and diagnostics.

/// One broken invariant found by a health check. Positions are slot indices
/// for open addressing and bucket indices for chaining.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Violation {
    /// The element at `slot` lies beyond the empty slot `gap` on its own
    /// probe path, so lookups stop before reaching it.
    EmptyInterval { slot: usize, gap: usize },
    /// The element's probe sequence never visits `slot`.
    Unreachable { slot: usize },
    /// The element's hash changed since it was inserted.
    HashDrift { slot: usize },
    /// A chained node sits in `bucket` but hashes to `expected`.
    MisplacedNode { bucket: usize, expected: usize },
    /// The element at `slot` equals one seen earlier.
    Duplicate { slot: usize },
    /// `counted` distinct elements were found but the set reports `size`.
    Consistency { counted: usize, size: usize },
}

/// Follows `path` until `slot`; reports the first empty slot on the way, or
/// `Unreachable` if the path never gets there.
pub(crate) fn check_probe_path<I, E>(path: I, slot: usize, is_empty: E) -> Option<Violation>
where
    I: IntoIterator<Item = usize>,
    E: Fn(usize) -> bool,
{
    for index in path {
        if index == slot {
            return None;
        }
        if is_empty(index) {
            return Some(Violation::EmptyInterval { slot, gap: index });
        }
    }
    Some(Violation::Unreachable { slot })
}

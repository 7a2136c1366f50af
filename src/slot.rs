//! Sentinel model shared by the open-addressing tables.
//!
//! Generic tables tag every slot with a closed variant, so no value can ever
//! be mistaken for a marker. Integer tables cannot afford a tag per slot and
//! reserve two codes instead; see `int_hash_set` for how the reserved codes
//! stay representable as members.

/// Code of a never-occupied slot in an integer table.
pub const EMPTY_MARK: i32 = 0;

/// Code of a tombstone in an integer table.
pub const REMOVED_MARK: i32 = 1;

/// Hash of an integer element: the value with its sign bit masked off.
#[inline]
pub fn positive_hash(value: i32) -> u64 {
    (value & 0x7fff_ffff) as u64
}

/// One slot of an open-addressing table.
///
/// `Occupied` keeps the hash computed at insertion so a rehash never calls
/// back into `T: Hash`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Slot<T> {
    Empty,
    Removed,
    Occupied { hash: u64, value: T },
}

impl<T> Slot<T> {
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    #[inline]
    pub(crate) fn is_occupied(&self) -> bool {
        matches!(self, Slot::Occupied { .. })
    }

    #[inline]
    pub(crate) fn value(&self) -> Option<&T> {
        match self {
            Slot::Occupied { value, .. } => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn hash(&self) -> Option<u64> {
        match self {
            Slot::Occupied { hash, .. } => Some(*hash),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: the sign bit never survives `positive_hash`.
    #[test]
    fn positive_hash_masks_sign_bit() {
        assert_eq!(positive_hash(5), 5);
        assert_eq!(positive_hash(-1), 0x7fff_ffff);
        assert_eq!(positive_hash(i32::MIN), 0);
        assert_eq!(positive_hash(i32::MAX), 0x7fff_ffff);
    }

    /// Invariant: only `Occupied` exposes a value and a hash.
    #[test]
    fn slot_accessors() {
        let e: Slot<u8> = Slot::Empty;
        let r: Slot<u8> = Slot::Removed;
        let o = Slot::Occupied { hash: 9, value: 3u8 };
        assert!(e.is_empty() && !e.is_occupied());
        assert!(!r.is_empty() && !r.is_occupied());
        assert!(o.is_occupied());
        assert_eq!(o.value(), Some(&3));
        assert_eq!(o.hash(), Some(9));
        assert_eq!(r.value(), None);
        assert_eq!(e.hash(), None);
    }
}

//! OpenTable: open addressing over tagged slots, generic over the probe order.

use crate::health::{check_probe_path, Violation};
use crate::policy::ResizePolicy;
use crate::probe::Probe;
use crate::slot::Slot;
use crate::strategy::{CollisionStrategy, Placement};

/// Flat slot array searched along `P`'s probe sequence. Deleted elements
/// leave tombstones so later elements on the same path stay reachable.
#[derive(Clone, Debug)]
pub struct OpenTable<T, P> {
    slots: Vec<Slot<T>>,
    probe: P,
}

impl<T, P: Probe> OpenTable<T, P> {
    /// An unallocated table; the owning set sizes it from its policy.
    pub fn new(probe: P) -> Self {
        Self {
            slots: Vec::new(),
            probe,
        }
    }

    /// The element stored at slot `index`, if any.
    pub fn occupant(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Slot::value)
    }

    /// True if slot `index` holds a tombstone.
    pub fn is_removed(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Slot::Removed))
    }

    pub fn tombstones(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, Slot::Removed))
            .count()
    }

    fn empty_slots(capacity: usize) -> Vec<Slot<T>> {
        (0..capacity).map(|_| Slot::Empty).collect()
    }

    fn scan_from(&self, start: usize) -> Option<usize> {
        (start..self.slots.len()).find(|&i| self.slots[i].is_occupied())
    }
}

impl<T, P: Probe + Default> Default for OpenTable<T, P> {
    fn default() -> Self {
        Self::new(P::default())
    }
}

impl<T, P: Probe> CollisionStrategy<T> for OpenTable<T, P> {
    type Position = usize;

    fn admissible_capacity(&self, requested: usize) -> usize {
        self.probe.admissible_capacity(requested)
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn reset(&mut self, capacity: usize) {
        self.probe.set_modulus(capacity);
        self.slots = Self::empty_slots(capacity);
    }

    fn find<F>(&self, hash: u64, mut eq: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        for index in self.probe.sequence(hash, self.slots.len()) {
            match &self.slots[index] {
                Slot::Empty => return None,
                Slot::Removed => {}
                Slot::Occupied { hash: h, value } => {
                    if *h == hash && eq(value) {
                        return Some(index);
                    }
                }
            }
        }
        None
    }

    fn place<R>(&mut self, hash: u64, value: T, policy: &R) -> Placement<T>
    where
        T: Eq,
        R: ResizePolicy + ?Sized,
    {
        let modulus = self.slots.len();
        // First tombstone on the path; reused so chains do not lengthen.
        let mut reusable = None;
        let mut target = None;
        for (depth, index) in self.probe.sequence(hash, modulus).enumerate() {
            match &self.slots[index] {
                Slot::Empty => {
                    target = Some(reusable.unwrap_or(index));
                    break;
                }
                Slot::Removed => {
                    if reusable.is_none() {
                        reusable = Some(index);
                    }
                }
                Slot::Occupied { hash: h, value: v } => {
                    if *h == hash && *v == value {
                        return Placement::Present(value);
                    }
                }
            }
            if policy.test_link_length(depth, modulus) {
                log::trace!("probe chain of {} slots abandoned at modulus {}", depth + 1, modulus);
                return Placement::Grow(value);
            }
        }
        // A path without any empty slot may still end on a tombstone.
        match target.or(reusable) {
            Some(index) => {
                self.slots[index] = Slot::Occupied { hash, value };
                Placement::Inserted
            }
            None => Placement::Grow(value),
        }
    }

    fn rehash(&mut self, capacity: usize) -> bool {
        let mut probe = self.probe.clone();
        probe.set_modulus(capacity);

        // Plan every move first so a failure leaves the table untouched.
        let mut taken = vec![false; capacity];
        let mut targets = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            if let Some(hash) = slot.hash() {
                match probe.sequence(hash, capacity).find(|&i| !taken[i]) {
                    Some(index) => {
                        taken[index] = true;
                        targets.push(index);
                    }
                    None => return false,
                }
            }
        }

        let mut fresh = Self::empty_slots(capacity);
        let old = core::mem::take(&mut self.slots);
        for (slot, index) in old.into_iter().filter(Slot::is_occupied).zip(targets) {
            fresh[index] = slot;
        }
        self.slots = fresh;
        self.probe = probe;
        true
    }

    fn get(&self, position: usize) -> &T {
        self.slots[position]
            .value()
            .expect("position must refer to an occupied slot")
    }

    fn take(&mut self, position: usize) -> (T, Option<usize>) {
        match core::mem::replace(&mut self.slots[position], Slot::Removed) {
            Slot::Occupied { value, .. } => (value, self.scan_from(position + 1)),
            other => {
                self.slots[position] = other;
                panic!("take at slot {position}, which holds no element");
            }
        }
    }

    fn first(&self) -> Option<usize> {
        self.scan_from(0)
    }

    fn successor(&self, position: usize) -> Option<usize> {
        self.scan_from(position + 1)
    }

    fn slot_of(&self, position: usize) -> usize {
        position
    }

    fn check_placement<H, V>(&self, hash: H, report: &mut V)
    where
        H: Fn(&T) -> u64,
        V: FnMut(Violation),
    {
        let modulus = self.slots.len();
        for (slot, entry) in self.slots.iter().enumerate() {
            let Slot::Occupied {
                hash: stored,
                value,
            } = entry
            else {
                continue;
            };
            let current = hash(value);
            if current != *stored {
                report(Violation::HashDrift { slot });
            }
            let path = self.probe.sequence(current, modulus);
            if let Some(v) = check_probe_path(path, slot, |i| self.slots[i].is_empty()) {
                report(v);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::TwiceResizePolicy;
    use crate::probe::{CongruentProbe, LinearProbe, Stride};

    fn linear(capacity: usize) -> OpenTable<&'static str, LinearProbe> {
        let mut t = OpenTable::new(LinearProbe);
        t.reset(capacity);
        t
    }

    fn violations<T, P: Probe>(t: &OpenTable<T, P>, hash: impl Fn(&T) -> u64) -> Vec<Violation> {
        let mut out = Vec::new();
        t.check_placement(hash, &mut |v| out.push(v));
        out
    }

    /// Invariant: colliding elements fill consecutive slots, and a tombstone
    /// between them does not hide the later ones.
    #[test]
    fn collisions_fill_forward_and_tombstones_are_transparent() {
        let policy = TwiceResizePolicy::new();
        let mut t = linear(7);
        for v in ["a", "b", "c"] {
            assert_eq!(t.place(3, v, &policy), Placement::Inserted);
        }
        assert_eq!(t.occupant(3), Some(&"a"));
        assert_eq!(t.occupant(4), Some(&"b"));
        assert_eq!(t.occupant(5), Some(&"c"));

        let (removed, next) = t.take(4);
        assert_eq!(removed, "b");
        assert_eq!(next, Some(5));
        assert!(t.is_removed(4));
        assert_eq!(t.find(3, |v| *v == "c"), Some(5));
        assert_eq!(t.find(3, |v| *v == "b"), None);

        // The tombstone is reused by the next colliding insert.
        assert_eq!(t.place(3, "d", &policy), Placement::Inserted);
        assert_eq!(t.occupant(4), Some(&"d"));
        assert_eq!(t.tombstones(), 0);
    }

    /// Invariant: an equal element already on the path is reported, not duplicated.
    #[test]
    fn place_reports_present() {
        let policy = TwiceResizePolicy::new();
        let mut t = linear(7);
        assert_eq!(t.place(3, "a", &policy), Placement::Inserted);
        assert_eq!(t.place(3, "a", &policy), Placement::Present("a"));
        // Same value under another hash is a different element to the table.
        assert_eq!(t.place(4, "a", &policy), Placement::Inserted);
    }

    /// Invariant: a full path of live elements asks for growth.
    #[test]
    fn full_table_requests_growth() {
        let policy = TwiceResizePolicy::new().with_link_factor(0);
        let mut t = linear(2);
        assert_eq!(t.place(0, "a", &policy), Placement::Inserted);
        assert_eq!(t.place(0, "b", &policy), Placement::Inserted);
        assert_eq!(t.place(0, "c", &policy), Placement::Grow("c"));
    }

    /// Invariant: the link-length test abandons long chains.
    #[test]
    fn long_chain_requests_growth() {
        let policy = TwiceResizePolicy::new().with_link_factor(1);
        let mut t = linear(64);
        // modulus 64 has 7 significant bits: passing an eighth live slot triggers.
        for (i, v) in ["a", "b", "c", "d", "e", "f", "g", "h"].into_iter().enumerate() {
            assert_eq!(t.place(0, v, &policy), Placement::Inserted, "insert {i}");
        }
        assert_eq!(t.place(0, "i", &policy), Placement::Grow("i"));
    }

    /// Invariant: rehash keeps every element findable and sheds tombstones.
    #[test]
    fn rehash_preserves_elements() {
        let policy = TwiceResizePolicy::new();
        let mut t = linear(7);
        let items = [(3, "a"), (3, "b"), (10, "c"), (6, "d")];
        for (h, v) in items {
            assert_eq!(t.place(h, v, &policy), Placement::Inserted);
        }
        let _ = t.take(4);
        assert!(t.rehash(14));
        assert_eq!(t.capacity(), 14);
        assert_eq!(t.tombstones(), 0);
        for (h, v) in items.into_iter().filter(|(_, v)| *v != "b") {
            assert!(t.find(h, |x| *x == v).is_some(), "{v} lost");
        }
        let hashes = |v: &&str| items.iter().find(|(_, x)| x == v).map(|(h, _)| *h).unwrap();
        assert!(violations(&t, hashes).is_empty());
    }

    /// A probe that only ever offers slot 0.
    #[derive(Clone, Default)]
    struct SingleSlot;
    impl Probe for SingleSlot {
        type Seq<'a> = Stride;
        fn admissible_capacity(&self, requested: usize) -> usize {
            requested.max(1)
        }
        fn sequence(&self, _hash: u64, modulus: usize) -> Stride {
            LinearProbe.sequence(0, modulus.min(1))
        }
    }

    /// Invariant: a rehash that cannot place every element changes nothing.
    #[test]
    fn failed_rehash_keeps_old_table() {
        let policy = TwiceResizePolicy::new();
        let mut t: OpenTable<u8, SingleSlot> = OpenTable::new(SingleSlot);
        t.reset(1);
        assert_eq!(t.place(0, 1, &policy), Placement::Inserted);
        // Manually wedge a second element in to make the layout unplaceable.
        t.slots.push(Slot::Occupied { hash: 0, value: 2 });
        assert!(!t.rehash(8));
        assert_eq!(t.capacity(), 2);
        assert_eq!(t.occupant(0), Some(&1));
        assert_eq!(t.occupant(1), Some(&2));
    }

    /// Invariant: the health check flags elements stranded behind an empty slot.
    #[test]
    fn health_detects_empty_interval_and_drift() {
        let policy = TwiceResizePolicy::new();
        let mut t = linear(7);
        assert_eq!(t.place(3, "a", &policy), Placement::Inserted);
        assert_eq!(t.place(3, "b", &policy), Placement::Inserted);
        // Simulate a corrupt deletion that left EMPTY instead of a tombstone.
        t.slots[3] = Slot::Empty;
        let v = violations(&t, |_| 3);
        assert_eq!(v, vec![Violation::EmptyInterval { slot: 4, gap: 3 }]);

        let v = violations(&t, |_| 4);
        assert_eq!(v, vec![Violation::HashDrift { slot: 4 }]);
    }

    /// Invariant: a congruent table sizes itself to primes and places every element.
    #[test]
    fn congruent_table_places_and_finds() {
        let policy = TwiceResizePolicy::new().with_link_factor(0);
        let mut t: OpenTable<u64, CongruentProbe> = OpenTable::default();
        let cap = t.admissible_capacity(10);
        assert_eq!(cap, 11);
        t.reset(cap);
        for v in 0..11u64 {
            let h = v * 11 + 5; // every element starts at slot 5
            assert_eq!(t.place(h, v, &policy), Placement::Inserted);
        }
        for v in 0..11u64 {
            assert!(t.find(v * 11 + 5, |x| *x == v).is_some());
        }
        assert!(violations(&t, |v| v * 11 + 5).is_empty());
    }
}

//! IntHashSet: open addressing over raw `i32` slots.
//!
//! Slots hold element values directly. `EMPTY_MARK` and `REMOVED_MARK` are
//! reserved as slot codes, so membership of those two values is kept in
//! flags outside the array and they are never written into a slot as data.
//! They count toward `len()` like any other element.

use crate::chained_table::ChainedTable;
use crate::error::{Result, SetError};
use crate::generation::Generation;
use crate::hash_set::HashSet;
use crate::health::{check_probe_path, Violation};
use crate::policy::{ResizePolicy, TwiceResizePolicy};
use crate::probe::{CongruentProbe, LinearProbe, Probe, QuadraticProbe};
use crate::slot::{positive_hash, EMPTY_MARK, REMOVED_MARK};
use crate::strategy::Placement;
use core::fmt;
use core::hash::{BuildHasher, Hasher};
use rand::Rng;
use std::sync::Arc;

pub type IntLinearHashSet<R = TwiceResizePolicy> = IntHashSet<LinearProbe, R>;
pub type IntQuadraticHashSet<R = TwiceResizePolicy> = IntHashSet<QuadraticProbe, R>;
pub type IntCongruentHashSet<R = TwiceResizePolicy> = IntHashSet<CongruentProbe, R>;

/// Chaining over `i32`, hashed exactly like the open-addressing integer sets.
pub type IntChainedHashSet<R = TwiceResizePolicy> =
    HashSet<i32, ChainedTable<i32>, R, PositiveHashBuilder>;

/// `BuildHasher` whose hash of an `i32` is `positive_hash` of it.
#[derive(Clone, Copy, Debug, Default)]
pub struct PositiveHashBuilder;

#[derive(Clone, Copy, Debug, Default)]
pub struct PositiveHasher(u64);

impl Hasher for PositiveHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.wrapping_mul(31).wrapping_add(b as u64) & 0x7fff_ffff;
        }
    }

    #[inline]
    fn write_i32(&mut self, i: i32) {
        self.0 = positive_hash(i);
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
}

impl BuildHasher for PositiveHashBuilder {
    type Hasher = PositiveHasher;

    fn build_hasher(&self) -> PositiveHasher {
        PositiveHasher::default()
    }
}

impl IntChainedHashSet {
    pub fn new() -> Self {
        Self::with_hasher(PositiveHashBuilder)
    }
}

#[inline]
fn is_live(code: i32) -> bool {
    code != EMPTY_MARK && code != REMOVED_MARK
}

/// Position of an element of an `IntHashSet`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IntPosition {
    /// The value `EMPTY_MARK`, stored as a flag.
    EmptyMark,
    /// The value `REMOVED_MARK`, stored as a flag.
    RemovedMark,
    Slot(usize),
}

pub struct IntHashSet<P, R = TwiceResizePolicy> {
    slots: Vec<i32>,
    probe: P,
    policy: Arc<R>,
    contains_empty_mark: bool,
    contains_removed_mark: bool,
    len: usize,
    generation: Generation,
}

impl<P: Probe + Default> IntHashSet<P> {
    pub fn new() -> Self {
        Self::with_policy(TwiceResizePolicy::default())
    }
}

impl<P: Probe + Default, R: ResizePolicy> IntHashSet<P, R> {
    pub fn with_policy(policy: R) -> Self {
        Self::from_parts(P::default(), Arc::new(policy))
    }
}

impl<P: Probe, R: ResizePolicy> IntHashSet<P, R> {
    pub fn from_parts(mut probe: P, policy: Arc<R>) -> Self {
        let capacity = probe.admissible_capacity(policy.initial_capacity());
        probe.set_modulus(capacity);
        Self {
            slots: vec![EMPTY_MARK; capacity],
            probe,
            policy,
            contains_empty_mark: false,
            contains_removed_mark: false,
            len: 0,
            generation: Generation::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn policy(&self) -> &Arc<R> {
        &self.policy
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// The element stored in slot `index`, if any.
    pub fn occupant(&self, index: usize) -> Option<i32> {
        self.slots.get(index).copied().filter(|&c| is_live(c))
    }

    /// True if slot `index` holds a tombstone.
    pub fn is_removed(&self, index: usize) -> bool {
        self.slots.get(index) == Some(&REMOVED_MARK)
    }

    fn find(&self, value: i32) -> Option<usize> {
        let hash = positive_hash(value);
        for index in self.probe.sequence(hash, self.slots.len()) {
            match self.slots[index] {
                EMPTY_MARK => return None,
                REMOVED_MARK => {}
                code if code == value => return Some(index),
                _ => {}
            }
        }
        None
    }

    pub fn contains(&self, value: i32) -> bool {
        match value {
            EMPTY_MARK => self.contains_empty_mark,
            REMOVED_MARK => self.contains_removed_mark,
            _ => self.find(value).is_some(),
        }
    }

    fn mark_flag(&mut self, value: i32) -> Option<&mut bool> {
        match value {
            EMPTY_MARK => Some(&mut self.contains_empty_mark),
            REMOVED_MARK => Some(&mut self.contains_removed_mark),
            _ => None,
        }
    }

    /// Adds `value`; `Ok(false)` if already present.
    pub fn try_insert(&mut self, value: i32) -> Result<bool> {
        if let Some(flag) = self.mark_flag(value) {
            if *flag {
                return Ok(false);
            }
            *flag = true;
            self.len += 1;
            self.generation.bump();
            return Ok(true);
        }
        loop {
            if self.policy.test_loaded_size(self.len + 1, self.slots.len()) {
                if self.find(value).is_some() {
                    return Ok(false);
                }
                self.grow()?;
                continue;
            }
            match self.place(value) {
                Placement::Inserted => {
                    self.len += 1;
                    self.generation.bump();
                    return Ok(true);
                }
                Placement::Present(_) => return Ok(false),
                Placement::Grow(_) => {
                    // The search may stop short of an equal value placed deep
                    // by a rehash.
                    if self.find(value).is_some() {
                        return Ok(false);
                    }
                    self.grow()?;
                }
            }
        }
    }

    /// Adds `value`; `false` if already present.
    ///
    /// # Panics
    ///
    /// Panics if the table needs to grow and cannot; see `try_insert`.
    pub fn insert(&mut self, value: i32) -> bool {
        match self.try_insert(value) {
            Ok(added) => added,
            Err(e) => panic!("{e}"),
        }
    }

    fn place(&mut self, value: i32) -> Placement<i32> {
        let modulus = self.slots.len();
        let mut reusable = None;
        let mut target = None;
        for (depth, index) in self.probe.sequence(positive_hash(value), modulus).enumerate() {
            match self.slots[index] {
                EMPTY_MARK => {
                    target = Some(reusable.unwrap_or(index));
                    break;
                }
                REMOVED_MARK => {
                    if reusable.is_none() {
                        reusable = Some(index);
                    }
                }
                code if code == value => return Placement::Present(value),
                _ => {}
            }
            if self.policy.test_link_length(depth, modulus) {
                log::trace!("probe chain of {} slots abandoned at modulus {}", depth + 1, modulus);
                return Placement::Grow(value);
            }
        }
        match target.or(reusable) {
            Some(index) => {
                self.slots[index] = value;
                Placement::Inserted
            }
            None => Placement::Grow(value),
        }
    }

    fn grow(&mut self) -> Result<()> {
        let current = self.slots.len();
        let next = self
            .probe
            .admissible_capacity(self.policy.next_capacity(current));
        if next <= current {
            log::warn!("cannot grow past {current} slots with {} elements", self.len);
            return Err(SetError::CapacityExhausted { capacity: current });
        }
        if !self.rehash(next) {
            log::warn!("rehash from {current} to {next} slots failed; keeping the old table");
            return Err(SetError::RehashFailed { capacity: next });
        }
        self.generation.bump();
        log::debug!("rehashed {} elements: {current} -> {next} slots", self.len);
        Ok(())
    }

    fn rehash(&mut self, capacity: usize) -> bool {
        let mut probe = self.probe.clone();
        probe.set_modulus(capacity);
        let mut fresh = vec![EMPTY_MARK; capacity];
        for &value in self.slots.iter().filter(|&&c| is_live(c)) {
            let free = probe
                .sequence(positive_hash(value), capacity)
                .find(|&i| fresh[i] == EMPTY_MARK);
            match free {
                Some(index) => fresh[index] = value,
                None => return false,
            }
        }
        self.slots = fresh;
        self.probe = probe;
        true
    }

    /// Removes `value`; `false` if it was absent.
    pub fn remove(&mut self, value: i32) -> bool {
        let position = match value {
            EMPTY_MARK if self.contains_empty_mark => IntPosition::EmptyMark,
            REMOVED_MARK if self.contains_removed_mark => IntPosition::RemovedMark,
            EMPTY_MARK | REMOVED_MARK => return false,
            _ => match self.find(value) {
                Some(index) => IntPosition::Slot(index),
                None => return false,
            },
        };
        self.take_at(position);
        true
    }

    /// Removes every element, keeping the current capacity.
    pub fn clear(&mut self) {
        self.slots.fill(EMPTY_MARK);
        self.contains_empty_mark = false;
        self.contains_removed_mark = false;
        self.len = 0;
        self.generation.bump();
    }

    /// Position following `position` in iteration order; `None` starts from
    /// the beginning. Flagged marks come first, then slots in index order.
    fn after(&self, position: Option<IntPosition>) -> Option<IntPosition> {
        let start = match position {
            None if self.contains_empty_mark => return Some(IntPosition::EmptyMark),
            None | Some(IntPosition::EmptyMark) if self.contains_removed_mark => {
                return Some(IntPosition::RemovedMark)
            }
            None | Some(IntPosition::EmptyMark) | Some(IntPosition::RemovedMark) => 0,
            Some(IntPosition::Slot(index)) => index + 1,
        };
        (start..self.slots.len())
            .find(|&i| is_live(self.slots[i]))
            .map(IntPosition::Slot)
    }

    fn value_at(&self, position: IntPosition) -> i32 {
        match position {
            IntPosition::EmptyMark => EMPTY_MARK,
            IntPosition::RemovedMark => REMOVED_MARK,
            IntPosition::Slot(index) => self.slots[index],
        }
    }

    fn take_at(&mut self, position: IntPosition) -> (i32, Option<IntPosition>) {
        let value = self.value_at(position);
        match position {
            IntPosition::EmptyMark => self.contains_empty_mark = false,
            IntPosition::RemovedMark => self.contains_removed_mark = false,
            IntPosition::Slot(index) => self.slots[index] = REMOVED_MARK,
        }
        self.len -= 1;
        self.generation.bump();
        (value, self.after(Some(position)))
    }

    pub fn iter(&self) -> IntIter<'_, P, R> {
        IntIter {
            set: self,
            next: self.after(None),
            remaining: self.len,
        }
    }

    pub fn cursor(&self) -> IntCursor {
        IntCursor {
            next: self.after(None),
            current: None,
            generation: self.generation,
        }
    }

    pub fn to_vec(&self) -> Vec<i32> {
        self.iter().collect()
    }

    pub fn first(&self) -> Option<i32> {
        self.after(None).map(|p| self.value_at(p))
    }

    /// Without `rng`, the first element. With `rng`, an element chosen
    /// uniformly by reservoir sampling over one pass.
    pub fn get_arbitrary<G: Rng>(&self, rng: Option<&mut G>) -> Option<i32> {
        self.arbitrary_position(rng).map(|p| self.value_at(p))
    }

    pub fn remove_arbitrary<G: Rng>(&mut self, rng: Option<&mut G>) -> Option<i32> {
        let position = self.arbitrary_position(rng)?;
        Some(self.take_at(position).0)
    }

    fn arbitrary_position<G: Rng>(&self, rng: Option<&mut G>) -> Option<IntPosition> {
        let first = self.after(None)?;
        let Some(rng) = rng else {
            return Some(first);
        };
        let mut selected = first;
        let mut seen = 1u64;
        let mut cursor = self.after(Some(first));
        while let Some(p) = cursor {
            seen += 1;
            if rng.random_range(0..seen) == 0 {
                selected = p;
            }
            cursor = self.after(Some(p));
        }
        Some(selected)
    }

    pub fn add_all<I: IntoIterator<Item = i32>>(&mut self, values: I) -> bool {
        values
            .into_iter()
            .fold(false, |changed, v| self.insert(v) | changed)
    }

    pub fn remove_all<I: IntoIterator<Item = i32>>(&mut self, values: I) -> bool {
        values
            .into_iter()
            .fold(false, |changed, v| self.remove(v) | changed)
    }

    pub fn contains_all<I: IntoIterator<Item = i32>>(&self, values: I) -> bool {
        values.into_iter().all(|v| self.contains(v))
    }

    pub fn retain<F: FnMut(i32) -> bool>(&mut self, mut keep: F) {
        let mut cursor = self.after(None);
        while let Some(p) = cursor {
            cursor = if keep(self.value_at(p)) {
                self.after(Some(p))
            } else {
                self.take_at(p).1
            };
        }
    }

    /// Keeps only the elements also found in `values`; true if any was removed.
    pub fn retain_all<I: IntoIterator<Item = i32>>(&mut self, values: I) -> bool {
        let keep: hashbrown::HashSet<i32> = values.into_iter().collect();
        let before = self.len;
        self.retain(|v| keep.contains(&v));
        before != self.len
    }

    /// An independent copy: own slots, shared policy.
    pub fn duplicate(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            probe: self.probe.clone(),
            policy: Arc::clone(&self.policy),
            contains_empty_mark: self.contains_empty_mark,
            contains_removed_mark: self.contains_removed_mark,
            len: self.len,
            generation: Generation::new(),
        }
    }

    /// Streams every structural violation to `report`. Never panics.
    pub fn check_health<V: FnMut(Violation)>(&self, mut report: V) {
        let modulus = self.slots.len();
        let mut seen: hashbrown::HashSet<i32> = hashbrown::HashSet::with_capacity(self.len);
        let mut counted =
            usize::from(self.contains_empty_mark) + usize::from(self.contains_removed_mark);
        for (slot, &value) in self.slots.iter().enumerate() {
            if !is_live(value) {
                continue;
            }
            let path = self.probe.sequence(positive_hash(value), modulus);
            if let Some(v) = check_probe_path(path, slot, |i| self.slots[i] == EMPTY_MARK) {
                report(v);
            }
            if seen.insert(value) {
                counted += 1;
            } else {
                report(Violation::Duplicate { slot });
            }
        }
        if counted != self.len {
            report(Violation::Consistency {
                counted,
                size: self.len,
            });
        }
    }

    pub fn health_violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        self.check_health(|v| out.push(v));
        out
    }
}

/// Iterator over the elements of an `IntHashSet`, by value.
pub struct IntIter<'a, P, R> {
    set: &'a IntHashSet<P, R>,
    next: Option<IntPosition>,
    remaining: usize,
}

impl<'a, P: Probe, R: ResizePolicy> Iterator for IntIter<'a, P, R> {
    type Item = i32;

    #[inline]
    fn next(&mut self) -> Option<i32> {
        let position = self.next?;
        self.next = self.set.after(Some(position));
        self.remaining = self.remaining.saturating_sub(1);
        Some(self.set.value_at(position))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, P: Probe, R: ResizePolicy> ExactSizeIterator for IntIter<'a, P, R> {}

/// Fail-fast cursor over an `IntHashSet`; see `hash_set::Cursor`.
#[derive(Clone, Debug)]
pub struct IntCursor {
    next: Option<IntPosition>,
    current: Option<IntPosition>,
    generation: Generation,
}

impl IntCursor {
    pub fn next<P: Probe, R: ResizePolicy>(&mut self, set: &IntHashSet<P, R>) -> Result<Option<i32>> {
        set.generation.ensure(self.generation)?;
        let Some(position) = self.next else {
            self.current = None;
            return Ok(None);
        };
        self.next = set.after(Some(position));
        self.current = Some(position);
        Ok(Some(set.value_at(position)))
    }

    pub fn remove<P: Probe, R: ResizePolicy>(&mut self, set: &mut IntHashSet<P, R>) -> Result<i32> {
        set.generation.ensure(self.generation)?;
        let position = self.current.take().ok_or(SetError::NoCurrentElement)?;
        let (value, successor) = set.take_at(position);
        self.next = successor;
        self.generation = set.generation;
        Ok(value)
    }
}

impl<P: Probe, R: ResizePolicy> Clone for IntHashSet<P, R> {
    fn clone(&self) -> Self {
        self.duplicate()
    }
}

impl<P: Probe, R: ResizePolicy> fmt::Debug for IntHashSet<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<P: Probe, R: ResizePolicy> PartialEq for IntHashSet<P, R> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().all(|v| other.contains(v))
    }
}

impl<P: Probe, R: ResizePolicy> Eq for IntHashSet<P, R> {}

impl<P: Probe + Default, R: ResizePolicy + Default> Default for IntHashSet<P, R> {
    fn default() -> Self {
        Self::from_parts(P::default(), Arc::new(R::default()))
    }
}

impl<P: Probe, R: ResizePolicy> Extend<i32> for IntHashSet<P, R> {
    fn extend<I: IntoIterator<Item = i32>>(&mut self, iter: I) {
        for v in iter {
            self.insert(v);
        }
    }
}

impl<P: Probe + Default, R: ResizePolicy + Default> FromIterator<i32> for IntHashSet<P, R> {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<'a, P: Probe, R: ResizePolicy> IntoIterator for &'a IntHashSet<P, R> {
    type Item = i32;
    type IntoIter = IntIter<'a, P, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn linear7() -> IntLinearHashSet {
        IntHashSet::with_policy(TwiceResizePolicy::new().with_initial_capacity(7))
    }

    /// Invariant: three values with ideal index 3 land in 3, 4, 5; a
    /// tombstone at 4 does not stop the probe for the value at 5.
    #[test]
    fn colliding_values_and_tombstone() {
        let mut s = linear7();
        assert_eq!(s.capacity(), 7);
        for v in [3, 10, 17] {
            assert!(s.insert(v));
        }
        assert_eq!(s.occupant(3), Some(3));
        assert_eq!(s.occupant(4), Some(10));
        assert_eq!(s.occupant(5), Some(17));

        assert!(s.remove(10));
        assert!(s.is_removed(4));
        assert!(s.contains(17));
        assert!(!s.contains(10));
        assert!(s.health_violations().is_empty());
    }

    /// Invariant: the reserved codes are ordinary members, never stored in slots.
    #[test]
    fn marks_are_members() {
        let mut s = linear7();
        assert!(!s.contains(EMPTY_MARK));
        assert!(s.insert(EMPTY_MARK));
        assert!(!s.insert(EMPTY_MARK));
        assert!(s.insert(REMOVED_MARK));
        assert!(s.insert(8));
        assert_eq!(s.len(), 3);
        assert!(s.contains(0) && s.contains(1) && s.contains(8));
        assert!((0..7).all(|i| s.occupant(i).map_or(true, |v| v == 8)));
        assert_eq!(s.to_vec(), vec![0, 1, 8]);

        assert!(s.remove(EMPTY_MARK));
        assert!(!s.remove(EMPTY_MARK));
        assert_eq!(s.len(), 2);
        assert_eq!(s.to_vec(), vec![1, 8]);
        assert!(s.health_violations().is_empty());
    }

    /// Invariant: negative values hash by their masked bits and stay findable.
    #[test]
    fn negative_values() {
        let mut s: IntCongruentHashSet = IntHashSet::new();
        for v in [-1, i32::MIN, -7, i32::MAX, 2] {
            assert!(s.insert(v));
        }
        assert!(s.contains(-1) && s.contains(i32::MIN) && s.contains(i32::MAX));
        assert!(!s.contains(-2));
        assert!(s.health_violations().is_empty());
    }

    /// Invariant: growth keeps every value in each open-addressing family.
    #[test]
    fn growth_in_every_family() {
        let mut l: IntLinearHashSet = IntHashSet::new();
        let mut q: IntQuadraticHashSet = IntHashSet::new();
        let mut c: IntCongruentHashSet = IntHashSet::new();
        for v in -300..300 {
            assert!(l.insert(v * 7));
            assert!(q.insert(v * 7));
            assert!(c.insert(v * 7));
        }
        assert!(q.capacity().is_power_of_two());
        assert!(crate::policy::is_prime(c.capacity()));
        for s in [l.to_vec(), q.to_vec(), c.to_vec()] {
            let got: BTreeSet<i32> = s.into_iter().collect();
            let want: BTreeSet<i32> = (-300..300).map(|v| v * 7).collect();
            assert_eq!(got, want);
        }
        assert!(l.health_violations().is_empty());
        assert!(q.health_violations().is_empty());
        assert!(c.health_violations().is_empty());
    }

    /// Invariant: the cursor walks the flagged marks too and removes them.
    #[test]
    fn cursor_over_marks() {
        let mut s: IntLinearHashSet = [0, 1, 5, 6].into_iter().collect();
        let mut c = s.cursor();
        let mut seen = Vec::new();
        while let Some(v) = c.next(&s).unwrap() {
            seen.push(v);
            if v <= 1 {
                assert_eq!(c.remove(&mut s), Ok(v));
            }
        }
        assert_eq!(&seen[..2], &[0, 1]);
        assert_eq!(seen.len(), 4);
        assert_eq!(s.len(), 2);
        assert!(!s.contains(0) && !s.contains(1));

        let mut c = s.cursor();
        s.clear();
        assert_eq!(c.next(&s), Err(SetError::ConcurrentModification));
    }

    #[test]
    fn retain_and_bulk() {
        let mut s: IntQuadraticHashSet = (0..50).collect();
        assert!(s.retain_all(0..10));
        assert_eq!(s.len(), 10);
        s.retain(|v| v % 2 == 1);
        assert_eq!(s.to_vec().into_iter().collect::<BTreeSet<_>>(), BTreeSet::from([1, 3, 5, 7, 9]));
        assert!(s.contains_all([1, 3]));
        assert!(s.remove_all([1, 2]));
        assert!(!s.add_all([3, 5]));
        assert!(s.health_violations().is_empty());
    }

    /// Invariant: the chaining alias hashes integers by their masked bits.
    #[test]
    fn chained_alias_uses_positive_hash() {
        assert_eq!(PositiveHashBuilder.hash_one(-1i32), 0x7fff_ffff);
        assert_eq!(PositiveHashBuilder.hash_one(42i32), 42);
        let mut s = IntChainedHashSet::new();
        assert!(s.insert(0));
        assert!(s.insert(-5));
        assert!(s.contains(&0) && s.contains(&-5));
        assert!(s.health_violations().is_empty());
    }
}

//! HashSet: size, generation, hashing and health checks over any
//! `CollisionStrategy`.

use crate::chained_table::ChainedTable;
use crate::error::{Result, SetError};
use crate::generation::Generation;
use crate::health::Violation;
use crate::open_table::OpenTable;
use crate::policy::{ResizePolicy, TwiceResizePolicy};
use crate::probe::{CongruentProbe, LinearProbe, QuadraticProbe};
use crate::strategy::{CollisionStrategy, Placement};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use rand::Rng;
use std::collections::hash_map::RandomState;
use std::sync::Arc;

/// Open addressing with a step of one.
pub type LinearHashSet<T, S = RandomState> =
    HashSet<T, OpenTable<T, LinearProbe>, TwiceResizePolicy, S>;

/// Open addressing along a triangular-number probe sequence.
pub type QuadraticHashSet<T, S = RandomState> =
    HashSet<T, OpenTable<T, QuadraticProbe>, TwiceResizePolicy, S>;

/// Open addressing with a hash-derived step over prime capacities.
pub type CongruentHashSet<T, S = RandomState> =
    HashSet<T, OpenTable<T, CongruentProbe>, TwiceResizePolicy, S>;

/// Separate chaining.
pub type ChainedHashSet<T, S = RandomState> =
    HashSet<T, ChainedTable<T>, TwiceResizePolicy, S>;

/// A hash set storing its elements in a `C: CollisionStrategy`, resized by
/// `R` and hashed by `S`.
///
/// Single-threaded: nothing here synchronizes. `duplicate()` (and `Clone`)
/// copies the storage and shares the policy.
pub struct HashSet<T, C, R = TwiceResizePolicy, S = RandomState> {
    table: C,
    policy: Arc<R>,
    hasher: S,
    len: usize,
    generation: Generation,
    _marker: PhantomData<T>,
}

impl<T, C> HashSet<T, C>
where
    T: Eq + Hash,
    C: CollisionStrategy<T> + Default,
{
    pub fn new() -> Self {
        Self::with_policy(TwiceResizePolicy::default())
    }
}

impl<T, C, R> HashSet<T, C, R>
where
    T: Eq + Hash,
    C: CollisionStrategy<T> + Default,
    R: ResizePolicy,
{
    pub fn with_policy(policy: R) -> Self {
        Self::from_parts(C::default(), Arc::new(policy), RandomState::new())
    }
}

impl<T, C, R, S> HashSet<T, C, R, S>
where
    T: Eq + Hash,
    C: CollisionStrategy<T>,
    R: ResizePolicy,
    S: BuildHasher,
{
    /// Builds an empty set, sizing `table` from the policy's initial capacity.
    pub fn from_parts(mut table: C, policy: Arc<R>, hasher: S) -> Self {
        let capacity = table.admissible_capacity(policy.initial_capacity());
        table.reset(capacity);
        Self {
            table,
            policy,
            hasher,
            len: 0,
            generation: Generation::new(),
            _marker: PhantomData,
        }
    }

    pub fn with_hasher(hasher: S) -> Self
    where
        C: Default,
        R: Default,
    {
        Self::from_parts(C::default(), Arc::new(R::default()), hasher)
    }

    pub fn with_policy_and_hasher(policy: R, hasher: S) -> Self
    where
        C: Default,
    {
        Self::from_parts(C::default(), Arc::new(policy), hasher)
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current number of slots or buckets.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn policy(&self) -> &Arc<R> {
        &self.policy
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// The underlying storage, for inspection.
    pub fn strategy(&self) -> &C {
        &self.table
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    fn find<Q>(&self, value: &Q) -> Option<C::Position>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(value);
        self.table.find(hash, |v| v.borrow() == value)
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(value).is_some()
    }

    /// The stored element equal to `value`.
    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(value).map(|p| self.table.get(p))
    }

    /// Adds `value`; `Ok(false)` if an equal element is already present.
    ///
    /// Grows the table first when the policy finds the prospective size too
    /// dense, or when the probe for `value` runs too long.
    pub fn try_insert(&mut self, value: T) -> Result<bool> {
        let hash = self.make_hash(&value);
        let mut value = value;
        loop {
            if self.policy.test_loaded_size(self.len + 1, self.table.capacity()) {
                // An element already present needs no room.
                if self.table.find(hash, |v| *v == value).is_some() {
                    return Ok(false);
                }
                self.grow()?;
                continue;
            }
            match self.table.place(hash, value, &*self.policy) {
                Placement::Inserted => {
                    self.len += 1;
                    self.generation.bump();
                    return Ok(true);
                }
                Placement::Present(_) => return Ok(false),
                Placement::Grow(v) => {
                    // The search may stop short of an equal element placed
                    // deep by a rehash.
                    if self.table.find(hash, |x| *x == v).is_some() {
                        return Ok(false);
                    }
                    value = v;
                    self.grow()?;
                }
            }
        }
    }

    /// Adds `value`; `false` if an equal element is already present.
    ///
    /// # Panics
    ///
    /// Panics if the table needs to grow and cannot; see `try_insert`.
    pub fn insert(&mut self, value: T) -> bool {
        match self.try_insert(value) {
            Ok(added) => added,
            Err(e) => panic!("{e}"),
        }
    }

    fn grow(&mut self) -> Result<()> {
        let current = self.table.capacity();
        let next = self
            .table
            .admissible_capacity(self.policy.next_capacity(current));
        if next <= current {
            log::warn!("cannot grow past {current} slots with {} elements", self.len);
            return Err(SetError::CapacityExhausted { capacity: current });
        }
        if !self.table.rehash(next) {
            log::warn!("rehash from {current} to {next} slots failed; keeping the old table");
            return Err(SetError::RehashFailed { capacity: next });
        }
        self.generation.bump();
        log::debug!("rehashed {} elements: {current} -> {next} slots", self.len);
        Ok(())
    }

    fn take_at(&mut self, position: C::Position) -> (T, Option<C::Position>) {
        let taken = self.table.take(position);
        self.len -= 1;
        self.generation.bump();
        taken
    }

    /// Removes the element equal to `value`; `false` if there is none.
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.take(value).is_some()
    }

    /// Removes and returns the element equal to `value`.
    pub fn take<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let position = self.find(value)?;
        Some(self.take_at(position).0)
    }

    /// Removes every element, keeping the current capacity.
    pub fn clear(&mut self) {
        let capacity = self.table.capacity();
        self.table.reset(capacity);
        self.len = 0;
        self.generation.bump();
    }

    pub fn iter(&self) -> Iter<'_, T, C> {
        Iter {
            table: &self.table,
            next: self.table.first(),
            remaining: self.len,
            _marker: PhantomData,
        }
    }

    /// A detached cursor positioned before the first element.
    pub fn cursor(&self) -> Cursor<C::Position> {
        Cursor {
            next: self.table.first(),
            current: None,
            generation: self.generation,
        }
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    /// The first element in iteration order.
    pub fn first(&self) -> Option<&T> {
        self.table.first().map(|p| self.table.get(p))
    }

    /// Without `rng`, the first element. With `rng`, an element chosen
    /// uniformly by reservoir sampling over one pass.
    pub fn get_arbitrary<G: Rng>(&self, rng: Option<&mut G>) -> Option<&T> {
        self.arbitrary_position(rng).map(|p| self.table.get(p))
    }

    /// Removes and returns the element `get_arbitrary` would choose.
    pub fn remove_arbitrary<G: Rng>(&mut self, rng: Option<&mut G>) -> Option<T> {
        let position = self.arbitrary_position(rng)?;
        Some(self.take_at(position).0)
    }

    fn arbitrary_position<G: Rng>(&self, rng: Option<&mut G>) -> Option<C::Position> {
        let first = self.table.first()?;
        let Some(rng) = rng else {
            return Some(first);
        };
        // The k-th element replaces the selection with probability 1/k.
        let mut selected = first;
        let mut seen = 1u64;
        let mut cursor = self.table.successor(first);
        while let Some(p) = cursor {
            seen += 1;
            if rng.random_range(0..seen) == 0 {
                selected = p;
            }
            cursor = self.table.successor(p);
        }
        Some(selected)
    }

    /// Inserts every value; true if any was new.
    pub fn add_all<I>(&mut self, values: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        values
            .into_iter()
            .fold(false, |changed, v| self.insert(v) | changed)
    }

    /// Removes every value; true if any was present.
    pub fn remove_all<'q, Q, I>(&mut self, values: I) -> bool
    where
        I: IntoIterator<Item = &'q Q>,
        T: Borrow<Q>,
        Q: 'q + ?Sized + Hash + Eq,
    {
        values
            .into_iter()
            .fold(false, |changed, v| self.remove(v) | changed)
    }

    pub fn contains_all<'q, Q, I>(&self, values: I) -> bool
    where
        I: IntoIterator<Item = &'q Q>,
        T: Borrow<Q>,
        Q: 'q + ?Sized + Hash + Eq,
    {
        values.into_iter().all(|v| self.contains(v))
    }

    /// Keeps only the elements for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        let mut cursor = self.table.first();
        while let Some(p) = cursor {
            cursor = if keep(self.table.get(p)) {
                self.table.successor(p)
            } else {
                self.take_at(p).1
            };
        }
    }

    /// Keeps only the elements also found in `values`; true if any was removed.
    pub fn retain_all<'q, I>(&mut self, values: I) -> bool
    where
        I: IntoIterator<Item = &'q T>,
        T: 'q,
    {
        let keep: hashbrown::HashSet<&T> = values.into_iter().collect();
        let before = self.len;
        self.retain(|v| keep.contains(v));
        before != self.len
    }

    /// An independent copy: own storage, shared policy.
    pub fn duplicate(&self) -> Self
    where
        C: Clone,
        S: Clone,
    {
        Self {
            table: self.table.clone(),
            policy: Arc::clone(&self.policy),
            hasher: self.hasher.clone(),
            len: self.len,
            generation: Generation::new(),
            _marker: PhantomData,
        }
    }

    /// Streams every structural violation to `report`. Never panics.
    ///
    /// Checks that each element is reachable along its own probe path, that
    /// no two stored elements are equal, and that the number of distinct
    /// elements matches `len()`.
    pub fn check_health<V>(&self, mut report: V)
    where
        V: FnMut(Violation),
    {
        self.table
            .check_placement(|v| self.make_hash(v), &mut report);

        let mut seen: hashbrown::HashSet<&T> = hashbrown::HashSet::with_capacity(self.len);
        let mut counted = 0;
        let mut cursor = self.table.first();
        while let Some(p) = cursor {
            if seen.insert(self.table.get(p)) {
                counted += 1;
            } else {
                report(Violation::Duplicate {
                    slot: self.table.slot_of(p),
                });
            }
            cursor = self.table.successor(p);
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

/// Borrowing iterator over a `HashSet`, in storage order.
pub struct Iter<'a, T, C: CollisionStrategy<T>> {
    table: &'a C,
    next: Option<C::Position>,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T, C: CollisionStrategy<T>> Iterator for Iter<'a, T, C> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        let position = self.next?;
        self.next = self.table.successor(position);
        self.remaining = self.remaining.saturating_sub(1);
        Some(self.table.get(position))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T, C: CollisionStrategy<T>> ExactSizeIterator for Iter<'a, T, C> {}

/// Fail-fast cursor over a `HashSet` that can remove the element it last
/// returned.
///
/// The cursor does not borrow the set; each call takes the set explicitly.
/// A structural change made other than through this cursor makes the next
/// call return `ConcurrentModification`. The check is best effort and only
/// meant to surface misuse.
#[derive(Clone, Debug)]
pub struct Cursor<P> {
    next: Option<P>,
    current: Option<P>,
    generation: Generation,
}

impl<P: Copy> Cursor<P> {
    /// Advances to the next element.
    pub fn next<'a, T, C, R, S>(&mut self, set: &'a HashSet<T, C, R, S>) -> Result<Option<&'a T>>
    where
        C: CollisionStrategy<T, Position = P>,
    {
        set.generation.ensure(self.generation)?;
        let Some(position) = self.next else {
            self.current = None;
            return Ok(None);
        };
        self.next = set.table.successor(position);
        self.current = Some(position);
        Ok(Some(set.table.get(position)))
    }

    /// Removes the element returned by the last `next`.
    pub fn remove<T, C, R, S>(&mut self, set: &mut HashSet<T, C, R, S>) -> Result<T>
    where
        C: CollisionStrategy<T, Position = P>,
    {
        set.generation.ensure(self.generation)?;
        let position = self.current.take().ok_or(SetError::NoCurrentElement)?;
        let (value, successor) = set.table.take(position);
        set.len -= 1;
        set.generation.bump();
        self.next = successor;
        self.generation = set.generation;
        Ok(value)
    }
}

impl<T, C, R, S> Clone for HashSet<T, C, R, S>
where
    T: Eq + Hash,
    C: CollisionStrategy<T> + Clone,
    R: ResizePolicy,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> Self {
        self.duplicate()
    }
}

impl<T, C, R, S> fmt::Debug for HashSet<T, C, R, S>
where
    T: fmt::Debug + Eq + Hash,
    C: CollisionStrategy<T>,
    R: ResizePolicy,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, C, R, S> PartialEq for HashSet<T, C, R, S>
where
    T: Eq + Hash,
    C: CollisionStrategy<T>,
    R: ResizePolicy,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|v| other.contains(v))
    }
}

impl<T, C, R, S> Eq for HashSet<T, C, R, S>
where
    T: Eq + Hash,
    C: CollisionStrategy<T>,
    R: ResizePolicy,
    S: BuildHasher,
{
}

impl<T, C, R, S> Default for HashSet<T, C, R, S>
where
    T: Eq + Hash,
    C: CollisionStrategy<T> + Default,
    R: ResizePolicy + Default,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::from_parts(C::default(), Arc::new(R::default()), S::default())
    }
}

impl<T, C, R, S> Extend<T> for HashSet<T, C, R, S>
where
    T: Eq + Hash,
    C: CollisionStrategy<T>,
    R: ResizePolicy,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for v in iter {
            self.insert(v);
        }
    }
}

impl<T, C, R, S> FromIterator<T> for HashSet<T, C, R, S>
where
    T: Eq + Hash,
    C: CollisionStrategy<T> + Default,
    R: ResizePolicy + Default,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<'a, T, C, R, S> IntoIterator for &'a HashSet<T, C, R, S>
where
    T: Eq + Hash,
    C: CollisionStrategy<T>,
    R: ResizePolicy,
    S: BuildHasher,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

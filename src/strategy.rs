//! The seam between the set driver and its storage.
//!
//! `HashSet` owns the bookkeeping every family shares (size, generation,
//! hasher, policy, health oracle). A `CollisionStrategy` owns the storage and
//! decides where an element lives. Hashes are computed once by the driver and
//! handed down; strategies never call `T: Hash`.

use crate::health::Violation;
use crate::policy::ResizePolicy;

/// Outcome of `CollisionStrategy::place`.
#[derive(Debug, PartialEq, Eq)]
pub enum Placement<T> {
    /// The element was stored.
    Inserted,
    /// An equal element is already stored; the argument is handed back.
    Present(T),
    /// The table must grow before the element can be stored; the argument is
    /// handed back for the retry.
    Grow(T),
}

/// Collision-resolution storage for elements of type `T`.
pub trait CollisionStrategy<T> {
    /// Location of a stored element. Valid until the next structural change
    /// other than `take` at that position.
    type Position: Copy + Eq + core::fmt::Debug;

    /// Smallest capacity `>= requested` this strategy can use.
    fn admissible_capacity(&self, requested: usize) -> usize;

    /// Number of slots (open addressing) or buckets (chaining).
    fn capacity(&self) -> usize;

    /// Drops every element and allocates `capacity` empty slots; `capacity`
    /// must be admissible.
    fn reset(&mut self, capacity: usize);

    fn find<F>(&self, hash: u64, eq: F) -> Option<Self::Position>
    where
        F: FnMut(&T) -> bool;

    /// Stores `value` unless an equal element exists or `policy` asks for a
    /// larger table first.
    fn place<R>(&mut self, hash: u64, value: T, policy: &R) -> Placement<T>
    where
        T: Eq,
        R: ResizePolicy + ?Sized;

    /// Rebuilds the storage at `capacity` (admissible, larger than the
    /// current one). On `false` nothing changed.
    fn rehash(&mut self, capacity: usize) -> bool;

    fn get(&self, position: Self::Position) -> &T;

    /// Removes the element at `position`, returning it and the position of
    /// the element that followed it in iteration order.
    fn take(&mut self, position: Self::Position) -> (T, Option<Self::Position>);

    fn first(&self) -> Option<Self::Position>;

    fn successor(&self, position: Self::Position) -> Option<Self::Position>;

    /// Slot or bucket index of `position`, as used in `Violation`s.
    fn slot_of(&self, position: Self::Position) -> usize;

    /// Reports every element that cannot be found where lookups search for
    /// it. `hash` recomputes an element's hash.
    fn check_placement<H, V>(&self, hash: H, report: &mut V)
    where
        H: Fn(&T) -> u64,
        V: FnMut(Violation);
}

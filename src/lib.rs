//! slot-hashset: single-threaded hash sets with pluggable collision
//! resolution, resize policies, fail-fast cursors and health checks.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one set driver, several storage families, each small enough to
//!   verify on its own.
//! - Layers:
//!   - Probe / ProbeSequence: index sequences for open addressing (linear,
//!     congruent with a hash-derived step, quadratic via a generator).
//!   - CollisionStrategy<T>: storage that decides where an element lives.
//!     OpenTable<T, P> covers the probing families; ChainedTable<T> keeps
//!     chains of nodes in a slotmap arena.
//!   - HashSet<T, C, R, S>: size, generation counter, hasher, resize
//!     policy and the health oracle shared by every family.
//!   - IntHashSet<P, R>: `i32` set over raw slots where two values are
//!     reserved as slot codes and tracked by flags instead.
//!
//! Constraints
//! - Single-threaded: no internal synchronization.
//! - Open-addressing removal leaves a tombstone; lookups pass over it and
//!   insertion reuses the first one on the probe path.
//! - Capacities are chosen by the strategy: prime for congruent probing,
//!   a power of two for triangular quadratic probing.
//! - A failed rehash leaves the set exactly as it was.
//! - Any structural change bumps the generation; a `Cursor` that sees a
//!   different generation fails with `ConcurrentModification`.
//!
//! Hasher and rehashing invariants
//! - Each slot or node stores the `u64` hash computed at insertion, and
//!   rehashing uses the stored hash only. The health check recomputes the
//!   hash to detect elements mutated after insertion.
//!
//! Notes and non-goals
//! - No concurrent access, no persistence.
//! - `duplicate()` copies storage and shares the policy `Arc`.

pub mod chained_table;
pub mod error;
pub mod generation;
pub mod hash_set;
mod hash_set_proptest;
pub mod health;
pub mod int_hash_set;
pub mod open_table;
pub mod policy;
pub mod probe;
mod slot;
pub mod strategy;

// Public surface
pub use chained_table::ChainedTable;
pub use error::{Result, SetError};
pub use generation::Generation;
pub use hash_set::{
    ChainedHashSet, CongruentHashSet, Cursor, HashSet, Iter, LinearHashSet, QuadraticHashSet,
};
pub use health::Violation;
pub use int_hash_set::{
    IntChainedHashSet, IntCongruentHashSet, IntCursor, IntHashSet, IntIter, IntLinearHashSet,
    IntPosition, IntQuadraticHashSet, PositiveHashBuilder,
};
pub use open_table::OpenTable;
pub use policy::{ResizePolicy, TwiceResizePolicy};
pub use probe::{CongruentProbe, LinearProbe, Probe, ProbeSequence, QuadraticProbe, TriangularSequence};
pub use slot::{positive_hash, EMPTY_MARK, REMOVED_MARK};
pub use strategy::{CollisionStrategy, Placement};

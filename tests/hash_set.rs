// HashSet integration suite.
//
// Each test documents what behavior is being verified. The core invariants
// exercised across every collision family:
// - Uniqueness: inserting an equal element reports `false` and changes nothing.
// - Duplicate independence: a duplicated set shares no storage with its source.
// - Fail-fast cursors: only the cursor's own removals keep it valid.
// - Health: a set reports no violations unless an element hash drifts.
use slot_hashset::{
    ChainedHashSet, CollisionStrategy, CongruentHashSet, HashSet, LinearHashSet, LinearProbe,
    OpenTable, PositiveHashBuilder, QuadraticHashSet, ResizePolicy, SetError, TwiceResizePolicy,
    Violation,
};
use std::cell::Cell;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

fn words(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("w{i:04}")).collect()
}

fn exercise<C: CollisionStrategy<String>>(mut s: HashSet<String, C>) {
    let items = words(500);
    for w in &items {
        assert!(s.insert(w.clone()));
    }
    for w in &items {
        assert!(!s.insert(w.clone()));
        assert!(s.contains(w.as_str()));
    }
    assert_eq!(s.len(), items.len());
    assert!(s.health_violations().is_empty());

    for w in items.iter().step_by(2) {
        assert!(s.remove(w.as_str()));
    }
    assert_eq!(s.len(), 250);
    for (i, w) in items.iter().enumerate() {
        assert_eq!(s.contains(w.as_str()), i % 2 == 1);
    }
    assert!(!s.remove("absent"));
    assert!(s.health_violations().is_empty());

    let got: BTreeSet<String> = s.iter().cloned().collect();
    let want: BTreeSet<String> = items.iter().skip(1).step_by(2).cloned().collect();
    assert_eq!(got, want);
}

// Test: the same scenario passes for each family.
// Verifies: insert, contains, remove and iteration agree across growth.
#[test]
fn every_family_behaves_as_a_set() {
    exercise(LinearHashSet::<String>::new());
    exercise(QuadraticHashSet::<String>::new());
    exercise(CongruentHashSet::<String>::new());
    exercise(ChainedHashSet::<String>::new());
}

// Test: duplicate independence.
// Verifies: mutating either copy leaves the other unchanged, and both stay healthy.
#[test]
fn duplicate_is_independent() {
    let mut a: CongruentHashSet<u32> = (0..100).collect();
    let mut b = a.duplicate();
    assert_eq!(a, b);

    assert!(a.remove(&5));
    assert!(b.insert(1000));
    assert!(b.contains(&5));
    assert!(!a.contains(&1000));
    assert_eq!(a.len(), 99);
    assert_eq!(b.len(), 101);

    b.clear();
    assert_eq!(a.len(), 99);
    assert!(a.health_violations().is_empty());
    assert!(b.health_violations().is_empty());
    assert!(std::sync::Arc::ptr_eq(a.policy(), b.policy()));
}

// Test: cursor removal during a full walk.
// Verifies: every element is visited once, removals through the cursor do not
// invalidate it, and afterwards only the kept elements remain.
#[test]
fn cursor_removes_while_walking() {
    fn walk<C: CollisionStrategy<u32>>(mut s: HashSet<u32, C>) {
        s.extend(0..200);
        let mut cursor = s.cursor();
        let mut visited = 0;
        while let Some(&v) = cursor.next(&s).expect("no outside modification") {
            visited += 1;
            if v % 3 == 0 {
                assert_eq!(cursor.remove(&mut s), Ok(v));
            }
        }
        assert_eq!(visited, 200);
        assert_eq!(s.len(), 200 - 67);
        assert!(s.iter().all(|v| v % 3 != 0));
        assert!(s.health_violations().is_empty());
    }
    walk(LinearHashSet::<u32>::new());
    walk(QuadraticHashSet::<u32>::new());
    walk(CongruentHashSet::<u32>::new());
    walk(ChainedHashSet::<u32>::new());
}

// Test: fail-fast detection.
// Verifies: a modification made outside the cursor fails its next call, and
// removing twice without advancing is rejected.
#[test]
fn cursor_fails_fast() {
    let mut s: ChainedHashSet<u32> = (0..10).collect();
    let mut cursor = s.cursor();
    assert!(cursor.next(&s).unwrap().is_some());
    cursor.remove(&mut s).unwrap();
    assert_eq!(cursor.remove(&mut s), Err(SetError::NoCurrentElement));

    s.insert(99);
    assert_eq!(cursor.next(&s), Err(SetError::ConcurrentModification));

    // A failed insert changes nothing and does not invalidate.
    let mut cursor = s.cursor();
    assert!(!s.insert(99));
    assert!(cursor.next(&s).is_ok());
}

// Test: capacity exhaustion.
// Verifies: `try_insert` reports the ceiling and leaves the set usable.
#[test]
fn exhaustion_keeps_the_set_usable() {
    let policy = TwiceResizePolicy::new()
        .with_initial_capacity(8)
        .with_max_capacity(8);
    let mut s: LinearHashSet<u32> = HashSet::with_policy(policy);
    let mut inserted = 0;
    let err = loop {
        match s.try_insert(inserted) {
            Ok(true) => inserted += 1,
            Ok(false) => unreachable!("all values are fresh"),
            Err(e) => break e,
        }
    };
    assert_eq!(err, SetError::CapacityExhausted { capacity: 8 });
    assert_eq!(s.len() as u32, inserted);
    assert!(s.remove(&0));
    assert!(s.try_insert(0).unwrap());
    assert!(s.health_violations().is_empty());
}

#[derive(Debug)]
struct Drifting(Rc<Cell<u32>>);

impl PartialEq for Drifting {
    fn eq(&self, other: &Self) -> bool {
        self.0.get() == other.0.get()
    }
}
impl Eq for Drifting {}
impl Hash for Drifting {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.get().hash(state);
    }
}

// Test: health check after an element is mutated in place.
// Verifies: the drift is reported instead of silently ignored.
#[test]
fn mutated_element_is_reported() {
    let mut s: LinearHashSet<Drifting> = LinearHashSet::new();
    let cell = Rc::new(Cell::new(7));
    s.insert(Drifting(Rc::clone(&cell)));
    for i in 100..110 {
        s.insert(Drifting(Rc::new(Cell::new(i))));
    }
    assert!(s.health_violations().is_empty());

    cell.set(8);
    let violations = s.health_violations();
    assert!(violations
        .iter()
        .any(|v| matches!(v, Violation::HashDrift { .. })));
}

// Test: equal sets with different histories and families of one type compare equal.
#[test]
fn equality_ignores_layout() {
    let a: QuadraticHashSet<u32> = (0..64).collect();
    let mut b: QuadraticHashSet<u32> = (0..128).collect();
    b.retain(|v| *v < 64);
    assert_eq!(a, b);
    assert_ne!(a.capacity(), b.capacity());
    assert!(b.insert(500));
    assert_ne!(a, b);
}

// Two table sizes, 8 then 16. At 16 every search gives up after the
// first occupied slot it meets, while a rehash still places elements deeper.
struct TightAtSixteen;

impl ResizePolicy for TightAtSixteen {
    fn initial_capacity(&self) -> usize {
        8
    }
    fn next_capacity(&self, current: usize) -> usize {
        current.saturating_mul(2).clamp(8, 16)
    }
    fn test_loaded_size(&self, size: usize, modulus: usize) -> bool {
        size > modulus / 4
    }
    fn test_link_length(&self, _probe_index: usize, modulus: usize) -> bool {
        modulus >= 16
    }
}

// Test: re-inserting a member that a rehash placed past the link limit.
// Assumes: 2 and 18 collide at slot 2 in both table sizes; inserting 5
// grows the table to its ceiling of 16.
// Verifies: the duplicate insert reports `Ok(false)` without growing,
// failing, or invalidating an open cursor.
#[test]
fn present_member_beyond_link_limit_is_not_reinserted() {
    let mut s: HashSet<i32, OpenTable<i32, LinearProbe>, TightAtSixteen, PositiveHashBuilder> =
        HashSet::with_policy_and_hasher(TightAtSixteen, PositiveHashBuilder);
    for v in [2, 18, 5] {
        assert_eq!(s.try_insert(v), Ok(true));
    }
    assert_eq!(s.capacity(), 16);

    let mut cursor = s.cursor();
    let generation = s.generation();
    assert_eq!(s.try_insert(18), Ok(false));
    assert!(!s.insert(18));
    assert_eq!(s.capacity(), 16);
    assert_eq!(s.len(), 3);
    assert_eq!(s.generation(), generation);
    assert!(cursor.next(&s).is_ok());

    // A genuinely new colliding value still reports the ceiling.
    assert_eq!(
        s.try_insert(34),
        Err(SetError::CapacityExhausted { capacity: 16 })
    );
    assert!(s.health_violations().is_empty());
}

// Test: a cursor from one set is rejected by another.
// Verifies: `WrongSet` even when the other set is a fresh duplicate.
#[test]
fn cursor_is_bound_to_its_set() {
    let a: LinearHashSet<u32> = (0..8).collect();
    let b = a.duplicate();
    let mut cursor = a.cursor();
    assert_eq!(cursor.next(&b), Err(SetError::WrongSet));
    assert!(cursor.next(&a).unwrap().is_some());
}

#![cfg(test)]

// Property tests for every set family kept inside the crate so they can
// reach strategy internals without feature gates.

use crate::hash_set::{ChainedHashSet, CongruentHashSet, HashSet, LinearHashSet, QuadraticHashSet};
use crate::int_hash_set::{
    IntChainedHashSet, IntCongruentHashSet, IntHashSet, IntLinearHashSet, IntQuadraticHashSet,
};
use crate::policy::{ResizePolicy, TwiceResizePolicy};
use crate::probe::Probe;
use crate::strategy::CollisionStrategy;
use crate::{ChainedTable, OpenTable};
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::{BTreeSet, HashSet as StdHashSet};
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// elements, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize),
    Remove(usize),
    Take(usize),
    Contains(usize),
    CursorRemove(usize),
    RemoveArbitrary(u64),
    Iterate,
    Clear,
}

fn arb_ops(pool_len: usize) -> impl Strategy<Value = Vec<Op>> {
    let idx = 0..pool_len;
    let op = prop_oneof![
        4 => idx.clone().prop_map(Op::Insert),
        2 => idx.clone().prop_map(Op::Remove),
        1 => idx.clone().prop_map(Op::Take),
        2 => idx.clone().prop_map(Op::Contains),
        1 => idx.prop_map(Op::CursorRemove),
        1 => any::<u64>().prop_map(Op::RemoveArbitrary),
        1 => Just(Op::Iterate),
        1 => Just(Op::Clear),
    ];
    proptest::collection::vec(op, 1..80)
}

fn arb_strings() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=12)
        .prop_flat_map(|pool| (Just(pool.clone()), arb_ops(pool.len())))
}

fn arb_ints() -> impl Strategy<Value = (Vec<i32>, Vec<Op>)> {
    let value = prop_oneof![Just(0), Just(1), -40i32..40, any::<i32>()];
    proptest::collection::vec(value, 1..=24)
        .prop_flat_map(|pool| (Just(pool.clone()), arb_ops(pool.len())))
}

// Property: state-machine equivalence against std::collections::HashSet.
// Checked after every op:
// - `insert`/`remove`/`take`/`contains` agree with the model.
// - Cursor removal deletes exactly the element it stands on.
// - `iter` yields each member exactly once.
// - `len` parity, and the health check reports nothing.
fn run_generic<C, S>(
    mut sut: HashSet<String, C, TwiceResizePolicy, S>,
    pool: &[String],
    ops: &[Op],
) -> Result<(), TestCaseError>
where
    C: CollisionStrategy<String>,
    S: BuildHasher,
{
    let mut model: StdHashSet<String> = StdHashSet::new();
    for op in ops {
        match op {
            Op::Insert(i) => {
                let k = &pool[*i];
                prop_assert_eq!(sut.insert(k.clone()), model.insert(k.clone()));
            }
            Op::Remove(i) => {
                let k = pool[*i].as_str();
                prop_assert_eq!(sut.remove(k), model.remove(k));
            }
            Op::Take(i) => {
                let k = pool[*i].as_str();
                prop_assert_eq!(sut.take(k), model.take(k));
            }
            Op::Contains(i) => {
                let k = pool[*i].as_str();
                prop_assert_eq!(sut.contains(k), model.contains(k));
                prop_assert_eq!(sut.get(k).is_some(), model.contains(k));
            }
            Op::CursorRemove(i) => {
                let k = pool[*i].as_str();
                let mut cursor = sut.cursor();
                let mut removed = None;
                let mut visited = 0;
                while let Some(v) = cursor.next(&sut).unwrap() {
                    visited += 1;
                    if v.as_str() == k {
                        removed = Some(cursor.remove(&mut sut).unwrap());
                    }
                }
                prop_assert_eq!(visited, model.len());
                prop_assert_eq!(removed, model.take(k));
            }
            Op::RemoveArbitrary(seed) => {
                let mut rng = SmallRng::seed_from_u64(*seed);
                match sut.remove_arbitrary(Some(&mut rng)) {
                    Some(v) => prop_assert!(model.remove(&v), "removed a non-member"),
                    None => prop_assert!(model.is_empty()),
                }
            }
            Op::Iterate => {
                let items = sut.to_vec();
                let unique: BTreeSet<_> = items.iter().cloned().collect();
                prop_assert_eq!(unique.len(), items.len(), "iteration repeated an element");
                let want: BTreeSet<_> = model.iter().cloned().collect();
                prop_assert_eq!(unique, want);
                prop_assert_eq!(sut.iter().len(), model.len());
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        let violations = sut.health_violations();
        prop_assert!(violations.is_empty(), "after {:?}: {:?}", op, violations);
    }
    Ok(())
}

fn run_int<P, R>(mut sut: IntHashSet<P, R>, pool: &[i32], ops: &[Op]) -> Result<(), TestCaseError>
where
    P: Probe,
    R: ResizePolicy,
{
    let mut model: StdHashSet<i32> = StdHashSet::new();
    for op in ops {
        match op {
            Op::Insert(i) => prop_assert_eq!(sut.insert(pool[*i]), model.insert(pool[*i])),
            Op::Remove(i) | Op::Take(i) => {
                prop_assert_eq!(sut.remove(pool[*i]), model.remove(&pool[*i]))
            }
            Op::Contains(i) => prop_assert_eq!(sut.contains(pool[*i]), model.contains(&pool[*i])),
            Op::CursorRemove(i) => {
                let k = pool[*i];
                let mut cursor = sut.cursor();
                let mut removed = None;
                while let Some(v) = cursor.next(&sut).unwrap() {
                    if v == k {
                        removed = Some(cursor.remove(&mut sut).unwrap());
                    }
                }
                prop_assert_eq!(removed, model.take(&k));
            }
            Op::RemoveArbitrary(seed) => {
                let mut rng = SmallRng::seed_from_u64(*seed);
                match sut.remove_arbitrary(Some(&mut rng)) {
                    Some(v) => prop_assert!(model.remove(&v), "removed a non-member"),
                    None => prop_assert!(model.is_empty()),
                }
            }
            Op::Iterate => {
                let items = sut.to_vec();
                let unique: BTreeSet<_> = items.iter().copied().collect();
                prop_assert_eq!(unique.len(), items.len(), "iteration repeated an element");
                prop_assert_eq!(unique, model.iter().copied().collect::<BTreeSet<_>>());
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        let violations = sut.health_violations();
        prop_assert!(violations.is_empty(), "after {:?}: {:?}", op, violations);
    }
    Ok(())
}

// A tiny initial table makes growth happen inside short op sequences.
fn small_policy() -> TwiceResizePolicy {
    TwiceResizePolicy::new().with_initial_capacity(2)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_linear((pool, ops) in arb_strings()) {
        let sut: LinearHashSet<String> = HashSet::with_policy(small_policy());
        run_generic(sut, &pool, &ops)?;
    }

    #[test]
    fn prop_quadratic((pool, ops) in arb_strings()) {
        let sut: QuadraticHashSet<String> = HashSet::with_policy(small_policy());
        run_generic(sut, &pool, &ops)?;
    }

    #[test]
    fn prop_congruent((pool, ops) in arb_strings()) {
        let sut: CongruentHashSet<String> = HashSet::with_policy(small_policy());
        run_generic(sut, &pool, &ops)?;
    }

    #[test]
    fn prop_chained((pool, ops) in arb_strings()) {
        let sut: ChainedHashSet<String> = HashSet::with_policy(small_policy());
        run_generic(sut, &pool, &ops)?;
    }

    #[test]
    fn prop_int_families((pool, ops) in arb_ints()) {
        let linear: IntLinearHashSet = IntHashSet::with_policy(small_policy());
        run_int(linear, &pool, &ops)?;
        let quadratic: IntQuadraticHashSet = IntHashSet::with_policy(small_policy());
        run_int(quadratic, &pool, &ops)?;
        let congruent: IntCongruentHashSet = IntHashSet::with_policy(small_policy());
        run_int(congruent, &pool, &ops)?;
    }

    #[test]
    fn prop_int_chained_matches_std((pool, ops) in arb_ints()) {
        let mut sut = IntChainedHashSet::new();
        let mut model = StdHashSet::new();
        for op in &ops {
            match op {
                Op::Insert(i) => prop_assert_eq!(sut.insert(pool[*i]), model.insert(pool[*i])),
                Op::Remove(i) | Op::Take(i) => {
                    prop_assert_eq!(sut.remove(&pool[*i]), model.remove(&pool[*i]))
                }
                _ => prop_assert_eq!(sut.contains(&pool[0]), model.contains(&pool[0])),
            }
            prop_assert_eq!(sut.len(), model.len());
            prop_assert!(sut.health_violations().is_empty());
        }
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

fn collide<C: CollisionStrategy<String> + Default>() -> HashSet<String, C, TwiceResizePolicy, ConstBuildHasher> {
    HashSet::with_policy_and_hasher(small_policy(), ConstBuildHasher)
}

// Property: same state-machine invariants under worst-case collisions. Every
// element shares one probe path or one chain.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_strings()) {
        run_generic(collide::<OpenTable<String, crate::LinearProbe>>(), &pool, &ops)?;
        run_generic(collide::<OpenTable<String, crate::QuadraticProbe>>(), &pool, &ops)?;
        run_generic(collide::<OpenTable<String, crate::CongruentProbe>>(), &pool, &ops)?;
        run_generic(collide::<ChainedTable<String>>(), &pool, &ops)?;
    }
}

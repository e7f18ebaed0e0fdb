#![cfg(test)]

// Property tests for ChainedTable kept inside the crate so they can check
// chain invariants through crate-private accessors.

use crate::chained_table::{ChainedTable, Handle};
use crate::mix::hash_bytes;
use crate::policy::EntryPolicy;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
struct Rec {
    key: String,
    val: i32,
}

/// Hashes and compares `key` only; records released values.
struct ModelPolicy {
    collide: bool,
    released: Rc<RefCell<Vec<(String, i32)>>>,
}

impl EntryPolicy<Rec> for ModelPolicy {
    fn hash(&self, entry: &Rec) -> u32 {
        if self.collide {
            0
        } else {
            hash_bytes(entry.key.as_bytes())
        }
    }

    fn equal(&self, a: &Rec, b: &Rec) -> bool {
        a.key == b.key
    }

    fn release(&self, entry: Rec) {
        self.released.borrow_mut().push((entry.key, entry.val));
    }
}

// Pool-indexed operations so shrinking moves toward earlier keys and
// shorter op lists.
#[derive(Clone, Debug)]
enum Op {
    Set(usize, i32),
    Replace(usize, i32),
    Delete(usize),
    Remove(usize),
    Get(usize),
    Reserve(usize),
    Clear,
    Iterate,
}

fn query(pool: &[String], i: usize) -> Rec {
    Rec {
        key: pool[i].clone(),
        val: 0,
    }
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Set(i, v)),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Replace(i, v)),
            2 => idx.clone().prop_map(Op::Delete),
            1 => idx.clone().prop_map(Op::Remove),
            2 => idx.clone().prop_map(Op::Get),
            1 => (0usize..64).prop_map(Op::Reserve),
            1 => Just(Op::Clear),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

// State-machine equivalence against std::collections::HashMap:
// - equal keys replace; the displaced value is released exactly once
//   (set/delete/clear) or handed back unreleased (replace/remove);
// - get/delete/remove agree with the model; absent keys change nothing;
// - iter yields each live entry once; stale handles never resolve;
// - chain invariants and len parity hold after every op, and the bucket
//   count never shrinks.
fn run(collide: bool, pool: Vec<String>, ops: Vec<Op>) -> Result<(), TestCaseError> {
    let released = Rc::new(RefCell::new(Vec::new()));
    let mut sut: ChainedTable<Rec, ModelPolicy> = ChainedTable::with_policy(ModelPolicy {
        collide,
        released: released.clone(),
    });
    let mut model: HashMap<String, i32> = HashMap::new();
    let mut live: HashMap<String, Handle> = HashMap::new();
    let mut stale: Vec<Handle> = Vec::new();
    let mut expect_released: Vec<(String, i32)> = Vec::new();
    let mut capacity = sut.capacity();

    for op in ops {
        match op {
            Op::Set(i, v) => {
                let key = pool[i].clone();
                let h = sut.set(Rec { key: key.clone(), val: v });
                if let Some(old) = model.insert(key.clone(), v) {
                    expect_released.push((key.clone(), old));
                }
                if let Some(prev) = live.insert(key, h) {
                    stale.push(prev);
                }
            }
            Op::Replace(i, v) => {
                let key = pool[i].clone();
                let (h, old) = sut.replace(Rec { key: key.clone(), val: v });
                let model_old = model.insert(key.clone(), v);
                prop_assert_eq!(old.map(|r| r.val), model_old);
                if let Some(prev) = live.insert(key, h) {
                    stale.push(prev);
                }
            }
            Op::Delete(i) => {
                let q = query(&pool, i);
                let found = sut.delete(&q);
                let model_old = model.remove(&q.key);
                prop_assert_eq!(found, model_old.is_some());
                if let Some(old) = model_old {
                    expect_released.push((q.key.clone(), old));
                    stale.extend(live.remove(&q.key));
                }
            }
            Op::Remove(i) => {
                let q = query(&pool, i);
                let got = sut.remove(&q);
                let model_old = model.remove(&q.key);
                prop_assert_eq!(got.as_ref().map(|r| r.val), model_old);
                if let Some(r) = got {
                    prop_assert_eq!(&r.key, &q.key);
                    stale.extend(live.remove(&q.key));
                }
            }
            Op::Get(i) => {
                let q = query(&pool, i);
                let got = sut.get(&q).map(|r| r.val);
                prop_assert_eq!(got, model.get(&q.key).copied());
                let found = sut.find(&q);
                prop_assert_eq!(found, live.get(&q.key).copied());
            }
            Op::Reserve(n) => {
                sut.reserve(n);
                let ceiling = crate::primes::PRIMES[crate::primes::LAST_TIER];
                prop_assert!(sut.capacity() >= (sut.len() + n).min(ceiling));
            }
            Op::Clear => {
                sut.clear();
                for (k, v) in model.drain() {
                    expect_released.push((k, v));
                }
                stale.extend(live.drain().map(|(_, h)| h));
            }
            Op::Iterate => {
                let seen: BTreeSet<(String, i32)> =
                    sut.iter().map(|(_, r)| (r.key.clone(), r.val)).collect();
                let want: BTreeSet<(String, i32)> =
                    model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(seen, want);
                prop_assert_eq!(sut.iter().count(), model.len());
            }
        }

        sut.check_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.capacity() >= capacity, "bucket count shrank");
        capacity = sut.capacity();
        for h in &stale {
            prop_assert!(h.entry(&sut).is_none());
        }
        for (k, h) in &live {
            prop_assert_eq!(h.entry(&sut).map(|r| &r.key), Some(k));
        }
        let mut got = released.borrow().clone();
        let mut want = expect_released.clone();
        got.sort();
        want.sort();
        prop_assert_eq!(got, want);
    }

    // Teardown releases what is left, once each.
    drop(sut);
    expect_released.extend(model);
    let mut got = released.borrow().clone();
    got.sort();
    expect_released.sort();
    prop_assert_eq!(got, expect_released);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run(false, pool, ops)?;
    }

    // Same invariants with every entry in one chain, so only `equal`
    // tells keys apart.
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run(true, pool, ops)?;
    }

    // Any set of distinct keys: len counts them and all are retrievable
    // after however many rehashes they caused.
    #[test]
    fn prop_distinct_keys_survive_growth(keys in proptest::collection::hash_set(any::<u32>(), 0..600)) {
        let mut t = ChainedTable::with_policy(crate::FnPolicy::new(
            |k: &u32| crate::mix::hash32(*k),
            |a: &u32, b: &u32| a == b,
        ));
        for (n, k) in keys.iter().enumerate() {
            t.set(*k);
            prop_assert_eq!(t.len(), n + 1);
        }
        for k in &keys {
            prop_assert_eq!(t.get(k), Some(k));
        }
        t.check_invariants();
    }
}

//! End-to-end scenarios and randomized model tests.
//!
//! The model tests drive a `PackedDict` and a `BTreeMap` through the same
//! operation sequences (seeded RNG, reproducible) and require them to agree
//! after every step, together with the structural invariants: buffer length
//! a whole number of records, keys strictly ascending.

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use packdict::{intersection, merge, PackedDict};

fn key(x: u64) -> [u8; 8] {
    x.to_be_bytes()
}

/// Check the structural invariants that must hold after every operation.
fn assert_well_formed(d: &PackedDict) {
    assert_eq!(d.size_bytes() % d.block_size(), 0);
    let mut prev: Option<Vec<u8>> = None;
    for (k, _) in d.pairs() {
        assert_eq!(k.len(), d.key_size());
        if let Some(p) = &prev {
            assert!(p.as_slice() < k, "keys out of order");
        }
        prev = Some(k.to_vec());
    }
}

fn assert_matches_model(d: &PackedDict, model: &BTreeMap<u64, u8>) {
    assert_eq!(d.len(), model.len());
    for (&k, &v) in model {
        assert_eq!(d.get(&key(k)).unwrap(), Some(&[v][..]), "key {k}");
    }
    // Traversal order equals the model's ascending order.
    let dict_keys: Vec<u64> = d
        .pairs()
        .map(|(k, _)| u64::from_be_bytes(k.try_into().unwrap()))
        .collect();
    let model_keys: Vec<u64> = model.keys().copied().collect();
    assert_eq!(dict_keys, model_keys);
}

// ---------------------------------------------------------------------------
// Concrete scenarios
// ---------------------------------------------------------------------------

#[test]
fn scenario_overwrite() {
    let d = PackedDict::new(8, 1)
        .unwrap()
        .insert(&key(2), &[0x02])
        .unwrap()
        .insert(&key(2), &[0x04])
        .unwrap();
    assert_eq!(d.get(&key(2)).unwrap(), Some(&[0x04][..]));
    assert_eq!(d.len(), 1);
}

#[test]
fn scenario_ordered_build_exact_bytes() {
    let mut d = PackedDict::new(8, 1).unwrap();
    for (k, v) in [(2u64, 2u8), (4, 4), (1, 1), (3, 3)] {
        d = d.insert(&key(k), &[v]).unwrap();
    }
    let mut expected = Vec::new();
    for i in 1u64..=4 {
        expected.extend_from_slice(&key(i));
        expected.push(i as u8);
    }
    assert_eq!(d.as_bytes(), expected.as_slice());
}

#[test]
fn scenario_bulk_merge() {
    let k1 = key(1);
    let k10 = key(10);
    let k12 = key(12);
    let start = PackedDict::new(8, 1)
        .unwrap()
        .from_sorted_pairs(&[(&k1, &[1]), (&k10, &[10]), (&k12, &[12])])
        .unwrap();

    let k0 = key(0);
    let k5 = key(5);
    let k11 = key(11);
    let merged = start
        .bulk_insert(&[(&k0, &[0]), (&k5, &[5]), (&k10, &[11]), (&k11, &[11])])
        .unwrap();

    let keys: Vec<u64> = merged
        .pairs()
        .map(|(k, _)| u64::from_be_bytes(k.try_into().unwrap()))
        .collect();
    assert_eq!(keys, vec![0, 1, 5, 10, 11, 12]);
    assert_eq!(merged.get(&key(10)).unwrap(), Some(&[11][..]));
    assert_well_formed(&merged);
}

#[test]
fn scenario_snapshot_isolation_across_writes() {
    // Readers holding older snapshots keep seeing them unchanged while a
    // writer layers new versions on top.
    let v0 = PackedDict::new(8, 1).unwrap();
    let v1 = v0.insert(&key(1), &[1]).unwrap();
    let v2 = v1.insert(&key(2), &[2]).unwrap();
    let v3 = v2.remove(&key(1)).unwrap();

    assert_eq!(v0.len(), 0);
    assert_eq!(v1.len(), 1);
    assert_eq!(v2.len(), 2);
    assert_eq!(v3.len(), 1);
    assert_eq!(v2.get(&key(1)).unwrap(), Some(&[1][..]));
    assert_eq!(v3.get(&key(1)).unwrap(), None);
}

#[test]
fn scenario_cas_coordinated_writer() {
    // An external writer publishes snapshots and detects interleaving.
    let shared = PackedDict::new(8, 1).unwrap().insert(&key(1), &[1]).unwrap();

    // Writer A prepares an update against the observed value.
    let a = shared.compare_and_swap(&key(1), Some(&[1]), &[2]).unwrap();

    // Writer B still holds the old observation; against A's published
    // snapshot its expectation no longer matches.
    assert!(a.compare_and_swap(&key(1), Some(&[1]), &[3]).is_err());
    assert!(a.compare_and_swap(&key(1), Some(&[2]), &[3]).is_ok());
}

#[test]
fn scenario_serialize_reload_query() {
    let mut d = PackedDict::new(8, 4).unwrap();
    for i in 0..100u64 {
        d = d.insert(&key(i * 7), &(i as u32).to_be_bytes()).unwrap();
    }
    let blob = d.serialize();
    let reloaded = PackedDict::deserialize(&blob).unwrap();
    assert_eq!(reloaded, d);
    assert_eq!(
        reloaded.get(&key(7 * 99)).unwrap(),
        Some(&99u32.to_be_bytes()[..])
    );
    assert_well_formed(&reloaded);
}

// ---------------------------------------------------------------------------
// Randomized model tests
// ---------------------------------------------------------------------------

#[test]
fn random_ops_agree_with_btreemap() {
    let mut rng = SmallRng::seed_from_u64(42);
    let mut d = PackedDict::new(8, 1).unwrap();
    let mut model: BTreeMap<u64, u8> = BTreeMap::new();

    for _ in 0..2_000 {
        let k: u64 = rng.gen_range(0..500);
        let v: u8 = rng.gen();
        match rng.gen_range(0..5) {
            // insert
            0 | 1 => {
                d = d.insert(&key(k), &[v]).unwrap();
                model.insert(k, v);
            }
            // remove (only when present; absent removal is an error)
            2 => {
                if model.remove(&k).is_some() {
                    d = d.remove(&key(k)).unwrap();
                } else {
                    assert!(d.remove(&key(k)).is_err());
                }
            }
            // update
            3 => {
                d = d.update(&key(k), &[v], |old| vec![old[0].wrapping_add(1)]).unwrap();
                model
                    .entry(k)
                    .and_modify(|x| *x = x.wrapping_add(1))
                    .or_insert(v);
            }
            // lookup round
            _ => {
                assert_eq!(d.get(&key(k)).unwrap(), model.get(&k).map(std::slice::from_ref));
            }
        }
    }

    assert_well_formed(&d);
    assert_matches_model(&d, &model);
}

#[test]
fn random_neighbor_queries_agree_with_btreemap() {
    let mut rng = SmallRng::seed_from_u64(7);
    let mut d = PackedDict::new(8, 1).unwrap();
    let mut model: BTreeMap<u64, u8> = BTreeMap::new();
    for _ in 0..300 {
        let k: u64 = rng.gen_range(0..1_000);
        let v: u8 = rng.gen();
        d = d.insert(&key(k), &[v]).unwrap();
        model.insert(k, v);
    }

    for _ in 0..1_000 {
        let probe: u64 = rng.gen_range(0..1_100);
        let expected = model.range(probe + 1..).next();
        let got = d.next_after(&key(probe)).unwrap();
        match (expected, got) {
            (None, None) => {}
            (Some((&ek, &ev)), Some((gk, gv))) => {
                assert_eq!(gk, &key(ek));
                assert_eq!(gv, &[ev]);
            }
            other => panic!("next_after({probe}) mismatch: {other:?}"),
        }

        let n = rng.gen_range(1..5usize);
        let expected_nth = model.range(probe + 1..).nth(n - 1);
        let got_nth = d.nth_after(&key(probe), n).unwrap();
        assert_eq!(
            got_nth.map(|(k, _)| k.to_vec()),
            expected_nth.map(|(&k, _)| key(k).to_vec())
        );
    }
}

#[test]
fn random_bulk_insert_equals_insert_fold() {
    let mut rng = SmallRng::seed_from_u64(99);
    for round in 0..20 {
        let mut d = PackedDict::new(8, 1).unwrap();
        for _ in 0..rng.gen_range(0..50) {
            let k: u64 = rng.gen_range(0..200);
            d = d.insert(&key(k), &[rng.gen()]).unwrap();
        }

        // Sorted unique batch.
        let mut batch_model: BTreeMap<u64, u8> = BTreeMap::new();
        for _ in 0..rng.gen_range(1..40) {
            batch_model.insert(rng.gen_range(0..200), rng.gen());
        }
        let keys: Vec<[u8; 8]> = batch_model.keys().map(|&k| key(k)).collect();
        let values: Vec<u8> = batch_model.values().copied().collect();
        let refs: Vec<(&[u8], &[u8])> = keys
            .iter()
            .zip(values.iter())
            .map(|(k, v)| (&k[..], std::slice::from_ref(v)))
            .collect();

        let bulk = d.bulk_insert(&refs).unwrap();
        let mut folded = d.clone();
        for (k, v) in &refs {
            folded = folded.insert(k, v).unwrap();
        }
        assert_eq!(bulk, folded, "round {round}");
        assert_well_formed(&bulk);
    }
}

#[test]
fn random_merge_is_overlayed_union() {
    let mut rng = SmallRng::seed_from_u64(1234);
    for _ in 0..20 {
        let mut small_model = BTreeMap::new();
        let mut big_model = BTreeMap::new();
        let mut small = PackedDict::new(8, 1).unwrap();
        let mut big = PackedDict::new(8, 1).unwrap();
        for _ in 0..rng.gen_range(0..30) {
            let (k, v) = (rng.gen_range(0..100u64), rng.gen::<u8>());
            small = small.insert(&key(k), &[v]).unwrap();
            small_model.insert(k, v);
        }
        for _ in 0..rng.gen_range(0..60) {
            let (k, v) = (rng.gen_range(0..100u64), rng.gen::<u8>());
            big = big.insert(&key(k), &[v]).unwrap();
            big_model.insert(k, v);
        }

        let merged = merge(&small, &big).unwrap();
        let mut expected = big_model.clone();
        expected.extend(small_model.iter().map(|(&k, &v)| (k, v)));
        assert_well_formed(&merged);
        assert_matches_model(&merged, &expected);
    }
}

#[test]
fn random_intersection_matches_naive() {
    let mut rng = SmallRng::seed_from_u64(777);
    for _ in 0..20 {
        let input_count = rng.gen_range(2..5);
        let mut models: Vec<BTreeMap<u64, u8>> = Vec::new();
        let mut dicts: Vec<PackedDict> = Vec::new();
        for _ in 0..input_count {
            let mut model = BTreeMap::new();
            let mut d = PackedDict::new(8, 1).unwrap();
            for _ in 0..rng.gen_range(0..40) {
                let (k, v) = (rng.gen_range(0..60u64), rng.gen::<u8>());
                d = d.insert(&key(k), &[v]).unwrap();
                model.insert(k, v);
            }
            models.push(model);
            dicts.push(d);
        }

        let refs: Vec<&PackedDict> = dicts.iter().collect();
        let result = intersection(&refs).unwrap();
        assert_well_formed(&result);

        // Key set: present in every input.
        let mut common: Vec<u64> = models[0].keys().copied().collect();
        common.retain(|k| models[1..].iter().all(|m| m.contains_key(k)));
        let result_keys: Vec<u64> = result
            .pairs()
            .map(|(k, _)| u64::from_be_bytes(k.try_into().unwrap()))
            .collect();
        assert_eq!(result_keys, common);

        // Values: from the smallest input (stable tie-break on size).
        let smallest = dicts
            .iter()
            .enumerate()
            .min_by_key(|&(i, d)| (d.size_bytes(), i))
            .map(|(i, _)| i)
            .unwrap();
        for k in &common {
            assert_eq!(
                result.get(&key(*k)).unwrap(),
                Some(&[models[smallest][k]][..])
            );
        }
    }
}

#[test]
fn random_serialize_round_trip() {
    let mut rng = SmallRng::seed_from_u64(4242);
    for _ in 0..20 {
        let key_size = rng.gen_range(1..16);
        let value_size = rng.gen_range(1..16);
        let count = rng.gen_range(0..50);

        let mut model: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
        for _ in 0..count {
            let k: Vec<u8> = (0..key_size).map(|_| rng.gen()).collect();
            let v: Vec<u8> = (0..value_size).map(|_| rng.gen()).collect();
            model.insert(k, v);
        }

        let mut d = PackedDict::new(key_size, value_size).unwrap();
        for (k, v) in &model {
            d = d.insert(k, v).unwrap();
        }

        let reloaded = PackedDict::deserialize(&d.serialize()).unwrap();
        assert_eq!(reloaded, d);
        assert_well_formed(&reloaded);
    }
}

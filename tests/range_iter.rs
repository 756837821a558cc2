//! Range iteration behavior
//!
//! Bound handling for keys/values/entries ranges: the start bound is
//! always inclusive, the `inclusive` flag controls the end bound, and
//! bounds need not be present in the index.

use keytree::{Index, IndexConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;

fn ten_evens() -> Index {
    let mut index = Index::with_config(IndexConfig::new().with_order(4)).unwrap();
    for k in (0..20i64).step_by(2) {
        index.set(k, k * 100);
    }
    index
}

fn longs(iter: impl Iterator<Item = i64>) -> Vec<i64> {
    iter.collect()
}

fn range_keys(index: &Index, start: i64, end: i64, inclusive: bool) -> Vec<i64> {
    index
        .keys_range(start, end, inclusive)
        .map(|k| k.as_long().unwrap())
        .collect()
}

#[test]
fn inclusive_and_exclusive_end_bounds() {
    let index = ten_evens();
    assert_eq!(range_keys(&index, 4, 10, true), vec![4, 6, 8, 10]);
    assert_eq!(range_keys(&index, 4, 10, false), vec![4, 6, 8]);
}

#[test]
fn bounds_absent_from_index_clip_to_present_keys() {
    let index = ten_evens();
    // 5 and 11 are not stored; the range covers the keys between them.
    assert_eq!(range_keys(&index, 5, 11, true), vec![6, 8, 10]);
    assert_eq!(range_keys(&index, 5, 11, false), vec![6, 8, 10]);
}

#[test]
fn bounds_outside_key_space() {
    let index = ten_evens();
    assert_eq!(
        range_keys(&index, -100, 100, true),
        longs((0..20).step_by(2))
    );
    assert_eq!(range_keys(&index, 50, 100, true), Vec::<i64>::new());
    assert_eq!(range_keys(&index, -100, -50, true), Vec::<i64>::new());
}

#[test]
fn inverted_range_is_empty() {
    let index = ten_evens();
    assert_eq!(range_keys(&index, 10, 4, true), Vec::<i64>::new());
}

#[test]
fn single_key_range() {
    let index = ten_evens();
    assert_eq!(range_keys(&index, 8, 8, true), vec![8]);
    assert_eq!(range_keys(&index, 8, 8, false), Vec::<i64>::new());
}

#[test]
fn empty_index_yields_nothing() {
    let index = Index::new();
    assert_eq!(index.keys().count(), 0);
    assert_eq!(index.values().count(), 0);
    assert_eq!(index.entries().count(), 0);
    assert_eq!(index.keys_range(0i64, 100i64, true).count(), 0);
}

#[test]
fn full_iterators_cover_everything_in_order() {
    let mut index = Index::new();
    for k in [42i64, 7, 19, 3, 88, 61] {
        index.set(k, k);
    }
    let keys: Vec<i64> = index.keys().map(|k| k.as_long().unwrap()).collect();
    assert_eq!(keys, vec![3, 7, 19, 42, 61, 88]);
    let values: Vec<i64> = index.values().map(|v| v.as_long().unwrap()).collect();
    assert_eq!(values, keys, "one value per key, set to the key");
}

#[test]
fn values_range_flattens_multi_value_keys() {
    let mut index = Index::new();
    index.set(1i64, "a");
    index.set(2i64, "b1").set(2i64, "b2");
    index.set(3i64, "c");
    let values: Vec<&str> = index
        .values_range(1i64, 2i64, true)
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(values, vec!["a", "b1", "b2"]);
}

#[test]
fn entries_range_repeats_key_per_value() {
    let mut index = Index::new();
    index.set(2i64, "b1").set(2i64, "b2");
    index.set(5i64, "e");
    let entries: Vec<(i64, &str)> = index
        .entries_range(0i64, 10i64, true)
        .map(|(k, v)| (k.as_long().unwrap(), v.as_str().unwrap()))
        .collect();
    assert_eq!(entries, vec![(2, "b1"), (2, "b2"), (5, "e")]);
}

#[test]
fn get_range_is_the_values_range() {
    let index = ten_evens();
    let via_get: Vec<i64> = index
        .get_range(4i64, 8i64, true)
        .map(|v| v.as_long().unwrap())
        .collect();
    let via_values: Vec<i64> = index
        .values_range(4i64, 8i64, true)
        .map(|v| v.as_long().unwrap())
        .collect();
    assert_eq!(via_get, via_values);
    assert_eq!(via_get, vec![400, 600, 800]);
}

#[test]
fn for_each_range_passes_value_then_key() {
    let index = ten_evens();
    let mut seen = Vec::new();
    index.for_each_range(6i64, 10i64, false, |value, key| {
        seen.push((value.as_long().unwrap(), key.as_long().unwrap()));
    });
    assert_eq!(seen, vec![(600, 6), (800, 8)]);
}

#[test]
fn string_key_ranges() {
    let mut index = Index::new();
    for word in ["apple", "apricot", "banana", "cherry", "citrus", "date"] {
        index.set(word, 1i64);
    }
    let within: Vec<&str> = index
        .keys_range("ap", "b", false)
        .map(|k| k.as_str().unwrap())
        .collect();
    assert_eq!(within, vec!["apple", "apricot"]);
    let c_words: Vec<&str> = index
        .keys_range("c", "d", false)
        .map(|k| k.as_str().unwrap())
        .collect();
    assert_eq!(c_words, vec!["cherry", "citrus"]);
}

#[test]
fn range_spanning_many_leaves_stays_ascending() {
    let mut index = Index::new();
    for k in 0..500i64 {
        index.set(k, k);
    }
    let slice: Vec<i64> = index
        .keys_range(123i64, 456i64, true)
        .map(|k| k.as_long().unwrap())
        .collect();
    assert_eq!(slice, (123..=456).collect::<Vec<_>>());
}

#[test]
fn range_bounds_are_normalized_like_keys() {
    let mut index = Index::new();
    for k in 1..=5i64 {
        index.set(k, k);
    }
    // Double bounds address the same numeric keys.
    assert_eq!(range_keys(&index, 2, 4, true), vec![2, 3, 4]);
    let via_doubles: Vec<i64> = index
        .keys_range(2.0f64, 4.0f64, true)
        .map(|k| k.as_long().unwrap())
        .collect();
    assert_eq!(via_doubles, vec![2, 3, 4]);
}

#[test]
fn random_bounds_match_model_filter() {
    for order in [3usize, 4, 7] {
        let mut index = Index::with_config(IndexConfig::new().with_order(order)).unwrap();
        let mut model = BTreeSet::new();
        let mut rng = StdRng::seed_from_u64(0xb0c4 + order as u64);
        for _ in 0..400 {
            let k: i64 = rng.gen_range(0..500);
            index.set(k, k);
            model.insert(k);
        }

        for _ in 0..200 {
            let a: i64 = rng.gen_range(-20..520);
            let b: i64 = rng.gen_range(-20..520);
            let (start, end) = (a.min(b), a.max(b));
            for inclusive in [true, false] {
                let got = range_keys(&index, start, end, inclusive);
                let expected: Vec<i64> = model
                    .iter()
                    .copied()
                    .filter(|k| *k >= start && if inclusive { *k <= end } else { *k < end })
                    .collect();
                assert_eq!(
                    got, expected,
                    "order {order}, range [{start}, {end}], inclusive {inclusive}"
                );
            }
        }
    }
}

//! Save/load round trips and on-disk format checks

use chrono::{TimeZone, Utc};
use keytree::{Datum, Error, Index, IndexConfig};
use std::path::PathBuf;
use tempfile::TempDir;

fn scratch(name: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    (dir, path)
}

fn entries_of(index: &Index) -> Vec<(Datum, Datum)> {
    index
        .entries()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[test]
fn round_trip_preserves_entries_and_config() {
    let (_dir, path) = scratch("basic.db");
    let mut index = Index::with_config(IndexConfig::new().with_order(5)).unwrap();
    for k in 0..50i64 {
        index.set(k, k * 2);
    }
    index.set(10i64, 999i64); // multi value on an existing key
    index.save(&path).unwrap();

    let mut restored = Index::new();
    restored.load(&path).unwrap();

    assert_eq!(restored.order(), 5, "order adopted from the header");
    assert!(!restored.unique());
    assert_eq!(restored.size(), index.size());
    assert_eq!(restored.stats().values, index.stats().values);
    assert_eq!(entries_of(&restored), entries_of(&index));
}

#[test]
fn round_trip_keeps_multi_value_list_order() {
    let (_dir, path) = scratch("multi.db");
    let mut index = Index::new();
    index.set("k", 3i64).set("k", 1i64).set("k", 2i64);
    index.save(&path).unwrap();

    let mut restored = Index::new();
    restored.load(&path).unwrap();
    assert_eq!(
        restored.get("k"),
        Some(&[Datum::Long(3), Datum::Long(1), Datum::Long(2)][..])
    );
}

#[test]
fn round_trip_unique_mode() {
    let (_dir, path) = scratch("unique.db");
    let mut index = Index::with_config(IndexConfig::new().with_unique(true)).unwrap();
    index.set("a", 1i64).set("a", 2i64);
    index.save(&path).unwrap();

    let mut restored = Index::new();
    restored.load(&path).unwrap();
    assert!(restored.unique(), "uniqueness adopted from the header");
    assert_eq!(restored.get_one("a"), Some(&Datum::Long(2)));
    // The restored index keeps overwriting.
    restored.set("a", 3i64);
    assert_eq!(restored.get("a"), Some(&[Datum::Long(3)][..]));
}

#[test]
fn round_trip_heterogeneous_datums() {
    let (_dir, path) = scratch("datums.db");
    let stamp = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
    let mut index = Index::new();
    index.set(stamp, "a datetime key");
    index.set(f64::NAN, f64::INFINITY);
    index.set("nested", Datum::Object(vec![
        ("list".into(), Datum::Array(vec![Datum::Long(1), Datum::Bool(true)])),
        ("none".into(), Datum::Null),
    ]));
    index.set(Datum::Array(vec![Datum::Long(1), Datum::from("x")]), -1.5f64);
    index.save(&path).unwrap();

    let mut restored = Index::new();
    restored.load(&path).unwrap();
    assert_eq!(entries_of(&restored), entries_of(&index));
    assert!(restored.has(stamp));
    assert_eq!(
        restored.get_one(f64::NAN),
        Some(&Datum::from(f64::INFINITY))
    );
}

#[test]
fn empty_index_round_trips_as_header_only_file() {
    let (_dir, path) = scratch("empty.db");
    let index = Index::with_config(IndexConfig::new().with_order(7)).unwrap();
    index.save(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 9, "header only");

    let mut restored = Index::new();
    restored.load(&path).unwrap();
    assert!(restored.is_empty());
    assert_eq!(restored.order(), 7);
}

#[test]
fn file_layout_is_le_order_unique_then_records() {
    let (_dir, path) = scratch("layout.db");
    let mut index = Index::with_config(IndexConfig::new().with_order(4).with_unique(true)).unwrap();
    index.set(1i64, "one");
    index.save(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..8], &4u64.to_le_bytes());
    assert_eq!(bytes[8], 1);
    let record_len = u64::from_le_bytes(bytes[9..17].try_into().unwrap()) as usize;
    assert_eq!(bytes.len(), 17 + record_len);
    // The payload is the JSON of the (key, value) pair.
    let payload: serde_json::Value = serde_json::from_slice(&bytes[17..]).unwrap();
    assert!(payload.is_array());
}

#[test]
fn load_rejects_bad_header_without_clearing() {
    let (_dir, path) = scratch("bad-order.db");
    let mut bad = Vec::new();
    bad.extend_from_slice(&2u64.to_le_bytes()); // below the minimum order
    bad.push(0);
    std::fs::write(&path, &bad).unwrap();

    let mut index = Index::new();
    index.set("keep", 1i64);
    let err = index.load(&path).unwrap_err();
    assert!(matches!(err, Error::Corrupt(_)), "got {err:?}");
    assert!(index.has("keep"), "failed header must leave the index alone");
}

#[test]
fn load_rejects_bad_unique_flag_without_clearing() {
    let (_dir, path) = scratch("bad-flag.db");
    let mut bad = Vec::new();
    bad.extend_from_slice(&3u64.to_le_bytes());
    bad.push(7);
    std::fs::write(&path, &bad).unwrap();

    let mut index = Index::new();
    index.set("keep", 1i64);
    assert!(matches!(index.load(&path), Err(Error::Corrupt(_))));
    assert!(index.has("keep"));
}

#[test]
fn load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut index = Index::new();
    let err = index.load(dir.path().join("nope.db")).unwrap_err();
    assert!(matches!(err, Error::Io(_)), "got {err:?}");
}

#[test]
fn load_truncated_record_fails() {
    let (_dir, path) = scratch("truncated.db");
    let mut index = Index::new();
    for k in 0..10i64 {
        index.set(k, k);
    }
    index.save(&path).unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    bytes.truncate(bytes.len() - 3);
    std::fs::write(&path, &bytes).unwrap();

    let mut restored = Index::new();
    assert!(restored.load(&path).is_err());
}

#[test]
fn save_rejects_record_above_size_cap() {
    let (_dir, path) = scratch("oversized.db");
    let mut index = Index::new();
    index.set("huge", "x".repeat(17 * 1024 * 1024));

    // The write side enforces the same record cap the loader does.
    let err = index.save(&path).unwrap_err();
    assert!(matches!(err, Error::Corrupt(_)), "got {err:?}");
}

#[test]
fn save_overwrites_previous_file() {
    let (_dir, path) = scratch("overwrite.db");
    let mut index = Index::new();
    for k in 0..100i64 {
        index.set(k, k);
    }
    index.save(&path).unwrap();

    index.clear();
    index.set(1i64, 1i64);
    index.save(&path).unwrap();

    let mut restored = Index::new();
    restored.load(&path).unwrap();
    assert_eq!(restored.size(), 1);
}

#[test]
fn load_replaces_previous_contents() {
    let (_dir, path) = scratch("replace.db");
    let mut source = Index::new();
    source.set("new", 1i64);
    source.save(&path).unwrap();

    let mut index = Index::new();
    index.set("old", 0i64);
    index.load(&path).unwrap();
    assert!(!index.has("old"));
    assert!(index.has("new"));
    assert_eq!(index.size(), 1);
}

//! Value storage
//!
//! The hash side of the index: every key maps to its ordered value list,
//! one element in unique mode, append-ordered in multi mode. Point
//! operations resolve here in O(1) without touching the tree. The key set
//! held here and the key set in the tree are always identical.

use crate::datum::Datum;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub(crate) struct ValueStore {
    map: FxHashMap<Datum, Vec<Datum>>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, key: &Datum) -> bool {
        self.map.contains_key(key)
    }

    pub fn get(&self, key: &Datum) -> Option<&[Datum]> {
        self.map.get(key).map(Vec::as_slice)
    }

    /// Add a value under `key`. Returns true when the key was absent, in
    /// which case the ordered tree must learn the key too. In unique mode
    /// an existing key's sole value is overwritten in place.
    pub fn add(&mut self, key: &Datum, value: Datum, unique: bool) -> bool {
        match self.map.get_mut(key) {
            Some(list) => {
                if unique {
                    list[0] = value;
                } else {
                    list.push(value);
                }
                false
            }
            None => {
                self.map.insert(key.clone(), vec![value]);
                true
            }
        }
    }

    /// Drop a key and hand back its value list.
    pub fn remove(&mut self, key: &Datum) -> Option<Vec<Datum>> {
        self.map.remove(key)
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_multi_appends_in_order() {
        let mut store = ValueStore::new();
        let key = Datum::from("k");
        assert!(store.add(&key, Datum::Long(1), false));
        assert!(!store.add(&key, Datum::Long(2), false));
        assert!(!store.add(&key, Datum::Long(3), false));
        assert_eq!(
            store.get(&key),
            Some(&[Datum::Long(1), Datum::Long(2), Datum::Long(3)][..])
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_unique_overwrites_sole_value() {
        let mut store = ValueStore::new();
        let key = Datum::from("k");
        assert!(store.add(&key, Datum::Long(1), true));
        assert!(!store.add(&key, Datum::Long(2), true));
        assert_eq!(store.get(&key), Some(&[Datum::Long(2)][..]));
    }

    #[test]
    fn test_remove_returns_list() {
        let mut store = ValueStore::new();
        let key = Datum::from("k");
        store.add(&key, Datum::Long(1), false);
        store.add(&key, Datum::Long(2), false);
        assert_eq!(store.remove(&key), Some(vec![Datum::Long(1), Datum::Long(2)]));
        assert_eq!(store.remove(&key), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_numeric_class_keys_collide() {
        let mut store = ValueStore::new();
        store.add(&Datum::Long(3), Datum::from("int"), false);
        assert!(store.contains(&Datum::Double(3.0)));
        assert!(!store.add(&Datum::Double(3.0), Datum::from("float"), false));
        assert_eq!(store.len(), 1);
    }
}

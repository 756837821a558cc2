//! Range iterators
//!
//! All iteration walks the leaf chain, never revisiting branches: a full
//! scan starts at the leftmost leaf, a bounded scan descends once to the
//! leaf covering the start bound. The start bound is always inclusive;
//! the `inclusive` flag controls the end bound only. Iteration stops for
//! good at the first key past the end bound.

use crate::compare::Comparator;
use crate::datum::Datum;
use crate::node::NodeId;
use crate::store::ValueStore;
use crate::tree::Tree;
use std::cmp::Ordering;
use std::iter::FusedIterator;

/// Ascending key iterator: the whole key space, or `[start, end]` /
/// `[start, end)`.
pub struct Keys<'a> {
    tree: &'a Tree,
    cmp: Comparator,
    leaf: Option<NodeId>,
    slot: usize,
    start: Option<Datum>,
    end: Option<Datum>,
    inclusive: bool,
}

impl<'a> Keys<'a> {
    /// Keys within `[start, end]`, or `[start, end)` when `inclusive` is
    /// false.
    pub(crate) fn new(
        tree: &'a Tree,
        cmp: Comparator,
        start: Datum,
        end: Datum,
        inclusive: bool,
    ) -> Self {
        Self {
            tree,
            cmp,
            leaf: Some(tree.leaf_for(&start, cmp)),
            slot: 0,
            start: Some(start),
            end: Some(end),
            inclusive,
        }
    }

    /// Every key, starting at the leftmost leaf.
    pub(crate) fn full(tree: &'a Tree, cmp: Comparator) -> Self {
        Self {
            tree,
            cmp,
            leaf: Some(tree.first_leaf()),
            slot: 0,
            start: None,
            end: None,
            inclusive: true,
        }
    }
}

impl<'a> Iterator for Keys<'a> {
    type Item = &'a Datum;

    fn next(&mut self) -> Option<&'a Datum> {
        let tree = self.tree;
        while let Some(leaf_id) = self.leaf {
            let leaf = tree.node(leaf_id).as_leaf();
            while self.slot < leaf.keys.len() {
                let key = &leaf.keys[self.slot];
                self.slot += 1;
                if let Some(end) = &self.end {
                    match (self.cmp)(key, end) {
                        Ordering::Greater => {
                            self.leaf = None;
                            return None;
                        }
                        Ordering::Equal if !self.inclusive => continue,
                        _ => {}
                    }
                }
                if let Some(start) = &self.start {
                    if (self.cmp)(key, start) == Ordering::Less {
                        continue;
                    }
                }
                return Some(key);
            }
            self.leaf = leaf.next;
            self.slot = 0;
        }
        None
    }
}

impl FusedIterator for Keys<'_> {}

/// Ascending iterator over values; multi-valued keys yield each value in
/// its list order.
pub struct Values<'a> {
    keys: Keys<'a>,
    store: &'a ValueStore,
    current: std::slice::Iter<'a, Datum>,
}

impl<'a> Values<'a> {
    pub(crate) fn new(keys: Keys<'a>, store: &'a ValueStore) -> Self {
        Self {
            keys,
            store,
            current: Default::default(),
        }
    }
}

impl<'a> Iterator for Values<'a> {
    type Item = &'a Datum;

    fn next(&mut self) -> Option<&'a Datum> {
        loop {
            if let Some(value) = self.current.next() {
                return Some(value);
            }
            let key = self.keys.next()?;
            self.current = match self.store.get(key) {
                Some(list) => list.iter(),
                None => Default::default(),
            };
        }
    }
}

impl FusedIterator for Values<'_> {}

/// Ascending iterator over `(key, value)` pairs; multi-valued keys repeat
/// the key, one pair per value.
pub struct Entries<'a> {
    keys: Keys<'a>,
    store: &'a ValueStore,
    current_key: Option<&'a Datum>,
    current: std::slice::Iter<'a, Datum>,
}

impl<'a> Entries<'a> {
    pub(crate) fn new(keys: Keys<'a>, store: &'a ValueStore) -> Self {
        Self {
            keys,
            store,
            current_key: None,
            current: Default::default(),
        }
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = (&'a Datum, &'a Datum);

    fn next(&mut self) -> Option<(&'a Datum, &'a Datum)> {
        loop {
            if let Some(key) = self.current_key {
                if let Some(value) = self.current.next() {
                    return Some((key, value));
                }
            }
            let key = self.keys.next()?;
            self.current_key = Some(key);
            self.current = match self.store.get(key) {
                Some(list) => list.iter(),
                None => Default::default(),
            };
        }
    }
}

impl FusedIterator for Entries<'_> {}

//! The index facade
//!
//! [`Index`] owns the ordered tree, the value store, and the aggregate
//! statistics, and keeps the two access structures in lock step: every
//! key present in the hash side is present in the tree and vice versa.
//! Point operations resolve on the hash side in O(1); ordered operations
//! descend the tree once and walk the leaf chain.

use crate::codec;
use crate::config::{IndexConfig, MIN_ORDER};
use crate::datum::Datum;
use crate::error::{Error, Result};
use crate::iter::{Entries, Keys, Values};
use crate::node::Node;
use crate::stats::IndexStats;
use crate::store::ValueStore;
use crate::tree::Tree;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, trace};

/// Ordered associative map over heterogeneous keys.
///
/// Keys are kept in a B+-tree under the configured comparator for range
/// scans, and in a hash map for O(1) point access. Each key holds an
/// ordered list of values: one value overwritten in place in unique
/// mode, append-ordered values in multi mode.
///
/// ```ignore
/// let mut index = Index::new();
/// index.set("b", 2).set("a", 1).set("c", 3);
/// assert_eq!(index.lowest(), Some(&Datum::from("a")));
/// let keys: Vec<_> = index.keys().collect();
/// index.save("index.db")?;
/// ```
#[derive(Debug, Clone)]
pub struct Index {
    config: IndexConfig,
    tree: Tree,
    store: ValueStore,
    stats: IndexStats,
}

impl Index {
    /// Index with default configuration: order 3, multi-value mode, the
    /// built-in comparator.
    pub fn new() -> Self {
        let config = IndexConfig::default();
        Self {
            tree: Tree::new(config.order),
            config,
            store: ValueStore::new(),
            stats: Tree::initial_stats(),
        }
    }

    /// Index with the given configuration. Fails with
    /// [`Error::Config`] when `config.order` is below [`MIN_ORDER`].
    pub fn with_config(config: IndexConfig) -> Result<Self> {
        config.validate()?;
        let tree = Tree::new(config.order);
        Ok(Self {
            config,
            tree,
            store: ValueStore::new(),
            stats: Tree::initial_stats(),
        })
    }

    /// Tree order: maximum keys per leaf.
    pub fn order(&self) -> usize {
        self.config.order
    }

    /// Whether repeat inserts overwrite instead of appending.
    pub fn unique(&self) -> bool {
        self.config.unique
    }

    /// Number of distinct keys.
    pub fn size(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Structural counter snapshot.
    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    /// Smallest key under the configured comparator.
    pub fn lowest(&self) -> Option<&Datum> {
        self.tree.lowest()
    }

    /// Largest key under the configured comparator.
    pub fn highest(&self) -> Option<&Datum> {
        self.tree.highest()
    }

    /// Whether `key` is present. O(1).
    pub fn has(&self, key: impl Into<Datum>) -> bool {
        self.store.contains(&key.into())
    }

    /// The value list under `key`. O(1). A unique-mode key holds exactly
    /// one value.
    pub fn get(&self, key: impl Into<Datum>) -> Option<&[Datum]> {
        self.store.get(&key.into())
    }

    /// The sole value in unique mode, the first inserted value in multi
    /// mode.
    pub fn get_one(&self, key: impl Into<Datum>) -> Option<&Datum> {
        self.store.get(&key.into()).and_then(|list| list.first())
    }

    /// Values for every key in the range; equivalent to
    /// [`values_range`](Index::values_range).
    pub fn get_range(
        &self,
        start: impl Into<Datum>,
        end: impl Into<Datum>,
        inclusive: bool,
    ) -> Values<'_> {
        self.values_range(start, end, inclusive)
    }

    /// Insert a value under `key`, normalizing the key first. A new key
    /// enters both access structures; an existing key appends (multi
    /// mode) or overwrites its sole value (unique mode). Returns `self`
    /// for chaining.
    pub fn set(&mut self, key: impl Into<Datum>, value: impl Into<Datum>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        trace!(key = %key, "set");
        let new_key = self.store.add(&key, value, self.config.unique);
        if new_key {
            self.tree
                .insert_key(key, self.config.comparator, &mut self.stats);
            self.stats.values += 1;
        } else if !self.config.unique {
            self.stats.values += 1;
        }
        self
    }

    /// Remove `key` and all its values. Returns whether the key existed.
    pub fn delete(&mut self, key: impl Into<Datum>) -> bool {
        let key = key.into();
        let removed = match self.store.remove(&key) {
            Some(values) => {
                self.stats.values -= values.len();
                self.tree
                    .delete_key(&key, self.config.comparator, &mut self.stats);
                true
            }
            None => false,
        };
        trace!(key = %key, removed, "delete");
        removed
    }

    /// Remove every key in the range. The range is snapshotted before any
    /// removal, so rebalancing during deletion cannot skip keys. Returns
    /// whether anything was removed.
    pub fn delete_range(
        &mut self,
        start: impl Into<Datum>,
        end: impl Into<Datum>,
        inclusive: bool,
    ) -> bool {
        let doomed: Vec<Datum> = self
            .keys_range(start, end, inclusive)
            .cloned()
            .collect();
        let mut removed = false;
        for key in doomed {
            if self.delete(key) {
                removed = true;
            }
        }
        removed
    }

    /// Reset to the freshly constructed state, keeping the configuration.
    pub fn clear(&mut self) {
        self.tree = Tree::new(self.config.order);
        self.store.clear();
        self.stats = Tree::initial_stats();
        debug!("Index cleared");
    }

    /// All keys in ascending order.
    pub fn keys(&self) -> Keys<'_> {
        self.full_range()
    }

    /// Keys in `[start, end]`, or `[start, end)` when `inclusive` is
    /// false. The start bound is always inclusive.
    pub fn keys_range(
        &self,
        start: impl Into<Datum>,
        end: impl Into<Datum>,
        inclusive: bool,
    ) -> Keys<'_> {
        Keys::new(
            &self.tree,
            self.config.comparator,
            start.into(),
            end.into(),
            inclusive,
        )
    }

    /// All values in ascending key order; multi-valued keys yield each
    /// value in its list order.
    pub fn values(&self) -> Values<'_> {
        Values::new(self.full_range(), &self.store)
    }

    pub fn values_range(
        &self,
        start: impl Into<Datum>,
        end: impl Into<Datum>,
        inclusive: bool,
    ) -> Values<'_> {
        Values::new(self.keys_range(start, end, inclusive), &self.store)
    }

    /// All `(key, value)` pairs in ascending key order; multi-valued keys
    /// repeat the key, one pair per value.
    pub fn entries(&self) -> Entries<'_> {
        Entries::new(self.full_range(), &self.store)
    }

    pub fn entries_range(
        &self,
        start: impl Into<Datum>,
        end: impl Into<Datum>,
        inclusive: bool,
    ) -> Entries<'_> {
        Entries::new(self.keys_range(start, end, inclusive), &self.store)
    }

    /// Call `func(value, key)` for every entry in ascending key order.
    pub fn for_each<F: FnMut(&Datum, &Datum)>(&self, mut func: F) {
        for (key, value) in self.entries() {
            func(value, key);
        }
    }

    /// Call `func(value, key)` for every entry in the range.
    pub fn for_each_range<F: FnMut(&Datum, &Datum)>(
        &self,
        start: impl Into<Datum>,
        end: impl Into<Datum>,
        inclusive: bool,
        mut func: F,
    ) {
        for (key, value) in self.entries_range(start, end, inclusive) {
            func(value, key);
        }
    }

    /// Write the header and every entry to `path`; see [`crate::codec`]
    /// for the layout.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        codec::write_header(
            &mut writer,
            &codec::Header {
                order: self.config.order as u64,
                unique: self.config.unique,
            },
        )?;
        let mut records = 0usize;
        for (key, value) in self.entries() {
            codec::write_record(&mut writer, key, value)?;
            records += 1;
        }
        writer.flush()?;
        debug!(path = %path.display(), records, "Index saved");
        Ok(())
    }

    /// Replace this index's contents with the file at `path`.
    ///
    /// The header is read and validated before anything is discarded, so
    /// a file with a bad header leaves the index untouched. Order and
    /// uniqueness are adopted from the header; the comparator is not
    /// persisted and stays as configured. Every record reinserts through
    /// [`set`](Index::set), rebuilding the tree and statistics from
    /// scratch. An error past the header leaves the records applied so
    /// far in place.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        let header = codec::read_header(&mut reader)?;
        let order = usize::try_from(header.order)
            .map_err(|_| Error::corrupt(format!("persisted order {} too large", header.order)))?;
        if order < MIN_ORDER {
            return Err(Error::corrupt(format!(
                "persisted order {order} below minimum {MIN_ORDER}"
            )));
        }
        self.config.order = order;
        self.config.unique = header.unique;
        self.clear();
        let mut records = 0usize;
        while let Some((key, value)) = codec::read_record(&mut reader)? {
            self.set(key, value);
            records += 1;
        }
        debug!(
            path = %path.display(),
            order,
            unique = header.unique,
            records,
            "Index loaded"
        );
        Ok(())
    }

    fn full_range(&self) -> Keys<'_> {
        Keys::full(&self.tree, self.config.comparator)
    }

    fn fmt_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        id: crate::node::NodeId,
        level: usize,
    ) -> fmt::Result {
        match self.tree.node(id) {
            Node::Branch(branch) => {
                write_indent(f, level)?;
                f.write_str(if level == 0 { "Root - " } else { "Node - " })?;
                write_joined(f, &branch.keys)?;
                for child in &branch.children {
                    f.write_str("\n")?;
                    self.fmt_node(f, *child, level + 1)?;
                }
                Ok(())
            }
            Node::Leaf(leaf) => {
                write_indent(f, level)?;
                f.write_str("Leaf")?;
                for key in &leaf.keys {
                    f.write_str("\n")?;
                    write_indent(f, level + 1)?;
                    write!(f, "{key}: ")?;
                    if let Some(values) = self.store.get(key) {
                        write_joined(f, values)?;
                    }
                }
                if let Some(next_id) = leaf.next {
                    if let Some(low) = self.tree.node(next_id).as_leaf().keys.first() {
                        write!(f, " --> {low}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl Default for Index {
    fn default() -> Self {
        Self::new()
    }
}

/// Indented tree dump for diagnostics: branch lines show separators,
/// leaf lines show `key: values`, and each leaf's last line points at
/// the next leaf's lowest key.
impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(f, self.tree.root(), 0)
    }
}

impl<'a> IntoIterator for &'a Index {
    type Item = (&'a Datum, &'a Datum);
    type IntoIter = Entries<'a>;

    fn into_iter(self) -> Entries<'a> {
        self.entries()
    }
}

fn write_indent(f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
    for _ in 0..level {
        f.write_str("|  ")?;
    }
    Ok(())
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Datum]) -> fmt::Result {
    let mut first = true;
    for item in items {
        if !first {
            f.write_str(",")?;
        }
        first = false;
        write!(f, "{item}")?;
    }
    Ok(())
}

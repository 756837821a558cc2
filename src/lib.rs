//! # keytree
//!
//! In-memory B+-tree ordered index with hash-backed point lookups,
//! pluggable comparators, and binary persistence.
//!
//! - **Hybrid access**: every key lives in a hash map and in a B+-tree,
//!   so point reads are O(1) while range scans walk the leaf chain in
//!   O(log n + k)
//! - **Heterogeneous keys**: numbers, strings, datetimes, booleans and
//!   nested composites are all valid keys under one total order
//! - **Pluggable ordering**: the comparator is a plain function pointer
//!   supplied at construction and applied uniformly to leaf keys, branch
//!   separators and range bounds
//! - **Multi or unique values**: a key holds an append-ordered value
//!   list, or exactly one value overwritten in place
//! - **Binary persistence**: save and load a length-prefixed record
//!   stream with a fixed header
//!
//! ## Design principles
//!
//! 1. **Two structures, one key set**: the hash side and the tree side
//!    always hold exactly the same keys; values live only on the hash
//!    side and the tree stays keys-only
//! 2. **Rebalance on the unwind**: parents resolve child overflow and
//!    underflow after recursion returns, borrowing from siblings before
//!    splitting or merging
//! 3. **Incremental statistics**: depth, node, leaf, key and value
//!    counters are maintained by every mutation and never recomputed by
//!    walking the tree
//!
//! ## Example
//!
//! ```ignore
//! use keytree::{Index, IndexConfig};
//!
//! let mut index = Index::with_config(IndexConfig::new().with_order(16))?;
//! index.set("apple", 3).set("pear", 7).set("apple", 4);
//!
//! assert!(index.has("apple"));
//! for key in index.keys_range("a", "b", false) {
//!     println!("{key}");
//! }
//!
//! index.save("fruit.db")?;
//! ```

pub mod compare;
pub mod config;
pub mod datum;
pub mod error;
pub mod index;
pub mod iter;
pub mod stats;

mod codec;
mod node;
mod store;
mod tree;

pub use compare::{default_compare, Comparator};
pub use config::{IndexConfig, MIN_ORDER};
pub use datum::Datum;
pub use error::{Error, Result};
pub use index::Index;
pub use iter::{Entries, Keys, Values};
pub use stats::IndexStats;

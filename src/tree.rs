//! B+-tree engine
//!
//! Structure-only ordered tree: leaves hold sorted keys, branches hold
//! separators and child ids. Values never enter the tree; they live in the
//! `ValueStore` keyed by datum equality.
//!
//! All rebalancing happens on the unwind of the insert/delete recursion.
//! A parent inspects the child it just recursed into and resolves
//! overflow or underflow locally: borrow from the left sibling, else
//! borrow from the right sibling, else split (insert) or merge (delete).
//! Borrowing before splitting keeps node counts low under skewed
//! insertion orders.
//!
//! Capacity bounds per node kind, for a tree of a given order:
//!
//! ```text
//! leaf:   min = ceil(order/2)      max = order
//! branch: min = ceil(order/2) - 1  max = order - 1
//! ```
//!
//! The root is exempt from the minimum on either kind.

use crate::compare::Comparator;
use crate::datum::Datum;
use crate::node::{slot_of, Branch, Leaf, Node, NodeId, NodeStore};
use crate::stats::IndexStats;
use std::cmp::Ordering;

/// The ordered tree over one index's key set.
///
/// Mutations take the live comparator and the index stats; the tree keeps
/// the structural counters (`depth`, `nodes`, `leaves`, `keys`) exact on
/// every path through a mutation.
#[derive(Debug, Clone)]
pub(crate) struct Tree {
    nodes: NodeStore,
    root: NodeId,
    order: usize,
}

impl Tree {
    /// Empty tree: the root starts as a leaf with no keys.
    pub fn new(order: usize) -> Self {
        let mut nodes = NodeStore::new();
        let root = nodes.insert(Node::Leaf(Leaf::new()));
        Self { nodes, root, order }
    }

    /// Structural counters matching [`Tree::new`].
    pub fn initial_stats() -> IndexStats {
        IndexStats {
            leaves: 1,
            ..IndexStats::default()
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes.get(id)
    }

    /// Smallest key in the tree.
    pub fn lowest(&self) -> Option<&Datum> {
        let mut id = self.root;
        loop {
            match self.nodes.get(id) {
                Node::Leaf(leaf) => return leaf.keys.first(),
                Node::Branch(branch) => id = branch.children[0],
            }
        }
    }

    /// Largest key in the tree.
    pub fn highest(&self) -> Option<&Datum> {
        let mut id = self.root;
        loop {
            match self.nodes.get(id) {
                Node::Leaf(leaf) => return leaf.keys.last(),
                Node::Branch(branch) => id = branch.children[branch.children.len() - 1],
            }
        }
    }

    /// Leftmost leaf; start of the leaf chain.
    pub fn first_leaf(&self) -> NodeId {
        let mut id = self.root;
        loop {
            match self.nodes.get(id) {
                Node::Leaf(_) => return id,
                Node::Branch(branch) => id = branch.children[0],
            }
        }
    }

    /// The leaf whose key range covers `key`.
    pub fn leaf_for(&self, key: &Datum, cmp: Comparator) -> NodeId {
        let mut id = self.root;
        loop {
            match self.nodes.get(id) {
                Node::Leaf(_) => return id,
                Node::Branch(branch) => {
                    let slot = slot_of(&branch.keys, key, cmp);
                    id = branch.children[slot];
                }
            }
        }
    }

    /// Insert a key known to be absent from the tree.
    pub fn insert_key(&mut self, key: Datum, cmp: Comparator, stats: &mut IndexStats) {
        self.insert_into(self.root, key, cmp, stats);
        let overflowed = {
            let root = self.nodes.get(self.root);
            root.len() > self.max_of(root)
        };
        if overflowed {
            self.grow_root(stats);
        }
        stats.keys += 1;
    }

    /// Remove a key; no-op when the key is absent.
    pub fn delete_key(&mut self, key: &Datum, cmp: Comparator, stats: &mut IndexStats) {
        if self.delete_from(self.root, key, cmp, stats) {
            stats.keys -= 1;
        }
        // A branch root left with a single child hands the root down a level.
        let collapse = match self.nodes.get(self.root) {
            Node::Branch(branch) if branch.keys.is_empty() => Some(branch.children[0]),
            _ => None,
        };
        if let Some(child) = collapse {
            self.nodes.remove(self.root);
            self.root = child;
            stats.nodes -= 1;
            stats.depth -= 1;
        }
    }

    fn leaf_min(&self) -> usize {
        self.order.div_ceil(2)
    }

    fn leaf_max(&self) -> usize {
        self.order
    }

    fn branch_min(&self) -> usize {
        self.order.div_ceil(2) - 1
    }

    fn branch_max(&self) -> usize {
        self.order - 1
    }

    fn min_of(&self, node: &Node) -> usize {
        if node.is_leaf() {
            self.leaf_min()
        } else {
            self.branch_min()
        }
    }

    fn max_of(&self, node: &Node) -> usize {
        if node.is_leaf() {
            self.leaf_max()
        } else {
            self.branch_max()
        }
    }

    fn insert_into(&mut self, id: NodeId, key: Datum, cmp: Comparator, stats: &mut IndexStats) {
        let (child, slot) = match self.nodes.get_mut(id) {
            Node::Leaf(leaf) => {
                let slot = slot_of(&leaf.keys, &key, cmp);
                leaf.keys.insert(slot, key);
                return;
            }
            Node::Branch(branch) => {
                let slot = slot_of(&branch.keys, &key, cmp);
                (branch.children[slot], slot)
            }
        };
        self.insert_into(child, key, cmp, stats);
        self.fix_overflow(id, slot, stats);
    }

    /// Resolve an overflowing child of `parent`: borrow into a sibling
    /// with slack, preferring the left one, else split the child.
    fn fix_overflow(&mut self, parent: NodeId, slot: usize, stats: &mut IndexStats) {
        let (child_len, child_max, child_count) = {
            let branch = self.nodes.get(parent).as_branch();
            let child = self.nodes.get(branch.children[slot]);
            (child.len(), self.max_of(child), branch.children.len())
        };
        if child_len <= child_max {
            return;
        }
        if slot > 0 {
            if self.has_slack(parent, slot - 1) {
                self.rotate_left(parent, slot - 1);
                return;
            }
            if slot < child_count - 1 && self.has_slack(parent, slot + 1) {
                self.rotate_right(parent, slot);
                return;
            }
            self.split_child(parent, slot, stats);
        } else {
            if self.has_slack(parent, 1) {
                self.rotate_right(parent, slot);
                return;
            }
            self.split_child(parent, slot, stats);
        }
    }

    fn delete_from(&mut self, id: NodeId, key: &Datum, cmp: Comparator, stats: &mut IndexStats) -> bool {
        let (child, slot) = match self.nodes.get_mut(id) {
            Node::Leaf(leaf) => {
                let slot = slot_of(&leaf.keys, key, cmp);
                if slot > 0 && cmp(&leaf.keys[slot - 1], key) == Ordering::Equal {
                    leaf.keys.remove(slot - 1);
                    return true;
                }
                return false;
            }
            Node::Branch(branch) => {
                let slot = slot_of(&branch.keys, key, cmp);
                (branch.children[slot], slot)
            }
        };
        let removed = self.delete_from(child, key, cmp, stats);
        self.fix_underflow(id, slot, stats);
        removed
    }

    /// Refresh the child's separator, then resolve an underflow: borrow
    /// from a sibling with surplus, preferring the left one, else merge
    /// with the nearest sibling tried.
    fn fix_underflow(&mut self, parent: NodeId, slot: usize, stats: &mut IndexStats) {
        if slot > 0 {
            // The removed key may have been the child's lowest.
            self.refresh_separator(parent, slot - 1);
        }
        let (child_len, child_min, child_count) = {
            let branch = self.nodes.get(parent).as_branch();
            let child = self.nodes.get(branch.children[slot]);
            (child.len(), self.min_of(child), branch.children.len())
        };
        if child_len >= child_min {
            return;
        }
        if slot > 0 {
            if self.has_surplus(parent, slot - 1) {
                self.rotate_right(parent, slot - 1);
                return;
            }
            if slot < child_count - 1 && self.has_surplus(parent, slot + 1) {
                self.rotate_left(parent, slot);
                return;
            }
            self.merge_pair(parent, slot - 1, stats);
        } else {
            if self.has_surplus(parent, 1) {
                self.rotate_left(parent, slot);
                return;
            }
            self.merge_pair(parent, slot, stats);
        }
    }

    fn has_slack(&self, parent: NodeId, slot: usize) -> bool {
        let sibling = self.nodes.get(self.nodes.get(parent).as_branch().children[slot]);
        sibling.len() < self.max_of(sibling)
    }

    fn has_surplus(&self, parent: NodeId, slot: usize) -> bool {
        let sibling = self.nodes.get(self.nodes.get(parent).as_branch().children[slot]);
        sibling.len() > self.min_of(sibling)
    }

    /// Lowest key reachable from `id`. Only the empty root has none.
    fn subtree_lowest(&self, id: NodeId) -> Datum {
        let mut current = id;
        loop {
            match self.nodes.get(current) {
                Node::Leaf(leaf) => {
                    return leaf.keys.first().cloned().expect("subtree with no keys");
                }
                Node::Branch(branch) => current = branch.children[0],
            }
        }
    }

    /// Restore `keys[i]` to the live lowest of `children[i + 1]`.
    fn refresh_separator(&mut self, parent: NodeId, i: usize) {
        let right_id = self.nodes.get(parent).as_branch().children[i + 1];
        let low = self.subtree_lowest(right_id);
        self.nodes.get_mut(parent).as_branch_mut().keys[i] = low;
    }

    fn pair(&self, parent: NodeId, i: usize) -> (NodeId, NodeId) {
        let branch = self.nodes.get(parent).as_branch();
        (branch.children[i], branch.children[i + 1])
    }

    /// Move the first entry of `children[i + 1]` into `children[i]`.
    fn rotate_left(&mut self, parent: NodeId, i: usize) {
        let (left_id, right_id) = self.pair(parent, i);
        if self.nodes.get(left_id).is_leaf() {
            let key = self.nodes.get_mut(right_id).as_leaf_mut().keys.remove(0);
            self.nodes.get_mut(left_id).as_leaf_mut().keys.push(key);
        } else {
            // The right subtree's live lowest separates the migrating child
            // from the left node's last child.
            let separator = self.subtree_lowest(right_id);
            let moved = {
                let right = self.nodes.get_mut(right_id).as_branch_mut();
                right.keys.remove(0);
                right.children.remove(0)
            };
            let left = self.nodes.get_mut(left_id).as_branch_mut();
            left.keys.push(separator);
            left.children.push(moved);
        }
        self.refresh_separator(parent, i);
    }

    /// Move the last entry of `children[i]` into `children[i + 1]`.
    fn rotate_right(&mut self, parent: NodeId, i: usize) {
        let (left_id, right_id) = self.pair(parent, i);
        if self.nodes.get(left_id).is_leaf() {
            let key = {
                let left = self.nodes.get_mut(left_id).as_leaf_mut();
                left.keys.pop().expect("rotate from an empty leaf")
            };
            self.nodes.get_mut(right_id).as_leaf_mut().keys.insert(0, key);
        } else {
            // Captured before mutation: the right subtree's old lowest
            // separates the migrating child from the right node's children.
            let separator = self.subtree_lowest(right_id);
            let moved = {
                let left = self.nodes.get_mut(left_id).as_branch_mut();
                left.keys.pop();
                left.children.pop().expect("rotate from a branch with no children")
            };
            let right = self.nodes.get_mut(right_id).as_branch_mut();
            right.keys.insert(0, separator);
            right.children.insert(0, moved);
        }
        self.refresh_separator(parent, i);
    }

    /// Split `id` into itself and a new right sibling; returns the new
    /// sibling and the separator to file with the parent.
    fn split_node(&mut self, id: NodeId, stats: &mut IndexStats) -> (NodeId, Datum) {
        let leaf_min = self.leaf_min();
        let branch_min = self.branch_min();
        let (right, separator) = match self.nodes.get_mut(id) {
            Node::Leaf(leaf) => {
                let right_keys = leaf.keys.split_off(leaf_min);
                let separator = right_keys[0].clone();
                let right = Leaf {
                    keys: right_keys,
                    next: leaf.next,
                };
                (Node::Leaf(right), separator)
            }
            Node::Branch(branch) => {
                let mut right_keys = branch.keys.split_off(branch_min);
                // First carved-off key is promoted, not kept.
                let separator = right_keys.remove(0);
                let right_children = branch.children.split_off(branch_min + 1);
                let right = Branch {
                    keys: right_keys,
                    children: right_children,
                };
                (Node::Branch(right), separator)
            }
        };
        let split_leaf = right.is_leaf();
        let right_id = self.nodes.insert(right);
        if split_leaf {
            self.nodes.get_mut(id).as_leaf_mut().next = Some(right_id);
            stats.leaves += 1;
        } else {
            stats.nodes += 1;
        }
        (right_id, separator)
    }

    fn split_child(&mut self, parent: NodeId, slot: usize, stats: &mut IndexStats) {
        let child_id = self.nodes.get(parent).as_branch().children[slot];
        let (right_id, separator) = self.split_node(child_id, stats);
        let branch = self.nodes.get_mut(parent).as_branch_mut();
        branch.keys.insert(slot, separator);
        branch.children.insert(slot + 1, right_id);
    }

    /// Split the overflowing root and push a new branch root above it.
    fn grow_root(&mut self, stats: &mut IndexStats) {
        let (right_id, separator) = self.split_node(self.root, stats);
        let old_root = self.root;
        self.root = self.nodes.insert(Node::Branch(Branch {
            keys: vec![separator],
            children: vec![old_root, right_id],
        }));
        stats.nodes += 1;
        stats.depth += 1;
    }

    /// Merge `children[i + 1]` into `children[i]` and drop the separator
    /// between them. `keys[i]` is live here: underflow handling refreshes
    /// it before consolidating.
    fn merge_pair(&mut self, parent: NodeId, i: usize, stats: &mut IndexStats) {
        let (left_id, right_id) = self.pair(parent, i);
        let parent_separator = self.nodes.get(parent).as_branch().keys[i].clone();
        match self.nodes.remove(right_id) {
            Node::Leaf(right_leaf) => {
                let left = self.nodes.get_mut(left_id).as_leaf_mut();
                left.keys.extend(right_leaf.keys);
                left.next = right_leaf.next;
                stats.leaves -= 1;
            }
            Node::Branch(right_branch) => {
                let left = self.nodes.get_mut(left_id).as_branch_mut();
                left.keys.push(parent_separator);
                left.keys.extend(right_branch.keys);
                left.children.extend(right_branch.children);
                stats.nodes -= 1;
            }
        }
        let branch = self.nodes.get_mut(parent).as_branch_mut();
        branch.keys.remove(i);
        branch.children.remove(i + 1);
    }
}

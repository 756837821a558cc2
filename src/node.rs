//! Tree nodes and the arena that owns them
//!
//! Nodes live in a slot arena and refer to each other by [`NodeId`], so a
//! leaf can point at its successor without owning it and rebalancing can
//! move entries between siblings through the arena one mutable borrow at
//! a time. Leaves hold keys only; values live in the `ValueStore`.

use crate::compare::Comparator;
use crate::datum::Datum;
use std::cmp::Ordering;

/// Handle to a node slot. Stable for the node's lifetime; slots are
/// recycled after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeId(usize);

/// Leaf node: sorted keys plus a link to the next leaf in key order.
#[derive(Debug, Clone)]
pub(crate) struct Leaf {
    pub keys: Vec<Datum>,
    pub next: Option<NodeId>,
}

impl Leaf {
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            next: None,
        }
    }
}

/// Branch node: separator keys and child ids, `children.len() ==
/// keys.len() + 1`. `keys[i]` equals the lowest key reachable from
/// `children[i + 1]`.
#[derive(Debug, Clone)]
pub(crate) struct Branch {
    pub keys: Vec<Datum>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Leaf(Leaf),
    Branch(Branch),
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Number of keys held directly by this node.
    pub fn len(&self) -> usize {
        match self {
            Node::Leaf(leaf) => leaf.keys.len(),
            Node::Branch(branch) => branch.keys.len(),
        }
    }

    pub fn as_leaf(&self) -> &Leaf {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Branch(_) => panic!("expected leaf node"),
        }
    }

    pub fn as_leaf_mut(&mut self) -> &mut Leaf {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Branch(_) => panic!("expected leaf node"),
        }
    }

    pub fn as_branch(&self) -> &Branch {
        match self {
            Node::Branch(branch) => branch,
            Node::Leaf(_) => panic!("expected branch node"),
        }
    }

    pub fn as_branch_mut(&mut self) -> &mut Branch {
        match self {
            Node::Branch(branch) => branch,
            Node::Leaf(_) => panic!("expected branch node"),
        }
    }
}

/// Slot arena holding every node of one tree. Removed slots go on a free
/// list and are reused by later inserts.
#[derive(Debug, Clone, Default)]
pub(crate) struct NodeStore {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    pub fn remove(&mut self, id: NodeId) -> Node {
        let node = self.slots[id.0].take().expect("node slot already vacated");
        self.free.push(id.0);
        node
    }

    pub fn get(&self, id: NodeId) -> &Node {
        self.slots[id.0].as_ref().expect("vacant node slot")
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        self.slots[id.0].as_mut().expect("vacant node slot")
    }
}

/// Upper-bound binary search: the child slot (or key insertion point)
/// for `key` within sorted `keys`. An exact separator match descends to
/// the right of the separator, where the matching subtree starts.
pub(crate) fn slot_of(keys: &[Datum], key: &Datum, cmp: Comparator) -> usize {
    let mut bottom = 0;
    let mut top = keys.len();
    let mut middle = top >> 1;
    while bottom < top {
        match cmp(key, &keys[middle]) {
            Ordering::Equal => return middle + 1,
            Ordering::Less => top = middle,
            Ordering::Greater => bottom = middle + 1,
        }
        middle = bottom + ((top - bottom) >> 1);
    }
    middle
}

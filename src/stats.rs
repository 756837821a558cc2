//! Aggregate index statistics

/// Structural counters for an index.
///
/// Maintained incrementally by every mutation; reading them never walks
/// the tree. A fresh index reports `depth: 0, nodes: 0, leaves: 1,
/// keys: 0, values: 0` (the root starts as a single empty leaf).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Branch levels above the leaf level; 0 when the root is a leaf
    pub depth: usize,
    /// Number of branch nodes
    pub nodes: usize,
    /// Number of leaf nodes
    pub leaves: usize,
    /// Number of distinct keys
    pub keys: usize,
    /// Number of stored values across all keys
    pub values: usize,
}

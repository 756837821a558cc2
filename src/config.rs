//! Index configuration

use crate::compare::{default_compare, Comparator};
use crate::error::{Error, Result};
use std::fmt;

/// Smallest order whose leaf/branch capacity arithmetic works out.
pub const MIN_ORDER: usize = 3;

/// Configuration for building an [`Index`](crate::Index).
///
/// # Example
///
/// ```ignore
/// let config = IndexConfig::new()
///     .with_order(16)
///     .with_unique(true);
/// let index = Index::with_config(config)?;
/// ```
#[derive(Clone)]
pub struct IndexConfig {
    /// Maximum keys per leaf; branches hold up to `order - 1` separators.
    /// Must be at least [`MIN_ORDER`]. Default: 3
    pub order: usize,
    /// When true each key holds exactly one value and repeat inserts
    /// overwrite it. Default: false (multi-value)
    pub unique: bool,
    /// Key ordering applied to leaf keys, branch separators and range
    /// bounds alike. Default: [`default_compare`]
    pub comparator: Comparator,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            order: MIN_ORDER,
            unique: false,
            comparator: default_compare,
        }
    }
}

impl IndexConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tree order
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    /// Set unique-value mode
    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Set the key comparator.
    ///
    /// The comparator must honor the contract described in
    /// [`crate::compare`]: a total order returning `Equal` exactly for
    /// datum-equal keys.
    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    /// Reject configurations the tree arithmetic cannot support.
    pub fn validate(&self) -> Result<()> {
        if self.order < MIN_ORDER {
            return Err(Error::config(format!(
                "order must be at least {MIN_ORDER}, got {}",
                self.order
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for IndexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexConfig")
            .field("order", &self.order)
            .field("unique", &self.unique)
            .finish_non_exhaustive()
    }
}

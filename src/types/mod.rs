#![forbid(unsafe_code)]

//! Identifier, interval, and error types shared by every layer.

use std::fmt;

use thiserror::Error;

/// Store-assigned identifier of a tree node.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The nested-set coordinates of a node.
///
/// `left` and `right` are signed because a subtree being relocated is parked
/// in negative territory for the duration of a move.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Interval {
    /// Opening boundary.
    pub left: i64,
    /// Closing boundary.
    pub right: i64,
    /// Depth of the node, 0 for roots.
    pub level: i64,
}

impl Interval {
    /// Creates an interval from its three coordinates.
    pub const fn new(left: i64, right: i64, level: i64) -> Self {
        Self { left, right, level }
    }

    /// Number of integers spanned by the interval, always even for a valid node.
    pub fn width(&self) -> i64 {
        self.right - self.left + 1
    }

    /// Number of strict descendants encoded by the interval.
    pub fn descendant_count(&self) -> i64 {
        (self.right - self.left - 1) / 2
    }

    /// Whether no other interval can nest inside this one.
    pub fn is_leaf(&self) -> bool {
        self.right == self.left + 1
    }

    /// Strict containment: `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Interval) -> bool {
        self.left < other.left && other.right < self.right
    }

    /// Whether the two intervals share no position.
    pub fn is_disjoint(&self, other: &Interval) -> bool {
        self.right < other.left || other.right < self.left
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]@{}", self.left, self.right, self.level)
    }
}

/// Errors raised while maintaining or querying a nested-set forest.
#[derive(Debug, Error)]
pub enum NestedSetError {
    /// The referenced parent does not exist.
    #[error("parent not found: {0}")]
    ParentNotFound(NodeId),
    /// The addressed node does not exist.
    #[error("node not found: {0}")]
    NotFound(NodeId),
    /// A node cannot be moved under itself or one of its descendants.
    #[error("cannot move node {node} under {parent}: target lies inside the moved subtree")]
    CyclicMove {
        /// Node being moved.
        node: NodeId,
        /// Requested parent.
        parent: NodeId,
    },
    /// A post-mutation consistency check failed.
    #[error("interval invariant violated: {0}")]
    InvariantViolation(String),
    /// The column binding is unusable.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// Configuration could not be loaded or applied.
    #[error("configuration error: {0}")]
    Config(String),
    /// SQLite backend failure.
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Payload encoding failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NestedSetError>;

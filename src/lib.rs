//! Nested-set (interval) encoding for forests stored in flat record stores.
//!
//! Every node carries a `[left, right]` interval and a depth `level`, so
//! subtree, ancestor and descendant lookups become range comparisons. The
//! [`NestedSet`] maintainer keeps those intervals consistent across insert,
//! delete and reparent, running entirely inside a transaction owned by the
//! caller through a [`TreeStore`] adapter.
//!
//! ```rust
//! use nestset::{MemoryForest, NestedSet, Node};
//!
//! # fn main() -> nestset::Result<()> {
//! let forest = MemoryForest::new();
//! let tree = NestedSet::default();
//!
//! let mut tx = forest.begin_write();
//! let root = tree.insert(&mut tx, Node::new("Electronics"))?.node;
//! let tv = tree.insert(&mut tx, Node::child_of(root.id, "Television"))?;
//! assert_eq!((tv.node.interval.left, tv.node.interval.right), (2, 3));
//! assert_eq!(tv.ancestors[0].interval.right, 4);
//! tx.commit();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod logging;
pub mod model;
pub mod store;
pub mod tree;
pub mod types;
pub mod verify;

pub use logging::init_logging;
pub use model::{Node, PropertyValue, TreeNode};
pub use store::{
    write_transaction, Assign, Changeset, Cmp, Field, MemoryForest, MemoryTransaction, Predicate,
    Schema, SqliteStore, TreeStore,
};
pub use tree::{query, NestedSet, NestedSetOptions, Placement};
pub use types::{Interval, NestedSetError, NodeId, Result};
pub use verify::{verify_forest, VerifyCounts, VerifyFinding, VerifyReport, VerifySeverity};

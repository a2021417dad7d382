//! The interval maintainer.
//!
//! [`NestedSet`] turns logical tree mutations (insert, delete, reparent) into
//! the range-qualified updates that keep every node's `[left, right]`
//! interval consistent. It holds no state beyond its options and runs
//! entirely through the transaction-scoped [`TreeStore`] handed to each call,
//! so the caller's transaction is what makes a mutation atomic and exclusive.
//!
//! Each operation returns the touched node re-read from the store together
//! with its ancestor chain, because sibling and ancestor shifts change values
//! a caller may already hold in memory.

use tracing::error;

use crate::model::TreeNode;
use crate::store::TreeStore;
use crate::types::{NestedSetError, NodeId, Result};
use crate::verify::verify_forest;

mod delete_ops;
mod helpers;
mod insert_ops;
mod move_ops;
mod options;
pub mod query;

pub use options::NestedSetOptions;

/// A node re-read after a mutation, with its ancestors nearest first.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement<N> {
    /// The node as currently stored.
    pub node: N,
    /// Parent, grandparent, ... up to the root. Empty for roots or when
    /// ancestor refresh is disabled.
    pub ancestors: Vec<N>,
}

/// Interval maintainer for nested-set forests.
#[derive(Clone, Debug, Default)]
pub struct NestedSet {
    opts: NestedSetOptions,
}

impl NestedSet {
    /// Creates a maintainer with the given options.
    pub fn new(opts: NestedSetOptions) -> Self {
        Self { opts }
    }

    /// Options in effect.
    pub fn options(&self) -> &NestedSetOptions {
        &self.opts
    }

    fn refresh<S: TreeStore>(&self, store: &S, id: NodeId) -> Result<Placement<S::Node>> {
        let node = store.get_by_id(id)?.ok_or(NestedSetError::NotFound(id))?;
        let ancestors = self.refreshed_chain(store, node.parent_id())?;
        Ok(Placement { node, ancestors })
    }

    fn refreshed_chain<S: TreeStore>(
        &self,
        store: &S,
        parent: Option<NodeId>,
    ) -> Result<Vec<S::Node>> {
        if !self.opts.refresh_ancestors {
            return Ok(Vec::new());
        }
        helpers::ancestor_chain(store, parent)
    }

    fn check_invariants<S: TreeStore>(&self, store: &S) -> Result<()> {
        if !self.opts.verify_after_mutation {
            return Ok(());
        }
        let report = verify_forest(store)?;
        if report.success {
            return Ok(());
        }
        let first = report
            .findings
            .first()
            .map(|finding| finding.message.clone())
            .unwrap_or_default();
        error!(
            findings = report.findings.len(),
            first = %first,
            "forest failed post-mutation verification"
        );
        Err(NestedSetError::InvariantViolation(format!(
            "{first} ({} finding(s))",
            report.findings.len()
        )))
    }
}

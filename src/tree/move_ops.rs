use tracing::{debug, trace};

use super::helpers::{park_subtree, shift_from_right_of, unpark_subtree};
use super::{NestedSet, Placement};
use crate::model::TreeNode;
use crate::store::{Changeset, Field, TreeStore};
use crate::types::{NestedSetError, NodeId, Result};

impl NestedSet {
    /// Moves `id` and its subtree under `new_parent`, or makes it a root when `None`.
    ///
    /// A node that becomes a root is appended after the current maximum. A
    /// node moved under a parent becomes that parent's last child. The
    /// subtree's internal shape and the relative order of its children are
    /// preserved; levels shift by the change in depth.
    ///
    /// Reparenting to the current parent writes nothing.
    ///
    /// # Errors
    /// * [`NestedSetError::NotFound`] when `id` does not exist.
    /// * [`NestedSetError::ParentNotFound`] when `new_parent` does not exist.
    /// * [`NestedSetError::CyclicMove`] when `new_parent` is `id` or one of its descendants.
    pub fn reparent<S: TreeStore>(
        &self,
        store: &mut S,
        id: NodeId,
        new_parent: Option<NodeId>,
    ) -> Result<Placement<S::Node>> {
        let node = store.get_by_id(id)?.ok_or(NestedSetError::NotFound(id))?;
        if node.parent_id() == new_parent {
            trace!(node = %id, "reparent to current parent skipped");
            return self.refresh(store, id);
        }

        let moved = match new_parent {
            None => move_to_root(store, &node)?,
            Some(parent) => move_under(store, &node, parent)?,
        };
        store.update_fields(id, &Changeset::new().parent(new_parent))?;
        debug!(node = %id, parent = ?new_parent, moved, "node reparented");

        self.check_invariants(store)?;
        self.refresh(store, id)
    }
}

/// Relocates `node`'s subtree after the last root of the forest.
fn move_to_root<S: TreeStore>(store: &mut S, node: &S::Node) -> Result<bool> {
    let span = node.interval();
    let width = span.width();
    let max = store
        .get_max_right()?
        .ok_or(NestedSetError::NotFound(node.id()))?;

    let tree_offset = (max.interval().right - width) + 1 - span.left;
    if tree_offset == 0 {
        return Ok(false);
    }
    let level_offset = -span.level;

    park_subtree(store, &span, tree_offset, level_offset)?;
    shift_from_right_of(store, span.right, width)?;
    unpark_subtree(store, 0)?;
    trace!(node = %node.id(), tree_offset, level_offset, width, "subtree promoted to root");
    Ok(true)
}

/// Relocates `node`'s subtree to the closing boundary of `parent_id`.
fn move_under<S: TreeStore>(store: &mut S, node: &S::Node, parent_id: NodeId) -> Result<bool> {
    let parent = store
        .get_by_id(parent_id)?
        .ok_or(NestedSetError::ParentNotFound(parent_id))?;
    let span = node.interval();
    let anchor = parent.interval();
    if parent_id == node.id() || (span.left <= anchor.left && anchor.right <= span.right) {
        return Err(NestedSetError::CyclicMove {
            node: node.id(),
            parent: parent_id,
        });
    }

    let width = span.width();
    let tree_offset = anchor.right - span.left;
    if tree_offset == 0 {
        return Ok(false);
    }
    let level_offset = anchor.level + 1 - span.level;

    park_subtree(store, &span, tree_offset, level_offset)?;
    shift_from_right_of(store, span.right, width)?;

    // Closing the old gap moves the parent's boundary when it sat right of the subtree.
    let parent = store
        .get_by_id(parent_id)?
        .ok_or(NestedSetError::ParentNotFound(parent_id))?;
    let boundary = parent.interval().right;
    shift_from_right_of(store, boundary, -width)?;
    store.update_fields(parent_id, &Changeset::new().add(Field::Right, width))?;

    let drift = boundary - anchor.right;
    unpark_subtree(store, drift)?;
    trace!(
        node = %node.id(),
        parent = %parent_id,
        tree_offset,
        level_offset,
        drift,
        width,
        "subtree moved under new parent"
    );
    Ok(true)
}

use tracing::debug;

use super::{NestedSet, Placement};
use crate::model::TreeNode;
use crate::store::{Changeset, Field, Predicate, TreeStore};
use crate::types::{Interval, NestedSetError, NodeId, Result};

impl NestedSet {
    /// Persists `node` at the position implied by its parent reference.
    ///
    /// Roots are appended after the current maximum `right` without touching
    /// any other row. Children become the last child of their parent: a
    /// width-2 gap is opened at the parent's closing boundary and the new node
    /// fills it.
    ///
    /// Any interval already on `node` is ignored, and so is its id; the store
    /// assigns one.
    ///
    /// # Errors
    /// * [`NestedSetError::ParentNotFound`] when the parent reference resolves to nothing.
    /// * Store errors, unchanged.
    pub fn insert<S: TreeStore>(
        &self,
        store: &mut S,
        mut node: S::Node,
    ) -> Result<Placement<S::Node>> {
        let interval = match node.parent_id() {
            None => root_slot(store)?,
            Some(parent) => open_child_slot(store, parent)?,
        };
        node.set_interval(interval);
        let id = store.create(&node)?;
        debug!(node = %id, parent = ?node.parent_id(), %interval, "node inserted");
        self.check_invariants(store)?;
        self.refresh(store, id)
    }
}

fn root_slot<S: TreeStore>(store: &S) -> Result<Interval> {
    let max = store
        .get_max_right()?
        .map(|node| node.interval().right)
        .unwrap_or(0);
    Ok(Interval::new(max + 1, max + 2, 0))
}

fn open_child_slot<S: TreeStore>(store: &mut S, parent_id: NodeId) -> Result<Interval> {
    let parent = store
        .get_by_id(parent_id)?
        .ok_or(NestedSetError::ParentNotFound(parent_id))?;
    let anchor = parent.interval();
    let boundary = anchor.right;
    store.update_where(
        &Predicate::all().ge(Field::Right, boundary),
        &Changeset::new().add(Field::Right, 2),
    )?;
    store.update_where(
        &Predicate::all().ge(Field::Left, boundary),
        &Changeset::new().add(Field::Left, 2),
    )?;
    Ok(Interval::new(boundary, boundary + 1, anchor.level + 1))
}

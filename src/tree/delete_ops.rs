use tracing::debug;

use super::helpers::shift_from_right_of;
use super::NestedSet;
use crate::model::TreeNode;
use crate::store::{Field, Predicate, TreeStore};
use crate::types::{NestedSetError, NodeId, Result};

impl NestedSet {
    /// Deletes `id` together with its whole subtree and closes the gap.
    ///
    /// Returns the refreshed ancestor chain of the deleted node, nearest first.
    ///
    /// # Errors
    /// * [`NestedSetError::NotFound`] when `id` does not exist.
    /// * Store errors, unchanged.
    pub fn delete<S: TreeStore>(&self, store: &mut S, id: NodeId) -> Result<Vec<S::Node>> {
        let target = store.get_by_id(id)?.ok_or(NestedSetError::NotFound(id))?;
        let span = target.interval();

        let descendants = store.delete_where(
            &Predicate::all()
                .gt(Field::Left, span.left)
                .lt(Field::Left, span.right),
        )?;
        store.delete_where(&Predicate::all().equals(Field::Left, span.left))?;

        let width = span.width();
        shift_from_right_of(store, span.right, width)?;
        debug!(node = %id, %span, width, descendants, "subtree deleted");

        self.check_invariants(store)?;
        self.refreshed_chain(store, target.parent_id())
    }
}

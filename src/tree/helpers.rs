use std::collections::HashSet;

use crate::model::TreeNode;
use crate::store::{Changeset, Field, Predicate, TreeStore};
use crate::types::{Interval, NestedSetError, NodeId, Result};

/// Slides everything positioned after `boundary` left by `offset`.
///
/// A negative `offset` opens a gap instead of closing one. Parked (negative)
/// rows never satisfy either predicate.
pub(crate) fn shift_from_right_of<S: TreeStore>(
    store: &mut S,
    boundary: i64,
    offset: i64,
) -> Result<u64> {
    let rights = store.update_where(
        &Predicate::all().gt(Field::Right, boundary),
        &Changeset::new().add(Field::Right, -offset),
    )?;
    let lefts = store.update_where(
        &Predicate::all().gt(Field::Left, boundary),
        &Changeset::new().add(Field::Left, -offset),
    )?;
    Ok(rights.max(lefts))
}

/// Moves the subtree spanned by `span` into negative territory.
///
/// Each row becomes `-(value + offset)` and its level is adjusted by
/// `level_offset`, so the subtree is invisible to the positive-range shifts
/// that follow.
pub(crate) fn park_subtree<S: TreeStore>(
    store: &mut S,
    span: &Interval,
    offset: i64,
    level_offset: i64,
) -> Result<u64> {
    store.update_where(
        &Predicate::all()
            .ge(Field::Left, span.left)
            .le(Field::Right, span.right),
        &Changeset::new()
            .negate_add(Field::Left, offset)
            .negate_add(Field::Right, offset)
            .add(Field::Level, level_offset),
    )
}

/// Flips every parked row back to positive coordinates, adding `drift`.
pub(crate) fn unpark_subtree<S: TreeStore>(store: &mut S, drift: i64) -> Result<u64> {
    store.update_where(
        &Predicate::all().lt(Field::Right, 0),
        &Changeset::new()
            .negate_add(Field::Left, -drift)
            .negate_add(Field::Right, -drift),
    )
}

/// Walks parent references from `parent` up to the root, nearest first.
pub(crate) fn ancestor_chain<S: TreeStore>(
    store: &S,
    mut parent: Option<NodeId>,
) -> Result<Vec<S::Node>> {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    while let Some(id) = parent {
        if !visited.insert(id) {
            return Err(NestedSetError::InvariantViolation(format!(
                "parent chain loops back to node {id}"
            )));
        }
        let node = store
            .get_by_id(id)?
            .ok_or(NestedSetError::ParentNotFound(id))?;
        parent = node.parent_id();
        chain.push(node);
    }
    Ok(chain)
}

//! Hierarchy reads answered with interval containment.
//!
//! Every function here issues a single range scan (plus a point read of the
//! anchor node) regardless of how deep or wide the hierarchy is.

use crate::model::TreeNode;
use crate::store::{Field, Predicate, TreeStore};
use crate::types::{NestedSetError, NodeId, Result};

fn anchor<S: TreeStore>(store: &S, id: NodeId) -> Result<S::Node> {
    store.get_by_id(id)?.ok_or(NestedSetError::NotFound(id))
}

/// All roots of the forest, in interval order.
pub fn roots<S: TreeStore>(store: &S) -> Result<Vec<S::Node>> {
    store.scan(&Predicate::all().equals(Field::Level, 0))
}

/// Direct children of `id`, in interval order.
///
/// # Errors
/// [`NestedSetError::NotFound`] when `id` does not exist.
pub fn children<S: TreeStore>(store: &S, id: NodeId) -> Result<Vec<S::Node>> {
    let span = anchor(store, id)?.interval();
    store.scan(
        &Predicate::all()
            .gt(Field::Left, span.left)
            .lt(Field::Right, span.right)
            .equals(Field::Level, span.level + 1),
    )
}

/// Collects the descendants of `id` in pre-order (interval order).
///
/// An optional depth limit bounds the expansion: `Some(1)` returns direct
/// children, `Some(2)` adds grandchildren, and `Some(0)` returns nothing.
///
/// # Arguments
/// * `store` - Transaction-scoped store to read from.
/// * `id` - Node whose descendants should be collected.
/// * `max_depth` - Optional limit expressed in levels below `id`.
///
/// # Errors
/// [`NestedSetError::NotFound`] when `id` does not exist, plus store errors.
///
/// # Example
/// ```rust
/// use nestset::{MemoryForest, NestedSet, Node, tree::query};
///
/// # fn main() -> nestset::Result<()> {
/// let forest = MemoryForest::new();
/// let tree = NestedSet::default();
/// let mut tx = forest.begin_write();
/// let root = tree.insert(&mut tx, Node::new("Electronics"))?.node;
/// let tv = tree.insert(&mut tx, Node::child_of(root.id, "Television"))?.node;
/// tree.insert(&mut tx, Node::child_of(tv.id, "LCD"))?;
///
/// assert_eq!(query::descendants(&tx, root.id, None)?.len(), 2);
/// assert_eq!(query::descendants(&tx, root.id, Some(1))?.len(), 1);
/// tx.commit();
/// # Ok(())
/// # }
/// ```
pub fn descendants<S: TreeStore>(
    store: &S,
    id: NodeId,
    max_depth: Option<usize>,
) -> Result<Vec<S::Node>> {
    let span = anchor(store, id)?.interval();
    let mut predicate = Predicate::all()
        .gt(Field::Left, span.left)
        .lt(Field::Left, span.right);
    if let Some(limit) = max_depth {
        if limit == 0 {
            return Ok(Vec::new());
        }
        // A limit past the representable range is the same as no limit.
        if let Some(deepest) = i64::try_from(limit)
            .ok()
            .and_then(|limit| span.level.checked_add(limit))
        {
            predicate = predicate.le(Field::Level, deepest);
        }
    }
    store.scan(&predicate)
}

/// `id` followed by all of its descendants, in interval order.
pub fn subtree<S: TreeStore>(store: &S, id: NodeId) -> Result<Vec<S::Node>> {
    let span = anchor(store, id)?.interval();
    store.scan(
        &Predicate::all()
            .ge(Field::Left, span.left)
            .le(Field::Right, span.right),
    )
}

/// Ancestors of `id`, root first.
///
/// # Errors
/// [`NestedSetError::NotFound`] when `id` does not exist.
pub fn ancestors<S: TreeStore>(store: &S, id: NodeId) -> Result<Vec<S::Node>> {
    let span = anchor(store, id)?.interval();
    store.scan(
        &Predicate::all()
            .lt(Field::Left, span.left)
            .gt(Field::Right, span.right),
    )
}

/// Parent of `id`, `None` for roots.
pub fn parent<S: TreeStore>(store: &S, id: NodeId) -> Result<Option<S::Node>> {
    match anchor(store, id)?.parent_id() {
        Some(parent) => Ok(Some(
            store
                .get_by_id(parent)?
                .ok_or(NestedSetError::ParentNotFound(parent))?,
        )),
        None => Ok(None),
    }
}

/// Other children of the same parent (or other roots), in interval order.
pub fn siblings<S: TreeStore>(store: &S, id: NodeId) -> Result<Vec<S::Node>> {
    let node = anchor(store, id)?;
    let peers = match node.parent_id() {
        Some(parent) => children(store, parent)?,
        None => roots(store)?,
    };
    Ok(peers.into_iter().filter(|peer| peer.id() != id).collect())
}

/// Whether `id` lies strictly inside `ancestor`'s interval.
pub fn is_descendant_of<S: TreeStore>(store: &S, id: NodeId, ancestor: NodeId) -> Result<bool> {
    let inner = anchor(store, id)?.interval();
    let outer = anchor(store, ancestor)?.interval();
    Ok(outer.contains(&inner))
}

/// Stored depth of `id`, 0 for roots.
pub fn depth<S: TreeStore>(store: &S, id: NodeId) -> Result<i64> {
    Ok(anchor(store, id)?.interval().level)
}

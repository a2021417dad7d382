//! In-process forest guarded by a single exclusive writer.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{ArcMutexGuard, Mutex, RawMutex, RwLock};
use tracing::trace;

use super::{Changeset, Predicate, TreeStore};
use crate::model::TreeNode;
use crate::types::{NestedSetError, NodeId, Result};

#[derive(Clone, Debug)]
struct Table<N> {
    rows: BTreeMap<NodeId, N>,
    next_id: u64,
}

impl<N> Default for Table<N> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

/// Shared in-memory forest.
///
/// Writers go through [`MemoryForest::begin_write`], which holds the writer
/// lock until the returned transaction is committed or dropped, so structural
/// mutations never interleave. Committed rows sit behind a separate
/// read-write lock, so [`MemoryForest::snapshot`] never waits on a writer and
/// is safe to call from the thread holding an open transaction.
pub struct MemoryForest<N> {
    writer: Arc<Mutex<()>>,
    committed: Arc<RwLock<Table<N>>>,
}

impl<N> Clone for MemoryForest<N> {
    fn clone(&self) -> Self {
        Self {
            writer: Arc::clone(&self.writer),
            committed: Arc::clone(&self.committed),
        }
    }
}

impl<N: TreeNode> Default for MemoryForest<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: TreeNode> MemoryForest<N> {
    /// Creates an empty forest.
    pub fn new() -> Self {
        Self {
            writer: Arc::new(Mutex::new(())),
            committed: Arc::new(RwLock::new(Table::default())),
        }
    }

    /// Starts the single write transaction, blocking while another writer is active.
    pub fn begin_write(&self) -> MemoryTransaction<N> {
        let guard = self.writer.lock_arc();
        let working = (*self.committed.read()).clone();
        MemoryTransaction {
            _writer: guard,
            committed: Arc::clone(&self.committed),
            working,
        }
    }

    /// Committed rows ordered by `left`; writes of an open transaction are not visible.
    pub fn snapshot(&self) -> Vec<N> {
        let table = self.committed.read();
        let mut rows: Vec<N> = table.rows.values().cloned().collect();
        rows.sort_by_key(|node| node.interval().left);
        rows
    }

    /// Number of committed rows.
    pub fn len(&self) -> usize {
        self.committed.read().rows.len()
    }

    /// Whether the forest holds no committed rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Write transaction over a [`MemoryForest`].
///
/// Works on a private copy of the table; [`MemoryTransaction::commit`]
/// publishes it, dropping the transaction discards it.
pub struct MemoryTransaction<N> {
    _writer: ArcMutexGuard<RawMutex, ()>,
    committed: Arc<RwLock<Table<N>>>,
    working: Table<N>,
}

impl<N> MemoryTransaction<N> {
    /// Publishes every write made through this transaction.
    pub fn commit(self) {
        trace!(rows = self.working.rows.len(), "memory forest commit");
        *self.committed.write() = self.working;
    }

    /// Discards every write made through this transaction.
    pub fn rollback(self) {
        trace!("memory forest rollback");
    }
}

impl<N: TreeNode> TreeStore for MemoryTransaction<N> {
    type Node = N;

    fn get_by_id(&self, id: NodeId) -> Result<Option<N>> {
        Ok(self.working.rows.get(&id).cloned())
    }

    fn get_max_right(&self) -> Result<Option<N>> {
        Ok(self
            .working
            .rows
            .values()
            .max_by_key(|node| node.interval().right)
            .cloned())
    }

    fn scan(&self, predicate: &Predicate) -> Result<Vec<N>> {
        let mut rows: Vec<N> = self
            .working
            .rows
            .values()
            .filter(|node| predicate.matches(&node.interval()))
            .cloned()
            .collect();
        rows.sort_by_key(|node| node.interval().left);
        Ok(rows)
    }

    fn create(&mut self, node: &N) -> Result<NodeId> {
        let id = NodeId(self.working.next_id);
        self.working.next_id += 1;
        let mut row = node.clone();
        row.set_id(id);
        self.working.rows.insert(id, row);
        Ok(id)
    }

    fn update_fields(&mut self, id: NodeId, changes: &Changeset) -> Result<()> {
        let row = self
            .working
            .rows
            .get_mut(&id)
            .ok_or(NestedSetError::NotFound(id))?;
        apply(row, changes);
        Ok(())
    }

    fn update_where(&mut self, predicate: &Predicate, changes: &Changeset) -> Result<u64> {
        // Select first so every row is matched against the pre-update state.
        let matched: Vec<NodeId> = self
            .working
            .rows
            .iter()
            .filter(|(_, node)| predicate.matches(&node.interval()))
            .map(|(id, _)| *id)
            .collect();
        for id in &matched {
            if let Some(row) = self.working.rows.get_mut(id) {
                apply(row, changes);
            }
        }
        Ok(matched.len() as u64)
    }

    fn delete_where(&mut self, predicate: &Predicate) -> Result<u64> {
        let before = self.working.rows.len();
        self.working
            .rows
            .retain(|_, node| !predicate.matches(&node.interval()));
        Ok((before - self.working.rows.len()) as u64)
    }
}

fn apply<N: TreeNode>(row: &mut N, changes: &Changeset) {
    let next = changes.apply_to(&row.interval());
    row.set_interval(next);
    if let Some(parent) = changes.parent_assignment() {
        row.set_parent_id(parent);
    }
}

//! Store adapters: the narrow record-store contract the maintainer runs against.
//!
//! Every adapter operates inside a transaction owned by the caller and never
//! opens one of its own. Range updates are set-based: a single call selects
//! its rows against one consistent pre-update snapshot and evaluates relative
//! assignments against each row's own stored value.

use std::fmt;

use crate::model::TreeNode;
use crate::types::{Interval, NodeId, Result};

pub mod memory;
pub mod schema;
pub mod sqlite;

pub use memory::{MemoryForest, MemoryTransaction};
pub use schema::Schema;
pub use sqlite::{write_transaction, SqliteStore};

/// Interval column addressed by predicates and assignments.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Field {
    /// Opening boundary.
    Left,
    /// Closing boundary.
    Right,
    /// Depth.
    Level,
}

impl Field {
    pub(crate) fn read(self, interval: &Interval) -> i64 {
        match self {
            Field::Left => interval.left,
            Field::Right => interval.right,
            Field::Level => interval.level,
        }
    }

    pub(crate) fn write(self, interval: &mut Interval, value: i64) {
        match self {
            Field::Left => interval.left = value,
            Field::Right => interval.right = value,
            Field::Level => interval.level = value,
        }
    }
}

/// Value assigned to a field, either literal or relative to the stored value.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Assign {
    /// `field = v`
    Value(i64),
    /// `field = field + k`
    Add(i64),
    /// `field = -(field + k)`
    NegateAdd(i64),
}

impl Assign {
    /// Computes the new value from the row's pre-update value.
    pub fn apply(self, current: i64) -> i64 {
        match self {
            Assign::Value(v) => v,
            Assign::Add(k) => current + k,
            Assign::NegateAdd(k) => -(current + k),
        }
    }
}

/// A set of field assignments applied to one row or one range of rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Changeset {
    assignments: Vec<(Field, Assign)>,
    parent: Option<Option<NodeId>>,
}

impl Changeset {
    /// Empty changeset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a literal value.
    pub fn set(self, field: Field, value: i64) -> Self {
        self.assign(field, Assign::Value(value))
    }

    /// Adds `delta` to the stored value.
    pub fn add(self, field: Field, delta: i64) -> Self {
        self.assign(field, Assign::Add(delta))
    }

    /// Replaces the stored value with `-(value + offset)`.
    pub fn negate_add(self, field: Field, offset: i64) -> Self {
        self.assign(field, Assign::NegateAdd(offset))
    }

    /// Adds an arbitrary assignment, replacing any earlier one for `field`.
    pub fn assign(mut self, field: Field, assign: Assign) -> Self {
        self.assignments.retain(|(existing, _)| *existing != field);
        self.assignments.push((field, assign));
        self
    }

    /// Sets the parent reference.
    pub fn parent(mut self, parent: Option<NodeId>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Interval assignments in insertion order.
    pub fn assignments(&self) -> &[(Field, Assign)] {
        &self.assignments
    }

    /// Parent assignment, if any.
    pub fn parent_assignment(&self) -> Option<Option<NodeId>> {
        self.parent
    }

    /// Whether applying the changeset would write nothing.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty() && self.parent.is_none()
    }

    /// Applies every assignment against the same pre-update interval.
    pub fn apply_to(&self, interval: &Interval) -> Interval {
        let mut next = *interval;
        for (field, assign) in &self.assignments {
            field.write(&mut next, assign.apply(field.read(interval)));
        }
        next
    }
}

/// Comparison operator of a predicate clause.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Cmp {
    /// `=`
    Eq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl Cmp {
    pub(crate) fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Cmp::Eq => lhs == rhs,
            Cmp::Lt => lhs < rhs,
            Cmp::Le => lhs <= rhs,
            Cmp::Gt => lhs > rhs,
            Cmp::Ge => lhs >= rhs,
        }
    }

    pub(crate) fn sql(self) -> &'static str {
        match self {
            Cmp::Eq => "=",
            Cmp::Lt => "<",
            Cmp::Le => "<=",
            Cmp::Gt => ">",
            Cmp::Ge => ">=",
        }
    }
}

/// Conjunction of range clauses over interval fields. Empty matches every row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Predicate {
    clauses: Vec<(Field, Cmp, i64)>,
}

impl Predicate {
    /// Predicate matching every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds a clause.
    pub fn with(mut self, field: Field, cmp: Cmp, value: i64) -> Self {
        self.clauses.push((field, cmp, value));
        self
    }

    /// `field = value`
    pub fn equals(self, field: Field, value: i64) -> Self {
        self.with(field, Cmp::Eq, value)
    }

    /// `field < value`
    pub fn lt(self, field: Field, value: i64) -> Self {
        self.with(field, Cmp::Lt, value)
    }

    /// `field <= value`
    pub fn le(self, field: Field, value: i64) -> Self {
        self.with(field, Cmp::Le, value)
    }

    /// `field > value`
    pub fn gt(self, field: Field, value: i64) -> Self {
        self.with(field, Cmp::Gt, value)
    }

    /// `field >= value`
    pub fn ge(self, field: Field, value: i64) -> Self {
        self.with(field, Cmp::Ge, value)
    }

    /// Clauses in insertion order.
    pub fn clauses(&self) -> &[(Field, Cmp, i64)] {
        &self.clauses
    }

    /// Evaluates the predicate against an interval.
    pub fn matches(&self, interval: &Interval) -> bool {
        self.clauses
            .iter()
            .all(|(field, cmp, value)| cmp.holds(field.read(interval), *value))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clauses.is_empty() {
            return f.write_str("*");
        }
        for (idx, (field, cmp, value)) in self.clauses.iter().enumerate() {
            if idx > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "{field:?} {} {value}", cmp.sql())?;
        }
        Ok(())
    }
}

/// Record-store primitives the interval maintainer is written against.
///
/// Implementations are transaction-scoped handles: every call runs inside the
/// caller's transaction and becomes visible to others only on commit.
pub trait TreeStore {
    /// Record type stored in the forest.
    type Node: TreeNode;

    /// Point read by primary key.
    fn get_by_id(&self, id: NodeId) -> Result<Option<Self::Node>>;

    /// The node currently holding the highest `right`; `None` for an empty forest.
    fn get_max_right(&self) -> Result<Option<Self::Node>>;

    /// Rows matching `predicate`, ordered by `left` ascending.
    fn scan(&self, predicate: &Predicate) -> Result<Vec<Self::Node>>;

    /// Persists a new row with the interval already computed; returns the assigned id.
    fn create(&mut self, node: &Self::Node) -> Result<NodeId>;

    /// Applies `changes` to a single row.
    fn update_fields(&mut self, id: NodeId, changes: &Changeset) -> Result<()>;

    /// Applies `changes` to every row matching `predicate` as one set-based operation.
    fn update_where(&mut self, predicate: &Predicate, changes: &Changeset) -> Result<u64>;

    /// Deletes every row matching `predicate`.
    fn delete_where(&mut self, predicate: &Predicate) -> Result<u64>;
}

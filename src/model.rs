//! Node records and the schema contract binding them to the interval fields.

use std::collections::BTreeMap;

use crate::types::{Interval, NodeId};

/// Binds a host record type to the fields the interval maintainer manages.
///
/// Implemented once per record type; the maintainer only ever touches a node
/// through these accessors.
pub trait TreeNode: Clone {
    /// Store-assigned identifier, `NodeId(0)` until the row is persisted.
    fn id(&self) -> NodeId;
    /// Records the identifier assigned by the store.
    fn set_id(&mut self, id: NodeId);
    /// Parent reference, `None` for roots.
    fn parent_id(&self) -> Option<NodeId>;
    /// Replaces the parent reference.
    fn set_parent_id(&mut self, parent: Option<NodeId>);
    /// Current nested-set coordinates.
    fn interval(&self) -> Interval;
    /// Overwrites the nested-set coordinates.
    fn set_interval(&mut self, interval: Interval);

    /// Whether the node sits at the top of its tree.
    fn is_root(&self) -> bool {
        self.parent_id().is_none()
    }
}

/// Opaque payload value carried by [`Node`].
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 text.
    String(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

/// Ready-made tree record with a name and free-form properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Store-assigned identifier.
    pub id: NodeId,
    /// Parent reference, `None` for roots.
    pub parent_id: Option<NodeId>,
    /// Nested-set coordinates, owned by the maintainer.
    pub interval: Interval,
    /// Display name.
    pub name: String,
    /// Arbitrary payload, opaque to the maintainer.
    pub properties: BTreeMap<String, PropertyValue>,
}

impl Node {
    /// Creates an unsaved root node.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeId(0),
            parent_id: None,
            interval: Interval::default(),
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Creates an unsaved node attached to `parent`.
    pub fn child_of(parent: NodeId, name: impl Into<String>) -> Self {
        let mut node = Self::new(name);
        node.parent_id = Some(parent);
        node
    }

    /// Adds a payload property.
    pub fn with_property(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

impl TreeNode for Node {
    fn id(&self) -> NodeId {
        self.id
    }

    fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }

    fn parent_id(&self) -> Option<NodeId> {
        self.parent_id
    }

    fn set_parent_id(&mut self, parent: Option<NodeId>) {
        self.parent_id = parent;
    }

    fn interval(&self) -> Interval {
        self.interval
    }

    fn set_interval(&mut self, interval: Interval) {
        self.interval = interval;
    }
}

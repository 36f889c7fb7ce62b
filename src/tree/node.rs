//! Tree nodes and the arena that owns them
//!
//! Children are addressed by id and owned by the arena. The `parent` field
//! is a plain back-reference used only to walk upward when building audit
//! trails; it never keeps anything alive.

use crate::model::Digest;
use crate::{Error, Result};

/// Address of a node inside a tree's arena
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeId {
    /// Index into the ordered leaf sequence
    Leaf(usize),
    /// Index into the internal nodes of the current build
    Internal(usize),
}

/// A vertex of the tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    digest: Digest,
    left: Option<NodeId>,
    right: Option<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    /// Create a leaf by hashing its data
    pub fn leaf(data: impl AsRef<[u8]>) -> Self {
        Node::from_digest(Digest::leaf(data.as_ref()))
    }

    /// Create a leaf from an already computed digest
    pub fn from_digest(digest: Digest) -> Self {
        Node {
            digest,
            left: None,
            right: None,
            parent: None,
        }
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none()
    }
}

/// Storage for the leaves and internal nodes of one tree
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    leaves: Vec<Node>,
    internal: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a leaf, detached from any previous parent
    pub fn push_leaf(&mut self, mut leaf: Node) -> NodeId {
        leaf.left = None;
        leaf.right = None;
        leaf.parent = None;
        self.leaves.push(leaf);
        NodeId::Leaf(self.leaves.len() - 1)
    }

    /// Create an internal node over `left` and an optional `right`
    ///
    /// Sets the children's parent to the new node. A missing right child
    /// means `left` is carried up and its digest reused as is.
    pub fn make_parent(&mut self, left: NodeId, right: Option<NodeId>) -> Result<NodeId> {
        let left_digest = *self.require(left)?.digest();
        let right_digest = match right {
            Some(id) => Some(*self.require(id)?.digest()),
            None => None,
        };

        let id = NodeId::Internal(self.internal.len());
        self.internal.push(Node {
            digest: Digest::combine(&left_digest, right_digest.as_ref()),
            left: Some(left),
            right,
            parent: None,
        });

        self.set_parent(left, Some(id));
        if let Some(right) = right {
            self.set_parent(right, Some(id));
        }

        Ok(id)
    }

    /// Drop every internal node and detach all leaves
    pub fn clear_internal(&mut self) {
        self.internal.clear();
        for leaf in &mut self.leaves {
            leaf.parent = None;
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        match id {
            NodeId::Leaf(i) => self.leaves.get(i),
            NodeId::Internal(i) => self.internal.get(i),
        }
    }

    /// Like `get`, but an unknown id is an integrity error
    pub fn require(&self, id: NodeId) -> Result<&Node> {
        self.get(id)
            .ok_or_else(|| Error::Integrity(format!("unknown node {:?}", id)))
    }

    pub fn leaves(&self) -> &[Node] {
        &self.leaves
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    pub fn internal_count(&self) -> usize {
        self.internal.len()
    }

    fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        let node = match id {
            NodeId::Leaf(i) => self.leaves.get_mut(i),
            NodeId::Internal(i) => self.internal.get_mut(i),
        };
        if let Some(node) = node {
            node.parent = parent;
        }
    }
}

//! Acyclic persisted form of a tree
//!
//! Nodes are written as a flat post-order list: a node's children always
//! come before it, the left subtree before the right, and the root is last.
//! Children are referenced by index; parent back-references are never
//! written out. Restoring recreates every internal node through the arena
//! (which re-derives each child's parent) and re-hashes as it goes.

use crate::model::Digest;
use crate::tree::{MerkleTree, NodeArena, NodeId};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A node without its parent pointer; children are indices into the
/// enclosing node list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedNode {
    pub hash: Digest,
    pub left: Option<u32>,
    pub right: Option<u32>,
}

impl PersistedNode {
    pub fn leaf(hash: Digest) -> Self {
        PersistedNode {
            hash,
            left: None,
            right: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// A whole tree: its leaf sequence and, once built, its nodes in post-order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedTree {
    pub nodes: Vec<PersistedNode>,
    pub leaves: Vec<Digest>,
}

impl PersistedTree {
    /// The root entry, if the tree was built
    pub fn root(&self) -> Option<&PersistedNode> {
        self.nodes.last()
    }
}

/// Per-entry bookkeeping while importing
#[derive(Clone, Copy)]
struct Imported {
    id: NodeId,
    /// Index of the first entry of this node's subtree
    first: usize,
    height: usize,
}

/// Rebuilds an arena from a node list, claiming leaves in order
struct Importer<'a> {
    arena: NodeArena,
    leaves: &'a [Digest],
    next_leaf: usize,
}

impl<'a> Importer<'a> {
    fn new(leaves: &'a [Digest]) -> Self {
        let mut arena = NodeArena::new();
        for digest in leaves {
            arena.push_leaf(crate::Node::from_digest(*digest));
        }
        Importer {
            arena,
            leaves,
            next_leaf: 0,
        }
    }

    fn claim_leaf(&mut self, hash: &Digest) -> Result<NodeId> {
        let index = self.next_leaf;
        match self.leaves.get(index) {
            Some(expected) if expected == hash => {
                self.next_leaf += 1;
                Ok(NodeId::Leaf(index))
            }
            Some(expected) => Err(Error::Corruption(format!(
                "leaf {} is {} in the tree but {} in the leaf list",
                index,
                hash.short(),
                expected.short()
            ))),
            None => Err(Error::Corruption(format!(
                "tree has more than {} leaves",
                self.leaves.len()
            ))),
        }
    }

    /// Import a post-order node list, returning the root id and height
    ///
    /// The layout must be exactly the one `to_persisted` writes: a right
    /// child sits just before its parent, a left child just before the
    /// first entry of its right sibling's subtree (or just before a parent
    /// without a right child), and the root's subtree spans the whole list.
    /// The height must be the one `build` gives for the leaves covered.
    fn import(&mut self, nodes: &[PersistedNode]) -> Result<(NodeId, usize)> {
        let mut imported: Vec<Imported> = Vec::with_capacity(nodes.len());

        for (index, node) in nodes.iter().enumerate() {
            let entry = match (node.left, node.right) {
                (None, None) => Imported {
                    id: self.claim_leaf(&node.hash)?,
                    first: index,
                    height: 0,
                },
                (None, Some(_)) => {
                    return Err(Error::Corruption(format!(
                        "node {} has a right child but no left child",
                        index
                    )))
                }
                (Some(left), right) => {
                    let right = match right {
                        Some(right) => Some(expect_child(&imported, index, right, index)?),
                        None => None,
                    };
                    let left_slot = right.map_or(index, |r| r.first);
                    let left = expect_child(&imported, index, left, left_slot)?;

                    let id = self.arena.make_parent(left.id, right.map(|r| r.id))?;
                    let digest = self.arena.require(id)?.digest();
                    if digest != &node.hash {
                        return Err(Error::Corruption(format!(
                            "node {} is {} but re-hashes to {}",
                            index,
                            node.hash.short(),
                            digest.short()
                        )));
                    }

                    Imported {
                        id,
                        first: left.first,
                        height: left.height.max(right.map_or(0, |r| r.height)) + 1,
                    }
                }
            };
            imported.push(entry);
        }

        let root = imported
            .last()
            .copied()
            .ok_or_else(|| Error::Corruption("node list is empty".into()))?;
        if root.first != 0 {
            return Err(Error::Corruption(format!(
                "{} nodes are not reachable from the root",
                root.first
            )));
        }
        // `build` yields ceil(log2 n) levels over n leaves
        let expected = self.next_leaf.next_power_of_two().trailing_zeros() as usize;
        if root.height != expected {
            return Err(Error::Corruption(format!(
                "tree over {} leaves has height {}, expected {}",
                self.next_leaf, root.height, expected
            )));
        }
        if self.next_leaf != self.leaves.len() {
            // Leaves appended after the last build stay detached
            tracing::debug!(
                built = self.next_leaf,
                leaves = self.leaves.len(),
                "snapshot has unbuilt leaves"
            );
        }
        Ok((root.id, root.height))
    }
}

/// Check that the child of entry `parent` sits at `slot` and return it
fn expect_child(imported: &[Imported], parent: usize, child: u32, slot: usize) -> Result<Imported> {
    let child = child as usize;
    if slot == 0 || child != slot - 1 {
        return Err(Error::Corruption(format!(
            "node {} references child {} out of post-order",
            parent, child
        )));
    }
    imported
        .get(child)
        .copied()
        .ok_or_else(|| Error::Corruption(format!("node {} references missing child {}", parent, child)))
}

impl MerkleTree {
    /// Convert to the acyclic persisted form
    pub fn to_persisted(&self) -> Result<PersistedTree> {
        let nodes = match self.root_id() {
            Some(root) => self.persist_nodes(root)?,
            None => Vec::new(),
        };
        Ok(PersistedTree {
            nodes,
            leaves: self.leaves().iter().map(|l| *l.digest()).collect(),
        })
    }

    /// Restore a tree, re-deriving every parent back-reference
    ///
    /// Childless nodes must match `leaves` in order and every internal
    /// digest must re-hash from its children. An empty node list restores
    /// the leaves unbuilt.
    pub fn from_persisted(persisted: &PersistedTree) -> Result<Self> {
        let mut importer = Importer::new(&persisted.leaves);
        let (root, height) = if persisted.nodes.is_empty() {
            (None, 0)
        } else {
            let (id, height) = importer.import(&persisted.nodes)?;
            (Some(id), height)
        };
        tracing::debug!(
            leaves = persisted.leaves.len(),
            height,
            "restored tree from snapshot"
        );
        Ok(MerkleTree::from_parts(importer.arena, root, height))
    }

    /// Restore a tree from a bare post-order node list; its childless
    /// nodes become the leaves
    ///
    /// The list must describe a tree as `build` lays it out over those
    /// leaves, e.g. the left subtree of a persisted root.
    pub fn from_persisted_nodes(nodes: &[PersistedNode]) -> Result<Self> {
        let leaves: Vec<Digest> = nodes
            .iter()
            .filter(|n| n.is_leaf())
            .map(|n| n.hash)
            .collect();
        let mut importer = Importer::new(&leaves);
        let (root, height) = importer.import(nodes)?;
        Ok(MerkleTree::from_parts(importer.arena, Some(root), height))
    }

    /// Lay out the graph under `root` in post-order
    fn persist_nodes(&self, root: NodeId) -> Result<Vec<PersistedNode>> {
        enum Visit {
            Enter(NodeId),
            Exit(NodeId),
        }

        let mut nodes = Vec::with_capacity(self.leaf_count() * 2);
        let mut stack = vec![Visit::Enter(root)];
        let mut done: Vec<u32> = Vec::new();

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(id) => {
                    let node = self.arena().require(id)?;
                    stack.push(Visit::Exit(id));
                    if let Some(right) = node.right() {
                        stack.push(Visit::Enter(right));
                    }
                    if let Some(left) = node.left() {
                        stack.push(Visit::Enter(left));
                    }
                }
                Visit::Exit(id) => {
                    let node = self.arena().require(id)?;
                    let right = match node.right() {
                        Some(_) => done.pop(),
                        None => None,
                    };
                    let left = match node.left() {
                        Some(_) => done.pop(),
                        None => None,
                    };
                    let index = u32::try_from(nodes.len()).map_err(|_| {
                        Error::Structural("tree has too many nodes to persist".into())
                    })?;
                    nodes.push(PersistedNode {
                        hash: *node.digest(),
                        left,
                        right,
                    });
                    done.push(index);
                }
            }
        }

        Ok(nodes)
    }
}

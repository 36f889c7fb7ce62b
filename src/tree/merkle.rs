//! Merkle tree construction, leaf lookup and audit trails

use super::{Node, NodeArena, NodeId};
use crate::model::{AuditProof, Branch, Digest, ProofHash};
use crate::{Error, Result};

/// A binary Merkle tree over an ordered sequence of leaves
///
/// Leaves are appended without rebuilding. `build` derives a fresh internal
/// graph from the current leaves and replaces whatever the previous build
/// produced. The tree is not synchronised: callers that share one across
/// threads must serialise `build` against every other operation.
#[derive(Clone, Debug, Default)]
pub struct MerkleTree {
    arena: NodeArena,
    root: Option<NodeId>,
    height: usize,
}

impl MerkleTree {
    /// Create an empty, unbuilt tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unbuilt tree from existing leaves
    pub fn from_leaves(leaves: impl IntoIterator<Item = Node>) -> Self {
        let mut tree = Self::new();
        for leaf in leaves {
            tree.append_leaf(leaf);
        }
        tree
    }

    /// Create an unbuilt tree, hashing each item into a leaf
    pub fn from_data<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        Self::from_leaves(items.into_iter().map(Node::leaf))
    }

    /// Append a leaf; the tree is not rebuilt
    pub fn append_leaf(&mut self, leaf: Node) -> NodeId {
        self.arena.push_leaf(leaf)
    }

    pub fn leaf_count(&self) -> usize {
        self.arena.leaf_count()
    }

    pub fn leaves(&self) -> &[Node] {
        self.arena.leaves()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    pub fn root_id(&self) -> Option<NodeId> {
        self.root
    }

    /// The root of the last successful build
    pub fn root(&self) -> Option<&Node> {
        self.root.and_then(|id| self.arena.get(id))
    }

    pub fn root_digest(&self) -> Option<Digest> {
        self.root().map(|n| *n.digest())
    }

    /// Number of internal levels produced by the last build
    pub fn height(&self) -> usize {
        self.height
    }

    /// (Re)build the tree from its leaves and return the root
    ///
    /// Each level is scanned left to right in pairs; the last node of an
    /// odd-length level is carried up alone. Runs level by level, so stack
    /// use does not grow with the leaf count.
    pub fn build(&mut self) -> Result<NodeId> {
        let count = self.arena.leaf_count();
        if count == 0 {
            return Err(Error::Structural("leaves is empty".into()));
        }

        self.arena.clear_internal();
        self.root = None;
        self.height = 0;

        let mut level: Vec<NodeId> = (0..count).map(NodeId::Leaf).collect();
        while level.len() > 1 {
            let mut parents = Vec::with_capacity(level.len().div_ceil(2));
            for pair in level.chunks(2) {
                parents.push(self.arena.make_parent(pair[0], pair.get(1).copied())?);
            }
            self.height += 1;
            tracing::debug!(height = self.height, nodes = parents.len(), "built tree level");
            level = parents;
        }

        let root = level[0];
        let root_digest = *self.arena.require(root)?.digest();
        self.root = Some(root);
        tracing::debug!(
            leaves = count,
            height = self.height,
            root = %root_digest.short(),
            "tree built"
        );
        Ok(root)
    }

    /// Find the first leaf whose digest equals `digest`
    pub fn find_leaf(&self, digest: &Digest) -> Option<NodeId> {
        self.arena
            .leaves()
            .iter()
            .position(|leaf| leaf.digest() == digest)
            .map(NodeId::Leaf)
    }

    /// Collect sibling digests from `child` up to the root
    ///
    /// `parent` must be the recorded parent of `child`; a `None` parent
    /// yields an empty trail.
    pub fn build_audit_trail(
        &self,
        parent: Option<NodeId>,
        child: NodeId,
    ) -> Result<Vec<ProofHash>> {
        let mut trail = Vec::with_capacity(self.height);
        let mut parent = parent;
        let mut child = child;

        while let Some(parent_id) = parent {
            let child_node = self.arena.require(child)?;
            if child_node.parent() != Some(parent_id) {
                tracing::warn!(?parent_id, ?child, "parent/child linkage mismatch");
                return Err(Error::Integrity(format!(
                    "parent of {:?} is not expected parent {:?}",
                    child, parent_id
                )));
            }

            let parent_node = self.arena.require(parent_id)?;
            let (sibling, direction) = if parent_node.left() == Some(child) {
                (parent_node.right(), Branch::Right)
            } else {
                (parent_node.left(), Branch::Left)
            };

            // A carried-up parent has no right sibling; its digest equals the
            // child's, so the level contributes no step.
            if let Some(sibling) = sibling {
                let sibling = self.arena.require(sibling)?;
                trail.push(ProofHash::new(*sibling.digest(), direction));
            }

            child = parent_id;
            parent = parent_node.parent();
        }

        Ok(trail)
    }

    /// Produce an inclusion proof for the leaf with digest `target`
    ///
    /// Returns `Ok(None)` when no leaf matches. A leaf without a parent
    /// (a single-leaf tree, or a leaf appended since the last build) is a
    /// structural error.
    pub fn audit_proof(&self, target: &Digest) -> Result<Option<AuditProof>> {
        let leaf_id = match self.find_leaf(target) {
            Some(id) => id,
            None => return Ok(None),
        };

        let parent = self
            .arena
            .require(leaf_id)?
            .parent()
            .ok_or_else(|| Error::Structural("expected leaf hash to have a parent hash".into()))?;

        let trail = self.build_audit_trail(Some(parent), leaf_id)?;
        tracing::debug!(target = %target.short(), steps = trail.len(), "audit proof built");
        Ok(Some(AuditProof::new(*target, trail)))
    }

    /// Check that `target` is a leaf included under `root`
    ///
    /// Never fails: a missing leaf or a proof error is reported as `false`.
    pub fn verify(&self, root: &Digest, target: &Digest) -> bool {
        match self.audit_proof(target) {
            Ok(Some(proof)) => proof.verify(root),
            Ok(None) | Err(_) => false,
        }
    }

    pub(crate) fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Install an already wired arena, as done when restoring a snapshot
    pub(crate) fn from_parts(arena: NodeArena, root: Option<NodeId>, height: usize) -> Self {
        MerkleTree {
            arena,
            root,
            height,
        }
    }
}

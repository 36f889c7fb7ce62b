//! Audit proof steps

use super::Digest;
use serde::{Deserialize, Serialize};

/// Which side of the proof path a sibling digest sits on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Branch {
    /// Reserved for consistency proofs between two roots; never produced
    /// by inclusion proofs
    OldRoot,
    /// The sibling is the left child, the path node is on the right
    Left,
    /// The sibling is the right child, the path node is on the left
    Right,
}

impl Branch {
    pub fn as_byte(&self) -> u8 {
        match self {
            Branch::OldRoot => 0,
            Branch::Left => 1,
            Branch::Right => 2,
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Branch::OldRoot),
            1 => Some(Branch::Left),
            2 => Some(Branch::Right),
            _ => None,
        }
    }
}

/// One step of an audit trail
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofHash {
    /// Digest of the node next to the path at this level
    pub hash: Digest,
    pub direction: Branch,
}

impl ProofHash {
    pub fn new(hash: Digest, direction: Branch) -> Self {
        ProofHash { hash, direction }
    }
}

/// An inclusion proof for one leaf
///
/// Steps are ordered leaf to root: index 0 is the sibling on the leaf's own
/// level, the last step is the sibling just below the root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditProof {
    /// Digest of the leaf being proven
    pub target: Digest,
    pub trail: Vec<ProofHash>,
}

impl AuditProof {
    pub fn new(target: Digest, trail: Vec<ProofHash>) -> Self {
        AuditProof { target, trail }
    }

    /// Number of steps in the trail
    pub fn len(&self) -> usize {
        self.trail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trail.is_empty()
    }

    /// Check this proof against a claimed root
    pub fn verify(&self, root: &Digest) -> bool {
        crate::ops::verify_audit(root, &self.target, &self.trail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_byte_values() {
        for branch in [Branch::OldRoot, Branch::Left, Branch::Right] {
            assert_eq!(Branch::from_byte(branch.as_byte()), Some(branch));
        }
        assert_eq!(Branch::Left.as_byte(), 1);
        assert_eq!(Branch::Right.as_byte(), 2);
        assert_eq!(Branch::from_byte(3), None);
    }

    #[test]
    fn test_proof_json_shape() {
        let proof = AuditProof::new(
            Digest::leaf(b"2"),
            vec![ProofHash::new(Digest::leaf(b"1"), Branch::Left)],
        );
        let json = serde_json::to_string(&proof).unwrap();
        assert!(json.contains("\"direction\":\"Left\""));
        assert!(json.contains(&format!("\"target\":\"{}\"", Digest::leaf(b"2").to_hex())));

        let restored: AuditProof = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, proof);
        assert_eq!(restored.len(), 1);
    }
}

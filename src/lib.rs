//! # merkle_audit
//!
//! A binary Merkle hash tree over an ordered list of leaves, with compact
//! audit proofs that a leaf is included under a claimed root.
//!
//! ## Core Concepts
//!
//! - **Leaves**: SHA-256 digests of external data, kept in insertion order
//! - **Build**: pairwise reduction, level by level; an unpaired node is
//!   carried up without re-hashing
//! - **Audit trail**: sibling digests from a leaf up to the root, each tagged
//!   with the side the sibling sits on
//! - **Verification**: replay the trail from the leaf digest and compare
//!   with the root
//!
//! ## Example
//!
//! ```
//! use merkle_audit::{verify_audit, Digest, MerkleTree};
//!
//! let mut tree = MerkleTree::from_data(["1", "2", "3"]);
//! tree.build()?;
//!
//! let root = tree.root_digest().unwrap();
//! let target = Digest::leaf(b"2");
//! let proof = tree.audit_proof(&target)?.unwrap();
//! assert!(verify_audit(&root, &target, &proof.trail));
//! # Ok::<(), merkle_audit::Error>(())
//! ```

pub mod model;
pub mod ops;
pub mod store;
pub mod tree;

mod error;

pub use error::{Error, Result};
pub use model::{AuditProof, Branch, Digest, ProofHash, DIGEST_LEN};
pub use ops::verify_audit;
pub use store::{PersistedNode, PersistedTree};
pub use tree::{MerkleTree, Node, NodeId};

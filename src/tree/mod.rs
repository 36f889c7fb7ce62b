//! Binary Merkle tree over an ordered list of leaves
//!
//! - Leaf digests are `H(data)`
//! - A pair of siblings combines to `H(left || right)`
//! - The unpaired last node of an odd level is carried up unchanged
//! - Every node keeps a back-reference to its parent so audit trails can be
//!   collected by walking from a leaf to the root

mod merkle;
mod node;

pub use merkle::MerkleTree;
pub use node::{Node, NodeArena, NodeId};

//! Behavioural properties of tree construction, proofs and verification

use merkle_audit::{verify_audit, Branch, Digest, Error, MerkleTree, Node, ProofHash};

fn h(data: &[u8]) -> Digest {
    Digest::leaf(data)
}

fn pair(left: &Digest, right: &Digest) -> Digest {
    Digest::combine(left, Some(right))
}

fn numbered(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("leaf-{}", i)).collect()
}

#[test]
fn test_every_leaf_verifies_for_many_sizes() {
    for n in 1..=33 {
        let items = numbered(n);
        let mut tree = MerkleTree::from_data(&items);
        tree.build().unwrap();
        let root = tree.root_digest().unwrap();

        let expected_height = (n as f64).log2().ceil() as usize;
        assert_eq!(tree.height(), expected_height, "height for {} leaves", n);

        if n == 1 {
            assert!(tree.root().unwrap().parent().is_none());
            assert_eq!(root, h(items[0].as_bytes()));
            continue;
        }

        for item in &items {
            let target = h(item.as_bytes());
            assert!(tree.verify(&root, &target), "{} of {} should verify", item, n);

            let proof = tree.audit_proof(&target).unwrap().unwrap();
            assert!(proof.len() <= expected_height);
            assert!(verify_audit(&root, &target, &proof.trail));
        }
    }
}

#[test]
fn test_absent_digest_does_not_verify() {
    let mut tree = MerkleTree::from_data(numbered(6));
    tree.build().unwrap();
    let root = tree.root_digest().unwrap();

    assert!(!tree.verify(&root, &h(b"not in tree")));
    assert!(tree.audit_proof(&h(b"not in tree")).unwrap().is_none());
}

#[test]
fn test_wrong_root_does_not_verify() {
    let mut tree = MerkleTree::from_data(numbered(4));
    tree.build().unwrap();

    assert!(!tree.verify(&h(b"some other root"), &h(b"leaf-1")));
}

#[test]
fn test_bit_flip_breaks_prior_proof() {
    let items = numbered(5);
    let mut tree = MerkleTree::from_data(&items);
    tree.build().unwrap();
    let root = tree.root_digest().unwrap();

    let original = items[2].as_bytes().to_vec();
    let proof = tree.audit_proof(&h(&original)).unwrap().unwrap();

    for byte in 0..original.len() {
        for bit in 0..8 {
            let mut flipped = original.clone();
            flipped[byte] ^= 1 << bit;
            let digest = h(&flipped);
            assert_ne!(digest, h(&original));
            assert!(!verify_audit(&root, &digest, &proof.trail));
        }
    }
}

#[test]
fn test_three_leaf_example() {
    let mut tree = MerkleTree::from_data(["1", "2", "3"]);
    tree.build().unwrap();

    let expected_root = pair(&pair(&h(b"1"), &h(b"2")), &h(b"3"));
    assert_eq!(tree.root_digest(), Some(expected_root));

    let proof = tree.audit_proof(&h(b"2")).unwrap().unwrap();
    assert_eq!(
        proof.trail,
        vec![
            ProofHash::new(h(b"1"), Branch::Left),
            ProofHash::new(h(b"3"), Branch::Right),
        ]
    );
}

#[test]
fn test_carried_up_leaf_proof() {
    let mut tree = MerkleTree::from_data(["1", "2", "3"]);
    tree.build().unwrap();
    let root = tree.root_digest().unwrap();

    // "3" is carried up once, so its only step is the left subtree
    let proof = tree.audit_proof(&h(b"3")).unwrap().unwrap();
    assert_eq!(
        proof.trail,
        vec![ProofHash::new(pair(&h(b"1"), &h(b"2")), Branch::Left)]
    );
    assert!(proof.verify(&root));
}

#[test]
fn test_single_leaf_proof_is_structural_error() {
    let mut tree = MerkleTree::from_data(["1"]);
    tree.build().unwrap();

    let result = tree.audit_proof(&h(b"1"));
    assert!(matches!(result, Err(Error::Structural(_))));
    assert!(!tree.verify(&h(b"1"), &h(b"1")));
}

#[test]
fn test_duplicate_leaves_resolve_to_first() {
    let mut tree = MerkleTree::new();
    tree.append_leaf(Node::leaf(b"dup"));
    tree.append_leaf(Node::leaf(b"other"));
    tree.append_leaf(Node::leaf(b"dup"));
    tree.build().unwrap();
    let root = tree.root_digest().unwrap();

    assert_eq!(tree.find_leaf(&h(b"dup")), Some(merkle_audit::NodeId::Leaf(0)));

    // The proof is for the first occurrence
    let proof = tree.audit_proof(&h(b"dup")).unwrap().unwrap();
    assert_eq!(proof.trail[0], ProofHash::new(h(b"other"), Branch::Right));
    assert!(proof.verify(&root));
}

#[test]
fn test_rebuild_after_append_moves_proofs_to_new_root() {
    let mut tree = MerkleTree::from_data(["a", "b"]);
    tree.build().unwrap();
    let old_root = tree.root_digest().unwrap();
    let old_proof = tree.audit_proof(&h(b"a")).unwrap().unwrap();

    tree.append_leaf(Node::leaf(b"c"));
    tree.build().unwrap();
    let new_root = tree.root_digest().unwrap();

    assert!(old_proof.verify(&old_root));
    assert!(!old_proof.verify(&new_root));
    assert!(tree.verify(&new_root, &h(b"a")));
    assert!(tree.verify(&new_root, &h(b"c")));
}

#[test]
fn test_proof_survives_the_wire() {
    let mut tree = MerkleTree::from_data(numbered(7));
    tree.build().unwrap();
    let root = tree.root_digest().unwrap();

    let proof = tree.audit_proof(&h(b"leaf-6")).unwrap().unwrap();
    let bytes = serde_json::to_vec(&proof).unwrap();
    let received: merkle_audit::AuditProof = serde_json::from_slice(&bytes).unwrap();

    assert!(verify_audit(&root, &received.target, &received.trail));
}

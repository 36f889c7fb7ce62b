//! Reading and writing snapshots on disk
//!
//! Two encodings are supported: JSON for interchange and bincode for a
//! compact binary file. Both carry the same `PersistedTree`.

use super::PersistedTree;
use crate::tree::MerkleTree;
use crate::Result;
use std::fs;
use std::path::Path;

/// On-disk encoding of a snapshot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    Bincode,
}

impl Format {
    /// `.bin` files are bincode, anything else is JSON
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some("bin") => Format::Bincode,
            _ => Format::Json,
        }
    }

    pub fn encode(&self, snapshot: &PersistedTree) -> Result<Vec<u8>> {
        let bytes = match self {
            Format::Json => serde_json::to_vec_pretty(snapshot)?,
            Format::Bincode => bincode::serialize(snapshot)?,
        };
        Ok(bytes)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<PersistedTree> {
        let snapshot = match self {
            Format::Json => serde_json::from_slice(bytes)?,
            Format::Bincode => bincode::deserialize(bytes)?,
        };
        Ok(snapshot)
    }
}

/// Write `tree` to `path`, picking the format from the extension
pub fn save(tree: &MerkleTree, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let format = Format::from_path(path);
    let bytes = format.encode(&tree.to_persisted()?)?;
    fs::write(path, bytes)?;
    tracing::debug!(path = %path.display(), ?format, "saved tree");
    Ok(())
}

/// Read a tree from `path` and restore its parent links
pub fn load(path: impl AsRef<Path>) -> Result<MerkleTree> {
    let path = path.as_ref();
    let format = Format::from_path(path);
    let bytes = fs::read(path)?;
    let tree = MerkleTree::from_persisted(&format.decode(&bytes)?)?;
    tracing::debug!(path = %path.display(), ?format, "loaded tree");
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PersistedNode;
    use crate::{Digest, Error};
    use tempfile::tempdir;

    fn sample() -> MerkleTree {
        let mut tree = MerkleTree::from_data(["a", "b", "c"]);
        tree.build().unwrap();
        tree
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path("tree.bin"), Format::Bincode);
        assert_eq!(Format::from_path("tree.json"), Format::Json);
        assert_eq!(Format::from_path("tree"), Format::Json);
    }

    #[test]
    fn test_save_load_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tree.json");
        let tree = sample();

        save(&tree, &path).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded.root_digest(), tree.root_digest());
        assert!(loaded.verify(&tree.root_digest().unwrap(), &Digest::leaf(b"c")));
    }

    #[test]
    fn test_save_load_bincode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tree.bin");
        let tree = sample();

        save(&tree, &path).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded.root_digest(), tree.root_digest());
        assert_eq!(loaded.leaf_count(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_load_garbage_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tree.json");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(matches!(load(&path), Err(Error::Json(_))));
    }

    #[test]
    fn test_load_garbage_bincode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tree.bin");
        std::fs::write(&path, [0xffu8; 5]).unwrap();
        assert!(matches!(load(&path), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_load_deep_bincode_chain_is_an_error() {
        // One leaf under a 200k-long chain of lone-child parents: every
        // entry is well formed, but no build produces such a tree
        let leaf = Digest::leaf(b"1");
        let mut nodes = vec![PersistedNode::leaf(leaf)];
        for i in 0..200_000u32 {
            nodes.push(PersistedNode {
                hash: leaf,
                left: Some(i),
                right: None,
            });
        }
        let snapshot = PersistedTree {
            nodes,
            leaves: vec![leaf],
        };

        let dir = tempdir().unwrap();
        let path = dir.path().join("deep.bin");
        std::fs::write(&path, Format::Bincode.encode(&snapshot).unwrap()).unwrap();

        assert!(matches!(load(&path), Err(Error::Corruption(_))));
    }
}

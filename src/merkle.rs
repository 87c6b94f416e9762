//! SHA-256 binary Merkle tree commitment
//!
//! A complete binary tree over the SHA-256 digests of an opaque leaf
//! sequence. Odd levels duplicate the last node as its own sibling
//! (spec.md §3/§4.3). No domain-separation prefix is used, matching the
//! reference this design is distilled from — implementers may add one, but
//! then the wire encoding is no longer identical, so this crate does not.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub type Digest32 = [u8; 32];

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum MerkleError {
    #[error("leaf index {index} out of range (len={len})")]
    IndexOutOfRange { index: usize, len: usize },
}

fn hash_leaf(leaf: &[u8]) -> Digest32 {
    Sha256::digest(leaf).into()
}

fn hash_node(left: &Digest32, right: &Digest32) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

fn empty_root() -> Digest32 {
    Sha256::digest(b"empty").into()
}

/// One step of an inclusion path: the sibling digest and whether the node
/// being proven was the left child at that level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathStep {
    #[serde(with = "hex_digest")]
    pub sibling: Digest32,
    pub is_left: bool,
}

/// A Merkle inclusion proof: ordered sibling digests from leaf to root.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct InclusionProof {
    pub steps: Vec<PathStep>,
}

/// A complete binary Merkle tree over a leaf sequence, committed with
/// SHA-256.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    levels: Vec<Vec<Digest32>>,
}

impl MerkleTree {
    /// Build the tree over `leaves`, each independently hashed to form level
    /// 0. An empty leaf set yields the deterministic sentinel root
    /// `SHA-256("empty")`.
    pub fn build<L: AsRef<[u8]>>(leaves: &[L]) -> Self {
        if leaves.is_empty() {
            return MerkleTree { levels: vec![] };
        }
        let mut level: Vec<Digest32> = leaves.iter().map(|l| hash_leaf(l.as_ref())).collect();
        let mut levels = vec![level.clone()];
        while level.len() > 1 {
            let mut next = Vec::with_capacity((level.len() + 1) / 2);
            for pair in level.chunks(2) {
                let left = pair[0];
                let right = if pair.len() > 1 { pair[1] } else { pair[0] };
                next.push(hash_node(&left, &right));
            }
            levels.push(next.clone());
            level = next;
        }
        MerkleTree { levels }
    }

    pub fn root(&self) -> Digest32 {
        match self.levels.last() {
            Some(top) if !top.is_empty() => top[0],
            _ => empty_root(),
        }
    }

    pub fn root_hex(&self) -> String {
        hex::encode(self.root())
    }

    pub fn len(&self) -> usize {
        self.levels.first().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build the inclusion proof for leaf `index`, walking bottom-up.
    pub fn prove(&self, index: usize) -> Result<InclusionProof, MerkleError> {
        let len = self.len();
        if index >= len {
            return Err(MerkleError::IndexOutOfRange { index, len });
        }
        let mut steps = Vec::with_capacity(self.levels.len().saturating_sub(1));
        let mut idx = index;
        for level in &self.levels[..self.levels.len().saturating_sub(1)] {
            let is_left = idx % 2 == 0;
            let sibling_idx = if is_left { idx + 1 } else { idx - 1 };
            let sibling = if sibling_idx < level.len() { level[sibling_idx] } else { level[idx] };
            steps.push(PathStep { sibling, is_left });
            idx /= 2;
        }
        Ok(InclusionProof { steps })
    }

    /// Verify that `leaf` occurs at `index` under `root`, via `proof`.
    pub fn verify(leaf: &[u8], index: usize, proof: &InclusionProof, root: &Digest32) -> bool {
        let _ = index; // index is implicit in the left/right bits recorded in `proof`.
        let mut current = hash_leaf(leaf);
        for step in &proof.steps {
            current = if step.is_left {
                hash_node(&current, &step.sibling)
            } else {
                hash_node(&step.sibling, &current)
            };
        }
        &current == root
    }
}

mod hex_digest {
    use super::Digest32;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(digest: &Digest32, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(digest))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Digest32, D::Error> {
        let s = String::deserialize(d)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 32-byte hex digest"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inclusion_proof_round_trips() {
        let leaves: Vec<String> = (0..13).map(|i| format!("leaf-{i}")).collect();
        let tree = MerkleTree::build(&leaves);
        let root = tree.root();
        for (i, leaf) in leaves.iter().enumerate() {
            let proof = tree.prove(i).unwrap();
            assert!(MerkleTree::verify(leaf.as_bytes(), i, &proof, &root));
        }
    }

    #[test]
    fn tampered_leaf_fails_verification() {
        let leaves: Vec<String> = (0..8).map(|i| format!("leaf-{i}")).collect();
        let tree = MerkleTree::build(&leaves);
        let root = tree.root();
        let proof = tree.prove(3).unwrap();
        assert!(!MerkleTree::verify(b"not-the-leaf", 3, &proof, &root));
    }

    #[test]
    fn odd_leaf_count_duplicates_last_node() {
        let leaves: Vec<&str> = vec!["a", "b", "c"];
        let tree = MerkleTree::build(&leaves);
        // c's sibling at level 0 should be c itself (duplicated).
        let proof = tree.prove(2).unwrap();
        assert_eq!(proof.steps[0].sibling, hash_leaf(b"c"));
    }

    #[test]
    fn empty_tree_has_sentinel_root() {
        let leaves: Vec<&[u8]> = vec![];
        let tree = MerkleTree::build(&leaves);
        assert_eq!(tree.root(), empty_root());
    }
}

//! Inclusion path from a leaf to a root.

use serde::{Deserialize, Serialize};

use crate::digest::{hex_digest, hex_digest_vec, Digest};
use crate::hasher::Hasher;

/// Siblings from the leaf level (0) up to level `height - 1`, with the
/// position of the running node at each level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerklePath {
    /// Root the path was generated against
    #[serde(with = "hex_digest")]
    pub root: Digest,

    /// Sibling hashes, leaf level first
    #[serde(with = "hex_digest_vec")]
    pub path_elements: Vec<Digest>,

    /// true = the running node is the right child at that level
    pub path_index_bits: Vec<bool>,
}

impl MerklePath {
    /// Number of levels covered by the path.
    pub fn depth(&self) -> usize {
        self.path_elements.len()
    }

    /// Leaf index encoded by the direction bits (least significant first).
    pub fn leaf_index(&self) -> u64 {
        self.path_index_bits
            .iter()
            .enumerate()
            .filter(|(_, &bit)| bit)
            .fold(0u64, |acc, (i, _)| acc | (1u64 << i))
    }

    /// Fold the path bottom-up starting from `leaf`.
    pub fn compute_root<H: Hasher>(&self, hasher: &H, leaf: Digest) -> Digest {
        let mut current = leaf;

        for (sibling, &is_right) in self.path_elements.iter().zip(self.path_index_bits.iter()) {
            current = if is_right {
                // Current is right child: H(sibling, current)
                hasher.hash(*sibling, current)
            } else {
                // Current is left child: H(current, sibling)
                hasher.hash(current, *sibling)
            };
        }

        current
    }

    /// Check that `leaf` folds up to the root carried by this path.
    pub fn verify<H: Hasher>(&self, hasher: &H, leaf: Digest) -> bool {
        self.path_elements.len() == self.path_index_bits.len()
            && self.compute_root(hasher, leaf) == self.root
    }
}

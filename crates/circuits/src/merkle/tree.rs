//! Append-only incremental Merkle tree.
//!
//! Only nodes whose subtree holds at least one real leaf are materialized,
//! keyed by `(level, index)`. Every other node is the precomputed root of an
//! empty subtree for its level, so memory grows with occupancy rather than
//! with `2^height`, and an insertion costs `height` hashes.

use std::collections::HashMap;

use tracing::debug;

use super::path::MerklePath;
use crate::digest::Digest;
use crate::error::MembershipError;
use crate::hasher::{Hasher, PoseidonHasher};

/// Default tree height (20 levels = 1,048,576 voters)
pub const DEFAULT_HEIGHT: usize = 20;

/// Largest supported height; leaf indices must fit in a `u64` with room to spare.
pub const MAX_HEIGHT: usize = 32;

/// Fixed-height accumulator over committed identities.
#[derive(Clone, Debug)]
pub struct IncrementalMerkleTree<H: Hasher = PoseidonHasher> {
    /// Number of levels between the leaves and the root
    height: usize,

    hasher: H,

    /// Inserted leaves, index order
    leaves: Vec<Digest>,

    /// Materialized internal nodes: (level, index) -> hash.
    /// Level 1 = parents of leaves, level `height` = root
    nodes: HashMap<(usize, u64), Digest>,

    /// zero_values[0] = empty leaf
    /// zero_values[i] = hash(zero_values[i-1], zero_values[i-1])
    zero_values: Vec<Digest>,

    /// root_history[n] = root after n insertions, never pruned
    root_history: Vec<Digest>,
}

impl<H: Hasher> IncrementalMerkleTree<H> {
    /// Create an empty tree of the given height.
    pub fn new(height: usize, hasher: H) -> Result<Self, MembershipError> {
        if height == 0 || height > MAX_HEIGHT {
            return Err(MembershipError::InvalidHeight {
                height,
                max: MAX_HEIGHT,
            });
        }

        let zero_values = Self::compute_zero_values(&hasher, height);
        let empty_root = zero_values[height];

        Ok(Self {
            height,
            hasher,
            leaves: Vec::new(),
            nodes: HashMap::new(),
            zero_values,
            root_history: vec![empty_root],
        })
    }

    /// Rebuild a tree by replaying insertions in ledger order.
    pub fn from_leaves<I>(height: usize, hasher: H, leaves: I) -> Result<Self, MembershipError>
    where
        I: IntoIterator<Item = Digest>,
    {
        let mut tree = Self::new(height, hasher)?;
        for leaf in leaves {
            tree.insert(leaf)?;
        }
        Ok(tree)
    }

    fn compute_zero_values(hasher: &H, height: usize) -> Vec<Digest> {
        let mut zeros = Vec::with_capacity(height + 1);
        let mut current = Digest::from(0u64);
        zeros.push(current);

        for _ in 0..height {
            current = hasher.hash(current, current);
            zeros.push(current);
        }

        zeros
    }

    /// Append a leaf and return its index.
    ///
    /// The whole path is computed before any state changes, so a failure
    /// leaves the tree untouched.
    pub fn insert(&mut self, leaf: Digest) -> Result<u64, MembershipError> {
        let index = self.len();
        if index >= self.capacity() {
            return Err(MembershipError::CapacityExceeded {
                height: self.height,
                capacity: self.capacity(),
            });
        }

        let mut updates = Vec::with_capacity(self.height);
        let mut current_index = index;
        let mut current_hash = leaf;

        for level in 0..self.height {
            let sibling_hash = self.get_node(level, current_index ^ 1);

            current_hash = if current_index & 1 == 0 {
                self.hasher.hash(current_hash, sibling_hash)
            } else {
                self.hasher.hash(sibling_hash, current_hash)
            };
            current_index >>= 1;

            updates.push(((level + 1, current_index), current_hash));
        }

        self.leaves.push(leaf);
        self.nodes.extend(updates);
        self.root_history.push(current_hash);

        debug!(index, total = self.len(), "leaf inserted");
        Ok(index)
    }

    /// Node at `(level, index)`, or the empty-subtree value if nothing was inserted below it.
    fn get_node(&self, level: usize, index: u64) -> Digest {
        let stored = if level == 0 {
            usize::try_from(index)
                .ok()
                .and_then(|i| self.leaves.get(i))
                .copied()
        } else {
            self.nodes.get(&(level, index)).copied()
        };
        stored.unwrap_or(self.zero_values[level])
    }

    /// Current root.
    pub fn root(&self) -> Digest {
        self.root_history[self.leaves.len()]
    }

    /// Root as it was after `count` insertions.
    pub fn root_at(&self, count: u64) -> Option<Digest> {
        usize::try_from(count)
            .ok()
            .and_then(|i| self.root_history.get(i))
            .copied()
    }

    /// Every root the tree has had, starting with the empty root.
    pub fn root_history(&self) -> &[Digest] {
        &self.root_history
    }

    /// Whether `root` was the tree root at any point.
    pub fn is_known_root(&self, root: &Digest) -> bool {
        self.root_history.iter().any(|r| r == root)
    }

    /// Inclusion path for an inserted leaf against the current root.
    pub fn path(&self, index: u64) -> Result<MerklePath, MembershipError> {
        if index >= self.len() {
            return Err(MembershipError::IndexOutOfRange {
                index,
                total: self.len(),
            });
        }

        let mut path_elements = Vec::with_capacity(self.height);
        let mut path_index_bits = Vec::with_capacity(self.height);

        let mut current_index = index;
        for level in 0..self.height {
            path_elements.push(self.get_node(level, current_index ^ 1));
            path_index_bits.push(current_index & 1 == 1); // true if current is right child
            current_index >>= 1;
        }

        Ok(MerklePath {
            root: self.root(),
            path_elements,
            path_index_bits,
        })
    }

    /// Leaf stored at `index`.
    pub fn leaf(&self, index: u64) -> Result<Digest, MembershipError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.leaves.get(i))
            .copied()
            .ok_or(MembershipError::IndexOutOfRange {
                index,
                total: self.len(),
            })
    }

    pub fn leaves(&self) -> &[Digest] {
        &self.leaves
    }

    /// Number of inserted leaves.
    pub fn len(&self) -> u64 {
        self.leaves.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Maximum number of leaves, `2^height`.
    pub fn capacity(&self) -> u64 {
        1u64 << self.height
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Root of an empty subtree at `level` (0 = empty leaf).
    pub fn zero_value(&self, level: usize) -> Option<Digest> {
        self.zero_values.get(level).copied()
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }
}

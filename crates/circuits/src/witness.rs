//! Witness assembly.
//!
//! Packages the accumulator's path and the identity's secret and nullifier
//! hash into the public/private split the membership circuit consumes. Built
//! fresh for every proof request and never persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::digest::{hex_digest, Digest};
use crate::error::MembershipError;
use crate::hasher::Hasher;
use crate::identity::Identity;
use crate::merkle::{MerklePath, MAX_HEIGHT};

/// Values revealed to the verifier and the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicInputs {
    #[serde(with = "hex_digest")]
    pub root: Digest,
    #[serde(with = "hex_digest")]
    pub nullifier_hash: Digest,
    #[serde(with = "hex_digest")]
    pub signal_hash: Digest,
    #[serde(with = "hex_digest")]
    pub epoch: Digest,
}

impl PublicInputs {
    /// Number of public field elements.
    pub const LEN: usize = 4;

    /// Circuit order: root, nullifier hash, signal hash, epoch.
    pub fn to_field_elements(&self) -> Vec<Digest> {
        vec![self.root, self.nullifier_hash, self.signal_hash, self.epoch]
    }

    pub fn from_field_elements(inputs: &[Digest]) -> Result<Self, MembershipError> {
        match inputs {
            [root, nullifier_hash, signal_hash, epoch] => Ok(Self {
                root: *root,
                nullifier_hash: *nullifier_hash,
                signal_hash: *signal_hash,
                epoch: *epoch,
            }),
            _ => Err(MembershipError::InvalidDigest(format!(
                "expected {} public inputs, got {}",
                Self::LEN,
                inputs.len()
            ))),
        }
    }
}

/// Values only the prover sees.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateInputs {
    pub secret: Digest,
    pub path_elements: Vec<Digest>,
    pub path_index_bits: Vec<bool>,
}

impl fmt::Debug for PrivateInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateInputs")
            .field("secret", &"<redacted>")
            .field("depth", &self.path_elements.len())
            .finish()
    }
}

/// Complete input to the proof system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Witness {
    pub public: PublicInputs,
    pub private: PrivateInputs,
}

impl Witness {
    /// Combine a root, an externally computed signal hash, an epoch, a
    /// registered identity and its inclusion path.
    ///
    /// Fails with `NotRegistered` if the identity has no leaf index and with
    /// `MalformedPath` if the path does not span exactly `height` levels.
    /// Heights above `MAX_HEIGHT` are `InvalidHeight`.
    pub fn assemble<H: Hasher>(
        height: usize,
        root: Digest,
        signal_hash: Digest,
        epoch: Digest,
        identity: &Identity,
        hasher: &H,
        path: &MerklePath,
    ) -> Result<Self, MembershipError> {
        if height == 0 || height > MAX_HEIGHT {
            return Err(MembershipError::InvalidHeight {
                height,
                max: MAX_HEIGHT,
            });
        }

        let nullifier_hash = identity.nullifier_hash(hasher, epoch)?;

        if path.path_elements.len() != height || path.path_index_bits.len() != height {
            return Err(MembershipError::MalformedPath {
                height,
                elements: path.path_elements.len(),
                bits: path.path_index_bits.len(),
            });
        }

        Ok(Self {
            public: PublicInputs {
                root,
                nullifier_hash,
                signal_hash,
                epoch,
            },
            private: PrivateInputs {
                secret: identity.secret(),
                path_elements: path.path_elements.clone(),
                path_index_bits: path.path_index_bits.clone(),
            },
        })
    }

    /// Tree height the witness was built for.
    pub fn height(&self) -> usize {
        self.private.path_elements.len()
    }

    /// Leaf index encoded by the path bits.
    pub fn leaf_index(&self) -> u64 {
        self.path().leaf_index()
    }

    fn path(&self) -> MerklePath {
        MerklePath {
            root: self.public.root,
            path_elements: self.private.path_elements.clone(),
            path_index_bits: self.private.path_index_bits.clone(),
        }
    }

    /// Evaluate the membership relation natively.
    ///
    /// True iff `hash(secret, 0)` folds up to `root` along the path and the
    /// nullifier hash was derived from the secret, the epoch and the leaf
    /// index the path encodes. A witness failing this cannot be proven.
    pub fn is_satisfied<H: Hasher>(&self, hasher: &H) -> bool {
        let identity_commitment = hasher.hash(self.private.secret, Digest::from(0u64));
        let path = self.path();
        if !path.verify(hasher, identity_commitment) {
            return false;
        }

        let inner = hasher.hash(self.private.secret, self.public.epoch);
        let expected_nullifier = hasher.hash(inner, Digest::from(path.leaf_index()));
        expected_nullifier == self.public.nullifier_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::PoseidonHasher;
    use crate::identity::SECRET_BYTES;
    use crate::merkle::IncrementalMerkleTree;
    use crate::signal::hash_proposal;
    use ark_bn254::Fr;

    const HEIGHT: usize = 4;

    fn registered_tree() -> (IncrementalMerkleTree, Identity) {
        let mut tree = IncrementalMerkleTree::new(HEIGHT, PoseidonHasher).unwrap();
        tree.insert(Fr::from(1u64)).unwrap();

        let mut identity = Identity::from_secret([3u8; SECRET_BYTES]);
        let index = tree.insert(identity.commitment(&PoseidonHasher)).unwrap();
        identity.register(index).unwrap();
        tree.insert(Fr::from(2u64)).unwrap();

        (tree, identity)
    }

    #[test]
    fn test_assemble_honest_witness() {
        let (tree, identity) = registered_tree();
        let path = tree.path(1).unwrap();
        let epoch = Fr::from(0u64);
        let signal_hash = hash_proposal(0);

        let witness =
            Witness::assemble(HEIGHT, path.root, signal_hash, epoch, &identity, &PoseidonHasher, &path)
                .unwrap();

        assert_eq!(witness.public.root, tree.root());
        assert_eq!(witness.public.signal_hash, signal_hash);
        assert_eq!(
            witness.public.nullifier_hash,
            identity.nullifier_hash(&PoseidonHasher, epoch).unwrap()
        );
        assert_eq!(witness.private.secret, identity.secret());
        assert_eq!(witness.height(), HEIGHT);
        assert_eq!(witness.leaf_index(), 1);
        assert!(witness.is_satisfied(&PoseidonHasher));
    }

    #[test]
    fn test_unregistered_identity() {
        let (tree, _) = registered_tree();
        let stranger = Identity::from_secret([4u8; SECRET_BYTES]);
        let path = tree.path(0).unwrap();

        let err = Witness::assemble(
            HEIGHT,
            path.root,
            Fr::from(0u64),
            Fr::from(0u64),
            &stranger,
            &PoseidonHasher,
            &path,
        )
        .unwrap_err();

        assert_eq!(err, MembershipError::NotRegistered);
    }

    #[test]
    fn test_malformed_path() {
        let (tree, identity) = registered_tree();
        let mut path = tree.path(1).unwrap();
        path.path_elements.pop();

        let err = Witness::assemble(
            HEIGHT,
            path.root,
            Fr::from(0u64),
            Fr::from(0u64),
            &identity,
            &PoseidonHasher,
            &path,
        )
        .unwrap_err();

        assert_eq!(
            err,
            MembershipError::MalformedPath {
                height: HEIGHT,
                elements: HEIGHT - 1,
                bits: HEIGHT
            }
        );
    }

    #[test]
    fn test_height_mismatch_is_malformed() {
        let (tree, identity) = registered_tree();
        let path = tree.path(1).unwrap();

        let result = Witness::assemble(
            HEIGHT + 1,
            path.root,
            Fr::from(0u64),
            Fr::from(0u64),
            &identity,
            &PoseidonHasher,
            &path,
        );

        assert!(matches!(result, Err(MembershipError::MalformedPath { .. })));
    }

    #[test]
    fn test_height_beyond_max_rejected() {
        let (_, identity) = registered_tree();
        let height = 70;
        let path = MerklePath {
            root: Fr::from(0u64),
            path_elements: vec![Fr::from(0u64); height],
            path_index_bits: vec![true; height],
        };

        let result = Witness::assemble(
            height,
            path.root,
            Fr::from(0u64),
            Fr::from(0u64),
            &identity,
            &PoseidonHasher,
            &path,
        );

        assert_eq!(
            result.unwrap_err(),
            MembershipError::InvalidHeight {
                height,
                max: MAX_HEIGHT
            }
        );
    }

    #[test]
    fn test_wrong_path_is_not_satisfied() {
        let (tree, identity) = registered_tree();
        // Path of another leaf: commitment does not fold to the root along it
        let path = tree.path(2).unwrap();

        let witness = Witness::assemble(
            HEIGHT,
            path.root,
            Fr::from(0u64),
            Fr::from(0u64),
            &identity,
            &PoseidonHasher,
            &path,
        )
        .unwrap();

        assert!(!witness.is_satisfied(&PoseidonHasher));
    }

    #[test]
    fn test_public_inputs_order() {
        let public = PublicInputs {
            root: Fr::from(1u64),
            nullifier_hash: Fr::from(2u64),
            signal_hash: Fr::from(3u64),
            epoch: Fr::from(4u64),
        };
        let fields = public.to_field_elements();
        assert_eq!(fields, vec![Fr::from(1u64), Fr::from(2u64), Fr::from(3u64), Fr::from(4u64)]);
        assert_eq!(PublicInputs::from_field_elements(&fields).unwrap(), public);
        assert!(PublicInputs::from_field_elements(&fields[..3]).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let (tree, identity) = registered_tree();
        let path = tree.path(1).unwrap();
        let witness =
            Witness::assemble(HEIGHT, path.root, Fr::from(0u64), Fr::from(0u64), &identity, &PoseidonHasher, &path)
                .unwrap();

        assert!(format!("{:?}", witness.private).contains("redacted"));
    }
}

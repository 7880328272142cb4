//! Two-input compression capability shared by the tree and the identity.

use crate::digest::Digest;
use crate::poseidon::poseidon_hash_two;

/// A deterministic, collision-resistant, non-commutative `hash(left, right)`.
///
/// Anything stored in or derived for the accumulator goes through this trait,
/// so the same code can run against a cheap reference hash in tests and the
/// circuit-compatible Poseidon in production.
pub trait Hasher {
    fn hash(&self, left: Digest, right: Digest) -> Digest;
}

impl<H: Hasher + ?Sized> Hasher for &H {
    fn hash(&self, left: Digest, right: Digest) -> Digest {
        (**self).hash(left, right)
    }
}

/// Poseidon(left, right), identical to the gadget the membership circuit uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoseidonHasher;

impl Hasher for PoseidonHasher {
    fn hash(&self, left: Digest, right: Digest) -> Digest {
        poseidon_hash_two(left, right)
    }
}

#[cfg(test)]
pub(crate) mod reference {
    use super::*;
    use ark_bn254::Fr;

    /// Affine mix, cheap and order-sensitive. Not collision resistant.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct ReferenceHasher;

    impl Hasher for ReferenceHasher {
        fn hash(&self, left: Digest, right: Digest) -> Digest {
            left * Fr::from(3u64) + right * Fr::from(7u64) + Fr::from(1u64)
        }
    }
}

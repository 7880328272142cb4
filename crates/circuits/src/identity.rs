//! Voter identity: secret, commitment and per-epoch nullifier hashes.
//!
//! An identity is created locally, its commitment is registered with the
//! ledger, and the ledger's leaf index is echoed back exactly once through
//! [`Identity::register`]. Only then can nullifier hashes be derived.

use std::fmt;

use ark_ff::PrimeField;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::debug;

use crate::digest::Digest;
use crate::error::MembershipError;
use crate::hasher::Hasher;

/// Secret length. 120 bits always fit in the BN254 scalar field unreduced.
pub const SECRET_BYTES: usize = 15;

/// Second input of the commitment hash, separating it from other uses of the secret.
pub const COMMITMENT_DOMAIN: u64 = 0;

/// Whether the identity's commitment has been accepted into the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registration {
    Unregistered,
    Registered(u64),
}

/// A voter's private identity. Single owner; `register` is the only mutation.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    secret: [u8; SECRET_BYTES],
    registration: Registration,
}

impl Identity {
    /// Sample a fresh identity from the operating system CSPRNG.
    pub fn generate() -> Self {
        Self::generate_with_rng(&mut OsRng)
    }

    /// Sample a fresh identity from the given cryptographic RNG.
    pub fn generate_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut secret = [0u8; SECRET_BYTES];
        rng.fill_bytes(&mut secret);
        Self::from_secret(secret)
    }

    /// Restore an identity from its secret. The leaf index must be registered again.
    pub fn from_secret(secret: [u8; SECRET_BYTES]) -> Self {
        Self {
            secret,
            registration: Registration::Unregistered,
        }
    }

    /// Restore an identity from a hex secret (`0x` prefix optional).
    pub fn from_secret_hex(s: &str) -> Result<Self, MembershipError> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
            .map_err(|e| MembershipError::InvalidSecret(format!("invalid hex: {}", e)))?;

        let secret: [u8; SECRET_BYTES] = bytes.as_slice().try_into().map_err(|_| {
            MembershipError::InvalidSecret(format!(
                "expected {} bytes, got {}",
                SECRET_BYTES,
                bytes.len()
            ))
        })?;

        Ok(Self::from_secret(secret))
    }

    pub fn secret_bytes(&self) -> &[u8; SECRET_BYTES] {
        &self.secret
    }

    /// `0x`-prefixed hex form of the secret.
    pub fn secret_hex(&self) -> String {
        format!("0x{}", hex::encode(self.secret))
    }

    /// The secret as a field element (big-endian).
    pub fn secret(&self) -> Digest {
        Digest::from_be_bytes_mod_order(&self.secret)
    }

    /// `hash(secret, 0)`, the public value inserted into the tree.
    pub fn commitment<H: Hasher>(&self, hasher: &H) -> Digest {
        hasher.hash(self.secret(), Digest::from(COMMITMENT_DOMAIN))
    }

    /// Record the leaf index assigned by the ledger. Allowed once.
    pub fn register(&mut self, leaf_index: u64) -> Result<(), MembershipError> {
        match self.registration {
            Registration::Registered(existing) => Err(MembershipError::AlreadyRegistered(existing)),
            Registration::Unregistered => {
                self.registration = Registration::Registered(leaf_index);
                debug!(leaf_index, "identity registered");
                Ok(())
            }
        }
    }

    pub fn registration(&self) -> Registration {
        self.registration
    }

    pub fn leaf_index(&self) -> Option<u64> {
        match self.registration {
            Registration::Registered(index) => Some(index),
            Registration::Unregistered => None,
        }
    }

    /// `hash(hash(secret, epoch), leaf_index)`.
    ///
    /// Same identity and epoch always give the same value, which is what lets a
    /// ledger reject a second vote in an epoch without learning who voted.
    pub fn nullifier_hash<H: Hasher>(
        &self,
        hasher: &H,
        epoch: Digest,
    ) -> Result<Digest, MembershipError> {
        let leaf_index = self.leaf_index().ok_or(MembershipError::NotRegistered)?;
        let inner = hasher.hash(self.secret(), epoch);
        Ok(hasher.hash(inner, Digest::from(leaf_index)))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("secret", &"<redacted>")
            .field("registration", &self.registration)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::PoseidonHasher;
    use ark_bn254::Fr;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn registered(seed: u64, index: u64) -> Identity {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut id = Identity::generate_with_rng(&mut rng);
        id.register(index).unwrap();
        id
    }

    #[test]
    fn test_generate_is_random() {
        let a = Identity::generate();
        let b = Identity::generate();
        assert_ne!(a.secret_bytes(), b.secret_bytes());
        assert_eq!(a.leaf_index(), None);
    }

    #[test]
    fn test_commitment_is_hash_of_secret_and_zero() {
        let id = Identity::from_secret([7u8; SECRET_BYTES]);
        let expected = PoseidonHasher.hash(id.secret(), Fr::from(0u64));
        assert_eq!(id.commitment(&PoseidonHasher), expected);
        assert_eq!(id.commitment(&PoseidonHasher), id.commitment(&PoseidonHasher));
    }

    #[test]
    fn test_secret_fits_field_unreduced() {
        let id = Identity::from_secret([0xff; SECRET_BYTES]);
        // 2^120 - 1
        let expected = (0..SECRET_BYTES).fold(Fr::from(0u64), |acc, _| acc * Fr::from(256u64) + Fr::from(255u64));
        assert_eq!(id.secret(), expected);
    }

    #[test]
    fn test_nullifier_requires_registration() {
        let id = Identity::from_secret([1u8; SECRET_BYTES]);
        assert_eq!(
            id.nullifier_hash(&PoseidonHasher, Fr::from(0u64)),
            Err(MembershipError::NotRegistered)
        );
    }

    #[test]
    fn test_register_only_once() {
        let mut id = Identity::from_secret([1u8; SECRET_BYTES]);
        id.register(3).unwrap();
        assert_eq!(id.register(4), Err(MembershipError::AlreadyRegistered(3)));
        assert_eq!(id.registration(), Registration::Registered(3));
    }

    #[test]
    fn test_index_zero_counts_as_registered() {
        let id = registered(1, 0);
        assert_eq!(id.leaf_index(), Some(0));
        assert!(id.nullifier_hash(&PoseidonHasher, Fr::from(9u64)).is_ok());
    }

    #[test]
    fn test_nullifier_deterministic() {
        let id = registered(42, 2);
        let epoch = Fr::from(17u64);
        assert_eq!(
            id.nullifier_hash(&PoseidonHasher, epoch).unwrap(),
            id.nullifier_hash(&PoseidonHasher, epoch).unwrap()
        );
    }

    #[test]
    fn test_nullifier_differs_per_epoch_and_identity() {
        let a = registered(1, 5);
        let b = registered(2, 6);

        let a0 = a.nullifier_hash(&PoseidonHasher, Fr::from(0u64)).unwrap();
        let a1 = a.nullifier_hash(&PoseidonHasher, Fr::from(1u64)).unwrap();
        let b0 = b.nullifier_hash(&PoseidonHasher, Fr::from(0u64)).unwrap();

        assert_ne!(a0, a1);
        assert_ne!(a0, b0);
    }

    #[test]
    fn test_same_secret_different_index_different_nullifier() {
        let mut a = Identity::from_secret([9u8; SECRET_BYTES]);
        let mut b = a.clone();
        a.register(1).unwrap();
        b.register(2).unwrap();

        let epoch = Fr::from(0u64);
        assert_ne!(
            a.nullifier_hash(&PoseidonHasher, epoch).unwrap(),
            b.nullifier_hash(&PoseidonHasher, epoch).unwrap()
        );
    }

    #[test]
    fn test_nullifier_nesting_order() {
        let id = registered(3, 4);
        let epoch = Fr::from(11u64);
        let h = PoseidonHasher;
        let expected = h.hash(h.hash(id.secret(), epoch), Fr::from(4u64));
        assert_eq!(id.nullifier_hash(&h, epoch).unwrap(), expected);
    }

    #[test]
    fn test_secret_hex_roundtrip() {
        let id = Identity::generate();
        let restored = Identity::from_secret_hex(&id.secret_hex()).unwrap();
        assert_eq!(restored.secret_bytes(), id.secret_bytes());
        assert_eq!(restored.leaf_index(), None);

        assert!(matches!(
            Identity::from_secret_hex("0x0102"),
            Err(MembershipError::InvalidSecret(_))
        ));
        assert!(matches!(
            Identity::from_secret_hex(&format!("0x{}", id.secret_hex())),
            Err(MembershipError::InvalidSecret(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let id = Identity::from_secret([0xab; SECRET_BYTES]);
        let printed = format!("{:?}", id);
        assert!(printed.contains("redacted"));
        assert!(!printed.contains("ab, "));
        assert!(!printed.contains("171"));
    }
}

//! Signal hashing.
//!
//! The signal (a vote, a message) is public and bound to the proof through a
//! single field element. Following the usual EVM convention the keccak256
//! digest is shifted right by 8 bits, so the result is always below the
//! BN254 modulus and never needs reduction.

use ark_ff::PrimeField;
use sha3::{Digest as _, Keccak256};

use crate::digest::{Digest, DIGEST_BYTES};

/// `keccak256(signal) >> 8` as a field element.
pub fn hash_signal(signal: &[u8]) -> Digest {
    let hash = Keccak256::digest(signal);

    let mut shifted = [0u8; DIGEST_BYTES];
    shifted[1..].copy_from_slice(&hash[..DIGEST_BYTES - 1]);

    Digest::from_be_bytes_mod_order(&shifted)
}

/// Signal hash of a proposal id, hashed as its 32-byte big-endian ABI word.
pub fn hash_proposal(proposal: u64) -> Digest {
    let mut word = [0u8; DIGEST_BYTES];
    word[DIGEST_BYTES - 8..].copy_from_slice(&proposal.to_be_bytes());
    hash_signal(&word)
}

//! Anonymous, Sybil-resistant membership and voting.
//!
//! This crate provides:
//! - `IncrementalMerkleTree`: append-only accumulator with full root history
//! - `Identity`: secret, commitment and per-epoch nullifier hashes
//! - `Witness`: public/private inputs for a membership proof
//! - `MembershipCircuit`: the R1CS statement proven with Groth16
//! - `InMemoryLedger`: reference ledger with nullifier dedup and tallies

pub mod digest;
pub mod error;
pub mod hasher;
pub mod identity;
pub mod ledger;
pub mod membership;
pub mod merkle;
pub mod poseidon;
pub mod proof_system;
pub mod signal;
pub mod witness;


pub use digest::{digest_from_hex, digest_to_hex, Digest};
pub use error::MembershipError;
pub use hasher::{Hasher, PoseidonHasher};
pub use identity::{Identity, Registration, SECRET_BYTES};
pub use ledger::{InMemoryLedger, Ledger, LedgerError, Proposal};
pub use membership::{constraint_count, MembershipCircuit};
pub use merkle::{IncrementalMerkleTree, MerklePath, DEFAULT_HEIGHT, MAX_HEIGHT};
pub use poseidon::{poseidon_config, poseidon_hash_two};
pub use proof_system::ProofSystem;
pub use signal::{hash_proposal, hash_signal};
pub use witness::{PrivateInputs, PublicInputs, Witness};

use ark_bn254::Fr;

/// Common type aliases
pub type ConstraintF = Fr;

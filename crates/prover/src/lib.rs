//! Proof generation library for anonymous membership votes.
//!
//! This crate provides utilities for:
//! - Trusted setup (generating proving and verifying keys)
//! - Proof generation for the membership circuit
//! - Local proof verification
//! - A Groth16 implementation of the core `ProofSystem` trait

pub mod backend;
pub mod prove;
pub mod setup;
pub mod verify;

pub use backend::{BackendError, Groth16Backend};
pub use prove::{prove_membership, serialize_proof, ProofWithInputs, ProveError};
pub use setup::{
    setup_all_circuits, setup_all_circuits_with_rng, setup_membership, CircuitKeyPair, CircuitKeys,
    KeyParams, SetupError,
};
pub use verify::{verify_field_elements, verify_membership, VerifyError};

use ark_bn254::Fr;

/// Common field type for all operations
pub type ConstraintF = Fr;

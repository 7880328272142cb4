//! Seam between witness assembly and a concrete proving backend.

use std::error::Error;

use crate::witness::{PublicInputs, Witness};

/// A zero-knowledge proof system over the membership relation.
///
/// The [`Witness`] is the only thing handed to the prover; the verifier sees
/// the public inputs and the opaque proof.
pub trait ProofSystem {
    type Proof;
    type Error: Error + Send + Sync + 'static;

    fn prove(&self, witness: &Witness) -> Result<Self::Proof, Self::Error>;

    fn verify(&self, public_inputs: &PublicInputs, proof: &Self::Proof)
        -> Result<bool, Self::Error>;
}

//! Groth16 over BN254 as a [`ProofSystem`].

use ark_bn254::Bn254;
use ark_groth16::Proof;
use thiserror::Error;

use anonvote_circuits::{ProofSystem, PublicInputs, Witness};

use crate::prove::{prove_membership, ProveError};
use crate::setup::CircuitKeyPair;
use crate::verify::{verify_membership, VerifyError};

#[derive(Error, Debug)]
pub enum BackendError {
    #[error(transparent)]
    Prove(#[from] ProveError),
    #[error(transparent)]
    Verify(#[from] VerifyError),
}

/// Proof system backed by a membership key pair.
#[derive(Clone, Copy)]
pub struct Groth16Backend<'a> {
    keys: &'a CircuitKeyPair,
}

impl<'a> Groth16Backend<'a> {
    pub fn new(keys: &'a CircuitKeyPair) -> Self {
        Self { keys }
    }
}

impl ProofSystem for Groth16Backend<'_> {
    type Proof = Proof<Bn254>;
    type Error = BackendError;

    fn prove(&self, witness: &Witness) -> Result<Self::Proof, Self::Error> {
        Ok(prove_membership(&self.keys.proving_key, witness)?.proof)
    }

    fn verify(&self, public_inputs: &PublicInputs, proof: &Self::Proof) -> Result<bool, Self::Error> {
        Ok(verify_membership(&self.keys.verifying_key, proof, public_inputs)?)
    }
}

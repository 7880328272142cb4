//! Local proof verification.

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, Proof, VerifyingKey};
use ark_snark::SNARK;
use thiserror::Error;

use anonvote_circuits::PublicInputs;

/// Errors during verification
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Verification failed: {0}")]
    Verification(String),
    #[error("Invalid public inputs")]
    InvalidInputs,
}

/// Verify a membership proof against its four public inputs
pub fn verify_membership(
    vk: &VerifyingKey<Bn254>,
    proof: &Proof<Bn254>,
    public_inputs: &PublicInputs,
) -> Result<bool, VerifyError> {
    verify_field_elements(vk, proof, &public_inputs.to_field_elements())
}

/// Verify against raw field elements in circuit order
pub fn verify_field_elements(
    vk: &VerifyingKey<Bn254>,
    proof: &Proof<Bn254>,
    inputs: &[Fr],
) -> Result<bool, VerifyError> {
    if inputs.len() != PublicInputs::LEN {
        return Err(VerifyError::InvalidInputs);
    }

    Groth16::<Bn254>::verify(vk, inputs, proof)
        .map_err(|e| VerifyError::Verification(e.to_string()))
}

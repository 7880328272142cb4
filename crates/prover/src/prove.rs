//! Proof generation for the membership circuit.

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, Proof, ProvingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info};

use anonvote_circuits::{MembershipCircuit, PoseidonHasher, PublicInputs, Witness};

/// Errors during proof generation
#[derive(Error, Debug)]
pub enum ProveError {
    #[error("Proof generation failed: {0}")]
    ProofGeneration(String),
    #[error("Invalid witness: {0}")]
    InvalidWitness(String),
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// A proof with its public inputs
#[derive(Clone, Debug)]
pub struct ProofWithInputs {
    pub proof: Proof<Bn254>,
    pub public_inputs: PublicInputs,
}

impl ProofWithInputs {
    /// Serialize proof to bytes
    pub fn serialize_proof(&self) -> Result<Vec<u8>, ProveError> {
        serialize_proof(&self.proof)
    }

    /// Public inputs in circuit order
    pub fn field_elements(&self) -> Vec<Fr> {
        self.public_inputs.to_field_elements()
    }

    /// Serialize public inputs to bytes (each Fr is 32 bytes)
    pub fn serialize_public_inputs(&self) -> Result<Vec<u8>, ProveError> {
        let mut bytes = Vec::new();
        for input in self.field_elements() {
            input
                .serialize_compressed(&mut bytes)
                .map_err(|e| ProveError::Serialization(e.to_string()))?;
        }
        Ok(bytes)
    }

    /// Deserialize proof from bytes
    pub fn deserialize_proof(bytes: &[u8]) -> Result<Proof<Bn254>, ProveError> {
        Proof::deserialize_compressed(bytes).map_err(|e| ProveError::Serialization(e.to_string()))
    }
}

/// Compressed proof bytes
pub fn serialize_proof(proof: &Proof<Bn254>) -> Result<Vec<u8>, ProveError> {
    let mut bytes = Vec::new();
    proof
        .serialize_compressed(&mut bytes)
        .map_err(|e| ProveError::Serialization(e.to_string()))?;
    Ok(bytes)
}

/// Generate proof for MembershipCircuit
pub fn prove_membership(
    pk: &ProvingKey<Bn254>,
    witness: &Witness,
) -> Result<ProofWithInputs, ProveError> {
    // Verify the claim is valid
    if !witness.is_satisfied(&PoseidonHasher) {
        return Err(ProveError::InvalidWitness(
            "commitment does not fold to the root or nullifier hash does not match".to_string(),
        ));
    }

    let circuit = MembershipCircuit::from_witness(witness);

    debug!(height = witness.height(), "generating membership proof");
    let mut rng = StdRng::from_entropy();
    let proof = Groth16::<Bn254>::prove(pk, circuit, &mut rng)
        .map_err(|e| ProveError::ProofGeneration(e.to_string()))?;
    info!("membership proof generated");

    Ok(ProofWithInputs {
        proof,
        public_inputs: witness.public,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::setup_membership;
    use anonvote_circuits::{hash_proposal, IncrementalMerkleTree, Identity};

    const HEIGHT: usize = 3;

    fn witness() -> Witness {
        let mut tree = IncrementalMerkleTree::new(HEIGHT, PoseidonHasher).unwrap();
        let mut identity = Identity::generate();
        tree.insert(Fr::from(5u64)).unwrap();
        let index = tree.insert(identity.commitment(&PoseidonHasher)).unwrap();
        identity.register(index).unwrap();

        let path = tree.path(index).unwrap();
        Witness::assemble(
            HEIGHT,
            path.root,
            hash_proposal(0),
            Fr::from(0u64),
            &identity,
            &PoseidonHasher,
            &path,
        )
        .unwrap()
    }

    #[test]
    fn test_prove_membership() {
        let mut rng = StdRng::seed_from_u64(42);
        let keys = setup_membership(&mut rng, HEIGHT).unwrap();
        let witness = witness();

        let result = prove_membership(&keys.proving_key, &witness).unwrap();
        assert_eq!(result.public_inputs, witness.public);
        assert_eq!(result.field_elements().len(), PublicInputs::LEN);

        let bytes = result.serialize_proof().unwrap();
        let restored = ProofWithInputs::deserialize_proof(&bytes).unwrap();
        assert_eq!(restored, result.proof);
        assert_eq!(result.serialize_public_inputs().unwrap().len(), 32 * PublicInputs::LEN);
    }

    #[test]
    fn test_unsatisfied_witness_rejected() {
        let mut rng = StdRng::seed_from_u64(42);
        let keys = setup_membership(&mut rng, HEIGHT).unwrap();
        let mut witness = witness();
        witness.public.nullifier_hash = Fr::from(1u64);

        assert!(matches!(
            prove_membership(&keys.proving_key, &witness),
            Err(ProveError::InvalidWitness(_))
        ));
    }
}

//! Membership circuit.
//!
//! Proves, for public `(root, nullifier_hash, signal_hash, epoch)`, knowledge
//! of a secret and a Merkle path such that:
//! - `Poseidon(secret, 0)` is a leaf of the tree with root `root`
//! - `nullifier_hash = Poseidon(Poseidon(secret, epoch), leaf_index)`, where
//!   `leaf_index` is recomposed from the path direction bits
//! - `signal_hash` is bound to the proof
//!
//! Public inputs, in order: root, nullifier_hash, signal_hash, epoch.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef, SynthesisError,
};

use crate::identity::COMMITMENT_DOMAIN;
use crate::merkle::{verify_inclusion, MerklePathVar};
use crate::poseidon::poseidon_hash_two_var;
use crate::witness::Witness;

/// Anonymous membership + nullifier circuit for a fixed tree height.
#[derive(Clone)]
pub struct MembershipCircuit {
    /// Tree height the circuit is shaped for
    pub height: usize,

    // Public inputs
    pub root: Option<Fr>,
    pub nullifier_hash: Option<Fr>,
    pub signal_hash: Option<Fr>,
    pub epoch: Option<Fr>,

    // Witnesses
    pub secret: Option<Fr>,
    /// Sibling hashes, leaf level first
    pub path_elements: Vec<Fr>,
    /// true = running node is the right child
    pub path_index_bits: Vec<bool>,
}

impl MembershipCircuit {
    /// Create an empty circuit for setup.
    /// Uses dummy values that produce the same constraint structure.
    pub fn empty(height: usize) -> Self {
        Self {
            height,
            root: Some(Fr::from(0u64)),
            nullifier_hash: Some(Fr::from(0u64)),
            signal_hash: Some(Fr::from(0u64)),
            epoch: Some(Fr::from(0u64)),
            secret: Some(Fr::from(0u64)),
            path_elements: vec![Fr::from(0u64); height],
            path_index_bits: vec![false; height],
        }
    }

    /// Create a circuit carrying an assembled witness.
    pub fn from_witness(witness: &Witness) -> Self {
        Self {
            height: witness.height(),
            root: Some(witness.public.root),
            nullifier_hash: Some(witness.public.nullifier_hash),
            signal_hash: Some(witness.public.signal_hash),
            epoch: Some(witness.public.epoch),
            secret: Some(witness.private.secret),
            path_elements: witness.private.path_elements.clone(),
            path_index_bits: witness.private.path_index_bits.clone(),
        }
    }
}

impl ConstraintSynthesizer<Fr> for MembershipCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        if self.path_elements.len() != self.height || self.path_index_bits.len() != self.height {
            return Err(SynthesisError::Unsatisfiable);
        }

        // === Allocate public inputs (order is part of the verifying key) ===
        let root_var = FpVar::new_input(cs.clone(), || {
            self.root.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let nullifier_hash_var = FpVar::new_input(cs.clone(), || {
            self.nullifier_hash.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let signal_hash_var = FpVar::new_input(cs.clone(), || {
            self.signal_hash.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let epoch_var = FpVar::new_input(cs.clone(), || {
            self.epoch.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // === Allocate witnesses ===
        let secret_var = FpVar::new_witness(cs.clone(), || {
            self.secret.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let path_var =
            MerklePathVar::new_witness(cs.clone(), &self.path_elements, &self.path_index_bits)?;

        // === Constraint 1: commitment = H(secret, 0) ===
        let domain = FpVar::Constant(Fr::from(COMMITMENT_DOMAIN));
        let commitment_var = poseidon_hash_two_var(cs.clone(), &secret_var, &domain)?;

        // === Constraint 2: commitment is included under root ===
        verify_inclusion(cs.clone(), &root_var, &commitment_var, &path_var)?;

        // === Constraint 3: nullifier_hash = H(H(secret, epoch), leaf_index) ===
        let leaf_index_var = path_var.leaf_index();
        let inner_var = poseidon_hash_two_var(cs.clone(), &secret_var, &epoch_var)?;
        let computed_nullifier = poseidon_hash_two_var(cs.clone(), &inner_var, &leaf_index_var)?;
        computed_nullifier.enforce_equal(&nullifier_hash_var)?;

        // === Constraint 4: tie signal_hash into the constraint system ===
        let _signal_square = signal_hash_var.square()?;

        Ok(())
    }
}

/// Number of R1CS constraints for a tree of the given height.
pub fn constraint_count(height: usize) -> Result<usize, SynthesisError> {
    let cs = ConstraintSystem::<Fr>::new_ref();
    MembershipCircuit::empty(height).generate_constraints(cs.clone())?;
    Ok(cs.num_constraints())
}

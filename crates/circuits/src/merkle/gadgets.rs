//! In-circuit Merkle path verification using Poseidon.

use ark_bn254::Fr;
use ark_ff::{Field, One};
use ark_r1cs_std::{boolean::Boolean, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use crate::poseidon::poseidon_hash_two_var;

/// Circuit variable representation of a Merkle path.
#[derive(Clone)]
pub struct MerklePathVar {
    /// Sibling hashes as circuit variables
    path: Vec<FpVar<Fr>>,

    /// Direction booleans as circuit variables
    indices: Vec<Boolean<Fr>>,
}

impl MerklePathVar {
    /// Allocate sibling hashes and direction bits as witness variables.
    pub fn new_witness(
        cs: ConstraintSystemRef<Fr>,
        path_elements: &[Fr],
        path_index_bits: &[bool],
    ) -> Result<Self, SynthesisError> {
        let path = path_elements
            .iter()
            .map(|h| FpVar::new_witness(cs.clone(), || Ok(*h)))
            .collect::<Result<Vec<_>, _>>()?;

        let indices = path_index_bits
            .iter()
            .map(|&b| Boolean::new_witness(cs.clone(), || Ok(b)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { path, indices })
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Leaf index recomposed from the direction bits, least significant first.
    pub fn leaf_index(&self) -> FpVar<Fr> {
        let mut acc = FpVar::<Fr>::zero();
        let mut coeff = Fr::one();

        for bit in &self.indices {
            acc += FpVar::from(bit.clone()) * coeff;
            coeff.double_in_place();
        }

        acc
    }
}

/// Compute the root from a leaf and a Merkle path in-circuit.
pub fn compute_root_from_path(
    cs: ConstraintSystemRef<Fr>,
    leaf: &FpVar<Fr>,
    path: &MerklePathVar,
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut current = leaf.clone();

    for (sibling, is_right) in path.path.iter().zip(path.indices.iter()) {
        // If is_right: H(sibling, current), else H(current, sibling)
        let left = is_right.select(sibling, &current)?;
        let right = is_right.select(&current, sibling)?;

        current = poseidon_hash_two_var(cs.clone(), &left, &right)?;
    }

    Ok(current)
}

/// Constrain `leaf` to be included under `expected_root`.
pub fn verify_inclusion(
    cs: ConstraintSystemRef<Fr>,
    expected_root: &FpVar<Fr>,
    leaf: &FpVar<Fr>,
    path: &MerklePathVar,
) -> Result<(), SynthesisError> {
    let computed = compute_root_from_path(cs, leaf, path)?;
    computed.enforce_equal(expected_root)
}

//! Trusted setup utilities for generating proving and verifying keys.

use std::path::Path;

use ark_bn254::Bn254;
use ark_groth16::{Groth16, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use anonvote_circuits::{MembershipCircuit, PublicInputs, MAX_HEIGHT};

pub const PROVING_KEY_FILE: &str = "membership.pk";
pub const VERIFYING_KEY_FILE: &str = "membership.vk";
pub const PARAMS_FILE: &str = "params.json";

/// Errors that can occur during setup
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Circuit setup failed: {0}")]
    CircuitSetup(String),
    #[error("Tree height must be between 1 and {max}, got {height}")]
    InvalidHeight { height: usize, max: usize },
    #[error("Serialization failed: {0}")]
    Serialization(String),
    #[error("Deserialization failed: {0}")]
    Deserialization(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Keys for a single circuit
#[derive(Clone)]
pub struct CircuitKeyPair {
    pub proving_key: ProvingKey<Bn254>,
    pub verifying_key: VerifyingKey<Bn254>,
}

impl CircuitKeyPair {
    /// Serialize proving key to bytes
    pub fn serialize_pk(&self) -> Result<Vec<u8>, SetupError> {
        let mut bytes = Vec::new();
        self.proving_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| SetupError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    /// Serialize verifying key to bytes
    pub fn serialize_vk(&self) -> Result<Vec<u8>, SetupError> {
        let mut bytes = Vec::new();
        self.verifying_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| SetupError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    /// Deserialize proving key from bytes
    pub fn deserialize_pk(bytes: &[u8]) -> Result<ProvingKey<Bn254>, SetupError> {
        ProvingKey::deserialize_compressed(bytes)
            .map_err(|e| SetupError::Deserialization(e.to_string()))
    }

    /// Deserialize verifying key from bytes
    pub fn deserialize_vk(bytes: &[u8]) -> Result<VerifyingKey<Bn254>, SetupError> {
        VerifyingKey::deserialize_compressed(bytes)
            .map_err(|e| SetupError::Deserialization(e.to_string()))
    }
}

/// Shape parameters stored next to the keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyParams {
    pub height: usize,
    pub public_inputs: usize,
}

/// Keys for the membership circuit at a given tree height
#[derive(Clone)]
pub struct CircuitKeys {
    pub height: usize,
    pub membership: CircuitKeyPair,
}

impl CircuitKeys {
    pub fn params(&self) -> KeyParams {
        KeyParams {
            height: self.height,
            public_inputs: PublicInputs::LEN,
        }
    }

    /// Save keys and their parameters to a directory
    pub fn save_to_directory(&self, dir: &Path) -> Result<(), SetupError> {
        std::fs::create_dir_all(dir)?;

        std::fs::write(dir.join(PROVING_KEY_FILE), self.membership.serialize_pk()?)?;
        std::fs::write(dir.join(VERIFYING_KEY_FILE), self.membership.serialize_vk()?)?;

        let params = serde_json::to_vec_pretty(&self.params())
            .map_err(|e| SetupError::Serialization(e.to_string()))?;
        std::fs::write(dir.join(PARAMS_FILE), params)?;

        info!(dir = %dir.display(), height = self.height, "circuit keys saved");
        Ok(())
    }

    /// Load keys from a directory
    pub fn load_from_directory(dir: &Path) -> Result<Self, SetupError> {
        let params: KeyParams = serde_json::from_slice(&std::fs::read(dir.join(PARAMS_FILE))?)
            .map_err(|e| SetupError::Deserialization(e.to_string()))?;

        if params.public_inputs != PublicInputs::LEN {
            return Err(SetupError::Deserialization(format!(
                "keys expect {} public inputs, circuit has {}",
                params.public_inputs,
                PublicInputs::LEN
            )));
        }

        let membership = CircuitKeyPair {
            proving_key: CircuitKeyPair::deserialize_pk(&std::fs::read(
                dir.join(PROVING_KEY_FILE),
            )?)?,
            verifying_key: CircuitKeyPair::deserialize_vk(&std::fs::read(
                dir.join(VERIFYING_KEY_FILE),
            )?)?,
        };

        info!(dir = %dir.display(), height = params.height, "circuit keys loaded");
        Ok(Self {
            height: params.height,
            membership,
        })
    }

    /// Load keys from `dir` if present, otherwise run setup and save them there.
    ///
    /// Existing keys built for a different height are replaced.
    pub fn load_or_setup(dir: &Path, height: usize) -> Result<Self, SetupError> {
        if dir.join(PARAMS_FILE).exists() {
            let keys = Self::load_from_directory(dir)?;
            if keys.height == height {
                return Ok(keys);
            }
            info!(found = keys.height, wanted = height, "key height mismatch, running setup");
        }

        let keys = setup_all_circuits(height)?;
        keys.save_to_directory(dir)?;
        Ok(keys)
    }
}

/// Run trusted setup for the membership circuit with OS entropy.
///
/// Whoever knows the RNG state can recover the toxic waste and forge proofs,
/// so keys a ledger trusts must come from here.
pub fn setup_all_circuits(height: usize) -> Result<CircuitKeys, SetupError> {
    let mut rng = StdRng::from_entropy();
    setup_all_circuits_with_rng(&mut rng, height)
}

/// Run trusted setup drawing randomness from `rng`.
///
/// Deterministic for a seeded `rng`; meant for tests and reproducible fixtures.
pub fn setup_all_circuits_with_rng(
    rng: &mut StdRng,
    height: usize,
) -> Result<CircuitKeys, SetupError> {
    info!(height, "setting up MembershipCircuit");
    let membership = setup_membership(rng, height)?;

    Ok(CircuitKeys { height, membership })
}

/// Setup MembershipCircuit for a tree of the given height
pub fn setup_membership(rng: &mut StdRng, height: usize) -> Result<CircuitKeyPair, SetupError> {
    if height == 0 || height > MAX_HEIGHT {
        return Err(SetupError::InvalidHeight {
            height,
            max: MAX_HEIGHT,
        });
    }

    let circuit = MembershipCircuit::empty(height);
    let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(circuit, rng)
        .map_err(|e| SetupError::CircuitSetup(e.to_string()))?;

    Ok(CircuitKeyPair {
        proving_key: pk,
        verifying_key: vk,
    })
}

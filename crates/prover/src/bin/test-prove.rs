//! Standalone test to verify proof generation with loaded keys

use std::path::Path;
use std::time::Instant;

use anonvote_circuits::{hash_proposal, Identity, IncrementalMerkleTree, PoseidonHasher, Witness};
use anonvote_prover::{prove, setup::CircuitKeys, verify};
use ark_bn254::Fr;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("loading keys from disk");
    let start = Instant::now();
    let keys = CircuitKeys::load_from_directory(Path::new("keys")).expect("Failed to load keys");
    info!(elapsed = ?start.elapsed(), height = keys.height, "keys loaded");

    // Register a few voters, ours in the middle
    let mut tree =
        IncrementalMerkleTree::new(keys.height, PoseidonHasher).expect("Invalid key height");
    tree.insert(Identity::generate().commitment(&PoseidonHasher))
        .expect("Tree full");
    let mut identity = Identity::generate();
    let index = tree
        .insert(identity.commitment(&PoseidonHasher))
        .expect("Tree full");
    identity.register(index).expect("Already registered");
    tree.insert(Identity::generate().commitment(&PoseidonHasher))
        .expect("Tree full");

    let path = tree.path(index).expect("Missing leaf");
    let witness = Witness::assemble(
        keys.height,
        path.root,
        hash_proposal(0),
        Fr::from(0u64),
        &identity,
        &PoseidonHasher,
        &path,
    )
    .expect("Failed to assemble witness");

    info!("testing prove_membership");
    let start = Instant::now();
    let result = prove::prove_membership(&keys.membership.proving_key, &witness);
    info!(elapsed = ?start.elapsed(), "proof generation completed");

    let proof = match result {
        Ok(proof) => proof,
        Err(e) => {
            error!(error = %e, "membership proof generation failed");
            std::process::exit(1);
        }
    };

    let start = Instant::now();
    match verify::verify_membership(
        &keys.membership.verifying_key,
        &proof.proof,
        &proof.public_inputs,
    ) {
        Ok(true) => info!(elapsed = ?start.elapsed(), "membership proof verified"),
        Ok(false) => {
            error!("membership proof did not verify");
            std::process::exit(1);
        }
        Err(e) => {
            error!(error = %e, "verification failed");
            std::process::exit(1);
        }
    }
}

//! Circuit statistics utility - reports constraint counts and proof timing
//!
//! Usage:
//!   cargo run --release --bin circuit-stats           # Just constraint counts
//!   cargo run --release --bin circuit-stats -- --time # Include proof timing (needs keys)

use std::path::Path;
use std::time::Instant;

use anonvote_circuits::{
    constraint_count, hash_proposal, Identity, IncrementalMerkleTree, PoseidonHasher, Witness,
    DEFAULT_HEIGHT,
};
use anonvote_prover::{prove, setup::CircuitKeys};
use ark_bn254::Fr;
use rayon::prelude::*;

const HEIGHTS: [usize; 6] = [4, 8, 10, 16, 20, 32];

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let include_timing = args.iter().any(|a| a == "--time");

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║              MEMBERSHIP CIRCUIT STATS                    ║");
    println!("╚══════════════════════════════════════════════════════════╝\n");

    println!("Default height: {}", DEFAULT_HEIGHT);
    println!("Max voters:     {}\n", 1u64 << DEFAULT_HEIGHT);

    println!("─────────────────────────────────────────────────────────────");
    println!("CIRCUIT CONSTRAINTS:");
    println!("─────────────────────────────────────────────────────────────\n");

    // Synthesis per height is independent
    let counts: Vec<(usize, usize)> = HEIGHTS
        .par_iter()
        .map(|&height| {
            let count = constraint_count(height).expect("Synthesis failed");
            (height, count)
        })
        .collect();

    println!("Height     Constraints    Per level");
    println!("──────────────────────────────────────");
    for (height, count) in &counts {
        println!("{:>6}     {:>11}    {:>9}", height, count, count / height);
    }

    if include_timing {
        println!("\n─────────────────────────────────────────────────────────────");
        println!("PROOF TIMING:");
        println!("─────────────────────────────────────────────────────────────\n");

        let keys_path = Path::new("keys");
        if !keys_path.exists() {
            // Try common locations
            let alt_paths = [Path::new("../../keys"), Path::new("../keys"), Path::new("./target/keys")];

            match alt_paths.iter().find(|p| p.exists()) {
                Some(path) => run_timing_benchmarks(path),
                None => {
                    println!("Keys not found. Generate keys first with:");
                    println!("  cargo run --release --bin export-vks");
                }
            }
        } else {
            run_timing_benchmarks(keys_path);
        }
    } else {
        println!("\n(Run with --time to include proof generation timing)");
    }
}

fn run_timing_benchmarks(keys_path: &Path) {
    println!("Loading keys from {:?}...", keys_path);
    let start = Instant::now();
    let keys = match CircuitKeys::load_from_directory(keys_path) {
        Ok(k) => k,
        Err(e) => {
            println!("Failed to load keys: {}", e);
            return;
        }
    };
    println!("Keys loaded in {:?}\n", start.elapsed());

    let mut tree = IncrementalMerkleTree::new(keys.height, PoseidonHasher).expect("Invalid key height");
    let mut identity = Identity::generate();
    let index = tree.insert(identity.commitment(&PoseidonHasher)).expect("Tree full");
    identity.register(index).expect("Already registered");
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

    // Warm up (first proof is slower due to caching)
    let _ = prove::prove_membership(&keys.membership.proving_key, &witness);

    const RUNS: usize = 3;
    let constraints = constraint_count(keys.height).expect("Synthesis failed") as f64;

    let mut times = Vec::new();
    for _ in 0..RUNS {
        let start = Instant::now();
        let _ = prove::prove_membership(&keys.membership.proving_key, &witness);
        times.push(start.elapsed().as_micros());
    }
    let avg_us = times.iter().sum::<u128>() / RUNS as u128;

    println!("Circuit          Constraints    Avg Time    μs/constraint");
    println!("────────────────────────────────────────────────────────────");
    println!(
        "Membership(h={:<2})    {:>7}       {:>4}ms         {:.2}",
        keys.height,
        constraints,
        avg_us / 1000,
        avg_us as f64 / constraints
    );
}
